//! Media upload helpers: safe file names and the stored path the backend returns.

use std::path::Path;

const MAX_FILE_NAME: usize = 80;
const FALLBACK_NAME: &str = "upload";
const MEDIA_ROOT: &str = "questions/";

/// Target size of an uploaded image; the backend rescales to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
    pub quality: f32,
}

impl ImageSize {
    pub const DEFAULT_QUALITY: f32 = 0.8;

    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            quality: Self::DEFAULT_QUALITY,
        }
    }
}

/// ASCII-only file name with a unique `_<stamp>` suffix, at most 80
/// characters before the extension.
pub fn sanitize_filename(file_name: &str, stamp: i64) -> String {
    let (base, extension) = match file_name.rsplit_once('.') {
        Some((base, extension)) => (base, format!(".{}", extension)),
        None => (file_name, String::new()),
    };
    let base = if base.is_empty() { FALLBACK_NAME } else { base };
    let suffix = format!("_{}", stamp);

    let mut ascii = String::with_capacity(base.len());
    let mut in_gap = false;
    for c in base.chars().filter_map(fold_accent) {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            ascii.push(c);
            in_gap = false;
        } else if !in_gap {
            ascii.push('_');
            in_gap = true;
        }
    }

    let limit = MAX_FILE_NAME.saturating_sub(suffix.len()).max(1);
    let trimmed: String = ascii.trim_matches('_').chars().take(limit).collect();
    let safe = if trimmed.is_empty() {
        FALLBACK_NAME
    } else {
        trimmed.as_str()
    };

    format!("{}{}{}", safe, suffix, extension)
}

/// Name of a local file as sent in the multipart form.
pub fn upload_name(path: &Path) -> &str {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(FALLBACK_NAME)
}

/// Stored path from an upload response.
///
/// The backend answers either with the bare path or with a sentence ending
/// in `: <path>`; only the part from `questions/` on is kept.
pub fn relative_media_path(body: &str) -> String {
    let path = match body.rsplit_once(':') {
        Some((_, tail)) => tail.trim(),
        None => body.trim(),
    };
    match path.find(MEDIA_ROOT) {
        Some(start) => path[start..].to_string(),
        None => path.to_string(),
    }
}

// Combining marks are dropped, accented Latin letters lose their accent.
fn fold_accent(c: char) -> Option<char> {
    if ('\u{0300}'..='\u{036f}').contains(&c) {
        return None;
    }
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'ç' => 'c',
        'Ç' => 'C',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        other => other,
    };
    Some(folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_accents_and_symbols() {
        assert_eq!(
            sanitize_filename("Château fort (v2).png", 1700),
            "Chateau_fort_v2_1700.png"
        );
        assert_eq!(sanitize_filename("cri de guerre.aztèque.mp3", 5), "cri_de_guerre.azteque_5.mp3");
    }

    #[test]
    fn test_sanitize_fallbacks() {
        assert_eq!(sanitize_filename("???.jpg", 1), "upload_1.jpg");
        assert_eq!(sanitize_filename(".ogg", 1), "upload_1.ogg");
        assert_eq!(sanitize_filename("wololo", 2), "wololo_2");
    }

    #[test]
    fn test_sanitize_limits_length() {
        let long = format!("{}.png", "a".repeat(200));
        let name = sanitize_filename(&long, 1_700_000_000_000);
        assert_eq!(name.len(), MAX_FILE_NAME + ".png".len());
        assert!(name.ends_with("_1700000000000.png"));
    }

    #[test]
    fn test_relative_media_path() {
        assert_eq!(
            relative_media_path("Fichier uploadé avec succès : /srv/data/questions/images/castle.png"),
            "questions/images/castle.png"
        );
        assert_eq!(
            relative_media_path("questions/audio/wololo_1.mp3"),
            "questions/audio/wololo_1.mp3"
        );
        assert_eq!(relative_media_path(" other/place.png "), "other/place.png");
    }

    #[test]
    fn test_upload_name() {
        assert_eq!(upload_name(Path::new("/tmp/sons/wololo.mp3")), "wololo.mp3");
        assert_eq!(upload_name(Path::new("/")), "upload");
    }
}
