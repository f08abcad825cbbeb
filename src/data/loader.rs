use std::fs;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use super::normalize::normalize_questions;
use crate::models::QuizQuestion;

/// Error returned when reading a local question set fails.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path} must contain a JSON array of questions")]
    NotAnArray { path: String },
    #[error("{path} must contain at least one question")]
    Empty { path: String },
}

/// Load a raw question set from a JSON file and normalize it.
///
/// The file holds the same array the backend returns from `/questions/quizz`,
/// in any of the supported payload shapes.
pub fn load_questions_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<QuizQuestion>, LoadError> {
    let path = path.as_ref();
    let shown = path.display().to_string();

    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: shown.clone(),
        source,
    })?;

    let raw: Value = serde_json::from_str(&content).map_err(|source| LoadError::Parse {
        path: shown.clone(),
        source,
    })?;

    if !raw.is_array() {
        return Err(LoadError::NotAnArray { path: shown });
    }

    let questions = normalize_questions(&raw);
    if questions.is_empty() {
        return Err(LoadError::Empty { path: shown });
    }

    info!(path = %shown, count = questions.len(), "loaded local question set");
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_file() {
        let file = write_temp(
            r#"[{"id": 1, "type": "TRUE_FALSE", "correctAnswer": "Vrai", "intitule": "Les Goths ont des Huskarls"}]"#,
        );
        let questions = load_questions_from_json(file.path()).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].options, vec!["Vrai", "Faux"]);
    }

    #[test]
    fn test_load_errors() {
        let missing = load_questions_from_json("/definitely/not/here.json");
        assert!(matches!(missing, Err(LoadError::Io { .. })));

        let garbage = write_temp("{ not json");
        assert!(matches!(
            load_questions_from_json(garbage.path()),
            Err(LoadError::Parse { .. })
        ));

        let object = write_temp(r#"{"questions": []}"#);
        assert!(matches!(
            load_questions_from_json(object.path()),
            Err(LoadError::NotAnArray { .. })
        ));

        let empty = write_temp("[]");
        assert!(matches!(
            load_questions_from_json(empty.path()),
            Err(LoadError::Empty { .. })
        ));
    }
}
