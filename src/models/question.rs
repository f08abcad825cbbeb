use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Display texts and ids used for synthesized true/false questions.
pub const TRUE_LABEL: &str = "Vrai";
pub const FALSE_LABEL: &str = "Faux";
pub const TRUE_ID: i64 = 1;
pub const FALSE_ID: i64 = 2;

/// How many options a player may hold at once for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Single,
    Multi,
}

/// Kind of a quiz question, as tagged by the backend.
///
/// Tags are read case-insensitively, so `"vrai_faux"` or `"sound"` in a
/// draft file deserialize like the canonical tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "String")]
pub enum QuestionKind {
    #[default]
    Multiple,
    TrueFalse,
    Sound,
    Image,
    /// A tag this client does not know. Played as single-choice.
    Other,
}

impl QuestionKind {
    /// Parse a backend type tag. A missing or blank tag means `Multiple`.
    pub fn from_tag(tag: Option<&str>) -> Self {
        let Some(tag) = tag.map(str::trim).filter(|tag| !tag.is_empty()) else {
            return Self::Multiple;
        };

        match tag.to_ascii_uppercase().as_str() {
            "MULTIPLE" => Self::Multiple,
            "TRUE_FALSE" | "VRAI_FAUX" => Self::TrueFalse,
            "SOUND" => Self::Sound,
            "IMAGE" => Self::Image,
            _ => Self::Other,
        }
    }

    pub fn selection_mode(self) -> SelectionMode {
        match self {
            Self::Multiple | Self::Sound | Self::Image => SelectionMode::Multi,
            Self::TrueFalse | Self::Other => SelectionMode::Single,
        }
    }

    pub fn as_tag(self) -> &'static str {
        match self {
            Self::Multiple => "MULTIPLE",
            Self::TrueFalse => "TRUE_FALSE",
            Self::Sound => "SOUND",
            Self::Image => "IMAGE",
            Self::Other => "OTHER",
        }
    }

    /// Whether the question carries a media file the player needs to see or hear.
    pub fn has_media(self) -> bool {
        matches!(self, Self::Sound | Self::Image)
    }

    /// French label shown in listings.
    pub fn label(self) -> &'static str {
        match self {
            Self::Multiple => "Choix multiple",
            Self::TrueFalse => "Vrai / Faux",
            Self::Sound => "Son",
            Self::Image => "Image",
            Self::Other => "Autre",
        }
    }
}

impl From<String> for QuestionKind {
    fn from(tag: String) -> Self {
        Self::from_tag(Some(&tag))
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Canonical question shape, independent of the payload it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuizQuestion {
    pub id: i64,
    pub text: String,
    pub options: Vec<String>,
    /// Index-aligned with `options`.
    pub option_ids: Vec<i64>,
    pub correct_option_ids: BTreeSet<i64>,
    /// Display texts of the correct options.
    pub correct_answers: Vec<String>,
    pub kind: QuestionKind,
    pub media_url: Option<String>,
}

impl QuizQuestion {
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    pub fn has_option_id(&self, id: i64) -> bool {
        self.option_ids.contains(&id)
    }

    pub fn option_id_at(&self, index: usize) -> Option<i64> {
        self.option_ids.get(index).copied()
    }

    /// Display text for an option id, if it belongs to this question.
    pub fn option_text(&self, id: i64) -> Option<&str> {
        self.option_ids
            .iter()
            .position(|candidate| *candidate == id)
            .and_then(|index| self.options.get(index))
            .map(String::as_str)
    }

    pub fn is_correct_option(&self, id: i64) -> bool {
        self.correct_option_ids.contains(&id)
    }
}
