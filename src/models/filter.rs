use serde::{Deserialize, Serialize};

pub const NONE_TAG: &str = "NONE";
pub const DEFAULT_THEME: &str = "TECH_TREE";
pub const MIN_QUESTIONS: u32 = 1;
pub const MAX_QUESTIONS: u32 = 100;

/// Themes offered when generating a solo quiz.
pub const THEMES: [(&str, &str); 4] = [
    ("TECH_TREE", "Arbre des technologies"),
    ("IMAGE", "Image"),
    ("UNIT_STATS", "Statistiques des unités"),
    ("SOUND", "Son"),
];

/// Preset quiz lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizLength {
    Short,
    Medium,
    Long,
    Custom(u32),
}

impl QuizLength {
    pub fn question_count(self) -> u32 {
        match self {
            Self::Short => 20,
            Self::Medium => 40,
            Self::Long => 60,
            Self::Custom(count) => count.clamp(MIN_QUESTIONS, MAX_QUESTIONS),
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "short" | "courte" => Some(Self::Short),
            "medium" | "moyenne" => Some(Self::Medium),
            "long" | "longue" => Some(Self::Long),
            other => other.parse().ok().map(Self::Custom),
        }
    }
}

impl Default for QuizLength {
    fn default() -> Self {
        Self::Short
    }
}

/// Body of `POST /questions/quizz`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizFilter {
    pub building: String,
    pub civilisation: String,
    pub theme: String,
    pub number_of_questions: u32,
}

impl Default for QuizFilter {
    fn default() -> Self {
        Self {
            building: NONE_TAG.to_string(),
            civilisation: NONE_TAG.to_string(),
            theme: DEFAULT_THEME.to_string(),
            number_of_questions: QuizLength::default().question_count(),
        }
    }
}

impl QuizFilter {
    pub fn with_length(mut self, length: QuizLength) -> Self {
        self.number_of_questions = length.question_count();
        self
    }

    pub fn with_theme(mut self, theme: Option<&str>) -> Self {
        self.theme = normalize_tag(theme).unwrap_or_else(|| DEFAULT_THEME.to_string());
        self
    }

    pub fn with_civilisation(mut self, civilisation: Option<&str>) -> Self {
        self.civilisation = normalize_tag(civilisation).unwrap_or_else(|| NONE_TAG.to_string());
        self
    }

    pub fn with_building(mut self, building: Option<&str>) -> Self {
        self.building = normalize_tag(building).unwrap_or_else(|| NONE_TAG.to_string());
        self
    }
}

fn normalize_tag(tag: Option<&str>) -> Option<String> {
    tag.map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(|tag| tag.to_ascii_uppercase().replace([' ', '-'], "_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_presets() {
        assert_eq!(QuizLength::Short.question_count(), 20);
        assert_eq!(QuizLength::Medium.question_count(), 40);
        assert_eq!(QuizLength::Long.question_count(), 60);
        assert_eq!(QuizLength::Custom(0).question_count(), 1);
        assert_eq!(QuizLength::Custom(250).question_count(), 100);
    }

    #[test]
    fn test_parse_length() {
        assert_eq!(QuizLength::parse("Long"), Some(QuizLength::Long));
        assert_eq!(QuizLength::parse("moyenne"), Some(QuizLength::Medium));
        assert_eq!(QuizLength::parse("12"), Some(QuizLength::Custom(12)));
        assert_eq!(QuizLength::parse("forever"), None);
    }

    #[test]
    fn test_filter_serializes_camel_case() {
        let filter = QuizFilter::default()
            .with_length(QuizLength::Custom(5))
            .with_civilisation(Some("britons"))
            .with_building(Some("archery range"));
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json["numberOfQuestions"], 5);
        assert_eq!(json["civilisation"], "BRITONS");
        assert_eq!(json["building"], "ARCHERY_RANGE");
        assert_eq!(json["theme"], "TECH_TREE");
    }
}
