use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::question::{QuestionKind, FALSE_LABEL, TRUE_LABEL};

/// Moderation status of a submitted question.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QuestionStatus {
    Pending,
    Approved,
    Rejected,
    CreatedReview,
    ClaimedReview,
    Validated,
    Draft,
    Other(String),
}

impl QuestionStatus {
    pub fn from_tag(tag: Option<&str>) -> Self {
        let Some(tag) = tag.map(str::trim).filter(|tag| !tag.is_empty()) else {
            return Self::Pending;
        };

        match tag.to_ascii_uppercase().as_str() {
            "PENDING" => Self::Pending,
            "APPROVED" => Self::Approved,
            "REJECTED" => Self::Rejected,
            "CREATED_REVIEW" => Self::CreatedReview,
            "CLAIMED_REVIEW" => Self::ClaimedReview,
            "VALIDATED" => Self::Validated,
            "DRAFT" => Self::Draft,
            _ => Self::Other(tag.to_string()),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::CreatedReview => "CREATED_REVIEW",
            Self::ClaimedReview => "CLAIMED_REVIEW",
            Self::Validated => "VALIDATED",
            Self::Draft => "DRAFT",
            Self::Other(tag) => tag,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Pending => "En attente",
            Self::Approved => "Approuvée",
            Self::Rejected => "Rejetée",
            Self::CreatedReview => "En révision",
            Self::ClaimedReview => "Prise en charge",
            Self::Validated => "Validée",
            Self::Draft => "Brouillon",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub username: String,
}

/// Question summary as listed by `GET /questions/all`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQuestion {
    #[serde(default)]
    pub id: i64,
    #[serde(default, alias = "questionText", alias = "intitule")]
    pub libelle: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub civilisation: Option<String>,
    #[serde(default)]
    pub building: Option<String>,
    #[serde(default)]
    pub author_username: Option<String>,
    #[serde(default)]
    pub created_by: Option<Author>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl ReviewQuestion {
    pub fn status(&self) -> QuestionStatus {
        QuestionStatus::from_tag(self.status.as_deref())
    }

    pub fn kind(&self) -> QuestionKind {
        QuestionKind::from_tag(self.kind.as_deref())
    }

    pub fn author(&self) -> Option<&str> {
        self.author_username
            .as_deref()
            .or_else(|| self.created_by.as_ref().map(|author| author.username.as_str()))
            .filter(|name| !name.is_empty())
    }

    /// Last modification time, falling back to creation time.
    pub fn last_touched(&self) -> Option<DateTime<Utc>> {
        self.updated_at
            .as_deref()
            .and_then(parse_timestamp)
            .or_else(|| self.created_at.as_deref().and_then(parse_timestamp))
    }
}

/// Accepts RFC 3339 as well as offset-less timestamps, read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftAnswer {
    /// Set when editing an existing answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub value: String,
    #[serde(default)]
    pub correct: bool,
}

impl DraftAnswer {
    pub fn new(value: impl Into<String>, correct: bool) -> Self {
        Self {
            id: None,
            value: value.into(),
            correct,
        }
    }
}

/// A question authored locally, sent to `POST /questions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestion {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "none_tag")]
    pub civilisation: String,
    #[serde(default = "none_tag")]
    pub building: String,
    pub libelle: String,
    #[serde(rename = "type", default)]
    pub kind: QuestionKind,
    #[serde(default)]
    pub answers: Vec<DraftAnswer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

/// An existing question with its new content, sent to `PUT /questions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionEdit {
    pub id: i64,
    #[serde(flatten)]
    pub question: NewQuestion,
}

impl QuestionEdit {
    /// Trim the draft for saving. Blank answers are dropped; the title and
    /// at least one answer must remain.
    pub fn new(id: i64, mut question: NewQuestion) -> Result<Self, String> {
        question.libelle = question.libelle.trim().to_string();
        if question.libelle.is_empty() {
            return Err("Le libellé est requis pour la modification".to_string());
        }

        for answer in &mut question.answers {
            answer.value = answer.value.trim().to_string();
        }
        question.answers.retain(|answer| !answer.value.is_empty());
        if question.answers.is_empty() {
            return Err("Au moins une réponse est requise".to_string());
        }

        for tag in [&mut question.civilisation, &mut question.building] {
            if tag.trim().is_empty() {
                *tag = none_tag();
            }
        }

        Ok(Self { id, question })
    }
}

fn default_theme() -> String {
    super::filter::DEFAULT_THEME.to_string()
}

fn none_tag() -> String {
    super::filter::NONE_TAG.to_string()
}

impl NewQuestion {
    pub fn true_false(libelle: impl Into<String>, answer: bool) -> Self {
        Self {
            theme: default_theme(),
            civilisation: none_tag(),
            building: none_tag(),
            libelle: libelle.into(),
            kind: QuestionKind::TrueFalse,
            answers: true_false_answers(answer),
            file_url: None,
        }
    }

    /// Check the draft before it is sent. True/false drafts get their two
    /// canonical answers rebuilt from whichever one was marked correct.
    pub fn validate(mut self) -> Result<Self, String> {
        if self.libelle.trim().is_empty() {
            return Err("La question est requise".to_string());
        }

        if self.kind == QuestionKind::TrueFalse {
            let answer = self
                .answers
                .iter()
                .find(|answer| answer.correct)
                .map(|answer| answer.value.trim().eq_ignore_ascii_case(TRUE_LABEL))
                .unwrap_or(true);
            self.answers = true_false_answers(answer);
            return Ok(self);
        }

        self.answers.retain(|answer| !answer.value.trim().is_empty());
        if self.answers.len() < 2 {
            return Err("Au moins deux réponses sont requises".to_string());
        }
        if !self.answers.iter().any(|answer| answer.correct) {
            return Err("Au moins une bonne réponse est requise".to_string());
        }
        if self.kind.has_media()
            && self.file_url.as_deref().is_none_or(|url| url.trim().is_empty())
        {
            return Err(format!("Un fichier est requis pour une question {}", self.kind.label()));
        }

        Ok(self)
    }
}

fn true_false_answers(answer: bool) -> Vec<DraftAnswer> {
    vec![
        DraftAnswer::new(TRUE_LABEL, answer),
        DraftAnswer::new(FALSE_LABEL, !answer),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_and_labels() {
        assert_eq!(QuestionStatus::from_tag(None), QuestionStatus::Pending);
        assert_eq!(QuestionStatus::from_tag(Some("validated")), QuestionStatus::Validated);
        assert_eq!(QuestionStatus::ClaimedReview.label(), "Prise en charge");
        let other = QuestionStatus::from_tag(Some("ARCHIVED"));
        assert_eq!(other.as_tag(), "ARCHIVED");
        assert_eq!(other.label(), "ARCHIVED");
    }

    #[test]
    fn test_last_touched_prefers_updated_at() {
        let question = ReviewQuestion {
            created_at: Some("2024-01-01T10:00:00".into()),
            updated_at: Some("2024-03-01T10:00:00Z".into()),
            ..Default::default()
        };
        let touched = question.last_touched().unwrap();
        assert_eq!(touched.to_rfc3339(), "2024-03-01T10:00:00+00:00");

        let created_only = ReviewQuestion {
            created_at: Some("2024-01-01T10:00:00.123".into()),
            ..Default::default()
        };
        assert!(created_only.last_touched().is_some());
        assert!(ReviewQuestion::default().last_touched().is_none());
    }

    #[test]
    fn test_true_false_draft_rebuilds_answers() {
        let draft = NewQuestion {
            answers: vec![DraftAnswer::new("faux", true)],
            ..NewQuestion::true_false("Les Celtes ont des Woad Raiders", true)
        };
        let draft = draft.validate().unwrap();
        assert_eq!(draft.answers.len(), 2);
        assert_eq!(draft.answers[0], DraftAnswer::new("Vrai", false));
        assert_eq!(draft.answers[1], DraftAnswer::new("Faux", true));
    }

    #[test]
    fn test_draft_validation_errors() {
        let empty_title = NewQuestion::true_false("  ", true);
        assert!(empty_title.validate().is_err());

        let mut multiple = NewQuestion::true_false("Quel bâtiment produit des moines ?", true);
        multiple.kind = QuestionKind::Multiple;
        multiple.answers = vec![
            DraftAnswer::new("Monastère", false),
            DraftAnswer::new("Forge", false),
        ];
        assert!(multiple.clone().validate().is_err());

        multiple.answers[0].correct = true;
        assert!(multiple.clone().validate().is_ok());

        multiple.kind = QuestionKind::Sound;
        assert!(multiple.clone().validate().is_err());
        multiple.file_url = Some("questions/audio/wololo.mp3".into());
        assert!(multiple.validate().is_ok());
    }

    #[test]
    fn test_draft_serializes_type_tag() {
        let draft = NewQuestion::true_false("Les Huns n'ont pas besoin de maisons", true);
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["type"], "TRUE_FALSE");
        assert_eq!(json["civilisation"], "NONE");
        assert!(json.get("fileUrl").is_none());
    }

    #[test]
    fn test_edit_trims_and_drops_blank_answers() {
        let draft: NewQuestion = serde_json::from_str(
            r#"{"libelle": "  Quel bâtiment forme les moines ? ", "type": "MULTIPLE",
                "civilisation": "", "answers": [
                    {"id": 3, "value": " Monastère ", "correct": true},
                    {"id": 4, "value": "   "}
                ]}"#,
        )
        .unwrap();

        let edit = QuestionEdit::new(12, draft).unwrap();
        assert_eq!(edit.question.libelle, "Quel bâtiment forme les moines ?");
        assert_eq!(edit.question.civilisation, "NONE");
        assert_eq!(edit.question.answers.len(), 1);
        assert_eq!(edit.question.answers[0].id, Some(3));

        let json = serde_json::to_value(&edit).unwrap();
        assert_eq!(json["id"], 12);
        assert_eq!(json["type"], "MULTIPLE");
        assert_eq!(json["answers"][0]["value"], "Monastère");
    }

    #[test]
    fn test_edit_requires_title_and_answer() {
        let untitled = NewQuestion::true_false("   ", true);
        assert!(QuestionEdit::new(1, untitled).is_err());

        let mut unanswered = NewQuestion::true_false("Les Perses ont des éléphants", true);
        unanswered.answers = vec![DraftAnswer::new(" ", true)];
        assert!(QuestionEdit::new(1, unanswered).is_err());
    }
}
