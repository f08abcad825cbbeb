//! Conversion of backend question payloads into [`QuizQuestion`].
//!
//! The backend has served questions in several shapes over time: answers
//! under `reponses` (`intitule` / `bonne`), under `answers` (`value` /
//! `correct`), or already flattened into `options` / `correctAnswerIds`.
//! Every shape is accepted; nothing here ever fails.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::debug;

use crate::models::{QuestionKind, QuizQuestion, FALSE_ID, FALSE_LABEL, TRUE_ID, TRUE_LABEL};

const TEXT_KEYS: [&str; 3] = ["intitule", "libelle", "questionText"];
const MEDIA_KEYS: [&str; 3] = ["fileUrl", "url", "mediaUrl"];

/// Where a question's answers were found, in lookup order.
#[derive(Debug, Clone, Copy)]
enum AnswerSource {
    Reponses,
    Answers,
}

impl AnswerSource {
    fn key(self) -> &'static str {
        match self {
            Self::Reponses => "reponses",
            Self::Answers => "answers",
        }
    }

    fn text_keys(self) -> [&'static str; 2] {
        match self {
            Self::Reponses => ["intitule", "value"],
            Self::Answers => ["value", "intitule"],
        }
    }
}

#[derive(Default)]
struct ResolvedOptions {
    options: Vec<String>,
    option_ids: Vec<i64>,
    correct_ids: Vec<i64>,
    correct_answers: Vec<String>,
}

/// Normalize a JSON array of raw questions. Anything that is not an array
/// yields an empty set.
pub fn normalize_questions(raw: &Value) -> Vec<QuizQuestion> {
    raw.as_array()
        .map(|questions| questions.iter().map(normalize_question).collect())
        .unwrap_or_default()
}

/// Normalize one raw question record.
pub fn normalize_question(raw: &Value) -> QuizQuestion {
    let kind = QuestionKind::from_tag(raw.get("type").and_then(Value::as_str));
    let text = first_string(raw, &TEXT_KEYS).unwrap_or_default();

    let mut resolved = [AnswerSource::Reponses, AnswerSource::Answers]
        .into_iter()
        .find_map(|source| {
            raw.get(source.key())
                .and_then(Value::as_array)
                .filter(|records| !records.is_empty())
                .map(|records| from_records(records, source))
        })
        .or_else(|| from_flattened(raw))
        .unwrap_or_default();

    if resolved.options.is_empty() && kind == QuestionKind::TrueFalse {
        resolved = true_false_fallback(raw);
    }

    let media_url = resolve_media(raw);
    let question = finish(raw, text, kind, resolved, media_url);

    debug!(
        id = question.id,
        kind = %question.kind,
        options = question.options.len(),
        "normalized question"
    );

    question
}

fn from_records(records: &[Value], source: AnswerSource) -> ResolvedOptions {
    let mut resolved = ResolvedOptions::default();

    for record in records {
        let text = first_string(record, &source.text_keys()).unwrap_or_default();
        let id = record.get("id").and_then(Value::as_i64).unwrap_or(0);

        if is_flagged_correct(record) {
            resolved.correct_ids.push(id);
            resolved.correct_answers.push(text.clone());
        }
        resolved.options.push(text);
        resolved.option_ids.push(id);
    }

    resolved
}

fn from_flattened(raw: &Value) -> Option<ResolvedOptions> {
    let options: Vec<String> = raw
        .get("options")?
        .as_array()?
        .iter()
        .map(|option| option.as_str().unwrap_or_default().to_string())
        .collect();
    if options.is_empty() {
        return None;
    }

    let option_ids: Vec<i64> = match raw.get("optionIds").and_then(Value::as_array) {
        Some(ids) => ids.iter().map(|id| id.as_i64().unwrap_or(0)).collect(),
        None => (0..options.len() as i64).collect(),
    };

    let correct_answers: Vec<String> = match raw.get("correctAnswers").and_then(Value::as_array) {
        Some(answers) => answers
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        None => non_empty_str(raw.get("correctAnswer"))
            .map(|answer| vec![answer.to_string()])
            .unwrap_or_default(),
    };

    let correct_ids: Vec<i64> = match raw.get("correctAnswerIds").and_then(Value::as_array) {
        Some(ids) => ids.iter().filter_map(Value::as_i64).collect(),
        // Without explicit ids the correct texts are the only way to score.
        None => correct_answers
            .iter()
            .filter_map(|answer| {
                options
                    .iter()
                    .position(|option| option == answer)
                    .and_then(|index| option_ids.get(index).copied())
            })
            .collect(),
    };

    Some(ResolvedOptions {
        options,
        option_ids,
        correct_ids,
        correct_answers,
    })
}

fn true_false_fallback(raw: &Value) -> ResolvedOptions {
    let mut resolved = ResolvedOptions {
        options: vec![TRUE_LABEL.to_string(), FALSE_LABEL.to_string()],
        option_ids: vec![TRUE_ID, FALSE_ID],
        ..Default::default()
    };

    if let Some(answer) = raw.get("correctAnswer").and_then(Value::as_str) {
        let id = if answer == TRUE_LABEL { TRUE_ID } else { FALSE_ID };
        resolved.correct_ids.push(id);
        resolved.correct_answers.push(answer.to_string());
    }

    resolved
}

fn resolve_media(raw: &Value) -> Option<String> {
    if let Some(url) = first_string(raw, &MEDIA_KEYS) {
        return Some(url);
    }

    [AnswerSource::Reponses, AnswerSource::Answers]
        .into_iter()
        .filter_map(|source| raw.get(source.key()).and_then(Value::as_array))
        .flat_map(|records| records.iter())
        .find_map(|record| first_string(record, &MEDIA_KEYS))
}

fn finish(
    raw: &Value,
    text: String,
    kind: QuestionKind,
    resolved: ResolvedOptions,
    media_url: Option<String>,
) -> QuizQuestion {
    let ResolvedOptions {
        mut options,
        mut option_ids,
        correct_ids,
        correct_answers,
    } = resolved;

    let aligned = options.len().min(option_ids.len());
    options.truncate(aligned);
    option_ids.truncate(aligned);

    let correct_option_ids: BTreeSet<i64> = correct_ids
        .into_iter()
        .filter(|id| option_ids.contains(id))
        .collect();

    QuizQuestion {
        id: raw.get("id").and_then(Value::as_i64).unwrap_or(0),
        text,
        options,
        option_ids,
        correct_option_ids,
        correct_answers,
        kind,
        media_url,
    }
}

fn is_flagged_correct(record: &Value) -> bool {
    ["bonne", "correct"]
        .iter()
        .any(|key| record.get(*key).and_then(Value::as_bool) == Some(true))
}

fn first_string(record: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| non_empty_str(record.get(*key)))
        .map(str::to_string)
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn expected_tower_question() -> QuizQuestion {
        QuizQuestion {
            id: 7,
            text: "Quel bâtiment recherche la Maçonnerie ?".into(),
            options: vec!["Université".into(), "Forge".into(), "Château".into()],
            option_ids: vec![5, 6, 7],
            correct_option_ids: BTreeSet::from([5]),
            correct_answers: vec!["Université".into()],
            kind: QuestionKind::Multiple,
            media_url: None,
        }
    }

    #[test]
    fn test_reponses_shape() {
        let raw = json!({
            "id": 7,
            "intitule": "Quel bâtiment recherche la Maçonnerie ?",
            "type": "MULTIPLE",
            "reponses": [
                {"id": 5, "intitule": "Université", "bonne": true},
                {"id": 6, "intitule": "Forge", "bonne": false},
                {"id": 7, "value": "Château"}
            ]
        });
        assert_eq!(normalize_question(&raw), expected_tower_question());
    }

    #[test]
    fn test_equivalent_shapes_normalize_identically() {
        let answers = json!({
            "id": 7,
            "libelle": "Quel bâtiment recherche la Maçonnerie ?",
            "answers": [
                {"id": 5, "value": "Université", "correct": true},
                {"id": 6, "value": "Forge", "correct": false},
                {"id": 7, "value": "Château", "correct": false}
            ]
        });
        let flattened = json!({
            "id": 7,
            "questionText": "Quel bâtiment recherche la Maçonnerie ?",
            "type": "MULTIPLE",
            "options": ["Université", "Forge", "Château"],
            "optionIds": [5, 6, 7],
            "correctAnswers": ["Université"],
            "correctAnswerIds": [5]
        });
        assert_eq!(normalize_question(&answers), expected_tower_question());
        assert_eq!(normalize_question(&flattened), expected_tower_question());
    }

    #[test]
    fn test_reponses_win_over_answers() {
        let raw = json!({
            "reponses": [{"id": 1, "intitule": "A", "bonne": true}],
            "answers": [{"id": 2, "value": "B", "correct": true}]
        });
        let question = normalize_question(&raw);
        assert_eq!(question.options, vec!["A"]);
        assert_eq!(question.option_ids, vec![1]);
    }

    #[test]
    fn test_empty_source_falls_through() {
        let raw = json!({
            "reponses": [],
            "answers": [{"id": 2, "value": "B", "correct": true}]
        });
        let question = normalize_question(&raw);
        assert_eq!(question.options, vec!["B"]);
        assert_eq!(question.correct_option_ids, BTreeSet::from([2]));
    }

    #[test]
    fn test_true_false_fallback() {
        let raw = json!({"id": 3, "type": "VRAI_FAUX", "correctAnswer": "Faux"});
        let question = normalize_question(&raw);
        assert_eq!(question.kind, QuestionKind::TrueFalse);
        assert_eq!(question.options, vec!["Vrai", "Faux"]);
        assert_eq!(question.option_ids, vec![1, 2]);
        assert_eq!(question.correct_option_ids, BTreeSet::from([2]));

        let unanswered = normalize_question(&json!({"type": "TRUE_FALSE"}));
        assert_eq!(unanswered.option_ids, vec![1, 2]);
        assert!(unanswered.correct_option_ids.is_empty());
    }

    #[test]
    fn test_flattened_without_ids_uses_positions() {
        let raw = json!({
            "options": ["Forum", "Moulin"],
            "correctAnswer": "Moulin"
        });
        let question = normalize_question(&raw);
        assert_eq!(question.option_ids, vec![0, 1]);
        assert_eq!(question.correct_option_ids, BTreeSet::from([1]));
        assert_eq!(question.correct_answers, vec!["Moulin"]);
    }

    #[test]
    fn test_media_resolution() {
        let top_level = json!({"type": "IMAGE", "fileUrl": "questions/images/castle.png"});
        assert_eq!(
            normalize_question(&top_level).media_url.as_deref(),
            Some("questions/images/castle.png")
        );

        let nested = json!({
            "type": "SOUND",
            "answers": [
                {"id": 1, "value": "Wololo", "correct": true},
                {"id": 2, "value": "Rogan", "url": "questions/audio/rogan.mp3"}
            ]
        });
        assert_eq!(
            normalize_question(&nested).media_url.as_deref(),
            Some("questions/audio/rogan.mp3")
        );
    }

    #[test]
    fn test_malformed_input_yields_empty_question() {
        let question = normalize_question(&json!("not a question"));
        assert!(question.options.is_empty());
        assert!(question.text.is_empty());
        assert_eq!(question.kind, QuestionKind::Multiple);

        let broken = normalize_question(&json!({"reponses": "nope", "options": 12}));
        assert!(broken.options.is_empty());
    }

    #[test]
    fn test_invariants_enforced() {
        let raw = json!({
            "options": ["A", "B", "C"],
            "optionIds": [1, 2],
            "correctAnswerIds": [2, 9]
        });
        let question = normalize_question(&raw);
        assert_eq!(question.options.len(), question.option_ids.len());
        assert_eq!(question.correct_option_ids, BTreeSet::from([2]));
    }

    #[test]
    fn test_normalize_questions_requires_array() {
        assert!(normalize_questions(&json!({"id": 1})).is_empty());
        assert_eq!(normalize_questions(&json!([{"id": 1}, {"id": 2}])).len(), 2);
    }
}
