//! Correctness and time-weighted points.
//!
//! Everything here is a pure function of the question set, the selections
//! and the captured response times, so a report can be rebuilt at any time.

use std::collections::BTreeSet;

use crate::config::Timing;
use crate::models::QuizQuestion;

/// Elapsed time assumed for a question that never had one captured.
const MIN_ELAPSED_SECONDS: u32 = 1;

/// How an option is shown in the correction view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
    /// Correct and selected.
    Found,
    /// Correct but not selected.
    Missed,
    /// Selected but wrong.
    Wrong,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionOutcome {
    pub text: String,
    pub mark: OptionMark,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionOutcome {
    pub question_id: i64,
    pub text: String,
    pub correct: bool,
    pub points: u32,
    pub elapsed_seconds: u32,
    pub options: Vec<OptionOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScoreReport {
    pub outcomes: Vec<QuestionOutcome>,
    /// Number of correctly answered questions.
    pub score: usize,
    pub total: usize,
    pub points: u32,
}

impl ScoreReport {
    pub fn percentage(&self) -> f64 {
        if self.total > 0 {
            (self.score as f64 / self.total as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// All or nothing: the selection must match the correct set exactly.
pub fn is_correct(selected: &BTreeSet<i64>, correct: &BTreeSet<i64>) -> bool {
    selected == correct
}

/// Points for one question; faster correct answers earn more, never less than one.
pub fn question_points(correct: bool, elapsed_seconds: u32, timing: Timing) -> u32 {
    if !correct {
        return 0;
    }
    timing.points_base.saturating_sub(elapsed_seconds).max(1)
}

pub fn score_question(
    question: &QuizQuestion,
    selected: &BTreeSet<i64>,
    elapsed_seconds: Option<u32>,
    timing: Timing,
) -> QuestionOutcome {
    let elapsed_seconds = elapsed_seconds.unwrap_or(MIN_ELAPSED_SECONDS).max(MIN_ELAPSED_SECONDS);
    let correct = is_correct(selected, &question.correct_option_ids);

    let options = question
        .options
        .iter()
        .zip(question.option_ids.iter())
        .map(|(text, id)| {
            let mark = match (question.is_correct_option(*id), selected.contains(id)) {
                (true, true) => OptionMark::Found,
                (true, false) => OptionMark::Missed,
                (false, true) => OptionMark::Wrong,
                (false, false) => OptionMark::Neutral,
            };
            OptionOutcome { text: text.clone(), mark }
        })
        .collect();

    QuestionOutcome {
        question_id: question.id,
        text: question.text.clone(),
        correct,
        points: question_points(correct, elapsed_seconds, timing),
        elapsed_seconds,
        options,
    }
}

/// Score a whole play-through. Missing selections count as empty.
pub fn score_session(
    questions: &[QuizQuestion],
    selections: &[BTreeSet<i64>],
    elapsed: &[Option<u32>],
    timing: Timing,
) -> ScoreReport {
    let empty = BTreeSet::new();

    let outcomes: Vec<QuestionOutcome> = questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let selected = selections.get(index).unwrap_or(&empty);
            let elapsed_seconds = elapsed.get(index).copied().flatten();
            score_question(question, selected, elapsed_seconds, timing)
        })
        .collect();

    ScoreReport {
        score: outcomes.iter().filter(|outcome| outcome.correct).count(),
        total: outcomes.len(),
        points: outcomes.iter().map(|outcome| outcome.points).sum(),
        outcomes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionKind;

    fn question(id: i64, option_ids: &[i64], correct: &[i64]) -> QuizQuestion {
        QuizQuestion {
            id,
            text: format!("Question {}", id),
            options: option_ids.iter().map(|id| format!("Option {}", id)).collect(),
            option_ids: option_ids.to_vec(),
            correct_option_ids: correct.iter().copied().collect(),
            correct_answers: Vec::new(),
            kind: QuestionKind::Multiple,
            media_url: None,
        }
    }

    #[test]
    fn test_exact_match_at_three_seconds() {
        let q = question(1, &[4, 5, 6], &[5]);
        let outcome = score_question(&q, &BTreeSet::from([5]), Some(3), Timing::default());
        assert!(outcome.correct);
        assert_eq!(outcome.points, 13);
    }

    #[test]
    fn test_partial_selection_scores_nothing() {
        let q = question(1, &[5, 6, 7], &[5, 7]);
        let outcome = score_question(&q, &BTreeSet::from([5]), Some(2), Timing::default());
        assert!(!outcome.correct);
        assert_eq!(outcome.points, 0);
        assert_eq!(outcome.options[0].mark, OptionMark::Found);
        assert_eq!(outcome.options[1].mark, OptionMark::Neutral);
        assert_eq!(outcome.options[2].mark, OptionMark::Missed);
    }

    #[test]
    fn test_extra_selection_is_wrong() {
        let q = question(1, &[5, 6], &[5]);
        let outcome = score_question(&q, &BTreeSet::from([5, 6]), Some(1), Timing::default());
        assert!(!outcome.correct);
        assert_eq!(outcome.options[1].mark, OptionMark::Wrong);
    }

    #[test]
    fn test_points_bounds() {
        let timing = Timing::default();
        assert_eq!(question_points(true, 1, timing), 15);
        assert_eq!(question_points(true, 15, timing), 1);
        assert_eq!(question_points(true, 40, timing), 1);
        assert_eq!(question_points(false, 1, timing), 0);
    }

    #[test]
    fn test_missing_elapsed_counts_as_one_second() {
        let q = question(1, &[1, 2], &[1]);
        let outcome = score_question(&q, &BTreeSet::from([1]), None, Timing::default());
        assert_eq!(outcome.elapsed_seconds, 1);
        assert_eq!(outcome.points, 15);
    }

    #[test]
    fn test_score_session_is_repeatable() {
        let questions = vec![question(1, &[1, 2], &[1]), question(2, &[3, 4], &[4])];
        let selections = vec![BTreeSet::from([1]), BTreeSet::new()];
        let elapsed = vec![Some(5), Some(15)];

        let first = score_session(&questions, &selections, &elapsed, Timing::default());
        let second = score_session(&questions, &selections, &elapsed, Timing::default());
        assert_eq!(first, second);
        assert_eq!(first.score, 1);
        assert_eq!(first.total, 2);
        assert_eq!(first.points, 11);
        assert_eq!(first.percentage(), 50.0);
    }

    #[test]
    fn test_custom_points_base() {
        let timing = Timing { seconds_per_question: 30, points_base: 31 };
        assert_eq!(question_points(true, 10, timing), 21);
    }
}
