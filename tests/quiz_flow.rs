use std::collections::BTreeSet;

use aoe_quiz::scoring::OptionMark;
use aoe_quiz::{
    normalize_questions, Advance, Phase, QuestionKind, QuizSession, SubmissionOutcome,
    TickOutcome, Timing,
};
use serde_json::json;

fn backend_payload() -> serde_json::Value {
    json!([
        {
            "id": 11,
            "intitule": "Quelles civilisations ont accès au Cor de guerre ?",
            "type": "MULTIPLE",
            "reponses": [
                {"id": 5, "intitule": "Mayas", "bonne": true},
                {"id": 6, "intitule": "Francs", "bonne": false},
                {"id": 7, "intitule": "Aztèques", "bonne": true}
            ]
        },
        {
            "id": 12,
            "libelle": "Les Goths peuvent construire des murs de pierre.",
            "type": "VRAI_FAUX",
            "correctAnswer": "Vrai"
        },
        {
            "id": 13,
            "questionText": "Quel bâtiment produit le Trébuchet ?",
            "type": "SOUND",
            "fileUrl": "questions/sounds/trebuchet.mp3",
            "options": ["Château", "Atelier de siège"],
            "optionIds": [20, 21],
            "correctAnswerIds": [20]
        }
    ])
}

fn start() -> QuizSession {
    let questions = normalize_questions(&backend_payload());
    QuizSession::start(questions, Timing::default()).expect("non-empty question set")
}

fn wait(session: &mut QuizSession, seconds: u32) -> TickOutcome {
    let generation = session.generation();
    let mut outcome = TickOutcome::Idle;
    for _ in 0..seconds {
        outcome = session.tick(generation);
    }
    outcome
}

#[test]
fn test_payload_normalizes_every_shape() {
    let questions = normalize_questions(&backend_payload());
    assert_eq!(questions.len(), 3);

    assert_eq!(questions[0].correct_option_ids, BTreeSet::from([5, 7]));
    assert_eq!(questions[1].kind, QuestionKind::TrueFalse);
    assert_eq!(questions[1].options, vec!["Vrai", "Faux"]);
    assert_eq!(questions[1].correct_option_ids, BTreeSet::from([1]));
    assert_eq!(
        questions[2].media_url.as_deref(),
        Some("questions/sounds/trebuchet.mp3")
    );
}

#[test]
fn test_full_play_through() {
    let mut session = start();

    // Both correct options after three seconds.
    assert!(session.select(5));
    assert!(session.select(7));
    wait(&mut session, 3);
    assert!(matches!(session.advance(), Advance::Next(1)));

    // Wrong true/false answer.
    assert!(session.select(2));
    wait(&mut session, 2);
    assert!(matches!(session.advance(), Advance::Next(2)));

    // Right answer, but the countdown runs out.
    assert!(session.select(20));
    let generation = session.generation();
    assert_eq!(wait(&mut session, 15), TickOutcome::Expired);
    let payload = match session.advance_for(generation) {
        Advance::Submit(payload) => payload,
        other => panic!("expected submission, got {:?}", other),
    };
    assert_eq!(session.phase(), Phase::Submitting);

    assert_eq!(payload.len(), 3);
    assert_eq!(payload[0].answer_ids, vec![5, 7]);
    assert_eq!(payload[0].response_time_seconds, 3);
    assert_eq!(payload[2].response_time_seconds, 15);

    session.finish_submission(SubmissionOutcome::Submitted);
    assert_eq!(session.phase(), Phase::Correction);

    let report = session.report();
    assert_eq!(report.score, 2);
    assert_eq!(report.total, 3);
    assert_eq!(report.outcomes[0].points, 13);
    assert_eq!(report.outcomes[1].points, 0);
    assert_eq!(report.outcomes[2].points, 1);
    assert_eq!(report.points, 14);
}

#[test]
fn test_true_false_replaces_choice() {
    let mut session = start();
    session.advance();

    session.select(1);
    session.select(2);
    assert_eq!(session.current_selection(), Some(&BTreeSet::from([2])));
}

#[test]
fn test_correction_marks_options() {
    let mut session = start();
    session.select(5);
    session.select(6);
    session.advance();
    session.advance();
    session.advance();
    session.finish_submission(SubmissionOutcome::Failed("timeout".into()));

    let report = session.report();
    let marks: Vec<OptionMark> = report.outcomes[0].options.iter().map(|o| o.mark).collect();
    assert_eq!(
        marks,
        vec![OptionMark::Found, OptionMark::Wrong, OptionMark::Missed]
    );
    assert!(!report.outcomes[0].correct);
    assert_eq!(
        session.submission_outcome(),
        Some(&SubmissionOutcome::Failed("timeout".into()))
    );
}

#[test]
fn test_late_expiry_after_manual_advance_is_ignored() {
    let mut session = start();
    let first = session.generation();

    assert!(matches!(session.advance_for(first), Advance::Next(1)));
    assert_eq!(session.tick(first), TickOutcome::Stale);
    assert!(matches!(session.advance_for(first), Advance::Ignored));
    assert_eq!(session.current_index(), 1);
}

#[test]
fn test_unknown_type_is_single_choice() {
    let questions = normalize_questions(&json!([{
        "id": 30,
        "intitule": "Quelle civilisation a le Conquistador ?",
        "type": "QCM",
        "reponses": [
            {"id": 5, "intitule": "Espagnols", "bonne": true},
            {"id": 6, "intitule": "Portugais", "bonne": false}
        ]
    }]));
    assert_eq!(questions[0].kind, QuestionKind::Other);

    let mut session = QuizSession::start(questions, Timing::default()).expect("one question");
    session.select(5);
    session.select(6);
    assert_eq!(session.current_selection(), Some(&BTreeSet::from([6])));
}

#[test]
fn test_missing_type_is_multiple_choice() {
    let questions = normalize_questions(&json!([{
        "id": 31,
        "reponses": [{"id": 5, "intitule": "A"}, {"id": 6, "intitule": "B"}]
    }]));
    let mut session = QuizSession::start(questions, Timing::default()).expect("one question");
    session.select(5);
    session.select(6);
    assert_eq!(session.current_selection(), Some(&BTreeSet::from([5, 6])));
}

#[test]
fn test_empty_payload_does_not_start() {
    let questions = normalize_questions(&json!([]));
    assert!(QuizSession::start(questions, Timing::default()).is_none());
}
