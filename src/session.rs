//! Quiz session state machine.
//!
//! A session moves `Playing -> Submitting -> Correction` and never back.
//! While playing, each question runs its own countdown. Countdowns are
//! identified by a generation number so that a tick or an expiry issued for
//! a previous question can never act on the current one.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::api::AnswerSubmission;
use crate::config::Timing;
use crate::models::{QuizQuestion, SelectionMode};
use crate::scoring::{score_session, ScoreReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Playing,
    Submitting,
    Correction,
}

/// Result of a single countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Seconds left after this tick.
    Running(u32),
    /// Reached zero. Reported once per countdown.
    Expired,
    /// Issued for a countdown that has since been replaced.
    Stale,
    /// The countdown already expired or the session is no longer playing.
    Idle,
}

/// What `advance` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Moved on to the question at this index.
    Next(usize),
    /// Last question done; these answers should be sent once.
    Submit(Vec<AnswerSubmission>),
    Ignored,
}

/// How the one-shot answer submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Submitted,
    /// Nobody logged in, nothing sent.
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone)]
struct Countdown {
    remaining: u32,
    generation: u64,
    fired: bool,
}

impl Countdown {
    fn new(seconds: u32, generation: u64) -> Self {
        Self {
            remaining: seconds,
            generation,
            fired: false,
        }
    }
}

pub struct QuizSession {
    questions: Vec<QuizQuestion>,
    current_index: usize,
    selections: Vec<BTreeSet<i64>>,
    elapsed: Vec<Option<u32>>,
    phase: Phase,
    countdown: Countdown,
    timing: Timing,
    submission: Option<SubmissionOutcome>,
}

impl QuizSession {
    /// Start a session on question 0. Returns `None` for an empty set.
    pub fn start(questions: Vec<QuizQuestion>, timing: Timing) -> Option<Self> {
        if questions.is_empty() {
            return None;
        }

        let count = questions.len();
        info!(questions = count, "quiz session started");

        Some(Self {
            questions,
            current_index: 0,
            selections: vec![BTreeSet::new(); count],
            elapsed: vec![None; count],
            phase: Phase::Playing,
            countdown: Countdown::new(timing.seconds_per_question, 0),
            timing,
            submission: None,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question_number(&self) -> usize {
        self.current_index + 1
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.current_index)
    }

    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 >= self.questions.len()
    }

    pub fn selections(&self) -> &[BTreeSet<i64>] {
        &self.selections
    }

    pub fn current_selection(&self) -> Option<&BTreeSet<i64>> {
        self.selections.get(self.current_index)
    }

    pub fn elapsed(&self) -> &[Option<u32>] {
        &self.elapsed
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.countdown.remaining
    }

    /// Generation of the countdown for the question on screen.
    pub fn generation(&self) -> u64 {
        self.countdown.generation
    }

    pub fn submission_outcome(&self) -> Option<&SubmissionOutcome> {
        self.submission.as_ref()
    }

    /// Toggle or set an option for the current question.
    ///
    /// Returns whether the selection changed.
    pub fn select(&mut self, option_id: i64) -> bool {
        if self.phase != Phase::Playing {
            return false;
        }
        let Some(question) = self.questions.get(self.current_index) else {
            return false;
        };
        if !question.has_option_id(option_id) {
            return false;
        }
        let mode = question.kind.selection_mode();
        let Some(selection) = self.selections.get_mut(self.current_index) else {
            return false;
        };

        match mode {
            SelectionMode::Multi => {
                if !selection.remove(&option_id) {
                    selection.insert(option_id);
                }
            }
            SelectionMode::Single => {
                selection.clear();
                selection.insert(option_id);
            }
        }
        true
    }

    /// Select the option at a display position.
    pub fn select_index(&mut self, index: usize) -> bool {
        match self.current_question().and_then(|q| q.option_id_at(index)) {
            Some(id) => self.select(id),
            None => false,
        }
    }

    /// Count down one second on the given countdown.
    pub fn tick(&mut self, generation: u64) -> TickOutcome {
        if generation != self.countdown.generation {
            return TickOutcome::Stale;
        }
        if self.phase != Phase::Playing || self.countdown.fired {
            return TickOutcome::Idle;
        }

        self.countdown.remaining = self.countdown.remaining.saturating_sub(1);
        if self.countdown.remaining == 0 {
            self.countdown.fired = true;
            debug!(index = self.current_index, "countdown expired");
            TickOutcome::Expired
        } else {
            TickOutcome::Running(self.countdown.remaining)
        }
    }

    /// Advance only if `generation` still names the question on screen.
    ///
    /// Both the countdown expiry and the player's "next" go through here, so
    /// whichever arrives second for the same question is ignored.
    pub fn advance_for(&mut self, generation: u64) -> Advance {
        if generation != self.countdown.generation {
            return Advance::Ignored;
        }
        self.advance()
    }

    /// Record the response time and move to the next question, or finish.
    pub fn advance(&mut self) -> Advance {
        if self.phase != Phase::Playing || self.current_index >= self.questions.len() {
            return Advance::Ignored;
        }

        let used = self
            .timing
            .seconds_per_question
            .saturating_sub(self.countdown.remaining);
        if let Some(slot) = self.elapsed.get_mut(self.current_index) {
            slot.get_or_insert(used.max(1));
        }

        if !self.is_last_question() {
            self.current_index += 1;
            self.restart_countdown();
            return Advance::Next(self.current_index);
        }

        self.phase = Phase::Submitting;
        self.countdown.fired = true;
        info!("last question answered, submitting");
        Advance::Submit(self.submission_payload())
    }

    /// Close the submission step. The correction is shown whatever happened.
    pub fn finish_submission(&mut self, outcome: SubmissionOutcome) {
        if self.phase != Phase::Submitting {
            return;
        }
        self.submission = Some(outcome);
        self.phase = Phase::Correction;
    }

    pub fn submission_payload(&self) -> Vec<AnswerSubmission> {
        self.questions
            .iter()
            .enumerate()
            .map(|(index, question)| AnswerSubmission {
                question_id: question.id,
                answer_ids: self
                    .selections
                    .get(index)
                    .map(|selected| selected.iter().copied().collect())
                    .unwrap_or_default(),
                response_time_seconds: self.elapsed.get(index).copied().flatten().unwrap_or(1),
            })
            .collect()
    }

    pub fn report(&self) -> ScoreReport {
        score_session(&self.questions, &self.selections, &self.elapsed, self.timing)
    }

    fn restart_countdown(&mut self) {
        let generation = self.countdown.generation.wrapping_add(1);
        self.countdown = Countdown::new(self.timing.seconds_per_question, generation);
    }
}
