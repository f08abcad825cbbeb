//! # aoe-quiz
//!
//! Terminal client for the Age of Empires II quiz backend: timed solo
//! quizzes, question authoring and moderation.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use aoe_quiz::{load_questions_from_json, QuizConfig, QuizError, Runner, UserContext};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), QuizError> {
//!     let config = QuizConfig::from_env()?;
//!     let questions = load_questions_from_json("questions.json")?;
//!     let context = UserContext::load(&config.user_file);
//!
//!     Runner::new(&config, context)?.play(questions).await?;
//!     Ok(())
//! }
//! ```

pub mod account;
pub mod api;
mod auth;
pub mod config;
mod data;
mod models;
pub mod review;
mod runner;
pub mod scoring;
pub mod session;
pub mod terminal;
mod ui;

use std::io;

use thiserror::Error;

pub use api::{AnswerSubmission, ApiClient, ApiError, ImageSize};
pub use auth::UserContext;
pub use config::{QuizConfig, Timing};
pub use data::{load_questions_from_json, normalize_question, normalize_questions, LoadError};
pub use models::{
    DraftAnswer, NewQuestion, QuestionEdit, QuestionKind, QuestionStatus, QuizFilter, QuizLength,
    QuizQuestion, ReviewQuestion, Role, SelectionMode, User, UserProfile, THEMES,
};
pub use runner::{QuestionSource, Runner};
pub use scoring::ScoreReport;
pub use session::{Advance, Phase, QuizSession, SubmissionOutcome, TickOutcome};

/// Error type for quiz operations.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("failed to load questions: {0}")]
    Load(#[from] LoadError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("backend error: {0}")]
    Api(#[from] ApiError),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("not logged in")]
    NotLoggedIn,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("invalid question: {0}")]
    InvalidDraft(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0}")]
    Rejected(String),
}
