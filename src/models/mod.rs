mod filter;
mod question;
mod review;
mod user;

pub use filter::{QuizFilter, QuizLength, THEMES};
pub use question::{
    QuestionKind, QuizQuestion, SelectionMode, FALSE_ID, FALSE_LABEL, TRUE_ID, TRUE_LABEL,
};
pub use review::{DraftAnswer, NewQuestion, QuestionEdit, QuestionStatus, ReviewQuestion};
pub use user::{Role, User, UserProfile};
