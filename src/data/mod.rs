mod loader;
mod normalize;

pub use loader::{load_questions_from_json, LoadError};
pub use normalize::{normalize_question, normalize_questions};
