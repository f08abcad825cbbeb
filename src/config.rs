//! Runtime configuration.
//!
//! Values come from the environment (a `.env` file is honoured) and can be
//! overridden by command-line flags in `main.rs`.

use std::env;
use std::path::PathBuf;

use crate::QuizError;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";
pub const DEFAULT_USER_FILE: &str = ".aoe-quiz-user.json";
pub const DEFAULT_SECONDS_PER_QUESTION: u32 = 15;
pub const DEFAULT_POINTS_BASE: u32 = 16;

/// Checked in order; the first one set wins.
const BACKEND_URL_VARS: [&str; 3] = [
    "AOE_QUIZ_BACKEND_URL",
    "JAVA_BACK_API_BASE_URL",
    "API_BASE_URL",
];

/// Countdown length and the base used to turn response time into points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub seconds_per_question: u32,
    pub points_base: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            seconds_per_question: DEFAULT_SECONDS_PER_QUESTION,
            points_base: DEFAULT_POINTS_BASE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizConfig {
    pub backend_url: String,
    pub user_file: PathBuf,
    pub timing: Timing,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            user_file: PathBuf::from(DEFAULT_USER_FILE),
            timing: Timing::default(),
        }
    }
}

impl QuizConfig {
    /// Read configuration from the process environment, loading `.env` first.
    pub fn from_env() -> Result<Self, QuizError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, QuizError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = BACKEND_URL_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|value| !value.trim().is_empty())
        {
            config.backend_url = url.trim().trim_end_matches('/').to_string();
        }

        if let Some(path) = lookup("AOE_QUIZ_USER_FILE").filter(|p| !p.trim().is_empty()) {
            config.user_file = PathBuf::from(path);
        }

        if let Some(seconds) = parse_var(&lookup, "AOE_QUIZ_TIMER_SECONDS")? {
            config.timing.seconds_per_question = seconds;
        }
        if let Some(base) = parse_var(&lookup, "AOE_QUIZ_POINTS_BASE")? {
            config.timing.points_base = base;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), QuizError> {
        if self.timing.seconds_per_question == 0 {
            return Err(QuizError::Config(
                "timer must be at least one second".to_string(),
            ));
        }
        if self.timing.points_base == 0 {
            return Err(QuizError::Config("points base must be positive".to_string()));
        }
        Ok(())
    }
}

fn parse_var<F>(lookup: &F, name: &str) -> Result<Option<u32>, QuizError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };

    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e| QuizError::Config(format!("invalid value for {}: {}", name, e)))
}
