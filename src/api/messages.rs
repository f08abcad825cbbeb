//! Request bodies exchanged with the quiz backend.
//!
//! All bodies are JSON with camelCase keys.

use serde::{Deserialize, Serialize};

use crate::models::{Role, UserProfile};

/// One answered question, as recorded by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmission {
    pub question_id: i64,
    pub answer_ids: Vec<i64>,
    pub response_time_seconds: u32,
}

/// Body of `POST /questions/submit-answers`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswersRequest<'a> {
    pub user_answer_requests: &'a [AnswerSubmission],
}

/// Body of `POST /login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Body of `POST /register`: a full user record with an empty role list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest<'a> {
    pub id: i64,
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub name: &'a str,
    pub surname: &'a str,
    pub enabled: bool,
    pub roles: &'a [Role],
    pub user_profile: &'a UserProfile,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordRequest<'a> {
    pub email: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest<'a> {
    pub new_password: &'a str,
    pub token: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest<'a> {
    pub old_password: &'a str,
    pub new_password: &'a str,
}
