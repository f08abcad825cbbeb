//! Backend REST client.
//!
//! Question sets, answer submission, accounts, moderation and media all go
//! through [`ApiClient`].

mod client;
mod messages;
mod upload;

pub use client::{media_file_name, ApiClient, ApiError};
pub use messages::{
    AnswerSubmission, ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    SubmitAnswersRequest, UpdatePasswordRequest,
};
pub use upload::{relative_media_path, sanitize_filename, upload_name, ImageSize};
