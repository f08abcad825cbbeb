//! HTTP client for the quiz backend.

use std::time::Duration;

use chrono::Utc;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use super::messages::{
    AnswerSubmission, ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    SubmitAnswersRequest, UpdatePasswordRequest,
};
use super::upload::{relative_media_path, sanitize_filename, ImageSize};
use crate::models::{
    NewQuestion, QuestionEdit, QuestionKind, QuestionStatus, QuizFilter, ReviewQuestion, User,
    UserProfile,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("login response carried no authorization header")]
    MissingToken,
    #[error("invalid backend url: {0}")]
    Url(String),
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url.trim()).map_err(|e| ApiError::Url(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Url(format!("{} cannot be used as a base", base_url)));
        }

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Generate a quiz matching `filter`. Returns the raw question array.
    pub async fn generate_quiz(&self, filter: &QuizFilter) -> Result<Value, ApiError> {
        info!(
            count = filter.number_of_questions,
            theme = %filter.theme,
            "requesting quiz"
        );
        let response = self
            .client
            .post(self.endpoint(&["questions", "quizz"]))
            .json(filter)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// Default quiz set, used when no filter was chosen.
    pub async fn fetch_default_quiz(&self) -> Result<Value, ApiError> {
        let response = self
            .client
            .get(self.endpoint(&["questions", "quizz"]))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn submit_answers(
        &self,
        answers: &[AnswerSubmission],
        jwt: Option<&str>,
    ) -> Result<(), ApiError> {
        let body = SubmitAnswersRequest {
            user_answer_requests: answers,
        };
        let request = self
            .client
            .post(self.endpoint(&["questions", "submit-answers"]))
            .json(&body);
        check(with_auth(request, jwt).send().await?).await?;
        info!(answers = answers.len(), "answers submitted");
        Ok(())
    }

    /// Log in. The JWT travels in the `Authorization` response header.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ApiError> {
        let response = self
            .client
            .post(self.endpoint(&["login"]))
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ApiError::InvalidCredentials);
        }
        let response = check(response).await?;
        let jwt = token_from_headers(response.headers()).ok_or(ApiError::MissingToken)?;

        let mut user: User = response.json().await?;
        user.jwt = jwt;
        info!(username = %user.username, "logged in");
        Ok(user)
    }

    pub async fn fetch_all_questions(
        &self,
        jwt: Option<&str>,
    ) -> Result<Vec<ReviewQuestion>, ApiError> {
        let request = self.client.get(self.endpoint(&["questions", "all"]));
        let response = check(with_auth(request, jwt).send().await?).await?;
        Ok(response.json().await?)
    }

    pub async fn update_question_status(
        &self,
        question_id: i64,
        status: &QuestionStatus,
        jwt: Option<&str>,
    ) -> Result<(), ApiError> {
        let id = question_id.to_string();
        let request = self
            .client
            .put(self.endpoint(&["questions", &id, status.as_tag()]));
        check(with_auth(request, jwt).send().await?).await?;
        info!(question_id, status = %status, "question status updated");
        Ok(())
    }

    pub async fn create_question(
        &self,
        draft: &NewQuestion,
        jwt: Option<&str>,
    ) -> Result<Value, ApiError> {
        let request = self.client.post(self.endpoint(&["questions"])).json(draft);
        let response = check(with_auth(request, jwt).send().await?).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }

    /// Replace the content of an existing question.
    pub async fn update_question(
        &self,
        edit: &QuestionEdit,
        jwt: Option<&str>,
    ) -> Result<(), ApiError> {
        let request = self.client.put(self.endpoint(&["questions"])).json(edit);
        check(with_auth(request, jwt).send().await?).await?;
        info!(question_id = edit.id, "question updated");
        Ok(())
    }

    /// Upload an image; returns the stored `questions/...` path.
    pub async fn upload_image(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        size: ImageSize,
        jwt: Option<&str>,
    ) -> Result<String, ApiError> {
        let form = Form::new()
            .part("file", file_part(file_name, bytes)?)
            .text("width", size.width.to_string())
            .text("height", size.height.to_string())
            .text("quality", size.quality.to_string());
        self.upload(&["upload", "image"], form, jwt).await
    }

    /// Upload an audio file; returns the stored `questions/...` path.
    pub async fn upload_audio(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        jwt: Option<&str>,
    ) -> Result<String, ApiError> {
        let form = Form::new().part("file", file_part(file_name, bytes)?);
        self.upload(&["upload", "audio"], form, jwt).await
    }

    async fn upload(
        &self,
        segments: &[&str],
        form: Form,
        jwt: Option<&str>,
    ) -> Result<String, ApiError> {
        let request = self.client.post(self.endpoint(segments)).multipart(form);
        let response = check(with_auth(request, jwt).send().await?).await?;
        let path = relative_media_path(&response.text().await?);
        info!(path = %path, "media uploaded");
        Ok(path)
    }

    pub async fn register(&self, request: &RegisterRequest<'_>) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.endpoint(&["register"]))
            .json(request)
            .send()
            .await?;
        check(response).await?;
        info!(username = request.username, "account registered");
        Ok(())
    }

    /// Ask for a reset link. The backend answers the same whether or not the
    /// address is known.
    pub async fn forgot_password(&self, email: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.endpoint(&["users", "forgot-password"]))
            .json(&ForgotPasswordRequest { email })
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.endpoint(&["users", "reset-password"]))
            .json(&ResetPasswordRequest { new_password, token })
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    pub async fn update_password(
        &self,
        old_password: &str,
        new_password: &str,
        jwt: Option<&str>,
    ) -> Result<(), ApiError> {
        let request = self
            .client
            .put(self.endpoint(&["users", "update-password"]))
            .json(&UpdatePasswordRequest {
                old_password,
                new_password,
            });
        check(with_auth(request, jwt).send().await?).await?;
        Ok(())
    }

    /// The logged-in user as the backend currently knows it. The JWT is not
    /// part of the body.
    pub async fn current_user(&self, jwt: Option<&str>) -> Result<User, ApiError> {
        let request = self.client.get(self.endpoint(&["users", "current"]));
        let response = check(with_auth(request, jwt).send().await?).await?;
        Ok(response.json().await?)
    }

    pub async fn update_user(&self, user: &User, jwt: Option<&str>) -> Result<(), ApiError> {
        let request = self.client.put(self.endpoint(&["users", "update"])).json(user);
        check(with_auth(request, jwt).send().await?).await?;
        info!(username = %user.username, "profile updated");
        Ok(())
    }

    pub async fn user_profile(
        &self,
        user_id: i64,
        jwt: Option<&str>,
    ) -> Result<UserProfile, ApiError> {
        let id = user_id.to_string();
        let request = self.client.get(self.endpoint(&["users", "profile", &id]));
        let response = check(with_auth(request, jwt).send().await?).await?;
        Ok(response.json().await?)
    }

    pub async fn list_profiles(&self, jwt: Option<&str>) -> Result<Vec<UserProfile>, ApiError> {
        let request = self.client.get(self.endpoint(&["users", "profiles"]));
        let response = check(with_auth(request, jwt).send().await?).await?;
        Ok(response.json().await?)
    }

    /// URL of the media file behind a question, by file name.
    pub fn media_url(&self, kind: QuestionKind, file_ref: &str) -> Option<String> {
        let folder = match kind {
            QuestionKind::Image => "image",
            QuestionKind::Sound => "audio",
            QuestionKind::Multiple | QuestionKind::TrueFalse | QuestionKind::Other => return None,
        };
        let file_name = media_file_name(file_ref)?;
        Some(self.endpoint(&["media", folder, file_name]))
    }

    pub async fn fetch_media(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        debug!(url, "fetching media");
        let response = check(self.client.get(url).send().await?).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Join percent-encoded path segments onto the base URL.
    fn endpoint(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.to_string()
    }
}

/// Last path component of a stored media reference.
pub fn media_file_name(file_ref: &str) -> Option<&str> {
    file_ref
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

/// The file field of an upload form, under a sanitized unique name.
fn file_part(file_name: &str, bytes: Vec<u8>) -> Result<Part, ApiError> {
    let safe_name = sanitize_filename(file_name, Utc::now().timestamp_millis());
    let mime = mime_guess::from_path(&safe_name).first_or_octet_stream();
    debug!(file = %safe_name, mime = %mime, "preparing upload");
    Ok(Part::bytes(bytes).file_name(safe_name).mime_str(mime.as_ref())?)
}

fn with_auth(request: RequestBuilder, jwt: Option<&str>) -> RequestBuilder {
    match jwt.map(bearer_token).filter(|token| !token.is_empty()) {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

/// The raw token, whether or not it already carries the `Bearer` scheme.
fn bearer_token(jwt: &str) -> &str {
    let jwt = jwt.trim();
    jwt.strip_prefix("Bearer ").unwrap_or(jwt).trim()
}

fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(bearer_token)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    #[test]
    fn test_endpoint_joins_segments() {
        let client = ApiClient::new("http://localhost:8080").unwrap();
        assert_eq!(
            client.endpoint(&["questions", "quizz"]),
            "http://localhost:8080/questions/quizz"
        );

        let prefixed = ApiClient::new("https://aoe.example/api/").unwrap();
        assert_eq!(
            prefixed.endpoint(&["questions", "12", "VALIDATED"]),
            "https://aoe.example/api/questions/12/VALIDATED"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(ApiClient::new("not a url"), Err(ApiError::Url(_))));
        assert!(matches!(ApiClient::new("mailto:a@b.c"), Err(ApiError::Url(_))));
    }

    #[test]
    fn test_media_url() {
        let client = ApiClient::new("http://localhost:8080").unwrap();
        assert_eq!(
            client.media_url(QuestionKind::Image, "questions/images/Château fort.png"),
            Some("http://localhost:8080/media/image/Ch%C3%A2teau%20fort.png".to_string())
        );
        assert_eq!(
            client.media_url(QuestionKind::Sound, "C:\\uploads\\wololo.mp3"),
            Some("http://localhost:8080/media/audio/wololo.mp3".to_string())
        );
        assert_eq!(client.media_url(QuestionKind::Multiple, "a.png"), None);
        assert_eq!(client.media_url(QuestionKind::Image, "questions/"), None);
    }

    #[test]
    fn test_upload_endpoints() {
        let client = ApiClient::new("http://localhost:8080/").unwrap();
        assert_eq!(
            client.endpoint(&["upload", "image"]),
            "http://localhost:8080/upload/image"
        );
        assert_eq!(
            client.endpoint(&["users", "profile", "7"]),
            "http://localhost:8080/users/profile/7"
        );
    }

    #[test]
    fn test_file_part_accepts_unknown_extension() {
        assert!(file_part("notes.zzz-unknown", b"data".to_vec()).is_ok());
        assert!(file_part("Château.png", Vec::new()).is_ok());
    }

    #[test]
    fn test_bearer_token_strips_scheme() {
        assert_eq!(bearer_token("Bearer abc.def"), "abc.def");
        assert_eq!(bearer_token(" abc.def "), "abc.def");
    }

    #[test]
    fn test_token_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(token_from_headers(&headers), None);
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(token_from_headers(&headers), Some("xyz".to_string()));
    }
}
