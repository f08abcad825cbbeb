//! Moderation of submitted questions.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::api::{upload_name, ApiClient, ImageSize};
use crate::auth::UserContext;
use crate::models::{NewQuestion, QuestionEdit, QuestionKind, QuestionStatus, ReviewQuestion};
use crate::QuizError;

/// Filters and ordering for the review listing.
#[derive(Debug, Clone)]
pub struct ReviewQuery {
    pub status: Option<QuestionStatus>,
    pub kind: Option<QuestionKind>,
    pub newest_first: bool,
}

impl Default for ReviewQuery {
    fn default() -> Self {
        Self {
            status: None,
            kind: None,
            newest_first: true,
        }
    }
}

impl ReviewQuery {
    pub fn matches(&self, question: &ReviewQuestion) -> bool {
        let status_ok = self
            .status
            .as_ref()
            .is_none_or(|status| question.status() == *status);
        let kind_ok = self.kind.is_none_or(|kind| question.kind() == kind);
        status_ok && kind_ok
    }

    /// Filter then sort by last modification. Undated questions sort as oldest.
    pub fn apply(&self, questions: Vec<ReviewQuestion>) -> Vec<ReviewQuestion> {
        let mut selected: Vec<ReviewQuestion> =
            questions.into_iter().filter(|q| self.matches(q)).collect();

        selected.sort_by_key(|q| q.last_touched().unwrap_or(DateTime::<Utc>::UNIX_EPOCH));
        if self.newest_first {
            selected.reverse();
        }
        selected
    }
}

/// List questions for moderation. Requires a reviewer or admin.
pub async fn list_questions(
    api: &ApiClient,
    context: &UserContext,
    query: &ReviewQuery,
) -> Result<Vec<ReviewQuestion>, QuizError> {
    require_reviewer(context)?;
    let questions = api.fetch_all_questions(context.jwt()).await?;
    Ok(query.apply(questions))
}

pub async fn set_status(
    api: &ApiClient,
    context: &UserContext,
    question_id: i64,
    status: &QuestionStatus,
) -> Result<(), QuizError> {
    require_reviewer(context)?;
    api.update_question_status(question_id, status, context.jwt())
        .await?;
    Ok(())
}

/// Validate a draft and send it. Any logged-in user may author questions.
pub async fn create_question(
    api: &ApiClient,
    context: &UserContext,
    draft: NewQuestion,
) -> Result<serde_json::Value, QuizError> {
    if !context.is_logged_in() {
        return Err(QuizError::NotLoggedIn);
    }
    let draft = draft.validate().map_err(QuizError::InvalidDraft)?;
    Ok(api.create_question(&draft, context.jwt()).await?)
}

/// Replace the content of an existing question. Reviewers only.
pub async fn update_question(
    api: &ApiClient,
    context: &UserContext,
    question_id: i64,
    draft: NewQuestion,
) -> Result<(), QuizError> {
    require_reviewer(context)?;
    let edit = QuestionEdit::new(question_id, draft).map_err(QuizError::InvalidDraft)?;
    api.update_question(&edit, context.jwt()).await?;
    Ok(())
}

/// Upload the file behind a sound or image question and return the stored
/// path to put in the draft's `fileUrl`.
pub async fn upload_media(
    api: &ApiClient,
    context: &UserContext,
    kind: QuestionKind,
    path: &Path,
    size: Option<ImageSize>,
) -> Result<String, QuizError> {
    if !context.is_logged_in() {
        return Err(QuizError::NotLoggedIn);
    }
    if !kind.has_media() {
        return Err(QuizError::InvalidDraft(format!(
            "une question {} n'a pas de fichier",
            kind.label()
        )));
    }
    if kind == QuestionKind::Image && size.is_none() {
        return Err(QuizError::InvalidInput(
            "la largeur et la hauteur de l'image sont requises".to_string(),
        ));
    }

    let bytes = tokio::fs::read(path).await?;
    let name = upload_name(path);
    let stored = match size {
        Some(size) if kind == QuestionKind::Image => {
            api.upload_image(name, bytes, size, context.jwt()).await?
        }
        _ => api.upload_audio(name, bytes, context.jwt()).await?,
    };
    Ok(stored)
}

fn require_reviewer(context: &UserContext) -> Result<(), QuizError> {
    match context.user() {
        None => Err(QuizError::NotLoggedIn),
        Some(user) if !user.can_review() => Err(QuizError::Forbidden(format!(
            "{} is not a reviewer",
            user.username
        ))),
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, User};

    fn user(roles: &[&str]) -> User {
        User {
            id: 1,
            username: "villager".into(),
            email: String::new(),
            name: String::new(),
            surname: String::new(),
            enabled: true,
            roles: roles
                .iter()
                .map(|name| Role { id: None, name: name.to_string() })
                .collect(),
            user_profile: None,
            jwt: "t".into(),
        }
    }

    fn offline_api() -> ApiClient {
        ApiClient::new("http://127.0.0.1:1").unwrap()
    }

    fn review_question(id: i64, status: &str, kind: &str, updated: Option<&str>) -> ReviewQuestion {
        ReviewQuestion {
            id,
            libelle: format!("Question {}", id),
            kind: Some(kind.to_string()),
            status: Some(status.to_string()),
            updated_at: updated.map(str::to_string),
            ..Default::default()
        }
    }

    fn sample() -> Vec<ReviewQuestion> {
        vec![
            review_question(1, "PENDING", "MULTIPLE", Some("2024-02-01T00:00:00")),
            review_question(2, "VALIDATED", "SOUND", Some("2024-03-01T00:00:00")),
            review_question(3, "PENDING", "SOUND", None),
            review_question(4, "PENDING", "IMAGE", Some("2024-04-01T00:00:00")),
        ]
    }

    fn ids(questions: &[ReviewQuestion]) -> Vec<i64> {
        questions.iter().map(|q| q.id).collect()
    }

    #[test]
    fn test_default_query_sorts_newest_first() {
        let listed = ReviewQuery::default().apply(sample());
        assert_eq!(ids(&listed), vec![4, 2, 1, 3]);
    }

    #[test]
    fn test_filters_combine() {
        let query = ReviewQuery {
            status: Some(QuestionStatus::Pending),
            kind: Some(QuestionKind::Sound),
            newest_first: false,
        };
        assert_eq!(ids(&query.apply(sample())), vec![3]);

        let pending_oldest = ReviewQuery {
            status: Some(QuestionStatus::Pending),
            kind: None,
            newest_first: false,
        };
        assert_eq!(ids(&pending_oldest.apply(sample())), vec![3, 1, 4]);
    }

    #[test]
    fn test_require_reviewer() {
        let anonymous = UserContext::in_memory(None);
        assert!(matches!(require_reviewer(&anonymous), Err(QuizError::NotLoggedIn)));

        let mut player = user(&["USER"]);
        let context = UserContext::in_memory(Some(player.clone()));
        assert!(matches!(require_reviewer(&context), Err(QuizError::Forbidden(_))));

        player.roles.push(Role { id: None, name: "ADMIN".into() });
        let context = UserContext::in_memory(Some(player));
        assert!(require_reviewer(&context).is_ok());
    }

    #[tokio::test]
    async fn test_update_question_checks_before_sending() {
        let api = offline_api();
        let draft = NewQuestion::true_false("Les Bretons ont des Longbowmen", true);

        let player = UserContext::in_memory(Some(user(&["USER"])));
        let refused = update_question(&api, &player, 3, draft.clone()).await;
        assert!(matches!(refused, Err(QuizError::Forbidden(_))));

        let reviewer = UserContext::in_memory(Some(user(&["REVIEWER"])));
        let untitled = NewQuestion::true_false(" ", true);
        let invalid = update_question(&api, &reviewer, 3, untitled).await;
        assert!(matches!(invalid, Err(QuizError::InvalidDraft(_))));

        let unreachable = update_question(&api, &reviewer, 3, draft).await;
        assert!(matches!(unreachable, Err(QuizError::Api(_))));
    }

    #[tokio::test]
    async fn test_upload_media_rejects_before_reading() {
        let api = offline_api();
        let missing = Path::new("/nonexistent/wololo.mp3");

        let anonymous = UserContext::in_memory(None);
        let result = upload_media(&api, &anonymous, QuestionKind::Sound, missing, None).await;
        assert!(matches!(result, Err(QuizError::NotLoggedIn)));

        let author = UserContext::in_memory(Some(user(&["USER"])));
        let result = upload_media(&api, &author, QuestionKind::Multiple, missing, None).await;
        assert!(matches!(result, Err(QuizError::InvalidDraft(_))));

        let result = upload_media(&api, &author, QuestionKind::Image, missing, None).await;
        assert!(matches!(result, Err(QuizError::InvalidInput(_))));

        let result = upload_media(&api, &author, QuestionKind::Sound, missing, None).await;
        assert!(matches!(result, Err(QuizError::Io(_))));
    }
}
