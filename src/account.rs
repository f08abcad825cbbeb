//! Account operations: registration, password recovery and profiles.

use tracing::info;

use crate::api::{ApiClient, ApiError, RegisterRequest};
use crate::auth::UserContext;
use crate::models::{User, UserProfile};
use crate::QuizError;

pub const MIN_PASSWORD_LEN: usize = 6;

const PSEUDO_TAKEN: (&str, &str) = (
    "UserWithSamePseudoExistException",
    "Ce pseudo DoL est déjà utilisé.",
);
const USERNAME_TAKEN: (&str, &str) = (
    "UserWithSameUsernameExistException",
    "Ce nom d'utilisateur est déjà utilisé.",
);
const EMAIL_TAKEN: (&str, &str) = ("email", "Cette adresse mail est déjà utilisée.");
const WRONG_OLD_PASSWORD: (&str, &str) = (
    "Ancien mot de passe incorrect",
    "L'ancien mot de passe est incorrect.",
);

/// Answer shown after a reset request, whether or not the address is known.
pub const RESET_LINK_SENT: &str = "Si un compte existe, un email a été envoyé.";

/// A new account as typed by the player.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub name: String,
    pub surname: String,
    pub pseudo: String,
    pub pseudo_discord: String,
}

impl Registration {
    /// Trim the identifying fields and check the password.
    pub fn validate(mut self) -> Result<Self, QuizError> {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_string();
        self.pseudo = self.pseudo.trim().to_string();
        self.pseudo_discord = self.pseudo_discord.trim().to_string();

        if self.username.is_empty() {
            return Err(invalid("le nom d'utilisateur est requis"));
        }
        if self.email.is_empty() {
            return Err(invalid("l'adresse mail est requise"));
        }
        if self.pseudo.is_empty() {
            return Err(invalid("le pseudo DoL est requis"));
        }
        validate_new_password(&self.password, &self.confirm_password)?;
        Ok(self)
    }

    fn profile(&self) -> UserProfile {
        UserProfile {
            pseudo: self.pseudo.clone(),
            pseudo_discord: self.pseudo_discord.clone(),
            ..UserProfile::default()
        }
    }
}

/// Profile fields to change; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub email: Option<String>,
    pub pseudo: Option<String>,
    pub pseudo_discord: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.pseudo.is_none()
            && self.pseudo_discord.is_none()
            && self.bio.is_none()
            && self.avatar.is_none()
    }

    fn apply(self, user: &mut User) {
        if let Some(email) = self.email {
            user.email = email.trim().to_string();
        }
        let profile = user.user_profile.get_or_insert_with(UserProfile::default);
        if let Some(pseudo) = self.pseudo {
            profile.pseudo = pseudo.trim().to_string();
        }
        if let Some(pseudo_discord) = self.pseudo_discord {
            profile.pseudo_discord = pseudo_discord.trim().to_string();
        }
        if let Some(bio) = self.bio {
            profile.bio = bio;
        }
        if let Some(avatar) = self.avatar {
            profile.avatar = avatar.trim().to_string();
        }
    }
}

pub fn validate_new_password(password: &str, confirm: &str) -> Result<(), QuizError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(invalid(&format!(
            "le mot de passe doit contenir au moins {} caractères",
            MIN_PASSWORD_LEN
        )));
    }
    if password != confirm {
        return Err(invalid("les mots de passe ne correspondent pas"));
    }
    Ok(())
}

pub async fn register(api: &ApiClient, registration: Registration) -> Result<(), QuizError> {
    let registration = registration.validate()?;
    let profile = registration.profile();
    let request = RegisterRequest {
        id: 0,
        username: &registration.username,
        email: &registration.email,
        password: &registration.password,
        name: registration.name.trim(),
        surname: registration.surname.trim(),
        enabled: true,
        roles: &[],
        user_profile: &profile,
    };
    api.register(&request)
        .await
        .map_err(|e| rejection(e, &[PSEUDO_TAKEN, USERNAME_TAKEN, EMAIL_TAKEN]))
}

pub async fn forgot_password(api: &ApiClient, email: &str) -> Result<(), QuizError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(invalid("l'adresse mail est requise"));
    }
    api.forgot_password(email).await?;
    Ok(())
}

pub async fn reset_password(
    api: &ApiClient,
    token: &str,
    password: &str,
    confirm: &str,
) -> Result<(), QuizError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(invalid("lien de réinitialisation invalide"));
    }
    validate_new_password(password, confirm)?;
    api.reset_password(token, password).await.map_err(|e| match e {
        ApiError::Status { .. } => QuizError::Rejected("Token invalide".to_string()),
        other => QuizError::Api(other),
    })
}

pub async fn update_password(
    api: &ApiClient,
    context: &UserContext,
    old_password: &str,
    password: &str,
    confirm: &str,
) -> Result<(), QuizError> {
    let jwt = require_login(context)?;
    validate_new_password(password, confirm)?;
    api.update_password(old_password, password, Some(jwt))
        .await
        .map_err(|e| rejection(e, &[WRONG_OLD_PASSWORD]))
}

/// The logged-in user as the backend currently has it, with the saved JWT.
pub async fn current_profile(api: &ApiClient, context: &UserContext) -> Result<User, QuizError> {
    let jwt = require_login(context)?;
    let mut user = api.current_user(Some(jwt)).await?;
    user.jwt = jwt.to_string();
    Ok(user)
}

/// Apply `changes` to the current user, send it, and keep the saved copy in step.
pub async fn update_profile(
    api: &ApiClient,
    context: &mut UserContext,
    changes: ProfileChanges,
) -> Result<User, QuizError> {
    if changes.is_empty() {
        return Err(invalid("aucune modification"));
    }
    let mut user = current_profile(api, context).await?;
    changes.apply(&mut user);
    if user.email.is_empty() {
        return Err(invalid("l'adresse mail est requise"));
    }

    api.update_user(&user, context.jwt())
        .await
        .map_err(|e| rejection(e, &[PSEUDO_TAKEN, EMAIL_TAKEN]))?;
    context.set_user(Some(user.clone()))?;
    info!(username = %user.username, "saved user refreshed");
    Ok(user)
}

pub async fn profile(
    api: &ApiClient,
    context: &UserContext,
    user_id: i64,
) -> Result<UserProfile, QuizError> {
    let jwt = require_login(context)?;
    Ok(api.user_profile(user_id, Some(jwt)).await?)
}

/// All public profiles, optionally narrowed to pseudos containing `pseudo`.
pub async fn list_profiles(
    api: &ApiClient,
    context: &UserContext,
    pseudo: Option<&str>,
) -> Result<Vec<UserProfile>, QuizError> {
    let jwt = require_login(context)?;
    let profiles = api.list_profiles(Some(jwt)).await?;
    Ok(filter_profiles(profiles, pseudo))
}

/// Case-insensitive substring match on the pseudo; a blank needle keeps all.
pub fn filter_profiles(profiles: Vec<UserProfile>, pseudo: Option<&str>) -> Vec<UserProfile> {
    let needle = match pseudo.map(str::trim).filter(|p| !p.is_empty()) {
        Some(needle) => needle.to_lowercase(),
        None => return profiles,
    };
    profiles
        .into_iter()
        .filter(|profile| profile.pseudo.to_lowercase().contains(&needle))
        .collect()
}

fn require_login(context: &UserContext) -> Result<&str, QuizError> {
    context.jwt().ok_or(QuizError::NotLoggedIn)
}

fn invalid(message: &str) -> QuizError {
    QuizError::InvalidInput(message.to_string())
}

/// Turn a backend refusal whose body names a known cause into a readable
/// message. Anything else stays an API error.
fn rejection(error: ApiError, causes: &[(&str, &str)]) -> QuizError {
    if let ApiError::Status { body, .. } = &error {
        if let Some((_, message)) = causes.iter().find(|(marker, _)| body.contains(marker)) {
            return QuizError::Rejected(message.to_string());
        }
    }
    QuizError::Api(error)
}
