use serde::{Deserialize, Serialize};

pub const ROLE_REVIEWER: &str = "REVIEWER";
pub const ROLE_ADMIN: &str = "ADMIN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub pseudo: String,
    #[serde(default)]
    pub pseudo_discord: String,
}

/// A logged-in user as returned by `/login`, plus the JWT from the response header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub user_profile: Option<UserProfile>,
    #[serde(default)]
    pub jwt: String,
}

impl User {
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|role| role.name == name)
    }

    /// Reviewers and admins may moderate submitted questions.
    pub fn can_review(&self) -> bool {
        self.has_role(ROLE_REVIEWER) || self.has_role(ROLE_ADMIN)
    }

    pub fn jwt(&self) -> Option<&str> {
        let jwt = self.jwt.trim();
        if jwt.is_empty() { None } else { Some(jwt) }
    }

    pub fn display_name(&self) -> &str {
        self.user_profile
            .as_ref()
            .map(|profile| profile.pseudo.as_str())
            .filter(|pseudo| !pseudo.is_empty())
            .unwrap_or(&self.username)
    }
}
