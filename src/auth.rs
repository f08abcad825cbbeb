//! Logged-in user context.
//!
//! The context is an explicit value handed to whatever needs the current
//! user. The only way to change the user is [`UserContext::set_user`], which
//! also keeps the on-disk copy in step.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::models::User;

pub struct UserContext {
    user: Option<User>,
    store_path: Option<PathBuf>,
}

impl UserContext {
    /// A context that lives only in memory.
    pub fn in_memory(user: Option<User>) -> Self {
        Self {
            user,
            store_path: None,
        }
    }

    /// Restore the user saved at `path`. A missing or unreadable file means
    /// nobody is logged in.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();

        let user = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<User>(&content) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring corrupt user file");
                    None
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read user file");
                None
            }
        };

        Self {
            user,
            store_path: Some(path),
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn jwt(&self) -> Option<&str> {
        self.user.as_ref().and_then(User::jwt)
    }

    pub fn is_logged_in(&self) -> bool {
        self.jwt().is_some()
    }

    /// Replace the current user (or log out with `None`) and persist it.
    pub fn set_user(&mut self, user: Option<User>) -> io::Result<()> {
        if let Some(path) = &self.store_path {
            match &user {
                Some(user) => {
                    let json = serde_json::to_string_pretty(user)?;
                    fs::write(path, json)?;
                    debug!(path = %path.display(), "user saved");
                }
                None => match fs::remove_file(path) {
                    Ok(()) => debug!(path = %path.display(), "user file removed"),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e),
                },
            }
        }

        self.user = user;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn user() -> User {
        User {
            id: 4,
            username: "hera".into(),
            email: "hera@example.com".into(),
            name: String::new(),
            surname: String::new(),
            enabled: true,
            roles: vec![Role { id: Some(2), name: "REVIEWER".into() }],
            user_profile: None,
            jwt: "token".into(),
        }
    }

    #[test]
    fn test_set_user_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user.json");

        let mut context = UserContext::load(&path);
        assert!(context.user().is_none());

        context.set_user(Some(user())).unwrap();
        assert!(path.exists());

        let restored = UserContext::load(&path);
        assert_eq!(restored.user(), Some(&user()));
        assert_eq!(restored.jwt(), Some("token"));
    }

    #[test]
    fn test_logout_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user.json");

        let mut context = UserContext::load(&path);
        context.set_user(Some(user())).unwrap();
        context.set_user(None).unwrap();
        assert!(!path.exists());
        assert!(!context.is_logged_in());

        // Logging out twice is fine.
        context.set_user(None).unwrap();
    }

    #[test]
    fn test_corrupt_file_means_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user.json");
        fs::write(&path, "{ nope").unwrap();

        let context = UserContext::load(&path);
        assert!(context.user().is_none());
    }

    #[test]
    fn test_in_memory_context() {
        let mut context = UserContext::in_memory(None);
        context.set_user(Some(user())).unwrap();
        assert!(context.is_logged_in());
    }
}
