use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::auth::repo_types::{Role, User};
use crate::error::AppError;

pub const MAX_USERNAME_CHARS: usize = 32;

/// 1-32 characters of any script, no control characters.
fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^\P{Cc}{1,32}$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

/// Body shared by register and login.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Registration rules; trims the username in place.
    pub fn validate_new(&mut self) -> Result<(), AppError> {
        self.username = self.username.trim().to_string();
        if !is_valid_username(&self.username) {
            return Err(AppError::Validation(format!(
                "Username must be 1-{MAX_USERNAME_CHARS} characters without control characters"
            )));
        }
        if self.password.is_empty() {
            return Err(AppError::Validation("Password is required".into()));
        }
        Ok(())
    }

    /// Login only needs both fields present.
    pub fn validate_login(&mut self) -> Result<(), AppError> {
        self.username = self.username.trim().to_string();
        if self.username.is_empty() || self.password.is_empty() {
            return Err(AppError::Validation("Username and password are required".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            role: u.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }

    #[test]
    fn registration_trims_and_accepts_simple_names() {
        let mut c = creds("  alice_01  ", "hunter22");
        c.validate_new().unwrap();
        assert_eq!(c.username, "alice_01");
    }

    #[test]
    fn registration_accepts_any_script_and_short_names() {
        let max = "字".repeat(MAX_USERNAME_CHARS);
        for name in ["张三", "jo", "x", "john smith", "Zoë", max.as_str()] {
            assert!(creds(name, "p").validate_new().is_ok(), "{name:?}");
        }
    }

    #[test]
    fn registration_rejects_bad_usernames() {
        let long = "x".repeat(MAX_USERNAME_CHARS + 1);
        for name in ["", "   ", "tab\there", "new\nline", long.as_str()] {
            assert!(creds(name, "hunter22").validate_new().is_err(), "{name:?}");
        }
    }

    #[test]
    fn registration_requires_a_password() {
        assert!(creds("alice", "").validate_new().is_err());
        assert!(creds("alice", "1").validate_new().is_ok());
    }

    #[test]
    fn login_requires_both_fields() {
        assert!(creds(" ", "pw").validate_login().is_err());
        assert!(creds("alice", "").validate_login().is_err());
        assert!(creds("alice", "pw").validate_login().is_ok());
    }
}
