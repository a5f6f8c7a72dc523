use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use super::error::DomainError;

const USERNAME_MAX_CHARS: usize = 150;
const PASSWORD_MIN_CHARS: usize = 8;
const PASSWORD_MAX_CHARS: usize = 128;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RegisterRequest {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password: String,
    pub(crate) password_confirmation: String,
}

impl RegisterRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let username = normalize_username(&self.username)?;
        let email = normalize_email(&self.email)?;
        validate_password(&self.password)?;
        if self.password != self.password_confirmation {
            return Err(DomainError::Validation {
                field: "password2",
                message: "the two password fields didn't match",
            });
        }
        Ok(Self {
            username,
            email,
            password: self.password,
            password_confirmation: self.password_confirmation,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) username: String,
    pub(crate) password: String,
}

impl LoginRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let username = self.username.trim();
        if username.is_empty() || username.chars().count() > USERNAME_MAX_CHARS {
            return Err(DomainError::Validation {
                field: "username",
                message: "must be 1..150 chars",
            });
        }

        if self.password.is_empty() {
            return Err(DomainError::Validation {
                field: "password",
                message: "must not be empty",
            });
        }
        Ok(Self {
            username: username.to_string(),
            password: self.password,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct User {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) created_at: DateTime<Utc>,
}

impl User {
    pub(crate) fn new(
        id: i64,
        username: impl Into<String>,
        email: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if id <= 0 {
            return Err(DomainError::Validation {
                field: "id",
                message: "must be > 0",
            });
        }
        let username = normalize_username(&username.into())?;
        let email = normalize_email(&email.into())?;

        Ok(Self {
            id,
            username,
            email,
            created_at,
        })
    }
}

fn normalize_username(username: &str) -> Result<String, DomainError> {
    let username = username.trim();
    let len = username.chars().count();
    if len == 0 || len > USERNAME_MAX_CHARS {
        return Err(DomainError::Validation {
            field: "username",
            message: "must be 1..150 chars",
        });
    }
    if !username
        .chars()
        .all(|ch| ch.is_alphanumeric() || matches!(ch, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(DomainError::Validation {
            field: "username",
            message: "may contain only letters, digits and @/./+/-/_",
        });
    }
    Ok(username.to_string())
}

fn normalize_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim().to_lowercase();
    if !email.validate_email() {
        return Err(DomainError::Validation {
            field: "email",
            message: "must be a valid email",
        });
    }
    Ok(email)
}

fn validate_password(password: &str) -> Result<(), DomainError> {
    let len = password.chars().count();
    if !(PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&len) {
        return Err(DomainError::Validation {
            field: "password1",
            message: "must be 8..128 chars",
        });
    }
    if password.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(DomainError::Validation {
            field: "password1",
            message: "must not be entirely numeric",
        });
    }
    Ok(())
}
