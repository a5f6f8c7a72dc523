use serde::{Deserialize, Serialize};
use validator::Validate;

/// Sign-up form. Passwords are never echoed back into the page.
#[derive(Debug, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub(crate) struct RegisterForm {
    #[validate(length(min = 1, max = 150, message = "required; 150 characters or fewer"))]
    pub(crate) username: String,
    #[validate(email(message = "enter a valid email address"))]
    pub(crate) email: String,
    #[serde(skip_serializing)]
    #[validate(length(min = 8, max = 128, message = "must contain at least 8 characters"))]
    pub(crate) password1: String,
    #[serde(skip_serializing)]
    #[validate(must_match(other = "password1", message = "the two password fields didn't match"))]
    pub(crate) password2: String,
}

#[derive(Debug, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub(crate) struct LoginForm {
    #[validate(length(min = 1, message = "this field is required"))]
    pub(crate) username: String,
    #[serde(skip_serializing)]
    #[validate(length(min = 1, message = "this field is required"))]
    pub(crate) password: String,
    pub(crate) next: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub(crate) struct PostForm {
    #[validate(length(min = 1, max = 200, message = "required; 200 characters or fewer"))]
    pub(crate) title: String,
    #[validate(length(min = 1, message = "this field is required"))]
    pub(crate) content: String,
}

#[derive(Debug, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub(crate) struct CommentForm {
    #[validate(length(min = 1, message = "this field is required"))]
    pub(crate) content: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PageQuery {
    pub(crate) page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NextQuery {
    pub(crate) next: Option<String>,
}

/// Only same-site absolute paths are followed after login.
pub(crate) fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}
