use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::comment::CommentDetails;
use super::error::DomainError;
use super::user::User;

pub(crate) const TITLE_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct Post {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) author_id: i64,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CreatePostRequest {
    pub(crate) title: String,
    pub(crate) content: String,
}

impl CreatePostRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            title: normalize_title(&self.title)?,
            content: normalize_content(&self.content)?,
        })
    }
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct UpdatePostRequest {
    pub(crate) title: Option<String>,
    pub(crate) content: Option<String>,
}

impl UpdatePostRequest {
    pub(crate) fn replace(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: Some(content.into()),
        }
    }

    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            title: self.title.as_deref().map(normalize_title).transpose()?,
            content: self.content.as_deref().map(normalize_content).transpose()?,
        })
    }
}

impl Post {
    pub(crate) fn new(
        id: i64,
        title: impl Into<String>,
        content: impl Into<String>,
        author_id: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        validate_positive_i64("id", id)?;
        validate_positive_i64("author_id", author_id)?;
        let title = normalize_title(&title.into())?;
        let content = normalize_content(&content.into())?;

        if updated_at < created_at {
            return Err(DomainError::Validation {
                field: "updated_at",
                message: "must be >= created_at",
            });
        }

        Ok(Self {
            id,
            title,
            content,
            author_id,
            created_at,
            updated_at,
        })
    }

    pub(crate) fn is_authored_by(&self, user_id: i64) -> bool {
        self.author_id == user_id
    }
}

/// A post joined with its author and its comments in chronological order.
#[derive(Debug, Clone)]
pub(crate) struct PostDetails {
    pub(crate) post: Post,
    pub(crate) author: User,
    pub(crate) comments: Vec<CommentDetails>,
}

impl PostDetails {
    pub(crate) fn comments_count(&self) -> usize {
        self.comments.len()
    }
}

fn validate_positive_i64(field: &'static str, value: i64) -> Result<(), DomainError> {
    if value <= 0 {
        return Err(DomainError::Validation {
            field,
            message: "must be > 0",
        });
    }
    Ok(())
}

fn normalize_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > TITLE_MAX_CHARS {
        return Err(DomainError::Validation {
            field: "title",
            message: "must be 1..200 chars",
        });
    }
    Ok(title.to_string())
}

fn normalize_content(content: &str) -> Result<String, DomainError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(DomainError::Validation {
            field: "content",
            message: "must not be empty",
        });
    }
    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{CreatePostRequest, DomainError, Post, UpdatePostRequest};

    #[test]
    fn create_post_request_validate_rejects_empty_title() {
        let req = CreatePostRequest {
            title: "   ".to_string(),
            content: "valid content".to_string(),
        };

        let err = req.validate().expect_err("title must be rejected");
        assert_validation_field(err, "title");
    }

    #[test]
    fn create_post_request_validate_rejects_long_title() {
        let req = CreatePostRequest {
            title: "t".repeat(201),
            content: "valid content".to_string(),
        };

        let err = req.validate().expect_err("title must be rejected");
        assert_validation_field(err, "title");
    }

    #[test]
    fn update_post_request_validate_rejects_empty_content() {
        let req = UpdatePostRequest::replace("valid title", "   ");

        let err = req.validate().expect_err("content must be rejected");
        assert_validation_field(err, "content");
    }

    #[test]
    fn update_post_request_keeps_missing_fields_untouched() {
        let req = UpdatePostRequest {
            title: Some("  new title ".to_string()),
            content: None,
        };

        let validated = req.validate().expect("must validate");
        assert_eq!(validated.title.as_deref(), Some("new title"));
        assert!(validated.content.is_none());
    }

    #[test]
    fn post_new_normalizes_and_builds_post() {
        let created_at = Utc::now();
        let updated_at = created_at + Duration::seconds(1);

        let post = Post::new(1, "  Title  ", "  Content  ", 10, created_at, updated_at)
            .expect("post should be created");

        assert_eq!(post.title, "Title");
        assert_eq!(post.content, "Content");
        assert!(post.is_authored_by(10));
        assert!(!post.is_authored_by(11));
    }

    #[test]
    fn post_new_rejects_updated_before_created() {
        let updated_at = Utc::now();
        let created_at = updated_at + Duration::seconds(1);

        let err = Post::new(1, "Title", "Content", 10, created_at, updated_at)
            .expect_err("updated_at < created_at must fail");
        assert_validation_field(err, "updated_at");
    }

    fn assert_validation_field(err: DomainError, expected_field: &'static str) {
        match err {
            DomainError::Validation { field, .. } => assert_eq!(field, expected_field),
            _ => panic!("expected DomainError::Validation"),
        }
    }
}
