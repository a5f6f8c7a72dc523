use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::user::User;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct Comment {
    pub(crate) id: i64,
    pub(crate) post_id: i64,
    pub(crate) author_id: i64,
    pub(crate) content: String,
    pub(crate) created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CreateCommentRequest {
    pub(crate) content: String,
}

impl CreateCommentRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let content = self.content.trim();
        if content.is_empty() {
            return Err(DomainError::Validation {
                field: "content",
                message: "must not be empty",
            });
        }
        Ok(Self {
            content: content.to_string(),
        })
    }
}

impl Comment {
    /// The comment author and the author of the commented post may both delete it.
    pub(crate) fn can_be_deleted_by(&self, user_id: i64, post_author_id: i64) -> bool {
        self.author_id == user_id || post_author_id == user_id
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CommentDetails {
    pub(crate) comment: Comment,
    pub(crate) author: User,
}
