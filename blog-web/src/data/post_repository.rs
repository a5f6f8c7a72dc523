use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::post::Post;

#[derive(Debug, Clone)]
pub(crate) struct NewPost {
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) author_id: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct PostPatch {
    pub(crate) title: String,
    pub(crate) content: String,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Pagination {
    pub(crate) page: u32,
    pub(crate) page_size: u32,
}

impl Pagination {
    pub(crate) fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub(crate) fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * self.limit()
    }
}

/// Listing methods return posts newest first.
#[async_trait]
pub(crate) trait PostRepository: Send + Sync {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError>;
    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError>;
    async fn update_post(&self, id: i64, patch: PostPatch) -> Result<Option<Post>, DomainError>;
    /// Deletes the post and all of its comments.
    async fn delete_post(&self, id: i64) -> Result<bool, DomainError>;
    async fn list_posts(&self, pagination: Pagination) -> Result<Vec<Post>, DomainError>;
    async fn list_all_posts(&self) -> Result<Vec<Post>, DomainError>;
    async fn list_posts_by_author(&self, author_id: i64) -> Result<Vec<Post>, DomainError>;
    async fn total_posts(&self) -> Result<i64, DomainError>;
}

#[async_trait]
impl<T: PostRepository + ?Sized> PostRepository for Arc<T> {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        (**self).create_post(input).await
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        (**self).get_post(id).await
    }

    async fn update_post(&self, id: i64, patch: PostPatch) -> Result<Option<Post>, DomainError> {
        (**self).update_post(id, patch).await
    }

    async fn delete_post(&self, id: i64) -> Result<bool, DomainError> {
        (**self).delete_post(id).await
    }

    async fn list_posts(&self, pagination: Pagination) -> Result<Vec<Post>, DomainError> {
        (**self).list_posts(pagination).await
    }

    async fn list_all_posts(&self) -> Result<Vec<Post>, DomainError> {
        (**self).list_all_posts().await
    }

    async fn list_posts_by_author(&self, author_id: i64) -> Result<Vec<Post>, DomainError> {
        (**self).list_posts_by_author(author_id).await
    }

    async fn total_posts(&self) -> Result<i64, DomainError> {
        (**self).total_posts().await
    }
}
