use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::user::User;

#[derive(Debug, Clone)]
pub(crate) struct UserCredentials {
    pub(crate) user: User,
    pub(crate) password_hash: String,
}

#[derive(Debug, Clone)]
pub(crate) struct NewUser {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password_hash: String,
}

#[async_trait]
pub(crate) trait UserRepository: Send + Sync {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError>;
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, DomainError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, DomainError>;
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<User>, DomainError>;
    /// Removes the user together with their posts, the comments on those posts
    /// and every comment they wrote elsewhere.
    async fn delete_user(&self, id: i64) -> Result<bool, DomainError>;
}

#[async_trait]
impl<T: UserRepository + ?Sized> UserRepository for Arc<T> {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError> {
        (**self).create_user(input).await
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, DomainError> {
        (**self).find_by_username(username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, DomainError> {
        (**self).find_by_email(email).await
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<User>, DomainError> {
        (**self).find_by_ids(ids).await
    }

    async fn delete_user(&self, id: i64) -> Result<bool, DomainError> {
        (**self).delete_user(id).await
    }
}
