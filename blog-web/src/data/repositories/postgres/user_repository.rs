use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use crate::data::user_repository::{NewUser, UserCredentials, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::user::User;

#[derive(Debug, Clone)]
pub(crate) struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_credentials_by(
        &self,
        column: &'static str,
        value: &str,
    ) -> Result<Option<UserCredentials>, DomainError> {
        let row = sqlx::query_as::<_, UserCredentialsRow>(&format!(
            r#"
            SELECT
            id,
            username,
            email,
            password_hash,
            created_at
            FROM users
            WHERE {column} = $1
            "#
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_user_db_error)?;

        let Some(r) = row else {
            return Ok(None);
        };
        let user = User::new(r.id, r.username, r.email, r.created_at)
            .map_err(|err| DomainError::Unexpected(err.to_string()))?;

        Ok(Some(UserCredentials {
            user,
            password_hash: r.password_hash,
        }))
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserCredentialsRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, created_at
            "#,
        )
        .bind(&input.username)
        .bind(&input.email)
        .bind(&input.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_user_db_error)?;

        map_row_to_user(row)
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, DomainError> {
        self.find_credentials_by("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, DomainError> {
        self.find_credentials_by("email", email).await
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<User>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, created_at
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_user_db_error)?;

        rows.into_iter().map(map_row_to_user).collect()
    }

    async fn delete_user(&self, id: i64) -> Result<bool, DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_user_db_error)?;

        let comments = sqlx::query(
            r#"
            DELETE FROM comments
            WHERE author_id = $1
               OR post_id IN (SELECT id FROM posts WHERE author_id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(map_user_db_error)?;

        let posts = sqlx::query(
            r#"
            DELETE FROM posts
            WHERE author_id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(map_user_db_error)?;

        let users = sqlx::query(
            r#"
            DELETE FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(map_user_db_error)?;

        tx.commit().await.map_err(map_user_db_error)?;

        debug!(
            user_id = id,
            posts_removed = posts.rows_affected(),
            comments_removed = comments.rows_affected(),
            "user delete cascaded"
        );
        Ok(users.rows_affected() > 0)
    }
}

fn map_row_to_user(row: UserRow) -> Result<User, DomainError> {
    User::new(row.id, row.username, row.email, row.created_at)
        .map_err(|err| DomainError::Unexpected(err.to_string()))
}

fn map_user_db_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.code().as_deref() == Some("23505")
    {
        let resource = match db_err.constraint() {
            Some("users_username_key") => "username",
            Some("users_email_key") => "email",
            _ => "user",
        };
        return DomainError::AlreadyExists(resource);
    }
    DomainError::Unexpected(err.to_string())
}
