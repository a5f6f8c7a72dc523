use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use crate::data::post_repository::{NewPost, Pagination, PostPatch, PostRepository};
use crate::domain::error::DomainError;
use crate::domain::post::Post;

const POST_COLUMNS: &str = "id, title, content, author_id, created_at, updated_at";

#[derive(Debug, Clone)]
pub(crate) struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    content: String,
    author_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            INSERT INTO posts (title, content, author_id)
            VALUES ($1, $2, $3)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        map_row_to_post(row)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        row.map(map_row_to_post).transpose()
    }

    async fn update_post(&self, id: i64, patch: PostPatch) -> Result<Option<Post>, DomainError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            UPDATE posts
            SET title = $2,
                content = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.content)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        row.map(map_row_to_post).transpose()
    }

    async fn delete_post(&self, id: i64) -> Result<bool, DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_post_db_error)?;

        let comments = sqlx::query(
            r#"
            DELETE FROM comments
            WHERE post_id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(map_post_db_error)?;

        let posts = sqlx::query(
            r#"
            DELETE FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(map_post_db_error)?;

        tx.commit().await.map_err(map_post_db_error)?;

        debug!(
            post_id = id,
            comments_removed = comments.rows_affected(),
            "post delete cascaded"
        );
        Ok(posts.rows_affected() > 0)
    }

    async fn list_posts(&self, pagination: Pagination) -> Result<Vec<Post>, DomainError> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            OFFSET $2
            "#
        ))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        rows.into_iter().map(map_row_to_post).collect()
    }

    async fn list_all_posts(&self) -> Result<Vec<Post>, DomainError> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        rows.into_iter().map(map_row_to_post).collect()
    }

    async fn list_posts_by_author(&self, author_id: i64) -> Result<Vec<Post>, DomainError> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE author_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        rows.into_iter().map(map_row_to_post).collect()
    }

    async fn total_posts(&self) -> Result<i64, DomainError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM posts
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        Ok(count)
    }
}

fn map_row_to_post(row: PostRow) -> Result<Post, DomainError> {
    Post::new(
        row.id,
        row.title,
        row.content,
        row.author_id,
        row.created_at,
        row.updated_at,
    )
    .map_err(|err| DomainError::Unexpected(err.to_string()))
}

fn map_post_db_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.code().as_deref() == Some("23503")
    {
        return DomainError::NotFound("author".to_string());
    }
    DomainError::Unexpected(err.to_string())
}
