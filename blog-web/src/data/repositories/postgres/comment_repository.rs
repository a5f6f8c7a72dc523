use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::data::comment_repository::{CommentRepository, NewComment};
use crate::domain::comment::Comment;
use crate::domain::error::DomainError;

const COMMENT_COLUMNS: &str = "id, post_id, author_id, content, created_at";

#[derive(Debug, Clone)]
pub(crate) struct PostgresCommentRepository {
    pool: PgPool,
}

impl PostgresCommentRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    post_id: i64,
    author_id: i64,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            author_id: row.author_id,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create_comment(&self, input: NewComment) -> Result<Comment, DomainError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            r#"
            INSERT INTO comments (post_id, author_id, content)
            VALUES ($1, $2, $3)
            RETURNING {COMMENT_COLUMNS}
            "#
        ))
        .bind(input.post_id)
        .bind(input.author_id)
        .bind(&input.content)
        .fetch_one(&self.pool)
        .await
        .map_err(map_comment_db_error)?;

        Ok(row.into())
    }

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>, DomainError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_comment_db_error)?;

        Ok(row.map(Comment::from))
    }

    async fn delete_comment(&self, id: i64) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_comment_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, DomainError> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments
            WHERE post_id = $1
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_comment_db_error)?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn list_for_posts(&self, post_ids: &[i64]) -> Result<Vec<Comment>, DomainError> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments
            WHERE post_id = ANY($1)
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_comment_db_error)?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }
}

fn map_comment_db_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.code().as_deref() == Some("23503")
    {
        let resource = match db_err.constraint() {
            Some("comments_post_id_fkey") => "post",
            Some("comments_author_id_fkey") => "author",
            _ => "comment reference",
        };
        return DomainError::NotFound(resource.to_string());
    }
    DomainError::Unexpected(err.to_string())
}
