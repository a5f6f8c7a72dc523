//! In-process storage with the same ordering and cascade rules as the
//! PostgreSQL repositories. Used by service and router tests.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::data::comment_repository::{CommentRepository, NewComment};
use crate::data::post_repository::{NewPost, Pagination, PostPatch, PostRepository};
use crate::data::user_repository::{NewUser, UserCredentials, UserRepository};
use crate::domain::comment::Comment;
use crate::domain::error::DomainError;
use crate::domain::post::Post;
use crate::domain::user::User;

#[derive(Default)]
struct Tables {
    users: Vec<UserCredentials>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub(crate) struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store mutex poisoned")
    }

    /// Inserts a post with an explicit creation time.
    pub(crate) fn insert_post_at(
        &self,
        author_id: i64,
        title: &str,
        created_at: DateTime<Utc>,
    ) -> Post {
        let mut tables = self.lock();
        let post = Post {
            id: tables.next_id(),
            title: title.to_string(),
            content: format!("{title} body"),
            author_id,
            created_at,
            updated_at: created_at,
        };
        tables.posts.push(post.clone());
        post
    }

    pub(crate) fn insert_comment_at(
        &self,
        post_id: i64,
        author_id: i64,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> Comment {
        let mut tables = self.lock();
        let comment = Comment {
            id: tables.next_id(),
            post_id,
            author_id,
            content: content.to_string(),
            created_at,
        };
        tables.comments.push(comment.clone());
        comment
    }

    pub(crate) fn comment_count(&self) -> usize {
        self.lock().comments.len()
    }

    pub(crate) fn post_count(&self) -> usize {
        self.lock().posts.len()
    }
}

fn newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

fn oldest_first(comments: &mut [Comment]) {
    comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError> {
        let mut tables = self.lock();
        if tables.users.iter().any(|c| c.user.username == input.username) {
            return Err(DomainError::AlreadyExists("username"));
        }
        if tables.users.iter().any(|c| c.user.email == input.email) {
            return Err(DomainError::AlreadyExists("email"));
        }
        let id = tables.next_id();
        let user = User::new(id, input.username, input.email, Utc::now())?;
        tables.users.push(UserCredentials {
            user: user.clone(),
            password_hash: input.password_hash,
        });
        Ok(user)
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, DomainError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|c| c.user.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, DomainError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|c| c.user.email == email)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<User>, DomainError> {
        Ok(self
            .lock()
            .users
            .iter()
            .filter(|c| ids.contains(&c.user.id))
            .map(|c| c.user.clone())
            .collect())
    }

    async fn delete_user(&self, id: i64) -> Result<bool, DomainError> {
        let mut tables = self.lock();
        let owned_posts: Vec<i64> = tables
            .posts
            .iter()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        tables
            .comments
            .retain(|c| c.author_id != id && !owned_posts.contains(&c.post_id));
        tables.posts.retain(|p| p.author_id != id);
        let before = tables.users.len();
        tables.users.retain(|c| c.user.id != id);
        Ok(tables.users.len() < before)
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let mut tables = self.lock();
        if !tables.users.iter().any(|c| c.user.id == input.author_id) {
            return Err(DomainError::NotFound("author".to_string()));
        }
        let now = Utc::now();
        let post = Post {
            id: tables.next_id(),
            title: input.title,
            content: input.content,
            author_id: input.author_id,
            created_at: now,
            updated_at: now,
        };
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        Ok(self.lock().posts.iter().find(|p| p.id == id).cloned())
    }

    async fn update_post(&self, id: i64, patch: PostPatch) -> Result<Option<Post>, DomainError> {
        let mut tables = self.lock();
        let Some(post) = tables.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        post.title = patch.title;
        post.content = patch.content;
        post.updated_at = Utc::now().max(post.created_at);
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: i64) -> Result<bool, DomainError> {
        let mut tables = self.lock();
        tables.comments.retain(|c| c.post_id != id);
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        Ok(tables.posts.len() < before)
    }

    async fn list_posts(&self, pagination: Pagination) -> Result<Vec<Post>, DomainError> {
        let mut posts = self.lock().posts.clone();
        newest_first(&mut posts);
        Ok(posts
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .collect())
    }

    async fn list_all_posts(&self) -> Result<Vec<Post>, DomainError> {
        let mut posts = self.lock().posts.clone();
        newest_first(&mut posts);
        Ok(posts)
    }

    async fn list_posts_by_author(&self, author_id: i64) -> Result<Vec<Post>, DomainError> {
        let mut posts: Vec<Post> = self
            .lock()
            .posts
            .iter()
            .filter(|p| p.author_id == author_id)
            .cloned()
            .collect();
        newest_first(&mut posts);
        Ok(posts)
    }

    async fn total_posts(&self) -> Result<i64, DomainError> {
        Ok(self.lock().posts.len() as i64)
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create_comment(&self, input: NewComment) -> Result<Comment, DomainError> {
        let mut tables = self.lock();
        if !tables.posts.iter().any(|p| p.id == input.post_id) {
            return Err(DomainError::NotFound("post".to_string()));
        }
        let comment = Comment {
            id: tables.next_id(),
            post_id: input.post_id,
            author_id: input.author_id,
            content: input.content,
            created_at: Utc::now(),
        };
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>, DomainError> {
        Ok(self.lock().comments.iter().find(|c| c.id == id).cloned())
    }

    async fn delete_comment(&self, id: i64) -> Result<bool, DomainError> {
        let mut tables = self.lock();
        let before = tables.comments.len();
        tables.comments.retain(|c| c.id != id);
        Ok(tables.comments.len() < before)
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, DomainError> {
        self.list_for_posts(&[post_id]).await
    }

    async fn list_for_posts(&self, post_ids: &[i64]) -> Result<Vec<Comment>, DomainError> {
        let mut comments: Vec<Comment> = self
            .lock()
            .comments
            .iter()
            .filter(|c| post_ids.contains(&c.post_id))
            .cloned()
            .collect();
        oldest_first(&mut comments);
        Ok(comments)
    }
}
