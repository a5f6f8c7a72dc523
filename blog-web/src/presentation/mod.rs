use std::sync::Arc;

use anyhow::Context;
use axum::{Router, middleware::from_fn_with_state};
use sqlx::PgPool;
use tera::Tera;
use tower_cookies::CookieManagerLayer;

use crate::application::auth_service::AuthService;
use crate::application::blog_service::{BlogService, EditPolicy};
use crate::data::comment_repository::CommentRepository;
use crate::data::post_repository::PostRepository;
use crate::data::repositories::postgres::comment_repository::PostgresCommentRepository;
use crate::data::repositories::postgres::post_repository::PostgresPostRepository;
use crate::data::repositories::postgres::user_repository::PostgresUserRepository;
use crate::data::user_repository::UserRepository;
use crate::infrastructure::jwt::JwtService;
use crate::infrastructure::settings::Settings;

pub(crate) mod field_errors;
pub(crate) mod http;
pub(crate) mod middleware;
pub(crate) mod session;
pub(crate) mod web;

pub(crate) type SharedUserRepository = Arc<dyn UserRepository>;
pub(crate) type SharedPostRepository = Arc<dyn PostRepository>;
pub(crate) type SharedCommentRepository = Arc<dyn CommentRepository>;

pub(crate) type AppAuthService = AuthService<SharedUserRepository>;
pub(crate) type AppBlogService =
    BlogService<SharedPostRepository, SharedCommentRepository, SharedUserRepository>;

#[derive(Debug, Clone, Copy)]
pub(crate) struct AppConfig {
    pub(crate) posts_per_page: u32,
    pub(crate) api_edit_policy: EditPolicy,
    pub(crate) session_cookie_secure: bool,
}

impl AppConfig {
    pub(crate) fn from_settings(settings: &Settings) -> Self {
        Self {
            posts_per_page: settings.posts_per_page,
            api_edit_policy: if settings.api_enforce_ownership {
                EditPolicy::AuthorOnly
            } else {
                EditPolicy::AnyAuthenticated
            },
            session_cookie_secure: settings.session_cookie_secure,
        }
    }
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) auth_service: Arc<AppAuthService>,
    pub(crate) blog_service: Arc<AppBlogService>,
    pub(crate) jwt: Arc<JwtService>,
    pub(crate) templates: Arc<Tera>,
    pub(crate) config: AppConfig,
}

impl AppState {
    pub(crate) fn new(
        users: SharedUserRepository,
        posts: SharedPostRepository,
        comments: SharedCommentRepository,
        jwt: JwtService,
        templates: Tera,
        config: AppConfig,
    ) -> Self {
        Self {
            auth_service: Arc::new(AuthService::new(users.clone(), jwt.clone())),
            blog_service: Arc::new(BlogService::new(posts, comments, users)),
            jwt: Arc::new(jwt),
            templates: Arc::new(templates),
            config,
        }
    }

    pub(crate) fn postgres(pool: PgPool, settings: &Settings) -> anyhow::Result<Self> {
        let templates = web::render::load_templates(&settings.templates_dir)
            .with_context(|| format!("failed to load templates from {}", settings.templates_dir))?;

        Ok(Self::new(
            Arc::new(PostgresUserRepository::new(pool.clone())),
            Arc::new(PostgresPostRepository::new(pool.clone())),
            Arc::new(PostgresCommentRepository::new(pool)),
            JwtService::new(&settings.jwt_secret, settings.jwt_ttl_seconds),
            templates,
            AppConfig::from_settings(settings),
        ))
    }
}

/// Web pages and the JSON API share one router; every request passes through
/// session resolution first.
pub(crate) fn routes(state: AppState) -> Router {
    Router::new()
        .merge(web::routes::router())
        .merge(http::routes::router())
        .layer(from_fn_with_state(state.clone(), session::session_middleware))
        .layer(CookieManagerLayer::new())
        .with_state(state)
}
