use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::presentation::field_errors::FieldErrors;
use crate::presentation::http::app_error::ErrorBody;
use crate::presentation::http::handlers::auth::{AuthResponseDto, LoginDto, RegisterDto, UserDto};
use crate::presentation::http::handlers::comments::{CommentDto, CreateCommentDto};
use crate::presentation::http::handlers::health::HealthzResponse;
use crate::presentation::http::handlers::posts::{
    CreatePostDto, PatchPostDto, PostDto, UpdatePostDto,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::http::handlers::health::healthz,
        crate::presentation::http::handlers::auth::register,
        crate::presentation::http::handlers::auth::login,
        crate::presentation::http::handlers::posts::list_posts,
        crate::presentation::http::handlers::posts::get_post,
        crate::presentation::http::handlers::posts::create_post,
        crate::presentation::http::handlers::posts::update_post,
        crate::presentation::http::handlers::posts::patch_post,
        crate::presentation::http::handlers::posts::delete_post,
        crate::presentation::http::handlers::comments::list_comments,
        crate::presentation::http::handlers::comments::create_comment
    ),
    components(
        schemas(
            HealthzResponse,
            RegisterDto,
            LoginDto,
            AuthResponseDto,
            UserDto,
            CreatePostDto,
            UpdatePostDto,
            PatchPostDto,
            PostDto,
            CreateCommentDto,
            CommentDto,
            ErrorBody,
            FieldErrors
        )
    ),
    tags(
        (name = "health", description = "Liveness probe"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "posts", description = "Post endpoints"),
        (name = "comments", description = "Comment endpoints")
    ),
    modifiers(&SecurityAddon)
)]
pub(crate) struct ApiDoc;

pub(crate) struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut components = openapi.components.take().unwrap_or_default();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        openapi.components = Some(components);
    }
}
