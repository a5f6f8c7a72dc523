use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::domain::error::DomainError;

const NOT_FOUND_PAGE: &str = "<!DOCTYPE html><html><head><title>Not found</title>\
<link rel=\"stylesheet\" href=\"/static/css/style.css\"></head><body><main class=\"container\">\
<h1>Not found</h1><p>The requested page does not exist.</p><p><a href=\"/\">Back to all posts</a></p>\
</main></body></html>";

const SERVER_ERROR_PAGE: &str = "<!DOCTYPE html><html><head><title>Server error</title></head>\
<body><h1>Server error</h1><p>Something went wrong. Please try again later.</p></body></html>";

#[derive(Debug, Error)]
pub(crate) enum PageError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),
}

pub(crate) type PageResult<T> = Result<T, PageError>;

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::Domain(DomainError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE)).into_response()
            }
            PageError::Domain(err) => {
                error!(error = %err, "page request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Html(SERVER_ERROR_PAGE)).into_response()
            }
            PageError::Template(err) => {
                error!(error = ?err, "template rendering failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Html(SERVER_ERROR_PAGE)).into_response()
            }
        }
    }
}
