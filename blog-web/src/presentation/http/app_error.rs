use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::domain::error::DomainError;
use crate::presentation::field_errors::FieldErrors;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

pub(crate) type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ErrorBody {
    pub(crate) error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) fields: Option<FieldErrors>,
}

impl ErrorBody {
    fn plain(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            fields: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Domain(err) => {
                let status = match &err {
                    DomainError::Validation { .. } => StatusCode::BAD_REQUEST,
                    DomainError::AlreadyExists(_) => StatusCode::CONFLICT,
                    DomainError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                    DomainError::NotFound(_) => StatusCode::NOT_FOUND,
                    DomainError::Forbidden => StatusCode::FORBIDDEN,
                    DomainError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let body = if status == StatusCode::INTERNAL_SERVER_ERROR {
                    error!(error = %err, "request failed");
                    ErrorBody::plain("internal error")
                } else {
                    ErrorBody {
                        error: err.to_string(),
                        fields: FieldErrors::from_domain(&err),
                    }
                };
                (status, body)
            }
            AppError::Validation(err) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "validation failed".to_string(),
                    fields: Some(FieldErrors::from(&err)),
                },
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorBody::plain(msg)),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, ErrorBody::plain("unauthorized")),
            AppError::Internal(err) => {
                error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::plain("internal error"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
