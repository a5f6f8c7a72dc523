use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::user::{LoginRequest, RegisterRequest, User};
use crate::presentation::AppState;
use crate::presentation::http::app_error::{AppResult, ErrorBody};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct RegisterDto {
    #[serde(default)]
    #[validate(length(min = 1, max = 150, message = "must be 1..150 chars"))]
    pub(crate) username: String,
    #[serde(default)]
    #[validate(email(message = "enter a valid email address"))]
    pub(crate) email: String,
    #[serde(default)]
    #[validate(length(min = 8, max = 128, message = "must be 8..128 chars"))]
    pub(crate) password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct LoginDto {
    #[serde(default)]
    #[validate(length(min = 1, max = 150, message = "must be 1..150 chars"))]
    pub(crate) username: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "this field is required"))]
    pub(crate) password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct AuthResponseDto {
    pub(crate) access_token: String,
    pub(crate) user: UserDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct UserDto {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) date_joined: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            date_joined: user.created_at,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterDto,
    responses(
        (status = 201, description = "Registered successfully", body = AuthResponseDto),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 409, description = "User already exists", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterDto>, JsonRejection>,
) -> AppResult<(StatusCode, Json<AuthResponseDto>)> {
    let Json(dto) = payload?;
    dto.validate()?;

    let req = RegisterRequest {
        username: dto.username,
        email: dto.email,
        password_confirmation: dto.password.clone(),
        password: dto.password,
    };

    let result = state.auth_service.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponseDto {
            access_token: result.access_token,
            user: result.user.into(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginDto,
    responses(
        (status = 200, description = "Login successful", body = AuthResponseDto),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginDto>, JsonRejection>,
) -> AppResult<(StatusCode, Json<AuthResponseDto>)> {
    let Json(dto) = payload?;
    dto.validate()?;

    let req = LoginRequest {
        username: dto.username,
        password: dto.password,
    };

    let result = state.auth_service.login(req).await?;

    Ok((
        StatusCode::OK,
        Json(AuthResponseDto {
            access_token: result.access_token,
            user: result.user.into(),
        }),
    ))
}
