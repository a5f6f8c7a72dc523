use std::time::Duration;

use axum::{Router, error_handling::HandleErrorLayer, http::StatusCode};
use tower::{BoxError, ServiceBuilder, limit::GlobalConcurrencyLimitLayer, timeout::TimeoutLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::warn;

use crate::infrastructure::settings::Settings;

/// Body size cap, global in-flight limit and per-request deadline.
pub(crate) fn apply_limits(router: Router, settings: &Settings) -> Router {
    router
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_overload))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    settings.http_request_timeout_secs,
                )))
                .layer(GlobalConcurrencyLimitLayer::new(
                    settings.http_concurrency_limit,
                )),
        )
        .layer(RequestBodyLimitLayer::new(
            settings.http_request_body_limit_bytes,
        ))
}

async fn handle_overload(err: BoxError) -> (StatusCode, &'static str) {
    if err.is::<tower::timeout::error::Elapsed>() {
        warn!("request timed out");
        (StatusCode::REQUEST_TIMEOUT, "request timed out")
    } else {
        warn!(error = %err, "request failed in middleware");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error")
    }
}
