use axum::Router;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::infrastructure::settings::Settings;
use crate::presentation::middleware::cors::apply_cors;
use crate::presentation::middleware::limits::apply_limits;
use crate::presentation::middleware::trace::apply_trace;
use crate::presentation::http::openapi::ApiDoc;
use crate::presentation::{self, AppState};

pub(crate) async fn run_http(settings: &Settings, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state, &settings.static_dir);
    let app = apply_limits(app, settings);
    let app = apply_trace(app);
    let app = apply_cors(app, &settings.cors_origins)?;

    let listener = TcpListener::bind(&settings.http_addr).await?;

    info!("HTTP server listening on {}", settings.http_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server stopped");
    Ok(())
}

pub(crate) fn build_router(state: AppState, static_dir: &str) -> Router {
    presentation::routes(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest_service("/static", ServeDir::new(static_dir))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
