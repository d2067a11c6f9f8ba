//! Stylist Web Server
//!
//! Axum-based server for the fashion report page, report download and
//! session handling.

pub mod markdown;
pub mod page;
pub mod routes;
pub mod session;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use stylist_core::{RemoteBackends, Settings};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Largest accepted request body; photos arrive inline in the form post.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::page::index))
        .route("/credentials", post(routes::credentials::update))
        .route("/generate", post(routes::generate::generate))
        .route("/report/download", get(routes::report::download))
        .route("/report/image", get(routes::report::image))
        .route("/session/end", post(routes::session::end))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::ensure_session,
        ))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the web server.
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let backends = Arc::new(RemoteBackends::new(
        settings.models.clone(),
        settings.search.clone(),
    ));
    let state = AppState::new(&settings, backends)?;
    let sweeper = state
        .sessions
        .spawn_sweeper(Duration::from_secs(settings.session.sweep_interval_secs));

    let app = create_router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Web server listening on http://{}", addr);

    let served = axum::serve(listener, app).await;
    sweeper.abort();
    served?;
    Ok(())
}
