//! JSON HTTP API for browsing and adding to the repertoire catalog.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

mod error;
mod routes;
mod state;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use repertoire_core::Database;

pub use error::ApiError;
pub use routes::{Health, RecordingSummary};
pub use state::AppState;

/// Build the API router.
pub fn make_app(state: AppState) -> Router {
    let api_routes: Router = Router::new()
        .route(
            "/recordings",
            get(routes::list_recordings).post(routes::create_recording),
        )
        .route("/recordings/{id}", get(routes::get_recording))
        .route("/stats", get(routes::get_stats))
        .with_state(state);

    Router::new()
        .route("/health", get(routes::health))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve the API on `host:port` until the process is stopped.
pub async fn serve(db: Database, host: &str, port: u16) -> std::io::Result<()> {
    let app = make_app(AppState::new(db));
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await
}
