use axum::{Json, Router, routing::get};
use tower_http::trace::TraceLayer;

use super::{handlers::dispatch, state::AppState};
use crate::{Result, config::Config};

/// Path of the proxy's own liveness probe; everything else goes to the backend.
pub const HEALTH_PATH: &str = "/astrm/health";

/// Create the application router.
pub fn create_router(config: &Config) -> Result<Router> {
    let state = AppState::new(config)?;

    let app = Router::new()
        .route(HEALTH_PATH, get(health_check))
        .fallback(dispatch)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
