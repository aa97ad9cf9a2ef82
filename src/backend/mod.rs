mod handlers;
mod routes;

use axum::{
    http::HeaderValue,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use sqlx::{Pool, Sqlite};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    /// Recorded as creator/submitter when a request names nobody.
    pub default_user: String,
}

impl AppState {
    pub fn new(db: Pool<Sqlite>, config: &AppConfig) -> Self {
        Self { db, default_user: config.default_user.clone() }
    }
}

/// Build the full router (separated from `run_server` for testing).
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(routes::api_routes())
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(pool: Pool<Sqlite>, config: &AppConfig) -> anyhow::Result<()> {
    let state = AppState::new(pool, config);
    let app = router(state, &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "forecast API listening");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Spending Forecast Tracker API" }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
