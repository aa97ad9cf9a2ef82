#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::{Pool, Sqlite};
use tower::ServiceExt;

use spending_forecast_tracker::backend::{self, AppState};
use spending_forecast_tracker::cli;
use spending_forecast_tracker::database::db::{connection, migrate};

pub const TEST_USER: &str = "test-user";

/// Router over a migrated and seeded in-memory database.
pub async fn test_app() -> Router {
    test_app_with_pool().await.0
}

/// Same as `test_app`, also handing back the pool for direct SQL.
pub async fn test_app_with_pool() -> (Router, Pool<Sqlite>) {
    let db = connection::memory_pool().await.unwrap();
    migrate::run_migrations(&db).await.unwrap();
    cli::seed(&db).await.unwrap();

    let state = AppState { db: db.clone(), default_user: TEST_USER.to_string() };
    (backend::router(state, &[]), db)
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Seeded project 1 belongs to department 1; monthly amounts sum to 1800.
pub fn forecast_body(department_id: i64, project_id: i64, year: i32) -> Value {
    json!({
        "department_id": department_id,
        "project_id": project_id,
        "year": year,
        "project_name": "Plattform Oppgradering",
        "profit_center": "PC-100",
        "wbs": "WBS-1",
        "account": "6000",
        "jan": 100, "feb": 150, "mar": 200, "apr": 180,
        "may": 160, "jun": 140, "jul": 120, "aug": 130,
        "sep": 140, "oct": 150, "nov": 160, "dec": 170
    })
}

pub fn amount(json: &Value, field: &str) -> f64 {
    json[field].as_f64().unwrap()
}
