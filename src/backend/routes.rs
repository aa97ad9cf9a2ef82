use axum::{
    routing::{get, post},
    Router,
};
use crate::backend::{handlers, AppState};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/departments", get(handlers::list_departments))
        .route("/api/departments/:department_id", get(handlers::get_department))
        .route("/api/projects", get(handlers::list_projects))
        .route("/api/projects/:project_id", get(handlers::get_project))
        .route(
            "/api/forecasts",
            get(handlers::list_forecasts).post(handlers::create_forecast),
        )
        .route(
            "/api/forecasts/:forecast_id",
            get(handlers::get_forecast)
                .put(handlers::update_forecast)
                .delete(handlers::delete_forecast),
        )
        .route(
            "/api/snapshots",
            get(handlers::list_snapshots).post(handlers::create_snapshot),
        )
        .route("/api/snapshots/bulk", post(handlers::create_bulk_snapshots))
        .route(
            "/api/snapshots/:snapshot_id",
            get(handlers::get_snapshot).delete(handlers::delete_snapshot),
        )
        .route("/api/snapshots/:snapshot_id/approve", post(handlers::approve_snapshot))
}
