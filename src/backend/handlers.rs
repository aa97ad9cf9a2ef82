use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::debug;

use crate::backend::AppState;
use crate::database::db::queries;
use crate::database::models::{Department, Project};
use crate::error::{AppError, Result};
use crate::forecast::{ForecastId, ForecastInput, SnapshotView, YearlyForecast};

#[derive(Debug, Default, Deserialize)]
pub struct ProjectFilter {
    pub department_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ForecastFilter {
    pub department_id: Option<i64>,
    pub year: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateForecastParams {
    #[serde(default)]
    pub upsert: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SnapshotFilter {
    pub department_id: Option<i64>,
    pub batch_id: Option<String>,
}

// forecast_id stays a raw token so a malformed one maps to 400, not 422
#[derive(Debug, Deserialize)]
pub struct CreateSnapshot {
    pub forecast_id: String,
    pub submitted_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBulkSnapshots {
    pub department_id: i64,
    pub submitted_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApproveSnapshot {
    pub approved_by: String,
}

// blank names count as absent
fn actor_or_default(name: Option<String>, state: &AppState) -> String {
    name.filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| state.default_user.clone())
}

/*==========Reference data=========== */

pub async fn list_departments(State(state): State<AppState>) -> Result<Json<Vec<Department>>> {
    Ok(Json(queries::get_all_departments(&state.db).await?))
}

pub async fn get_department(
    State(state): State<AppState>,
    Path(department_id): Path<i64>,
) -> Result<Json<Department>> {
    queries::get_department_by_id(&state.db, department_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Department"))
}

pub async fn list_projects(
    State(state): State<AppState>,
    Query(filter): Query<ProjectFilter>,
) -> Result<Json<Vec<Project>>> {
    Ok(Json(queries::get_all_projects(&state.db, filter.department_id).await?))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> Result<Json<Project>> {
    queries::get_project_by_id(&state.db, project_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Project"))
}

/*==========Forecasts=========== */

pub async fn list_forecasts(
    State(state): State<AppState>,
    Query(filter): Query<ForecastFilter>,
) -> Result<Json<Vec<YearlyForecast>>> {
    let forecasts = queries::list_forecasts(&state.db, filter.department_id, filter.year).await?;
    debug!(count = forecasts.len(), "listed forecasts");
    Ok(Json(forecasts))
}

pub async fn get_forecast(
    State(state): State<AppState>,
    Path(forecast_id): Path<String>,
) -> Result<Json<YearlyForecast>> {
    let id = ForecastId::decode(&forecast_id)?;
    Ok(Json(queries::get_forecast(&state.db, id).await?))
}

pub async fn create_forecast(
    State(state): State<AppState>,
    Query(params): Query<CreateForecastParams>,
    Json(payload): Json<ForecastInput>,
) -> Result<(StatusCode, Json<YearlyForecast>)> {
    let year = payload
        .year
        .ok_or_else(|| AppError::Validation("year is required".to_string()))?;
    let created_by = actor_or_default(payload.created_by.clone(), &state);

    let forecast =
        queries::create_forecast(&state.db, &payload, year, &created_by, params.upsert).await?;
    Ok((StatusCode::CREATED, Json(forecast)))
}

pub async fn update_forecast(
    State(state): State<AppState>,
    Path(forecast_id): Path<String>,
    Json(payload): Json<ForecastInput>,
) -> Result<Json<YearlyForecast>> {
    let id = ForecastId::decode(&forecast_id)?;
    Ok(Json(queries::update_forecast(&state.db, id, &payload).await?))
}

pub async fn delete_forecast(
    State(state): State<AppState>,
    Path(forecast_id): Path<String>,
) -> Result<StatusCode> {
    let id = ForecastId::decode(&forecast_id)?;
    if !queries::delete_forecast(&state.db, id).await? {
        return Err(AppError::not_found("Forecast"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/*==========Snapshots=========== */

pub async fn list_snapshots(
    State(state): State<AppState>,
    Query(filter): Query<SnapshotFilter>,
) -> Result<Json<Vec<SnapshotView>>> {
    let snapshots =
        queries::list_snapshots(&state.db, filter.department_id, filter.batch_id.as_deref()).await?;
    Ok(Json(snapshots))
}

pub async fn get_snapshot(
    State(state): State<AppState>,
    Path(snapshot_id): Path<i64>,
) -> Result<Json<SnapshotView>> {
    Ok(Json(queries::get_snapshot(&state.db, snapshot_id).await?))
}

pub async fn create_snapshot(
    State(state): State<AppState>,
    Json(payload): Json<CreateSnapshot>,
) -> Result<(StatusCode, Json<SnapshotView>)> {
    let id = ForecastId::decode(&payload.forecast_id)?;
    let submitted_by = actor_or_default(payload.submitted_by, &state);
    let snapshot = queries::create_snapshot(&state.db, id, &submitted_by).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

pub async fn create_bulk_snapshots(
    State(state): State<AppState>,
    Json(payload): Json<CreateBulkSnapshots>,
) -> Result<(StatusCode, Json<Vec<SnapshotView>>)> {
    let submitted_by = actor_or_default(payload.submitted_by, &state);
    let snapshots =
        queries::create_bulk_snapshots(&state.db, payload.department_id, &submitted_by).await?;
    Ok((StatusCode::CREATED, Json(snapshots)))
}

pub async fn approve_snapshot(
    State(state): State<AppState>,
    Path(snapshot_id): Path<i64>,
    Json(payload): Json<ApproveSnapshot>,
) -> Result<Json<SnapshotView>> {
    if payload.approved_by.trim().is_empty() {
        return Err(AppError::Validation("approved_by must not be empty".to_string()));
    }
    Ok(Json(queries::approve_snapshot(&state.db, snapshot_id, &payload.approved_by).await?))
}

pub async fn delete_snapshot(
    State(state): State<AppState>,
    Path(snapshot_id): Path<i64>,
) -> Result<StatusCode> {
    if !queries::delete_snapshot(&state.db, snapshot_id).await? {
        return Err(AppError::not_found("Snapshot"));
    }
    Ok(StatusCode::NO_CONTENT)
}
