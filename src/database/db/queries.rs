use std::collections::HashMap;
use std::str::FromStr;

use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Pool, Row, Sqlite, SqliteConnection, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::database::models::{
    Department, ForecastMonth, LineDetails, NewForecastMonth, Project, SnapshotHeader, SnapshotMonth,
};
use crate::error::{AppError, Result};
use crate::forecast::{self, ForecastId, ForecastInput, SnapshotView, YearlyForecast};

/*
This file contains the SQL queries and the CRUD logic for departments,
projects, forecasts and snapshots. Amounts are stored as TEXT and parsed
back into Decimal on read.
 */

/*==========Department Queries=========== */

// Create department
pub async fn create_department(pool: &Pool<Sqlite>, name: &str, code: &str) -> Result<i64> {
    let id = sqlx::query("INSERT INTO departments (name, code) VALUES (?, ?) RETURNING id")
        .bind(name)
        .bind(code)
        .fetch_one(pool)
        .await?
        .try_get("id")?;

    Ok(id)
}

pub async fn get_all_departments(pool: &Pool<Sqlite>) -> Result<Vec<Department>> {
    let departments = sqlx::query_as::<_, Department>(
        "SELECT id, name, code FROM departments ORDER BY id ASC"
    )
    .fetch_all(pool)
    .await?;

    Ok(departments)
}

pub async fn get_department_by_id(pool: &Pool<Sqlite>, department_id: i64) -> Result<Option<Department>> {
    let department = sqlx::query_as::<_, Department>(
        "SELECT id, name, code FROM departments WHERE id = ?"
    )
    .bind(department_id)
    .fetch_optional(pool)
    .await?;

    Ok(department)
}

pub async fn count_departments(pool: &Pool<Sqlite>) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM departments")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/*==========Project Queries=========== */

// Create project
pub async fn create_project(
    pool: &Pool<Sqlite>,
    name: &str,
    code: &str,
    department_id: i64,
) -> Result<i64> {
    let id = sqlx::query(
        "INSERT INTO projects (name, code, department_id) VALUES (?, ?, ?) RETURNING id"
    )
    .bind(name)
    .bind(code)
    .bind(department_id)
    .fetch_one(pool)
    .await?
    .try_get("id")?;

    Ok(id)
}

// Get all projects, optionally only those of one department
pub async fn get_all_projects(pool: &Pool<Sqlite>, department_id: Option<i64>) -> Result<Vec<Project>> {
    let projects = sqlx::query_as::<_, Project>(
        r#"
        SELECT id, name, code, department_id
        FROM projects
        WHERE (? IS NULL OR department_id = ?)
        ORDER BY id ASC
        "#
    )
    .bind(department_id)
    .bind(department_id)
    .fetch_all(pool)
    .await?;

    Ok(projects)
}

pub async fn get_project_by_id(pool: &Pool<Sqlite>, project_id: i64) -> Result<Option<Project>> {
    let project = sqlx::query_as::<_, Project>(
        "SELECT id, name, code, department_id FROM projects WHERE id = ?"
    )
    .bind(project_id)
    .fetch_optional(pool)
    .await?;

    Ok(project)
}

/*==========Forecast Queries=========== */

// Get one yearly forecast
pub async fn get_forecast(pool: &Pool<Sqlite>, id: ForecastId) -> Result<YearlyForecast> {
    let months = fetch_forecast_months(pool, id).await?;
    if months.is_empty() {
        return Err(AppError::not_found("Forecast"));
    }
    Ok(forecast::fold_monthly(&months)?)
}

// Get all yearly forecasts, optionally filtered by department and year
pub async fn list_forecasts(
    pool: &Pool<Sqlite>,
    department_id: Option<i64>,
    year: Option<i32>,
) -> Result<Vec<YearlyForecast>> {
    let months = sqlx::query(
        r#"
        SELECT *
        FROM forecast_months
        WHERE (? IS NULL OR department_id = ?)
          AND (? IS NULL OR year = ?)
        ORDER BY project_id ASC, year ASC, month ASC
        "#
    )
    .bind(department_id)
    .bind(department_id)
    .bind(year)
    .bind(year)
    .fetch_all(pool)
    .await?
    .iter()
    .map(forecast_month_from_row)
    .collect::<std::result::Result<Vec<ForecastMonth>, sqlx::Error>>()?;

    // rows arrive ordered, so each forecast is one contiguous run
    let mut groups: Vec<Vec<ForecastMonth>> = Vec::new();
    for month in months {
        let same_forecast = groups
            .last()
            .is_some_and(|g| g[0].project_id == month.project_id && g[0].year == month.year);
        if same_forecast {
            if let Some(group) = groups.last_mut() {
                group.push(month);
            }
        } else {
            groups.push(vec![month]);
        }
    }

    groups
        .iter()
        .map(|group| forecast::fold_monthly(group).map_err(AppError::from))
        .collect()
}

/* Creating a forecast:
The yearly input is expanded into twelve month rows that are inserted in one transaction.
An existing forecast for the same project/year is a conflict unless `upsert` is set,
in which case its rows are replaced and its original creator is kept. */

pub async fn create_forecast(
    pool: &Pool<Sqlite>,
    input: &ForecastInput,
    year: i32,
    created_by: &str,
    upsert: bool,
) -> Result<YearlyForecast> {
    let id = ForecastId::new(input.project_id, year);
    let rows = forecast::expand_yearly(input, year)?;
    ensure_references(pool, input.department_id, input.project_id).await?;
    let now = Utc::now().naive_utc();

    let mut tx = begin_write(pool).await?;

    let existing = first_audit(&mut *tx, id).await?;
    let replaced = existing.is_some();
    let (creator, created_at) = match existing {
        Some(_) if !upsert => return Err(AppError::Duplicate(id)),
        Some(audit) => audit,
        None => (created_by.to_string(), now),
    };

    replace_months(&mut *tx, id, &rows, &creator, created_at, now)
        .await
        .map_err(|e| duplicate_on_conflict(id, e))?;
    tx.commit().await?;

    info!(forecast_id = %id, replaced, "forecast saved");

    get_forecast(pool, id).await
}

// Replace all twelve rows of an existing forecast
pub async fn update_forecast(
    pool: &Pool<Sqlite>,
    id: ForecastId,
    input: &ForecastInput,
) -> Result<YearlyForecast> {
    // the identifier decides which forecast is rewritten
    let input = ForecastInput {
        project_id: id.project_id,
        year: Some(id.year),
        ..input.clone()
    };

    let Some((creator, created_at)) = first_audit(pool, id).await? else {
        return Err(AppError::not_found("Forecast"));
    };
    if get_department_by_id(pool, input.department_id).await?.is_none() {
        return Err(AppError::not_found("Department"));
    }

    let rows = forecast::expand_yearly(&input, id.year)?;
    let now = Utc::now().naive_utc();

    let mut tx = begin_write(pool).await?;
    replace_months(&mut *tx, id, &rows, &creator, created_at, now)
        .await
        .map_err(|e| duplicate_on_conflict(id, e))?;
    tx.commit().await?;

    info!(forecast_id = %id, "forecast updated");

    get_forecast(pool, id).await
}

// Delete a forecast (all of its months)
pub async fn delete_forecast(pool: &Pool<Sqlite>, id: ForecastId) -> Result<bool> {
    let result = sqlx::query("DELETE FROM forecast_months WHERE project_id = ? AND year = ?")
        .bind(id.project_id)
        .bind(id.year)
        .execute(pool)
        .await?;

    if result.rows_affected() > 0 {
        info!(forecast_id = %id, "forecast deleted");
    }
    Ok(result.rows_affected() > 0)
}

async fn ensure_references(pool: &Pool<Sqlite>, department_id: i64, project_id: i64) -> Result<()> {
    if get_department_by_id(pool, department_id).await?.is_none() {
        return Err(AppError::not_found("Department"));
    }
    if get_project_by_id(pool, project_id).await?.is_none() {
        return Err(AppError::not_found("Project"));
    }
    Ok(())
}

// Write transactions take the RESERVED lock at BEGIN. A deferred transaction
// that reads first cannot upgrade its lock while another writer waits.
async fn begin_write(
    pool: &Pool<Sqlite>,
) -> std::result::Result<Transaction<'static, Sqlite>, sqlx::Error> {
    pool.begin_with("BEGIN IMMEDIATE").await
}

// a UNIQUE(project_id, year, month) hit means another request created the forecast first
fn duplicate_on_conflict(id: ForecastId, err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return AppError::Duplicate(id);
        }
    }
    AppError::Database(err)
}

async fn fetch_forecast_months<'e, E>(
    executor: E,
    id: ForecastId,
) -> std::result::Result<Vec<ForecastMonth>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        SELECT *
        FROM forecast_months
        WHERE project_id = ? AND year = ?
        ORDER BY month ASC
        "#
    )
    .bind(id.project_id)
    .bind(id.year)
    .fetch_all(executor)
    .await?
    .iter()
    .map(forecast_month_from_row)
    .collect()
}

// creator and creation time of an existing forecast, taken from its first month
async fn first_audit<'e, E>(
    executor: E,
    id: ForecastId,
) -> std::result::Result<Option<(String, NaiveDateTime)>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        r#"
        SELECT created_by, created_at
        FROM forecast_months
        WHERE project_id = ? AND year = ?
        ORDER BY month ASC
        LIMIT 1
        "#
    )
    .bind(id.project_id)
    .bind(id.year)
    .fetch_optional(executor)
    .await?;

    match row {
        Some(r) => Ok(Some((r.try_get("created_by")?, r.try_get("created_at")?))),
        None => Ok(None),
    }
}

// delete-all-then-insert inside the caller's transaction
async fn replace_months(
    conn: &mut SqliteConnection,
    id: ForecastId,
    rows: &[NewForecastMonth],
    created_by: &str,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
) -> std::result::Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM forecast_months WHERE project_id = ? AND year = ?")
        .bind(id.project_id)
        .bind(id.year)
        .execute(&mut *conn)
        .await?;

    for row in rows {
        sqlx::query(
            r#"
            INSERT INTO forecast_months (
                department_id, project_id, year, month, amount,
                project_name, profit_center, wbs, account,
                created_by, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(row.department_id)
        .bind(row.project_id)
        .bind(row.year)
        .bind(row.month)
        .bind(row.amount.to_string())
        .bind(row.details.project_name.as_deref())
        .bind(row.details.profit_center.as_deref())
        .bind(row.details.wbs.as_deref())
        .bind(row.details.account.as_deref())
        .bind(created_by)
        .bind(created_at)
        .bind(updated_at)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/*==========Snapshot Queries=========== */

/* Creating a snapshot:
The live months of the forecast are copied into a new header plus detail rows
in one transaction. The copy never changes afterwards; only the approval
columns of the header are written again. */

pub async fn create_snapshot(
    pool: &Pool<Sqlite>,
    id: ForecastId,
    submitted_by: &str,
) -> Result<SnapshotView> {
    let batch_id = Uuid::new_v4().to_string();
    let now = Utc::now().naive_utc();

    let mut tx = begin_write(pool).await?;
    let months = fetch_forecast_months(&mut *tx, id).await?;
    let snapshot_id = insert_snapshot(&mut *tx, &months, &batch_id, submitted_by, now).await?;
    tx.commit().await?;

    info!(snapshot_id, forecast_id = %id, batch_id = %batch_id, submitted_by, "snapshot created");

    get_snapshot(pool, snapshot_id).await
}

// Snapshot every forecast of a department under one batch id
pub async fn create_bulk_snapshots(
    pool: &Pool<Sqlite>,
    department_id: i64,
    submitted_by: &str,
) -> Result<Vec<SnapshotView>> {
    let batch_id = Uuid::new_v4().to_string();
    let now = Utc::now().naive_utc();

    let mut tx = begin_write(pool).await?;

    let keys = sqlx::query(
        r#"
        SELECT DISTINCT project_id, year
        FROM forecast_months
        WHERE department_id = ?
        ORDER BY project_id ASC, year ASC
        "#
    )
    .bind(department_id)
    .fetch_all(&mut *tx)
    .await?
    .iter()
    .map(|row| Ok(ForecastId::new(row.try_get("project_id")?, row.try_get("year")?)))
    .collect::<std::result::Result<Vec<ForecastId>, sqlx::Error>>()?;

    if keys.is_empty() {
        return Err(AppError::not_found(format!("Forecasts for department {department_id}")));
    }

    let mut snapshot_ids = Vec::with_capacity(keys.len());
    for id in &keys {
        let months = fetch_forecast_months(&mut *tx, *id).await?;
        snapshot_ids.push(insert_snapshot(&mut *tx, &months, &batch_id, submitted_by, now).await?);
    }
    tx.commit().await?;

    info!(department_id, batch_id = %batch_id, count = snapshot_ids.len(), "bulk snapshots created");

    let mut views = Vec::with_capacity(snapshot_ids.len());
    for snapshot_id in snapshot_ids {
        views.push(get_snapshot(pool, snapshot_id).await?);
    }
    Ok(views)
}

// header and months come from one read transaction
pub async fn get_snapshot(pool: &Pool<Sqlite>, snapshot_id: i64) -> Result<SnapshotView> {
    let mut tx = pool.begin().await?;
    let header = get_snapshot_header(&mut *tx, snapshot_id).await?;
    let months = sqlx::query(
        "SELECT * FROM forecast_snapshot_months WHERE snapshot_id = ? ORDER BY month ASC"
    )
    .bind(snapshot_id)
    .fetch_all(&mut *tx)
    .await?
    .iter()
    .map(snapshot_month_from_row)
    .collect::<std::result::Result<Vec<SnapshotMonth>, sqlx::Error>>()?;
    tx.commit().await?;

    match header {
        Some(header) if !months.is_empty() => Ok(forecast::fold_snapshot(&header, &months)?),
        _ => Err(AppError::not_found("Snapshot")),
    }
}

// Get all snapshots newest first, optionally filtered by department or batch
pub async fn list_snapshots(
    pool: &Pool<Sqlite>,
    department_id: Option<i64>,
    batch_id: Option<&str>,
) -> Result<Vec<SnapshotView>> {
    let mut tx = pool.begin().await?;

    let headers = sqlx::query(
        r#"
        SELECT *
        FROM forecast_snapshots
        WHERE (? IS NULL OR department_id = ?)
          AND (? IS NULL OR batch_id = ?)
        ORDER BY snapshot_date DESC, id DESC
        "#
    )
    .bind(department_id)
    .bind(department_id)
    .bind(batch_id)
    .bind(batch_id)
    .fetch_all(&mut *tx)
    .await?
    .iter()
    .map(snapshot_header_from_row)
    .collect::<std::result::Result<Vec<SnapshotHeader>, sqlx::Error>>()?;

    let mut months_by_snapshot: HashMap<i64, Vec<SnapshotMonth>> = HashMap::new();
    let rows = sqlx::query(
        r#"
        SELECT m.*
        FROM forecast_snapshot_months m
        JOIN forecast_snapshots s ON s.id = m.snapshot_id
        WHERE (? IS NULL OR s.department_id = ?)
          AND (? IS NULL OR s.batch_id = ?)
        "#
    )
    .bind(department_id)
    .bind(department_id)
    .bind(batch_id)
    .bind(batch_id)
    .fetch_all(&mut *tx)
    .await?;
    tx.commit().await?;

    for row in &rows {
        let month = snapshot_month_from_row(row)?;
        months_by_snapshot.entry(month.snapshot_id).or_default().push(month);
    }

    // headers without months are mid-delete; leave them out
    headers
        .iter()
        .filter_map(|header| {
            let months = months_by_snapshot.remove(&header.id)?;
            Some(forecast::fold_snapshot(header, &months).map_err(AppError::from))
        })
        .collect()
}

/* Approving a snapshot:
Pending -> Approved happens once. The conditional UPDATE only matches a pending
header, so an approved one keeps its original approver and timestamp. */

pub async fn approve_snapshot(
    pool: &Pool<Sqlite>,
    snapshot_id: i64,
    approved_by: &str,
) -> Result<SnapshotView> {
    let now = Utc::now().naive_utc();

    let result = sqlx::query(
        r#"
        UPDATE forecast_snapshots
        SET is_approved = 1, approved_by = ?, approved_at = ?
        WHERE id = ? AND is_approved = 0
        "#
    )
    .bind(approved_by)
    .bind(now)
    .bind(snapshot_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return match get_snapshot_header(pool, snapshot_id).await? {
            Some(_) => Err(AppError::AlreadyApproved(snapshot_id)),
            None => Err(AppError::not_found("Snapshot")),
        };
    }

    info!(snapshot_id, approved_by, "snapshot approved");

    get_snapshot(pool, snapshot_id).await
}

// Delete snapshot
pub async fn delete_snapshot(pool: &Pool<Sqlite>, snapshot_id: i64) -> Result<bool> {
    let mut tx = begin_write(pool).await?;

    // First need to delete the frozen months owned by the header
    sqlx::query("DELETE FROM forecast_snapshot_months WHERE snapshot_id = ?")
        .bind(snapshot_id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM forecast_snapshots WHERE id = ?")
        .bind(snapshot_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    if result.rows_affected() > 0 {
        info!(snapshot_id, "snapshot deleted");
    }
    Ok(result.rows_affected() > 0)
}

async fn get_snapshot_header<'e, E>(
    executor: E,
    snapshot_id: i64,
) -> std::result::Result<Option<SnapshotHeader>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("SELECT * FROM forecast_snapshots WHERE id = ?")
        .bind(snapshot_id)
        .fetch_optional(executor)
        .await?
        .as_ref()
        .map(snapshot_header_from_row)
        .transpose()
}

async fn insert_snapshot(
    conn: &mut SqliteConnection,
    months: &[ForecastMonth],
    batch_id: &str,
    submitted_by: &str,
    snapshot_date: NaiveDateTime,
) -> Result<i64> {
    let Some(first) = months.first() else {
        return Err(AppError::not_found("Forecast"));
    };

    let snapshot_id: i64 = sqlx::query(
        r#"
        INSERT INTO forecast_snapshots (
            batch_id, department_id, project_id, year,
            is_approved, submitted_by, snapshot_date
        )
        VALUES (?, ?, ?, ?, 0, ?, ?)
        RETURNING id
        "#
    )
    .bind(batch_id)
    .bind(first.department_id)
    .bind(first.project_id)
    .bind(first.year)
    .bind(submitted_by)
    .bind(snapshot_date)
    .fetch_one(&mut *conn)
    .await?
    .try_get("id")?;

    for month in months {
        sqlx::query(
            r#"
            INSERT INTO forecast_snapshot_months (
                snapshot_id, month, amount,
                project_name, profit_center, wbs, account
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(snapshot_id)
        .bind(month.month)
        .bind(month.amount.to_string())
        .bind(month.details.project_name.as_deref())
        .bind(month.details.profit_center.as_deref())
        .bind(month.details.wbs.as_deref())
        .bind(month.details.account.as_deref())
        .execute(&mut *conn)
        .await?;
    }

    Ok(snapshot_id)
}

/*==========Row mapping=========== */

// NULL amounts read as zero
fn amount_from_row(row: &SqliteRow) -> std::result::Result<Decimal, sqlx::Error> {
    let amount_text: Option<String> = row.try_get("amount")?;
    match amount_text {
        Some(text) => Decimal::from_str(&text)
            .map_err(|e| sqlx::Error::Decode(format!("Invalid Decimal format for amount: {}", e).into())),
        None => Ok(Decimal::ZERO),
    }
}

fn details_from_row(row: &SqliteRow) -> std::result::Result<LineDetails, sqlx::Error> {
    Ok(LineDetails {
        project_name: row.try_get("project_name")?,
        profit_center: row.try_get("profit_center")?,
        wbs: row.try_get("wbs")?,
        account: row.try_get("account")?,
    })
}

fn forecast_month_from_row(row: &SqliteRow) -> std::result::Result<ForecastMonth, sqlx::Error> {
    Ok(ForecastMonth {
        id: row.try_get("id")?,
        department_id: row.try_get("department_id")?,
        project_id: row.try_get("project_id")?,
        year: row.try_get("year")?,
        month: row.try_get("month")?,
        amount: amount_from_row(row)?,
        details: details_from_row(row)?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn snapshot_header_from_row(row: &SqliteRow) -> std::result::Result<SnapshotHeader, sqlx::Error> {
    Ok(SnapshotHeader {
        id: row.try_get("id")?,
        batch_id: row.try_get("batch_id")?,
        department_id: row.try_get("department_id")?,
        project_id: row.try_get("project_id")?,
        year: row.try_get("year")?,
        is_approved: row.try_get("is_approved")?,
        submitted_by: row.try_get("submitted_by")?,
        snapshot_date: row.try_get("snapshot_date")?,
        approved_by: row.try_get("approved_by")?,
        approved_at: row.try_get("approved_at")?,
    })
}

fn snapshot_month_from_row(row: &SqliteRow) -> std::result::Result<SnapshotMonth, sqlx::Error> {
    Ok(SnapshotMonth {
        id: row.try_get("id")?,
        snapshot_id: row.try_get("snapshot_id")?,
        month: row.try_get("month")?,
        amount: amount_from_row(row)?,
        details: details_from_row(row)?,
    })
}
