use rust_decimal::Decimal;
use chrono::NaiveDateTime;

use super::LineDetails;

/// One submission event (`forecast_snapshots`).
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotHeader {
    pub id: i64,
    pub batch_id: String,
    pub department_id: i64,
    pub project_id: i64,
    pub year: i32,
    pub is_approved: bool,
    pub submitted_by: String,
    pub snapshot_date: NaiveDateTime,
    pub approved_by: Option<String>,
    pub approved_at: Option<NaiveDateTime>,
}

/// Frozen copy of one forecast month, owned by a `SnapshotHeader`.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotMonth {
    pub id: i64,
    pub snapshot_id: i64,
    pub month: i64,
    pub amount: Decimal,
    pub details: LineDetails,
}
