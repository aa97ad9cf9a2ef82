use serde::{Serialize, Deserialize};
use rust_decimal::Decimal;
use chrono::NaiveDateTime;

/// Descriptive attributes shared by every month row of one forecast.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDetails {
    pub project_name: Option<String>,
    pub profit_center: Option<String>,
    pub wbs: Option<String>,         // work-breakdown-structure code
    pub account: Option<String>,
}

/// One stored row of a live forecast (`forecast_months`).
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastMonth {
    pub id: i64,
    pub department_id: i64,
    pub project_id: i64,
    pub year: i32,
    pub month: i64,                  // 1..=12
    pub amount: Decimal,
    pub details: LineDetails,
    pub created_by: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A month row about to be inserted; audit columns are stamped by the query layer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewForecastMonth {
    pub department_id: i64,
    pub project_id: i64,
    pub year: i32,
    pub month: i64,
    pub amount: Decimal,
    pub details: LineDetails,
}
