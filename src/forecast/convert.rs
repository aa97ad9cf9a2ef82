use rust_decimal::Decimal;

use super::{ForecastError, ForecastId, ForecastInput, MonthAmounts, SnapshotView, YearlyForecast};
use crate::database::models::{
    ForecastMonth, LineDetails, NewForecastMonth, SnapshotHeader, SnapshotMonth,
};

/// A stored month row that can be folded into a yearly view.
pub trait MonthlyLine {
    fn month(&self) -> i64;
    fn amount(&self) -> Decimal;
    fn details(&self) -> &LineDetails;
}

impl MonthlyLine for ForecastMonth {
    fn month(&self) -> i64 {
        self.month
    }
    fn amount(&self) -> Decimal {
        self.amount
    }
    fn details(&self) -> &LineDetails {
        &self.details
    }
}

impl MonthlyLine for SnapshotMonth {
    fn month(&self) -> i64 {
        self.month
    }
    fn amount(&self) -> Decimal {
        self.amount
    }
    fn details(&self) -> &LineDetails {
        &self.details
    }
}

/// Expand a yearly input into twelve month rows for `year`, January first.
pub fn expand_yearly(
    input: &ForecastInput,
    year: i32,
) -> Result<Vec<NewForecastMonth>, ForecastError> {
    let details = input.details();
    let rows = input
        .amounts()?
        .iter()
        .map(|(month, amount)| NewForecastMonth {
            department_id: input.department_id,
            project_id: input.project_id,
            year,
            month,
            amount,
            details: details.clone(),
        })
        .collect();
    Ok(rows)
}

/// Fold the month rows of one live forecast into its yearly view.
///
/// Descriptive and audit fields come from the earliest month present.
pub fn fold_monthly(records: &[ForecastMonth]) -> Result<YearlyForecast, ForecastError> {
    let sorted = sort_by_month(records)?;
    let amounts = fold_amounts(&sorted)?;
    let first = sorted[0];

    Ok(YearlyForecast {
        id: ForecastId::new(first.project_id, first.year),
        department_id: first.department_id,
        project_id: first.project_id,
        year: first.year,
        details: first.details.clone(),
        amounts,
        created_by: Some(first.created_by.clone()),
        created_at: Some(first.created_at),
        updated_at: Some(first.updated_at),
    })
}

/// Fold a snapshot header and its frozen months into a yearly view.
///
/// Grouping key and approval state come from the header, descriptive fields
/// from the earliest detail row.
pub fn fold_snapshot(
    header: &SnapshotHeader,
    months: &[SnapshotMonth],
) -> Result<SnapshotView, ForecastError> {
    let sorted = sort_by_month(months)?;
    let amounts = fold_amounts(&sorted)?;

    Ok(SnapshotView {
        id: header.id,
        forecast_id: ForecastId::new(header.project_id, header.year),
        batch_id: header.batch_id.clone(),
        department_id: header.department_id,
        project_id: header.project_id,
        year: header.year,
        details: sorted[0].details().clone(),
        amounts,
        is_approved: header.is_approved,
        snapshot_date: header.snapshot_date,
        submitted_by: header.submitted_by.clone(),
        approved_by: header.approved_by.clone(),
        approved_at: header.approved_at,
    })
}

fn sort_by_month<L: MonthlyLine>(records: &[L]) -> Result<Vec<&L>, ForecastError> {
    if records.is_empty() {
        return Err(ForecastError::EmptyInput);
    }
    let mut sorted: Vec<&L> = records.iter().collect();
    sorted.sort_by_key(|r| r.month());
    Ok(sorted)
}

// months outside 1..=12 are skipped by MonthAmounts::set
fn fold_amounts<L: MonthlyLine>(sorted: &[&L]) -> Result<MonthAmounts, ForecastError> {
    let mut amounts = MonthAmounts::zero();
    for record in sorted {
        amounts.set(record.month(), record.amount());
    }
    amounts.checked_total().ok_or(ForecastError::Overflow)?;
    Ok(amounts)
}
