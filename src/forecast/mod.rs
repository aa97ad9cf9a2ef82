//! Forecast transformation core.
//!
//! Converts between the yearly shape exposed over the API (twelve named
//! month amounts plus totals) and the normalized monthly rows kept in the
//! database, and encodes the `"{project_id}_{year}"` identifier that
//! addresses one yearly forecast.

mod convert;
mod id;
mod input;
mod view;

pub use convert::{expand_yearly, fold_monthly, fold_snapshot, MonthlyLine};
pub use id::ForecastId;
pub use input::ForecastInput;
pub use view::{MonthAmounts, SnapshotView, YearlyForecast, MONTH_NAMES};

/// Errors raised by the transformation core.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForecastError {
    /// The identifier is not two `_`-separated integers.
    #[error("Invalid forecast_id format: {0}")]
    Format(String),

    /// Folding was asked to build a yearly view from no rows.
    #[error("No monthly records provided")]
    EmptyInput,

    /// The twelve months do not sum to a representable Decimal.
    #[error("Monthly amounts are too large to total")]
    Overflow,
}
