use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::ForecastId;
use crate::database::models::LineDetails;

/// Month field names of the yearly view, January first.
pub const MONTH_NAMES: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Twelve month amounts; months never set are zero.
///
/// The yearly total is always computed from the amounts. It is emitted twice
/// on serialization, as `total` and `yearly_sum`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonthAmounts([Decimal; 12]);

impl MonthAmounts {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn from_array(amounts: [Decimal; 12]) -> Self {
        Self(amounts)
    }

    /// Amount for a 1-based month; `None` outside 1..=12.
    pub fn get(&self, month: i64) -> Option<Decimal> {
        Self::index(month).map(|i| self.0[i])
    }

    /// Set the amount for a 1-based month. Returns `false` and changes
    /// nothing when the month is outside 1..=12.
    pub fn set(&mut self, month: i64, amount: Decimal) -> bool {
        match Self::index(month) {
            Some(i) => {
                self.0[i] = amount;
                true
            }
            None => false,
        }
    }

    /// Sum of the twelve months, `None` when it leaves the Decimal range.
    pub fn checked_total(&self) -> Option<Decimal> {
        self.0.iter().try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(*amount))
    }

    /// Sum of the twelve months, clamped to the Decimal range.
    pub fn total(&self) -> Decimal {
        self.0.iter().fold(Decimal::ZERO, |acc, amount| acc.saturating_add(*amount))
    }

    /// `(month, amount)` pairs in month order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, Decimal)> + '_ {
        self.0.iter().enumerate().map(|(i, amount)| (i as i64 + 1, *amount))
    }

    fn index(month: i64) -> Option<usize> {
        (1..=12).contains(&month).then(|| (month - 1) as usize)
    }
}

impl Serialize for MonthAmounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let total = self.total();
        let mut map = serializer.serialize_map(Some(MONTH_NAMES.len() + 2))?;
        for (name, amount) in MONTH_NAMES.iter().zip(self.0.iter()) {
            map.serialize_entry(name, amount)?;
        }
        map.serialize_entry("total", &total)?;
        map.serialize_entry("yearly_sum", &total)?;
        map.end()
    }
}

/// Live forecast folded into its yearly shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyForecast {
    pub id: ForecastId,
    pub department_id: i64,
    pub project_id: i64,
    pub year: i32,
    #[serde(flatten)]
    pub details: LineDetails,
    #[serde(flatten)]
    pub amounts: MonthAmounts,
    pub created_by: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl YearlyForecast {
    pub fn total(&self) -> Decimal {
        self.amounts.total()
    }
}

/// Snapshot header plus its frozen months, in yearly shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotView {
    pub id: i64,
    pub forecast_id: ForecastId,
    pub batch_id: String,
    pub department_id: i64,
    pub project_id: i64,
    pub year: i32,
    #[serde(flatten)]
    pub details: LineDetails,
    #[serde(flatten)]
    pub amounts: MonthAmounts,
    pub is_approved: bool,
    pub snapshot_date: NaiveDateTime,
    pub submitted_by: String,
    pub approved_by: Option<String>,
    pub approved_at: Option<NaiveDateTime>,
}

impl SnapshotView {
    pub fn total(&self) -> Decimal {
        self.amounts.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_ignores_out_of_range_months() {
        let mut amounts = MonthAmounts::zero();
        assert!(!amounts.set(0, Decimal::from(5)));
        assert!(!amounts.set(13, Decimal::from(5)));
        assert!(amounts.set(12, Decimal::from(5)));
        assert_eq!(amounts.get(12), Some(Decimal::from(5)));
        assert_eq!(amounts.get(13), None);
        assert_eq!(amounts.total(), Decimal::from(5));
    }

    #[test]
    fn test_serializes_twelve_months_and_both_totals() {
        let mut amounts = MonthAmounts::zero();
        amounts.set(1, Decimal::from(100));
        amounts.set(6, Decimal::from(50));

        let json = serde_json::to_value(amounts).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 14);
        assert_eq!(json["jan"].as_f64(), Some(100.0));
        assert_eq!(json["jun"].as_f64(), Some(50.0));
        assert_eq!(json["dec"].as_f64(), Some(0.0));
        assert_eq!(json["total"].as_f64(), Some(150.0));
        assert_eq!(json["yearly_sum"], json["total"]);
    }

    #[test]
    fn test_total_overflow_is_detected_without_panicking() {
        let mut amounts = MonthAmounts::zero();
        amounts.set(1, Decimal::MAX);
        amounts.set(2, Decimal::MAX);

        assert_eq!(amounts.checked_total(), None);
        assert_eq!(amounts.total(), Decimal::MAX);

        amounts.set(2, Decimal::MIN);
        assert_eq!(amounts.checked_total(), Some(Decimal::ZERO));
    }
}
