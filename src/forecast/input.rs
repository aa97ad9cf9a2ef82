use rust_decimal::Decimal;
use serde::Deserialize;

use super::{ForecastError, MonthAmounts};
use crate::database::models::LineDetails;

/// Request body for creating or replacing a yearly forecast.
///
/// camelCase spellings of the descriptive fields are accepted as aliases so
/// the converter only ever sees this one shape. Any `total` or `yearly_sum`
/// sent by the client is ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ForecastInput {
    #[serde(alias = "departmentId")]
    pub department_id: i64,
    #[serde(alias = "projectId")]
    pub project_id: i64,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default, alias = "projectName")]
    pub project_name: Option<String>,
    #[serde(default, alias = "profitCenter")]
    pub profit_center: Option<String>,
    #[serde(default)]
    pub wbs: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default, alias = "createdBy")]
    pub created_by: Option<String>,
    #[serde(default)]
    pub jan: Option<Decimal>,
    #[serde(default)]
    pub feb: Option<Decimal>,
    #[serde(default)]
    pub mar: Option<Decimal>,
    #[serde(default)]
    pub apr: Option<Decimal>,
    #[serde(default)]
    pub may: Option<Decimal>,
    #[serde(default)]
    pub jun: Option<Decimal>,
    #[serde(default)]
    pub jul: Option<Decimal>,
    #[serde(default)]
    pub aug: Option<Decimal>,
    #[serde(default)]
    pub sep: Option<Decimal>,
    #[serde(default)]
    pub oct: Option<Decimal>,
    #[serde(default)]
    pub nov: Option<Decimal>,
    #[serde(default)]
    pub dec: Option<Decimal>,
}

impl ForecastInput {
    /// Month amounts with absent months as zero. Fails when the yearly
    /// total would not fit in a Decimal.
    pub fn amounts(&self) -> Result<MonthAmounts, ForecastError> {
        let months = [
            self.jan, self.feb, self.mar, self.apr, self.may, self.jun,
            self.jul, self.aug, self.sep, self.oct, self.nov, self.dec,
        ];
        let amounts = MonthAmounts::from_array(months.map(Option::unwrap_or_default));
        amounts.checked_total().ok_or(ForecastError::Overflow)?;
        Ok(amounts)
    }

    pub fn details(&self) -> LineDetails {
        LineDetails {
            project_name: self.project_name.clone(),
            profit_center: self.profit_center.clone(),
            wbs: self.wbs.clone(),
            account: self.account.clone(),
        }
    }

    /// Set month amounts from a 1-based array, January first. Test helper
    /// and seeding convenience.
    pub fn with_amounts(mut self, amounts: [i64; 12]) -> Self {
        let [jan, feb, mar, apr, may, jun, jul, aug, sep, oct, nov, dec] =
            amounts.map(|a| Some(Decimal::from(a)));
        self.jan = jan;
        self.feb = feb;
        self.mar = mar;
        self.apr = apr;
        self.may = may;
        self.jun = jun;
        self.jul = jul;
        self.aug = aug;
        self.sep = sep;
        self.oct = oct;
        self.nov = nov;
        self.dec = dec;
        self
    }
}
