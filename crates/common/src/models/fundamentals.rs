use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::FundamentalsError;

/// A single cell of a filing table.
///
/// `Missing` means the column does not exist in the upstream table at all,
/// `Null` means the column exists but carries no usable value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Reported<T> {
    #[default]
    Missing,
    Null,
    Value(T),
}

impl<T> Reported<T> {
    /// Collapses to `Option`, turning an absent column into `MissingField`.
    pub fn require(self, field: &'static str) -> Result<Option<T>, FundamentalsError> {
        match self {
            Self::Missing => Err(FundamentalsError::MissingField(field)),
            Self::Null => Ok(None),
            Self::Value(v) => Ok(Some(v)),
        }
    }
}

impl Reported<f64> {
    /// Parses a raw cell as served by filing APIs, where nulls arrive as
    /// "None", "-" or an empty string.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None => Self::Missing,
            Some("" | "None" | "-" | "null") => Self::Null,
            Some(s) => s.parse::<f64>().map(Self::Value).unwrap_or(Self::Null),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyOverview {
    pub symbol: String,
    pub pe_ratio: Reported<f64>,
    pub peg_ratio: Reported<f64>,
    pub return_on_equity_ttm: Reported<f64>,
    pub quarterly_revenue_growth_yoy: Reported<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheetReport {
    pub fiscal_date_ending: NaiveDate,
    pub total_liabilities: Reported<f64>,
    pub total_shareholder_equity: Reported<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsReport {
    pub fiscal_date_ending: NaiveDate,
    pub reported_eps: Reported<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_distinguishes_missing_from_null() {
        assert_eq!(Reported::parse(None), Reported::Missing);
        assert_eq!(Reported::parse(Some("None")), Reported::Null);
        assert_eq!(Reported::parse(Some("-")), Reported::Null);
        assert_eq!(Reported::parse(Some("abc")), Reported::Null);
        assert_eq!(Reported::parse(Some(" 25.0 ")), Reported::Value(25.0));
    }

    #[test]
    fn test_require() {
        assert_eq!(
            Reported::<f64>::Missing.require("PERatio"),
            Err(FundamentalsError::MissingField("PERatio"))
        );
        assert_eq!(Reported::<f64>::Null.require("PERatio"), Ok(None));
        assert_eq!(Reported::Value(1.5).require("PEGRatio"), Ok(Some(1.5)));
    }
}
