use chrono::Months;
use tracing::warn;

use common::error::FundamentalsError;
use common::models::{BalanceSheetReport, CompanyOverview, EarningsReport, Fundamentals};

pub fn pe_ratio(overview: &CompanyOverview) -> Result<Option<f64>, FundamentalsError> {
    overview.pe_ratio.require("PERatio")
}

pub fn peg_ratio(overview: &CompanyOverview) -> Result<Option<f64>, FundamentalsError> {
    overview.peg_ratio.require("PEGRatio")
}

pub fn roe(overview: &CompanyOverview) -> Result<Option<f64>, FundamentalsError> {
    overview.return_on_equity_ttm.require("ReturnOnEquityTTM")
}

pub fn revenue_growth(overview: &CompanyOverview) -> Result<Option<f64>, FundamentalsError> {
    overview
        .quarterly_revenue_growth_yoy
        .require("QuarterlyRevenueGrowthYOY")
}

/// Furthest a report may sit from the one-year-back date and still count as
/// the year-ago filing.
const YEAR_AGO_TOLERANCE_DAYS: i64 = 45;

/// Year-over-year EPS growth in percent.
///
/// Compares the latest reported EPS with the report whose fiscal date is
/// nearest to one year before it. Absent when no report lies within
/// [`YEAR_AGO_TOLERANCE_DAYS`] of that date.
pub fn eps_growth(earnings: &[EarningsReport]) -> Result<Option<f64>, FundamentalsError> {
    let Some(latest) = earnings.iter().max_by_key(|r| r.fiscal_date_ending) else {
        return Ok(None);
    };
    let Some(target) = latest.fiscal_date_ending.checked_sub_months(Months::new(12)) else {
        return Ok(None);
    };
    let Some(previous) = earnings
        .iter()
        .filter(|r| r.fiscal_date_ending < latest.fiscal_date_ending)
        .min_by_key(|r| (r.fiscal_date_ending - target).num_days().abs())
        .filter(|r| (r.fiscal_date_ending - target).num_days().abs() <= YEAR_AGO_TOLERANCE_DAYS)
    else {
        return Ok(None);
    };

    let (Some(now), Some(prev)) = (
        latest.reported_eps.require("reportedEPS")?,
        previous.reported_eps.require("reportedEPS")?,
    ) else {
        return Ok(None);
    };

    if prev == 0.0 {
        return Err(FundamentalsError::ZeroDenominator("reportedEPS"));
    }
    Ok(Some(100.0 * (now - prev) / prev.abs()))
}

/// Debt/equity of the most recent balance sheet.
pub fn de_ratio(balance_sheet: &[BalanceSheetReport]) -> Result<Option<f64>, FundamentalsError> {
    let Some(latest) = balance_sheet.iter().max_by_key(|r| r.fiscal_date_ending) else {
        return Ok(None);
    };

    let (Some(liabilities), Some(equity)) = (
        latest.total_liabilities.require("totalLiabilities")?,
        latest.total_shareholder_equity.require("totalShareholderEquity")?,
    ) else {
        return Ok(None);
    };

    if equity == 0.0 {
        return Err(FundamentalsError::ZeroDenominator("totalShareholderEquity"));
    }
    Ok(Some(liabilities / equity))
}

/// Builds the fundamental sextuple, recording a field as absent when its
/// extraction fails.
pub fn extract_fundamentals(
    ticker: &str,
    overview: &CompanyOverview,
    balance_sheet: &[BalanceSheetReport],
    earnings: &[EarningsReport],
) -> Fundamentals {
    let field = |name: &str, result: Result<Option<f64>, FundamentalsError>| match result {
        Ok(value) => value,
        Err(e) => {
            warn!("{}: {} unavailable: {}", ticker, name, e);
            None
        }
    };

    Fundamentals {
        pe_ratio: field("P/E ratio", pe_ratio(overview)),
        peg_ratio: field("PEG ratio", peg_ratio(overview)),
        roe: field("ROE", roe(overview)),
        revenue_growth: field("revenue growth", revenue_growth(overview)),
        eps_growth: field("EPS growth", eps_growth(earnings)),
        de_ratio: field("D/E ratio", de_ratio(balance_sheet)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::Reported;

    fn overview() -> CompanyOverview {
        CompanyOverview {
            symbol: "AAPL".to_string(),
            pe_ratio: Reported::Value(25.0),
            peg_ratio: Reported::Value(1.5),
            return_on_equity_ttm: Reported::Value(0.15),
            quarterly_revenue_growth_yoy: Reported::Value(0.1),
        }
    }

    fn earnings(rows: &[(&str, Reported<f64>)]) -> Vec<EarningsReport> {
        rows.iter()
            .map(|(date, eps)| EarningsReport {
                fiscal_date_ending: date.parse().unwrap(),
                reported_eps: *eps,
            })
            .collect()
    }

    fn balance(liabilities: Reported<f64>, equity: Reported<f64>) -> Vec<BalanceSheetReport> {
        vec![BalanceSheetReport {
            fiscal_date_ending: "2024-03-31".parse().unwrap(),
            total_liabilities: liabilities,
            total_shareholder_equity: equity,
        }]
    }

    #[test]
    fn test_overview_ratios() {
        let o = overview();
        assert_eq!(pe_ratio(&o), Ok(Some(25.0)));
        assert_eq!(peg_ratio(&o), Ok(Some(1.5)));
        assert_eq!(roe(&o), Ok(Some(0.15)));
        assert_eq!(revenue_growth(&o), Ok(Some(0.1)));
    }

    #[test]
    fn test_pe_ratio_missing_column_is_distinct_from_null() {
        let mut o = overview();
        o.pe_ratio = Reported::Missing;
        assert_eq!(pe_ratio(&o), Err(FundamentalsError::MissingField("PERatio")));

        o.pe_ratio = Reported::Null;
        assert_eq!(pe_ratio(&o), Ok(None));
    }

    #[test]
    fn test_eps_growth() {
        let rows = earnings(&[
            ("2022-01-01", Reported::Value(1.0)),
            ("2023-01-01", Reported::Value(1.2)),
        ]);
        let growth = eps_growth(&rows).unwrap().unwrap();
        assert!((growth - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_eps_growth_picks_nearest_prior_year() {
        let rows = earnings(&[
            ("2023-12-31", Reported::Value(2.0)),
            ("2023-09-30", Reported::Value(1.8)),
            ("2023-06-30", Reported::Value(1.5)),
            ("2022-12-31", Reported::Value(-1.0)),
            ("2022-09-30", Reported::Value(9.0)),
        ]);
        // -1.0 -> 2.0 relative to |-1.0|
        let growth = eps_growth(&rows).unwrap().unwrap();
        assert!((growth - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_eps_growth_needs_year_ago_filing() {
        let single = earnings(&[("2023-01-01", Reported::Value(1.2))]);
        assert_eq!(eps_growth(&single), Ok(None));

        let quarters = earnings(&[
            ("2023-12-31", Reported::Value(1.0)),
            ("2024-03-31", Reported::Value(2.0)),
        ]);
        assert_eq!(eps_growth(&quarters), Ok(None));
    }

    #[test]
    fn test_eps_growth_zero_base() {
        let rows = earnings(&[
            ("2022-01-01", Reported::Value(0.0)),
            ("2023-01-01", Reported::Value(1.2)),
        ]);
        assert_eq!(
            eps_growth(&rows),
            Err(FundamentalsError::ZeroDenominator("reportedEPS"))
        );
    }

    #[test]
    fn test_de_ratio() {
        let rows = balance(Reported::Value(100.0), Reported::Value(200.0));
        assert_eq!(de_ratio(&rows), Ok(Some(0.5)));

        let rows = balance(Reported::Value(100.0), Reported::Missing);
        assert_eq!(
            de_ratio(&rows),
            Err(FundamentalsError::MissingField("totalShareholderEquity"))
        );
    }

    #[test]
    fn test_extract_records_failures_as_absent() {
        let mut o = overview();
        o.pe_ratio = Reported::Missing;
        let rows = earnings(&[("2023-01-01", Reported::Value(1.2))]);
        let sheet = balance(Reported::Value(10.0), Reported::Value(0.0));

        let f = extract_fundamentals("AAPL", &o, &sheet, &rows);
        assert_eq!(f.pe_ratio, None);
        assert_eq!(f.peg_ratio, Some(1.5));
        assert_eq!(f.eps_growth, None);
        assert_eq!(f.de_ratio, None);
    }
}
