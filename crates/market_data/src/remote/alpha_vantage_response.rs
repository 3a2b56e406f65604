use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use common::error::DataError;
use common::models::{BalanceSheetReport, Bar, CompanyOverview, EarningsReport, Reported};

use crate::traits::RemoteResponse;

const PROVIDER: &str = "alpha_vantage";

/// Raw filing cell. Alpha Vantage serves numbers as strings, but other
/// mirrors of the same tables return plain numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

/// `None` when the key is absent, `Some(None)` when it is present as null.
type Column = Option<Option<Cell>>;

fn present<'de, D>(deserializer: D) -> Result<Column, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Cell>::deserialize(deserializer).map(Some)
}

fn reported(column: &Column) -> Reported<f64> {
    match column {
        None => Reported::Missing,
        Some(None) => Reported::Null,
        Some(Some(Cell::Number(n))) => Reported::Value(*n),
        Some(Some(Cell::Text(s))) => Reported::parse(Some(s)),
    }
}

fn decode_error(reason: impl ToString) -> DataError {
    DataError::Decode {
        provider: PROVIDER,
        reason: reason.to_string(),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, DataError> {
    raw.parse::<NaiveDate>()
        .map_err(|e| decode_error(format!("bad date {}: {}", raw, e)))
}

#[derive(Debug, Deserialize)]
pub struct QuoteResponse {
    #[serde(rename(deserialize = "Global Quote"), default)]
    pub quote: BTreeMap<String, String>,
}

impl RemoteResponse<f64> for QuoteResponse {
    fn to_record(&self, ticker: &str) -> Result<f64, DataError> {
        let raw = self.quote.get("05. price").ok_or_else(|| DataError::Unavailable {
            provider: PROVIDER,
            ticker: ticker.to_string(),
        })?;
        let price = raw
            .parse::<f64>()
            .map_err(|e| decode_error(format!("price {:?}: {}", raw, e)))?;
        if price <= 0.0 {
            return Err(decode_error(format!("non-positive price {}", price)));
        }
        Ok(price)
    }
}

#[derive(Debug, Deserialize)]
pub struct DailyBarResponse {
    #[serde(rename(deserialize = "1. open"))]
    pub open: String,
    #[serde(rename(deserialize = "2. high"))]
    pub high: String,
    #[serde(rename(deserialize = "3. low"))]
    pub low: String,
    #[serde(rename(deserialize = "4. close"))]
    pub close: String,
    #[serde(rename(deserialize = "5. volume"))]
    pub volume: String,
}

#[derive(Debug, Deserialize)]
pub struct DailySeriesResponse {
    #[serde(rename(deserialize = "Time Series (Daily)"), default)]
    pub series: BTreeMap<String, DailyBarResponse>,
}

impl RemoteResponse<Vec<Bar>> for DailySeriesResponse {
    fn to_record(&self, ticker: &str) -> Result<Vec<Bar>, DataError> {
        if self.series.is_empty() {
            return Err(DataError::Unavailable {
                provider: PROVIDER,
                ticker: ticker.to_string(),
            });
        }

        let number = |raw: &str| {
            raw.parse::<f64>()
                .map_err(|e| decode_error(format!("{:?}: {}", raw, e)))
        };

        let mut bars = self
            .series
            .iter()
            .map(|(date, row)| {
                Ok(Bar {
                    date: parse_date(date)?,
                    open: number(&row.open)?,
                    high: number(&row.high)?,
                    low: number(&row.low)?,
                    close: number(&row.close)?,
                    volume: row
                        .volume
                        .parse::<u64>()
                        .map_err(|e| decode_error(format!("volume {:?}: {}", row.volume, e)))?,
                })
            })
            .collect::<Result<Vec<Bar>, DataError>>()?;
        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

#[derive(Debug, Deserialize)]
pub struct OverviewResponse {
    #[serde(rename(deserialize = "Symbol"))]
    pub symbol: Option<String>,
    #[serde(rename(deserialize = "PERatio"), default, deserialize_with = "present")]
    pub pe_ratio: Column,
    #[serde(rename(deserialize = "PEGRatio"), default, deserialize_with = "present")]
    pub peg_ratio: Column,
    #[serde(
        rename(deserialize = "ReturnOnEquityTTM"),
        default,
        deserialize_with = "present"
    )]
    pub return_on_equity_ttm: Column,
    #[serde(
        rename(deserialize = "QuarterlyRevenueGrowthYOY"),
        default,
        deserialize_with = "present"
    )]
    pub quarterly_revenue_growth_yoy: Column,
}

impl RemoteResponse<CompanyOverview> for OverviewResponse {
    fn to_record(&self, ticker: &str) -> Result<CompanyOverview, DataError> {
        let symbol = self.symbol.clone().ok_or_else(|| DataError::Unavailable {
            provider: PROVIDER,
            ticker: ticker.to_string(),
        })?;

        Ok(CompanyOverview {
            symbol,
            pe_ratio: reported(&self.pe_ratio),
            peg_ratio: reported(&self.peg_ratio),
            return_on_equity_ttm: reported(&self.return_on_equity_ttm),
            quarterly_revenue_growth_yoy: reported(&self.quarterly_revenue_growth_yoy),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct BalanceSheetRow {
    #[serde(rename(deserialize = "fiscalDateEnding"))]
    pub fiscal_date_ending: String,
    #[serde(rename(deserialize = "totalLiabilities"), default, deserialize_with = "present")]
    pub total_liabilities: Column,
    #[serde(
        rename(deserialize = "totalShareholderEquity"),
        default,
        deserialize_with = "present"
    )]
    pub total_shareholder_equity: Column,
}

#[derive(Debug, Deserialize)]
pub struct BalanceSheetResponse {
    #[serde(rename(deserialize = "quarterlyReports"), default)]
    pub quarterly_reports: Vec<BalanceSheetRow>,
}

impl RemoteResponse<Vec<BalanceSheetReport>> for BalanceSheetResponse {
    fn to_record(&self, ticker: &str) -> Result<Vec<BalanceSheetReport>, DataError> {
        if self.quarterly_reports.is_empty() {
            return Err(DataError::Unavailable {
                provider: PROVIDER,
                ticker: ticker.to_string(),
            });
        }

        self.quarterly_reports
            .iter()
            .map(|row| {
                Ok(BalanceSheetReport {
                    fiscal_date_ending: parse_date(&row.fiscal_date_ending)?,
                    total_liabilities: reported(&row.total_liabilities),
                    total_shareholder_equity: reported(&row.total_shareholder_equity),
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct EarningsRow {
    #[serde(rename(deserialize = "fiscalDateEnding"))]
    pub fiscal_date_ending: String,
    #[serde(rename(deserialize = "reportedEPS"), default, deserialize_with = "present")]
    pub reported_eps: Column,
}

#[derive(Debug, Deserialize)]
pub struct EarningsResponse {
    #[serde(rename(deserialize = "quarterlyEarnings"), default)]
    pub quarterly_earnings: Vec<EarningsRow>,
}

impl RemoteResponse<Vec<EarningsReport>> for EarningsResponse {
    fn to_record(&self, ticker: &str) -> Result<Vec<EarningsReport>, DataError> {
        if self.quarterly_earnings.is_empty() {
            return Err(DataError::Unavailable {
                provider: PROVIDER,
                ticker: ticker.to_string(),
            });
        }

        self.quarterly_earnings
            .iter()
            .map(|row| {
                Ok(EarningsReport {
                    fiscal_date_ending: parse_date(&row.fiscal_date_ending)?,
                    reported_eps: reported(&row.reported_eps),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_quote_price() {
        let resp: QuoteResponse = serde_json::from_value(json!({
            "Global Quote": {"01. symbol": "AAPL", "05. price": "189.9800"}
        }))
        .unwrap();
        assert_eq!(resp.to_record("AAPL").unwrap(), 189.98);
    }

    #[test]
    fn test_empty_quote_is_unavailable() {
        let resp: QuoteResponse = serde_json::from_value(json!({"Global Quote": {}})).unwrap();
        assert!(matches!(
            resp.to_record("GARBAGE"),
            Err(DataError::Unavailable { .. })
        ));
    }

    #[test]
    fn test_daily_series_sorted_ascending() {
        let resp: DailySeriesResponse = serde_json::from_value(json!({
            "Meta Data": {},
            "Time Series (Daily)": {
                "2024-01-03": {"1. open": "2", "2. high": "3", "3. low": "1", "4. close": "2.5", "5. volume": "200"},
                "2024-01-02": {"1. open": "1", "2. high": "2", "3. low": "0.5", "4. close": "1.5", "5. volume": "100"}
            }
        }))
        .unwrap();
        let bars = resp.to_record("AAPL").unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date.to_string(), "2024-01-02");
        assert_eq!(bars[1].close, 2.5);
        assert_eq!(bars[1].volume, 200);
    }

    #[test]
    fn test_overview_missing_vs_null_columns() {
        let resp: OverviewResponse = serde_json::from_value(json!({
            "Symbol": "AAPL",
            "PEGRatio": "None",
            "ReturnOnEquityTTM": null,
            "QuarterlyRevenueGrowthYOY": 0.1
        }))
        .unwrap();
        let overview = resp.to_record("AAPL").unwrap();
        assert_eq!(overview.pe_ratio, Reported::Missing);
        assert_eq!(overview.peg_ratio, Reported::Null);
        assert_eq!(overview.return_on_equity_ttm, Reported::Null);
        assert_eq!(overview.quarterly_revenue_growth_yoy, Reported::Value(0.1));
    }

    #[test]
    fn test_empty_overview_is_unavailable() {
        let resp: OverviewResponse = serde_json::from_value(json!({})).unwrap();
        assert!(resp.to_record("GARBAGE").is_err());
    }

    #[test]
    fn test_earnings_rows() {
        let resp: EarningsResponse = serde_json::from_value(json!({
            "symbol": "AAPL",
            "quarterlyEarnings": [
                {"fiscalDateEnding": "2023-01-01", "reportedEPS": "1.2"},
                {"fiscalDateEnding": "2022-01-01", "reportedEPS": "1.0"}
            ]
        }))
        .unwrap();
        let reports = resp.to_record("AAPL").unwrap();
        assert_eq!(reports[0].reported_eps, Reported::Value(1.2));
        assert_eq!(reports[1].fiscal_date_ending.to_string(), "2022-01-01");
    }
}
