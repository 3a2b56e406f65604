use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use common::error::DataError;
use common::models::{BalanceSheetReport, Bar, CompanyOverview, EarningsReport, HistorySpan};

use crate::remote::alpha_vantage_response::{
    BalanceSheetResponse, DailySeriesResponse, EarningsResponse, OverviewResponse, QuoteResponse,
};
use crate::remote::{USER_AGENT, get_alpha_vantage_base_url};
use crate::traits::{MarketDataProvider, RemoteResponse, trim_to_span};

const PROVIDER: &str = "alpha_vantage";

pub struct AlphaVantageClient {
    client: Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
}

impl AlphaVantageClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, DataError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| DataError::Request {
                provider: PROVIDER,
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: get_alpha_vantage_base_url(),
            api_key: api_key.into(),
            max_retries: 3,
        })
    }

    async fn query<T>(&self, function: &str, ticker: &str, extra: &[(&str, &str)]) -> Result<T, DataError>
    where
        T: DeserializeOwned,
    {
        let mut retry_count = 0;

        loop {
            match self.make_request(function, ticker, extra).await {
                Ok(body) => {
                    return serde_json::from_value::<T>(body).map_err(|e| DataError::Decode {
                        provider: PROVIDER,
                        reason: format!("{} for {}: {}", function, ticker, e),
                    });
                }
                Err(e) if e.is_rate_limit() => {
                    retry_count += 1;
                    if retry_count > self.max_retries {
                        warn!("Max retries exceeded for {} {}", function, ticker);
                        return Err(e);
                    }

                    let backoff_seconds = 2_u64.pow(retry_count);
                    warn!(
                        "Rate limited on {} for {}, backing off for {} seconds (attempt {}/{})",
                        function, ticker, backoff_seconds, retry_count, self.max_retries
                    );
                    sleep(Duration::from_secs(backoff_seconds)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn make_request(
        &self,
        function: &str,
        ticker: &str,
        extra: &[(&str, &str)],
    ) -> Result<Value, DataError> {
        let url = format!("{}/query", self.base_url);
        let symbol = ticker.to_uppercase();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("function", function),
                ("symbol", symbol.as_str()),
                ("apikey", self.api_key.as_str()),
            ])
            .query(extra)
            .send()
            .await
            .map_err(|e| DataError::Request {
                provider: PROVIDER,
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(DataError::RateLimited { provider: PROVIDER });
        }
        if !status.is_success() {
            return Err(DataError::Request {
                provider: PROVIDER,
                reason: format!("HTTP {} on {}", status, function),
            });
        }

        let body = response.json::<Value>().await.map_err(|e| DataError::Decode {
            provider: PROVIDER,
            reason: e.to_string(),
        })?;

        classify_body(body, ticker)
    }
}

/// Alpha Vantage reports throttling and unknown symbols inside a 200 body.
pub(crate) fn classify_body(body: Value, ticker: &str) -> Result<Value, DataError> {
    if body.get("Note").is_some() || body.get("Information").is_some() {
        return Err(DataError::RateLimited { provider: PROVIDER });
    }
    if let Some(message) = body.get("Error Message") {
        debug!("Alpha Vantage error for {}: {}", ticker, message);
        return Err(DataError::Unavailable {
            provider: PROVIDER,
            ticker: ticker.to_string(),
        });
    }
    Ok(body)
}

#[async_trait]
impl MarketDataProvider for AlphaVantageClient {
    async fn get_latest_price(&self, ticker: &str) -> Result<f64, DataError> {
        let price = self
            .query::<QuoteResponse>("GLOBAL_QUOTE", ticker, &[])
            .await?
            .to_record(ticker)?;
        info!("Got latest price for {}: {:.2}", ticker, price);
        Ok(price)
    }

    async fn get_historical_series(
        &self,
        ticker: &str,
        span: HistorySpan,
    ) -> Result<Vec<Bar>, DataError> {
        let bars = self
            .query::<DailySeriesResponse>("TIME_SERIES_DAILY", ticker, &[("outputsize", "full")])
            .await?
            .to_record(ticker)?;
        let bars = trim_to_span(bars, span);
        debug!("Got {} daily bars for {} ({:?})", bars.len(), ticker, span);
        Ok(bars)
    }

    async fn get_company_overview(&self, ticker: &str) -> Result<CompanyOverview, DataError> {
        self.query::<OverviewResponse>("OVERVIEW", ticker, &[])
            .await?
            .to_record(ticker)
    }

    async fn get_balance_sheet(&self, ticker: &str) -> Result<Vec<BalanceSheetReport>, DataError> {
        self.query::<BalanceSheetResponse>("BALANCE_SHEET", ticker, &[])
            .await?
            .to_record(ticker)
    }

    async fn get_earnings_history(&self, ticker: &str) -> Result<Vec<EarningsReport>, DataError> {
        self.query::<EarningsResponse>("EARNINGS", ticker, &[])
            .await?
            .to_record(ticker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_throttle_note_is_rate_limit() {
        let body = json!({"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."});
        assert!(classify_body(body, "AAPL").unwrap_err().is_rate_limit());

        let body = json!({"Information": "daily rate limit reached"});
        assert!(classify_body(body, "AAPL").unwrap_err().is_rate_limit());
    }

    #[test]
    fn test_error_message_is_unavailable() {
        let body = json!({"Error Message": "Invalid API call."});
        assert!(matches!(
            classify_body(body, "GARBAGE"),
            Err(DataError::Unavailable { .. })
        ));
    }

    #[test]
    fn test_regular_body_passes_through() {
        let body = json!({"Symbol": "AAPL"});
        assert_eq!(classify_body(body.clone(), "AAPL").unwrap(), body);
    }
}
