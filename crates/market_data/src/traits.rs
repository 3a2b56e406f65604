use async_trait::async_trait;
use chrono::{Months, NaiveDate, Utc};

use common::error::{BrokerageError, DataError};
use common::models::{
    BalanceSheetReport, Bar, CompanyOverview, EarningsReport, HistorySpan, NewsArticle,
    PortfolioState, SocialPost,
};

/// Converts a decoded vendor payload into one of our typed records.
pub trait RemoteResponse<T> {
    fn to_record(&self, ticker: &str) -> Result<T, DataError>;
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn get_latest_price(&self, ticker: &str) -> Result<f64, DataError>;

    /// Daily bars in ascending date order, trimmed to `span`.
    async fn get_historical_series(
        &self,
        ticker: &str,
        span: HistorySpan,
    ) -> Result<Vec<Bar>, DataError>;

    async fn get_company_overview(&self, ticker: &str) -> Result<CompanyOverview, DataError>;

    async fn get_balance_sheet(&self, ticker: &str) -> Result<Vec<BalanceSheetReport>, DataError>;

    async fn get_earnings_history(&self, ticker: &str) -> Result<Vec<EarningsReport>, DataError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub limit: u32,
}

impl SearchWindow {
    /// From one month ago up to `today`.
    pub fn last_month(today: NaiveDate, limit: u32) -> Self {
        Self {
            from: today.checked_sub_months(Months::new(1)).unwrap_or(today),
            to: today,
            limit,
        }
    }

    pub fn recent(limit: u32) -> Self {
        Self::last_month(Utc::now().date_naive(), limit)
    }
}

#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn search(&self, query: &str, window: SearchWindow) -> Result<Vec<NewsArticle>, DataError>;
}

#[async_trait]
pub trait SocialProvider: Send + Sync {
    async fn search(&self, query: &str, window: SearchWindow) -> Result<Vec<SocialPost>, DataError>;
}

/// Authenticated brokerage session. Calls other than `login` require a
/// prior successful login and fail with `NotAuthenticated` otherwise.
#[async_trait]
pub trait Brokerage: Send + Sync {
    async fn login(&self) -> Result<(), BrokerageError>;

    async fn logout(&self) -> Result<(), BrokerageError>;

    async fn is_authenticated(&self) -> bool;

    async fn get_portfolio_state(&self) -> Result<PortfolioState, BrokerageError>;
}

/// Keeps the bars no older than `span` before the latest bar.
pub fn trim_to_span(bars: Vec<Bar>, span: HistorySpan) -> Vec<Bar> {
    let (Some(months), Some(latest)) = (span.months(), bars.iter().map(|b| b.date).max()) else {
        return bars;
    };
    let Some(cutoff) = latest.checked_sub_months(Months::new(months)) else {
        return bars;
    };
    bars.into_iter().filter(|b| b.date >= cutoff).collect()
}
