use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::models::{NewsArticle, SocialPost};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Macd {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Technicals {
    pub sma: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<Macd>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub pe_ratio: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub roe: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub eps_growth: Option<f64>,
    pub de_ratio: Option<f64>,
}

/// Everything known about one ticker for one evaluation cycle.
///
/// Built once through [`SnapshotBuilder`] and only ever handed out by
/// reference afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockSnapshot {
    ticker: String,
    price: Option<f64>,
    volume: Option<u64>,
    technicals: Technicals,
    fundamentals: Fundamentals,
    news_articles: Vec<NewsArticle>,
    social_posts: Vec<SocialPost>,
}

impl StockSnapshot {
    pub fn builder(ticker: impl Into<String>) -> SnapshotBuilder {
        SnapshotBuilder {
            ticker: ticker.into(),
            price: None,
            volume: None,
            technicals: Technicals::default(),
            fundamentals: Fundamentals::default(),
            news_articles: Vec::new(),
            social_posts: Vec::new(),
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn price(&self) -> Option<f64> {
        self.price
    }

    pub fn volume(&self) -> Option<u64> {
        self.volume
    }

    pub fn technicals(&self) -> &Technicals {
        &self.technicals
    }

    pub fn fundamentals(&self) -> &Fundamentals {
        &self.fundamentals
    }

    pub fn news_articles(&self) -> &[NewsArticle] {
        &self.news_articles
    }

    pub fn social_posts(&self) -> &[SocialPost] {
        &self.social_posts
    }
}

#[derive(Debug)]
pub struct SnapshotBuilder {
    ticker: String,
    price: Option<f64>,
    volume: Option<u64>,
    technicals: Technicals,
    fundamentals: Fundamentals,
    news_articles: Vec<NewsArticle>,
    social_posts: Vec<SocialPost>,
}

impl SnapshotBuilder {
    pub fn price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn volume(mut self, volume: u64) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn technicals(mut self, technicals: Technicals) -> Self {
        self.technicals = technicals;
        self
    }

    pub fn fundamentals(mut self, fundamentals: Fundamentals) -> Self {
        self.fundamentals = fundamentals;
        self
    }

    pub fn news_articles(mut self, articles: Vec<NewsArticle>) -> Self {
        self.news_articles = articles;
        self
    }

    pub fn social_posts(mut self, posts: Vec<SocialPost>) -> Self {
        self.social_posts = posts;
        self
    }

    pub fn build(self) -> Result<StockSnapshot, SnapshotError> {
        if self.ticker.trim().is_empty() {
            return Err(SnapshotError::EmptyTicker);
        }
        if let Some(price) = self.price {
            if price.is_nan() || price <= 0.0 {
                return Err(SnapshotError::NonPositivePrice(price));
            }
        }

        Ok(StockSnapshot {
            ticker: self.ticker,
            price: self.price,
            volume: self.volume,
            technicals: self.technicals,
            fundamentals: self.fundamentals,
            news_articles: self.news_articles,
            social_posts: self.social_posts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_rejects_empty_ticker() {
        let err = StockSnapshot::builder("  ").price(10.0).build().unwrap_err();
        assert_eq!(err, SnapshotError::EmptyTicker);
    }

    #[test]
    fn test_builder_rejects_non_positive_price() {
        let err = StockSnapshot::builder("AAPL").price(0.0).build().unwrap_err();
        assert_eq!(err, SnapshotError::NonPositivePrice(0.0));

        let err = StockSnapshot::builder("AAPL").price(f64::NAN).build();
        assert!(err.is_err());
    }

    #[test]
    fn test_builder_allows_absent_fields() {
        let snapshot = StockSnapshot::builder("AAPL").build().unwrap();
        assert_eq!(snapshot.ticker(), "AAPL");
        assert_eq!(snapshot.price(), None);
        assert!(snapshot.news_articles().is_empty());
        assert_eq!(snapshot.fundamentals().pe_ratio, None);
    }
}
