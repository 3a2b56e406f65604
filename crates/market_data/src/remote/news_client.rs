use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use common::error::DataError;
use common::models::{NewsArticle, SocialPost};

use crate::remote::news_response::{EverythingResponse, RecentSearchResponse};
use crate::remote::{USER_AGENT, get_news_api_base_url, get_twitter_base_url};
use crate::traits::{NewsProvider, RemoteResponse, SearchWindow, SocialProvider};

fn build_client(provider: &'static str, timeout: Duration) -> Result<Client, DataError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| DataError::Request {
            provider,
            reason: e.to_string(),
        })
}

fn request_error(provider: &'static str) -> impl Fn(reqwest::Error) -> DataError {
    move |e| DataError::Request {
        provider,
        reason: e.to_string(),
    }
}

pub struct NewsApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    language: String,
}

impl NewsApiClient {
    const PROVIDER: &'static str = "newsapi";

    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, DataError> {
        Ok(Self {
            client: build_client(Self::PROVIDER, timeout)?,
            base_url: get_news_api_base_url(),
            api_key: api_key.into(),
            language: "en".to_string(),
        })
    }
}

#[async_trait]
impl NewsProvider for NewsApiClient {
    async fn search(&self, query: &str, window: SearchWindow) -> Result<Vec<NewsArticle>, DataError> {
        let url = format!("{}/v2/everything", self.base_url);
        let from = window.from.format("%Y-%m-%d").to_string();
        let to = window.to.format("%Y-%m-%d").to_string();
        let page_size = window.limit.clamp(1, 100).to_string();

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("q", query),
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("language", self.language.as_str()),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .map_err(request_error(Self::PROVIDER))?;

        if response.status().as_u16() == 429 {
            return Err(DataError::RateLimited {
                provider: Self::PROVIDER,
            });
        }

        // NewsAPI explains failures in the body, so decode before checking status.
        let body = response
            .json::<EverythingResponse>()
            .await
            .map_err(|e| DataError::Decode {
                provider: Self::PROVIDER,
                reason: e.to_string(),
            })?;

        let articles = body.to_record(query)?;
        info!(
            "Fetched {} articles for query: {} from {} to {}",
            articles.len(),
            query,
            from,
            to
        );
        Ok(articles)
    }
}

pub struct TwitterClient {
    client: Client,
    base_url: String,
    bearer_token: String,
}

impl TwitterClient {
    const PROVIDER: &'static str = "twitter";

    pub fn new(bearer_token: impl Into<String>, timeout: Duration) -> Result<Self, DataError> {
        Ok(Self {
            client: build_client(Self::PROVIDER, timeout)?,
            base_url: get_twitter_base_url(),
            bearer_token: bearer_token.into(),
        })
    }
}

#[async_trait]
impl SocialProvider for TwitterClient {
    /// Recent search only covers the last seven days, so the window's dates
    /// are not forwarded; only its limit is.
    async fn search(&self, query: &str, window: SearchWindow) -> Result<Vec<SocialPost>, DataError> {
        let url = format!("{}/2/tweets/search/recent", self.base_url);
        // The endpoint rejects max_results outside 10..=100.
        let max_results = window.limit.clamp(10, 100).to_string();

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .query(&[("query", query), ("max_results", max_results.as_str())])
            .send()
            .await
            .map_err(request_error(Self::PROVIDER))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(DataError::RateLimited {
                provider: Self::PROVIDER,
            });
        }
        if !status.is_success() {
            return Err(DataError::Request {
                provider: Self::PROVIDER,
                reason: format!("HTTP {} searching {}", status, query),
            });
        }

        let body = response
            .json::<RecentSearchResponse>()
            .await
            .map_err(|e| DataError::Decode {
                provider: Self::PROVIDER,
                reason: e.to_string(),
            })?;

        let mut posts = body.to_record(query)?;
        posts.truncate(window.limit as usize);
        info!(
            "Fetched {} tweets for query: {}",
            body.meta.map(|m| m.result_count).unwrap_or(0),
            query
        );
        Ok(posts)
    }
}
