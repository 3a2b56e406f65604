use chrono::{DateTime, Utc};
use serde::Deserialize;

use common::error::DataError;
use common::models::{NewsArticle, SocialPost};

use crate::traits::RemoteResponse;

#[derive(Debug, Deserialize)]
pub struct ArticleSource {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ArticlePayload {
    pub source: Option<ArticleSource>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub url: Option<String>,
    #[serde(rename(deserialize = "publishedAt"))]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct EverythingResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub articles: Vec<ArticlePayload>,
}

impl RemoteResponse<Vec<NewsArticle>> for EverythingResponse {
    fn to_record(&self, ticker: &str) -> Result<Vec<NewsArticle>, DataError> {
        if self.status != "ok" {
            return Err(DataError::Request {
                provider: "newsapi",
                reason: format!(
                    "{} for {}",
                    self.message.as_deref().unwrap_or("error status"),
                    ticker
                ),
            });
        }

        // Removed articles come back with a "[Removed]" title and no body.
        Ok(self
            .articles
            .iter()
            .filter_map(|a| {
                let title = a.title.clone().filter(|t| !t.is_empty() && t != "[Removed]")?;
                Some(NewsArticle {
                    title,
                    body: a.description.clone().or_else(|| a.content.clone()),
                    source: a.source.as_ref().and_then(|s| s.name.clone()),
                    url: a.url.clone(),
                    published_at: a.published_at,
                })
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
pub struct TweetPayload {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchMeta {
    pub result_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct RecentSearchResponse {
    #[serde(default)]
    pub data: Vec<TweetPayload>,
    pub meta: Option<SearchMeta>,
}

impl RemoteResponse<Vec<SocialPost>> for RecentSearchResponse {
    fn to_record(&self, _ticker: &str) -> Result<Vec<SocialPost>, DataError> {
        Ok(self
            .data
            .iter()
            .map(|t| SocialPost {
                id: t.id.clone(),
                text: t.text.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_everything_response() {
        let resp: EverythingResponse = serde_json::from_value(json!({
            "status": "ok",
            "totalResults": 3,
            "articles": [
                {"source": {"id": null, "name": "Reuters"}, "title": "Apple beats estimates",
                 "description": "Quarterly results", "url": "https://example.com/a",
                 "publishedAt": "2024-05-02T20:30:00Z", "content": "..."},
                {"source": {"id": null, "name": "[Removed]"}, "title": "[Removed]", "description": null},
                {"title": "No body", "description": null, "content": null}
            ]
        }))
        .unwrap();

        let articles = resp.to_record("AAPL").unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Apple beats estimates");
        assert_eq!(articles[0].source.as_deref(), Some("Reuters"));
        assert_eq!(articles[0].body.as_deref(), Some("Quarterly results"));
        assert!(articles[0].published_at.is_some());
        assert_eq!(articles[1].body, None);
    }

    #[test]
    fn test_everything_error_status() {
        let resp: EverythingResponse = serde_json::from_value(json!({
            "status": "error", "code": "apiKeyInvalid", "message": "Your API key is invalid."
        }))
        .unwrap();
        assert!(resp.to_record("AAPL").is_err());
    }

    #[test]
    fn test_recent_search_without_results() {
        let resp: RecentSearchResponse =
            serde_json::from_value(json!({"meta": {"result_count": 0}})).unwrap();
        assert!(resp.to_record("AAPL").unwrap().is_empty());
    }
}
