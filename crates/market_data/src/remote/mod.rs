use std::env;

pub mod alpha_vantage_client;
pub mod alpha_vantage_response;
pub mod news_client;
pub mod news_response;
pub mod robinhood_client;
pub mod robinhood_response;

pub use alpha_vantage_client::AlphaVantageClient;
pub use news_client::{NewsApiClient, TwitterClient};
pub use robinhood_client::RobinhoodClient;

pub const USER_AGENT: &str = "tradebot/0.1.0";

pub fn get_alpha_vantage_base_url() -> String {
    env::var("ALPHA_VANTAGE_BASE_URL").unwrap_or_else(|_| "https://www.alphavantage.co".to_string())
}

pub fn get_news_api_base_url() -> String {
    env::var("NEWS_API_BASE_URL").unwrap_or_else(|_| "https://newsapi.org".to_string())
}

pub fn get_twitter_base_url() -> String {
    env::var("TWITTER_BASE_URL").unwrap_or_else(|_| "https://api.twitter.com".to_string())
}

pub fn get_robinhood_base_url() -> String {
    env::var("ROBINHOOD_BASE_URL").unwrap_or_else(|_| "https://api.robinhood.com".to_string())
}

pub fn get_robinhood_crypto_url() -> String {
    env::var("ROBINHOOD_CRYPTO_URL").unwrap_or_else(|_| "https://nummus.robinhood.com".to_string())
}
