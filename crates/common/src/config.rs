use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::HistorySpan;

/// Hard limits the risk gate enforces and quotes back to the evaluator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradingLimits {
    pub max_position_size: f64,
    pub max_daily_trades: u32,
    pub max_portfolio_share_pct: f64,
}

impl Default for TradingLimits {
    fn default() -> Self {
        Self {
            max_position_size: 1_000.0,
            max_daily_trades: 5,
            max_portfolio_share_pct: 10.0,
        }
    }
}

/// When the trade budget starts over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BudgetReset {
    /// Counter resets whenever the UTC calendar date changes.
    #[default]
    Daily,
    /// Counter only resets on process start.
    Process,
}

impl FromStr for BudgetReset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "process" => Ok(Self::Process),
            other => Err(format!("unknown reset policy {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub robinhood_email: String,
    pub robinhood_password: String,
    pub alpha_vantage_key: String,
    pub news_api_key: String,
    pub twitter_bearer_token: String,
    pub gemini_api_key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub credentials: Credentials,
    pub tickers: Vec<String>,
    pub strategy: String,
    pub limits: TradingLimits,
    pub gate_sell_signals: bool,
    pub budget_reset: BudgetReset,
    pub history_span: HistorySpan,
    pub request_timeout: Duration,
    pub reasoning_model: String,
    pub cycle_interval: Option<Duration>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let credentials = Credentials {
            robinhood_email: required("ROBINHOOD_EMAIL")?,
            robinhood_password: required("ROBINHOOD_PWD")?,
            alpha_vantage_key: required("AV_API_KEY")?,
            news_api_key: required("NEWS_API_KEY")?,
            twitter_bearer_token: required("TWITTER_BEARER_TOKEN")?,
            gemini_api_key: required("GEMINI_API_KEY")?,
        };

        let defaults = TradingLimits::default();
        let limits = TradingLimits {
            max_position_size: parsed(&lookup, "MAX_POSITION_SIZE", defaults.max_position_size)?,
            max_daily_trades: parsed(&lookup, "MAX_DAILY_TRADES", defaults.max_daily_trades)?,
            max_portfolio_share_pct: parsed(
                &lookup,
                "MAX_PORTFOLIO_SHARE_PCT",
                defaults.max_portfolio_share_pct,
            )?,
        };

        let tickers: Vec<String> = lookup("TICKERS")
            .unwrap_or_else(|| "AAPL,TSLA".to_string())
            .split(',')
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty())
            .collect();
        if tickers.is_empty() {
            return Err(ConfigError::Invalid {
                key: "TICKERS",
                value: String::new(),
            });
        }

        let cycle_secs: u64 = parsed(&lookup, "CYCLE_INTERVAL_SECS", 0)?;

        Ok(Self {
            credentials,
            tickers,
            strategy: lookup("STRATEGY").unwrap_or_else(|| "basic_analysis".to_string()),
            limits,
            gate_sell_signals: parsed(&lookup, "GATE_SELL_SIGNALS", true)?,
            budget_reset: parsed(&lookup, "TRADE_BUDGET_RESET", BudgetReset::default())?,
            history_span: parsed(&lookup, "HISTORY_SPAN", HistorySpan::default())?,
            request_timeout: Duration::from_secs(parsed(&lookup, "REQUEST_TIMEOUT_SECS", 30)?),
            reasoning_model: lookup("REASONING_MODEL")
                .unwrap_or_else(|| "gemini-2.5-flash".to_string()),
            cycle_interval: (cycle_secs > 0).then(|| Duration::from_secs(cycle_secs)),
        })
    }
}

fn parsed<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}
