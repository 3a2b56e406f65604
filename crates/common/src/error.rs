use thiserror::Error;

/// A collaborator returned no usable data. Always recoverable: the ticker is skipped.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("{provider}: no data for {ticker}")]
    Unavailable {
        provider: &'static str,
        ticker: String,
    },
    #[error("{provider}: rate limited")]
    RateLimited { provider: &'static str },
    #[error("{provider}: request failed: {reason}")]
    Request {
        provider: &'static str,
        reason: String,
    },
    #[error("{provider}: unexpected payload: {reason}")]
    Decode {
        provider: &'static str,
        reason: String,
    },
}

impl DataError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error("reasoning request failed: {0}")]
    Request(String),
    #[error("reasoning service answered HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("reasoning service returned no candidates")]
    EmptyResponse,
    #[error("reasoning output is not a JSON object: {0}")]
    InvalidJson(String),
    #[error("no scripted response left")]
    Exhausted,
}

#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error(transparent)]
    Reasoning(#[from] ReasoningError),
    #[error("classifier output does not match schema: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum AssessmentError {
    #[error(transparent)]
    Reasoning(#[from] ReasoningError),
}

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),
    #[error(transparent)]
    Classification(#[from] ClassificationError),
}

#[derive(Debug, Error)]
pub enum BrokerageError {
    #[error("User is not logged in.")]
    NotAuthenticated,
    #[error("login rejected: {0}")]
    Login(String),
    #[error("brokerage request failed: {0}")]
    Request(String),
    #[error("unexpected brokerage payload: {0}")]
    Decode(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum FundamentalsError {
    #[error("Invalid column name: {0}")]
    MissingField(&'static str),
    #[error("{0} is zero")]
    ZeroDenominator(&'static str),
}

#[derive(Debug, Error, PartialEq)]
pub enum SnapshotError {
    #[error("ticker must not be empty")]
    EmptyTicker,
    #[error("price must be positive, got {0}")]
    NonPositivePrice(f64),
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}
