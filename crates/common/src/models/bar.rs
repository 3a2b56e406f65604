use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily OHLCV row of a historical series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// How far back a historical series reaches, measured from its latest bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistorySpan {
    Month,
    #[default]
    Year,
    FiveYear,
    Full,
}

impl HistorySpan {
    pub fn months(self) -> Option<u32> {
        match self {
            Self::Month => Some(1),
            Self::Year => Some(12),
            Self::FiveYear => Some(60),
            Self::Full => None,
        }
    }
}

impl std::str::FromStr for HistorySpan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            "5year" => Ok(Self::FiveYear),
            "full" => Ok(Self::Full),
            other => Err(format!("unknown span {}", other)),
        }
    }
}
