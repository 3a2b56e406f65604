use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{GateOutcome, RiskAssessment, Signal, TradeSignal};

/// Auditable record of what happened to one ticker in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeDecisionRecord {
    pub id: Uuid,
    pub ticker: String,
    pub signal: Signal,
    pub gate: GateOutcome,
    pub signal_reasoning: String,
    pub confidence: Option<String>,
    pub gate_reasoning: Option<String>,
    pub position_size: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl TradeDecisionRecord {
    /// A decision the gate never looked at (HOLD, or an ungated SELL).
    pub fn unassessed(ticker: impl Into<String>, signal: TradeSignal) -> Self {
        Self {
            id: Uuid::new_v4(),
            ticker: ticker.into(),
            signal: signal.signal,
            gate: GateOutcome::Unassessed,
            signal_reasoning: signal.reasoning,
            confidence: signal.confidence,
            gate_reasoning: None,
            position_size: None,
            created_at: Utc::now(),
        }
    }

    pub fn assessed(
        ticker: impl Into<String>,
        signal: TradeSignal,
        assessment: RiskAssessment,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            ticker: ticker.into(),
            signal: signal.signal,
            gate: assessment.outcome,
            signal_reasoning: signal.reasoning,
            confidence: signal.confidence,
            gate_reasoning: Some(assessment.reasoning),
            position_size: assessment.position_size,
            created_at: Utc::now(),
        }
    }
}

/// Why a ticker produced no decision this cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    DataUnavailable(String),
    InsufficientHistory { bars: usize },
    InvalidSnapshot(String),
    ClassificationFailed(String),
    PortfolioUnavailable(String),
    AssessmentFailed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DataUnavailable(cause) => write!(f, "data unavailable: {}", cause),
            Self::InsufficientHistory { bars } => {
                write!(f, "insufficient history ({} bars)", bars)
            }
            Self::InvalidSnapshot(cause) => write!(f, "invalid snapshot: {}", cause),
            Self::ClassificationFailed(cause) => write!(f, "classification failed: {}", cause),
            Self::PortfolioUnavailable(cause) => write!(f, "portfolio unavailable: {}", cause),
            Self::AssessmentFailed(cause) => write!(f, "risk assessment failed: {}", cause),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickerOutcome {
    Decided(TradeDecisionRecord),
    Skipped { ticker: String, reason: SkipReason },
}

impl TickerOutcome {
    pub fn ticker(&self) -> &str {
        match self {
            Self::Decided(record) => &record.ticker,
            Self::Skipped { ticker, .. } => ticker,
        }
    }

    pub fn decision(&self) -> Option<&TradeDecisionRecord> {
        match self {
            Self::Decided(record) => Some(record),
            Self::Skipped { .. } => None,
        }
    }
}
