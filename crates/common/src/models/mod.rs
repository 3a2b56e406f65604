pub mod bar;
pub mod decision;
pub mod fundamentals;
pub mod media;
pub mod portfolio;
pub mod signal;
pub mod snapshot;

pub use bar::{Bar, HistorySpan};
pub use decision::{SkipReason, TickerOutcome, TradeDecisionRecord};
pub use fundamentals::{BalanceSheetReport, CompanyOverview, EarningsReport, Reported};
pub use media::{NewsArticle, SocialPost};
pub use portfolio::{CryptoHolding, EquityHolding, PortfolioState};
pub use signal::{GateOutcome, RiskAssessment, Signal, TradeSignal};
pub use snapshot::{Fundamentals, Macd, SnapshotBuilder, StockSnapshot, Technicals};
