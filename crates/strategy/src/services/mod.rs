pub mod prompt;
pub mod risk_service;
pub mod strategy_service;
pub mod trade_budget;

pub use risk_service::{QUOTA_EXCEEDED, RiskManager};
pub use strategy_service::{DEFAULT_STRATEGY, StrategyEngine, default_templates};
pub use trade_budget::{Reservation, TradeBudget};
