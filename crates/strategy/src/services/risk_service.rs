use std::sync::Arc;

use serde::Deserialize;
use tracing::{error, info, warn};

use common::config::{BudgetReset, TradingLimits};
use common::error::AssessmentError;
use common::models::{GateOutcome, PortfolioState, RiskAssessment, StockSnapshot};

use crate::reasoning::{FieldKind, OutputSchema, ReasoningRequest, ReasoningService};
use crate::services::prompt;
use crate::services::trade_budget::TradeBudget;

pub const QUOTA_EXCEEDED: &str = "exceeded max daily trade count";

const SYSTEM_INSTRUCTION: &str = "You are a risk management assistant. \
Provide clear and concise risk analyses based on the data provided \
along with a detailed research and reasoning for your decision.";

fn risk_schema() -> OutputSchema {
    OutputSchema::new()
        .required("decision", FieldKind::OneOf(vec!["APPROVED", "REJECTED"]))
        .required("reasoning", FieldKind::Text)
        .optional("position_size", FieldKind::Number)
}

#[derive(Debug, Deserialize)]
struct RiskResponse {
    decision: String,
    #[serde(default)]
    reasoning: String,
    position_size: Option<f64>,
}

/// Second stage of the pipeline. Enforces the trade quota and asks an
/// independent evaluator to approve or veto a directional signal.
pub struct RiskManager {
    reasoning: Arc<dyn ReasoningService>,
    limits: TradingLimits,
    budget: TradeBudget,
}

impl RiskManager {
    pub fn new(
        reasoning: Arc<dyn ReasoningService>,
        limits: TradingLimits,
        reset: BudgetReset,
    ) -> Self {
        Self {
            reasoning,
            limits,
            budget: TradeBudget::new(limits.max_daily_trades, reset),
        }
    }

    pub fn limits(&self) -> &TradingLimits {
        &self.limits
    }

    pub fn used(&self) -> u32 {
        self.budget.used()
    }

    pub fn remaining(&self) -> u32 {
        self.budget.remaining()
    }

    fn build_prompt(&self, snapshot: &StockSnapshot, portfolio: &PortfolioState) -> String {
        format!(
            "Given the following stock data:\n\
             Basic Info: {}\n\
             Fundamentals: {}\n\
             Technicals: {}\n\
             News Articles: {}\n\
             Tweets: {}\n\
             Portfolio: {}\n\n\
             Evaluate the risk of trading this stock and respond with 'APPROVED' or 'REJECTED'.\n\
             Consider factors like volatility, fundamentals, and market sentiment.\n\
             Along with the decision, provide the position size you think is appropriate \
             if the trade is safe. The maximum size for one trade is ${:.2}. \
             Make sure the position is not over {}% of the total portfolio. \
             At most {} trades are allowed per day.",
            prompt::basic_info(snapshot),
            prompt::fundamentals(snapshot),
            prompt::technicals(snapshot),
            prompt::news_articles(snapshot),
            prompt::social_posts(snapshot),
            prompt::portfolio(portfolio),
            self.limits.max_position_size,
            self.limits.max_portfolio_share_pct,
            self.limits.max_daily_trades,
        )
    }

    pub async fn evaluate(
        &self,
        snapshot: &StockSnapshot,
        portfolio: &PortfolioState,
    ) -> Result<RiskAssessment, AssessmentError> {
        let Some(reservation) = self.budget.try_reserve() else {
            info!("Reached maximum daily trades limit.");
            return Ok(RiskAssessment {
                outcome: GateOutcome::Vetoed,
                reasoning: QUOTA_EXCEEDED.to_string(),
                position_size: None,
            });
        };

        let request = ReasoningRequest {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            prompt: self.build_prompt(snapshot, portfolio),
            schema: risk_schema(),
        };

        let answer = self.reasoning.generate(&request).await.inspect_err(|e| {
            error!("Risk assessment failed for {}: {}", snapshot.ticker(), e);
        })?;

        let response = match serde_json::from_value::<RiskResponse>(answer) {
            Ok(r) => r,
            Err(e) => {
                warn!("Unparsable risk assessment for {}: {}", snapshot.ticker(), e);
                return Ok(RiskAssessment {
                    outcome: GateOutcome::Vetoed,
                    reasoning: format!("unparsable risk assessment: {}", e),
                    position_size: None,
                });
            }
        };

        if response.decision == "APPROVED" {
            reservation.commit();
            info!(
                "Risk assessment APPROVED for {} ({} of {} trades used)",
                snapshot.ticker(),
                self.budget.used(),
                self.budget.limit()
            );
            Ok(RiskAssessment {
                outcome: GateOutcome::Approved,
                reasoning: response.reasoning,
                position_size: response.position_size,
            })
        } else {
            info!("Risk assessment REJECTED for {}.", snapshot.ticker());
            Ok(RiskAssessment {
                outcome: GateOutcome::Vetoed,
                reasoning: response.reasoning,
                position_size: None,
            })
        }
    }
}
