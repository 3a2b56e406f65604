use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use common::error::{ClassificationError, StrategyError};
use common::models::{Signal, StockSnapshot, TradeSignal};

use crate::reasoning::{FieldKind, OutputSchema, ReasoningRequest, ReasoningService};
use crate::services::prompt;

pub const DEFAULT_STRATEGY: &str = "basic_analysis";

const SYSTEM_INSTRUCTION: &str = "You are a financial trading assistant. \
Provide clear and concise trading signals based on the data provided \
along with a detailed research and reasoning for your decision.";

const BASIC_ANALYSIS: &str = "Given the following stock data:\n\
Basic Info: {basic_info}\n\
Fundamentals: {fundamentals}\n\
Technicals: {technicals}\n\
News Articles: {news_articles}\n\
Tweets: {social_posts}\n\
Provide a concise trading signal (BUY, SELL, HOLD) with reasoning and your confidence (High, Medium, Low).";

/// Built-in prompt templates keyed by strategy name.
///
/// Templates may reference `{basic_info}`, `{fundamentals}`, `{technicals}`,
/// `{news_articles}` and `{social_posts}`.
pub fn default_templates() -> HashMap<String, String> {
    HashMap::from([(DEFAULT_STRATEGY.to_string(), BASIC_ANALYSIS.to_string())])
}

fn signal_schema() -> OutputSchema {
    OutputSchema::new()
        .required("signal", FieldKind::OneOf(vec!["BUY", "SELL", "HOLD"]))
        .required("reasoning", FieldKind::Text)
        .required("confidence", FieldKind::OneOf(vec!["High", "Medium", "Low"]))
}

#[derive(Debug, Deserialize)]
struct SignalResponse {
    signal: String,
    reasoning: String,
    confidence: Option<String>,
}

/// First stage of the pipeline: snapshot in, BUY/SELL/HOLD out.
pub struct StrategyEngine {
    reasoning: Arc<dyn ReasoningService>,
    templates: HashMap<String, String>,
    strategy: String,
    active_template: String,
}

impl StrategyEngine {
    pub fn new(reasoning: Arc<dyn ReasoningService>, strategy: &str) -> Result<Self, StrategyError> {
        Self::with_templates(reasoning, default_templates(), strategy)
    }

    pub fn with_templates(
        reasoning: Arc<dyn ReasoningService>,
        templates: HashMap<String, String>,
        strategy: &str,
    ) -> Result<Self, StrategyError> {
        let active_template = templates
            .get(strategy)
            .cloned()
            .ok_or_else(|| StrategyError::UnknownStrategy(strategy.to_string()))?;

        info!(
            "Strategy engine using '{}' ({} templates registered)",
            strategy,
            templates.len()
        );
        Ok(Self {
            reasoning,
            templates,
            strategy: strategy.to_string(),
            active_template,
        })
    }

    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    pub fn format_prompt(template: &str, snapshot: &StockSnapshot) -> String {
        prompt::fill_template(template, snapshot)
    }

    /// Classifies with the strategy chosen at construction.
    pub async fn classify(&self, snapshot: &StockSnapshot) -> Result<TradeSignal, ClassificationError> {
        self.run(&self.active_template, snapshot).await
    }

    /// Classifies with any registered strategy.
    pub async fn classify_with(
        &self,
        snapshot: &StockSnapshot,
        strategy: &str,
    ) -> Result<TradeSignal, StrategyError> {
        let template = self
            .templates
            .get(strategy)
            .ok_or_else(|| StrategyError::UnknownStrategy(strategy.to_string()))?;
        Ok(self.run(template, snapshot).await?)
    }

    async fn run(
        &self,
        template: &str,
        snapshot: &StockSnapshot,
    ) -> Result<TradeSignal, ClassificationError> {
        let request = ReasoningRequest {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            prompt: Self::format_prompt(template, snapshot),
            schema: signal_schema(),
        };
        debug!("Classification prompt for {}:\n{}", snapshot.ticker(), request.prompt);

        let answer = self.reasoning.generate(&request).await?;
        let response: SignalResponse = serde_json::from_value(answer).map_err(|e| {
            warn!("Malformed classification for {}: {}", snapshot.ticker(), e);
            ClassificationError::Malformed(e.to_string())
        })?;

        let signal = Signal::from_label(&response.signal);
        info!(
            "Signal for {}: {} (confidence: {})",
            snapshot.ticker(),
            signal,
            response.confidence.as_deref().unwrap_or("n/a")
        );

        Ok(TradeSignal {
            signal,
            reasoning: response.reasoning,
            confidence: response.confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::{MockReasoningService, ScriptedReasoning};
    use common::error::ReasoningError;
    use common::models::{NewsArticle, SocialPost};
    use serde_json::json;

    fn snapshot() -> StockSnapshot {
        StockSnapshot::builder("AAPL").price(187.5).volume(1_000).build().unwrap()
    }

    fn answering(label: &str) -> Arc<MockReasoningService> {
        let label = label.to_string();
        let mut mock = MockReasoningService::new();
        mock.expect_generate().times(1).returning(move |_| {
            Ok(json!({"signal": label.clone(), "reasoning": "because", "confidence": "High"}))
        });
        Arc::new(mock)
    }

    #[tokio::test]
    async fn test_exact_labels_are_directional() {
        let engine = StrategyEngine::new(answering("BUY"), DEFAULT_STRATEGY).unwrap();
        let signal = engine.classify(&snapshot()).await.unwrap();
        assert_eq!(signal.signal, Signal::Buy);
        assert_eq!(signal.reasoning, "because");
        assert_eq!(signal.confidence.as_deref(), Some("High"));

        let engine = StrategyEngine::new(answering("SELL"), DEFAULT_STRATEGY).unwrap();
        assert_eq!(engine.classify(&snapshot()).await.unwrap().signal, Signal::Sell);
    }

    #[tokio::test]
    async fn test_defaults_to_hold() {
        for label in ["HOLD", "buy", "STRONG BUY", "SELL NOW", ""] {
            let engine = StrategyEngine::new(answering(label), DEFAULT_STRATEGY).unwrap();
            let signal = engine.classify(&snapshot()).await.unwrap();
            assert_eq!(signal.signal, Signal::Hold, "label {:?}", label);
        }
    }

    #[tokio::test]
    async fn test_unknown_strategy() {
        let mut mock = MockReasoningService::new();
        mock.expect_generate().times(0);
        let reasoning: Arc<dyn ReasoningService> = Arc::new(mock);

        assert!(matches!(
            StrategyEngine::new(reasoning.clone(), "momentum"),
            Err(StrategyError::UnknownStrategy(name)) if name == "momentum"
        ));

        let engine = StrategyEngine::new(reasoning, DEFAULT_STRATEGY).unwrap();
        let err = engine.classify_with(&snapshot(), "momentum").await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown strategy: momentum");
    }

    #[tokio::test]
    async fn test_registered_template_is_used() {
        let reasoning = Arc::new(ScriptedReasoning::new().respond(json!({
            "signal": "HOLD", "reasoning": "flat", "confidence": "Low"
        })));
        let mut templates = default_templates();
        templates.insert("terse".to_string(), "Ticker {basic_info}".to_string());

        let engine = StrategyEngine::with_templates(reasoning.clone(), templates, "terse").unwrap();
        engine.classify(&snapshot()).await.unwrap();

        let sent = reasoning.requests();
        assert!(sent[0].prompt.starts_with("Ticker {Ticker: AAPL"));
        assert_eq!(sent[0].schema, signal_schema());
    }

    #[tokio::test]
    async fn test_reasoning_failure_is_classification_error() {
        let mut mock = MockReasoningService::new();
        mock.expect_generate()
            .times(1)
            .returning(|_| Err(ReasoningError::Request("timeout".to_string())));
        let engine = StrategyEngine::new(Arc::new(mock), DEFAULT_STRATEGY).unwrap();

        assert!(matches!(
            engine.classify(&snapshot()).await,
            Err(ClassificationError::Reasoning(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_output_is_classification_error() {
        let mut mock = MockReasoningService::new();
        mock.expect_generate()
            .times(1)
            .returning(|_| Ok(json!({"verdict": "BUY"})));
        let engine = StrategyEngine::new(Arc::new(mock), DEFAULT_STRATEGY).unwrap();

        assert!(matches!(
            engine.classify(&snapshot()).await,
            Err(ClassificationError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_prompt_marks_unknowns_and_caps_media() {
        let news = (0..4)
            .map(|i| NewsArticle {
                title: if i == 0 {
                    "{basic_info} injected".to_string()
                } else {
                    format!("headline {}", i)
                },
                body: Some("body".to_string()),
                source: None,
                url: None,
                published_at: None,
            })
            .collect();
        let posts = (0..4)
            .map(|i| SocialPost {
                id: i.to_string(),
                text: format!("tweet {}", i),
            })
            .collect();
        let snapshot = StockSnapshot::builder("TSLA")
            .news_articles(news)
            .social_posts(posts)
            .build()
            .unwrap();

        let mut mock = MockReasoningService::new();
        mock.expect_generate()
            .withf(|request| {
                request.prompt.contains("Latest Price: unknown")
                    && request.prompt.contains("PE Ratio: unknown")
                    && request.prompt.contains("RSI: unknown")
                    && request.prompt.contains("headline 2")
                    && !request.prompt.contains("headline 3")
                    && request.prompt.contains("tweet 2")
                    && request.prompt.contains("{basic_info} injected")
                    && !request.prompt.contains("tweet 3")
                    && request.system_instruction.contains("financial trading assistant")
            })
            .times(1)
            .returning(|_| Ok(json!({"signal": "HOLD", "reasoning": "n/a", "confidence": "Low"})));

        let engine = StrategyEngine::new(Arc::new(mock), DEFAULT_STRATEGY).unwrap();
        engine.classify(&snapshot).await.unwrap();
    }
}
