use std::sync::Arc;

use tracing::{info, warn};

use common::models::{
    HistorySpan, Signal, SkipReason, StockSnapshot, TickerOutcome, TradeDecisionRecord,
};
use market_data::{Brokerage, MarketDataProvider, NewsProvider, SearchWindow, SocialProvider};
use strategy::analyzers::fundamentals::extract_fundamentals;
use strategy::analyzers::technical::compute_technicals;
use strategy::services::{RiskManager, StrategyEngine};

const MEDIA_LIMIT: u32 = 10;

/// External data sources and the brokerage session the pipeline reads from.
#[derive(Clone)]
pub struct Collaborators {
    pub market: Arc<dyn MarketDataProvider>,
    pub news: Arc<dyn NewsProvider>,
    pub social: Arc<dyn SocialProvider>,
    pub brokerage: Arc<dyn Brokerage>,
}

pub struct Orchestrator {
    sources: Collaborators,
    strategy: StrategyEngine,
    risk: RiskManager,
    history_span: HistorySpan,
    gate_sell_signals: bool,
}

impl Orchestrator {
    pub fn new(sources: Collaborators, strategy: StrategyEngine, risk: RiskManager) -> Self {
        Self {
            sources,
            strategy,
            risk,
            history_span: HistorySpan::default(),
            gate_sell_signals: true,
        }
    }

    pub fn with_history_span(mut self, span: HistorySpan) -> Self {
        self.history_span = span;
        self
    }

    pub fn with_sell_gating(mut self, enabled: bool) -> Self {
        self.gate_sell_signals = enabled;
        self
    }

    pub fn risk(&self) -> &RiskManager {
        &self.risk
    }

    /// Runs every ticker through the pipeline, one at a time.
    pub async fn run(&self, tickers: &[String]) -> Vec<TickerOutcome> {
        let mut outcomes = Vec::with_capacity(tickers.len());

        for ticker in tickers {
            let outcome = match self.evaluate(ticker).await {
                Ok(record) => {
                    info!(
                        "{}: {} / {} ({})",
                        ticker,
                        record.signal,
                        record.gate,
                        record.gate_reasoning.as_deref().unwrap_or(&record.signal_reasoning)
                    );
                    TickerOutcome::Decided(record)
                }
                Err(reason) => {
                    warn!("Skipping {}: {}", ticker, reason);
                    TickerOutcome::Skipped {
                        ticker: ticker.clone(),
                        reason,
                    }
                }
            };
            outcomes.push(outcome);
        }

        info!(
            "Cycle finished: {} tickers, {} trades left in budget",
            outcomes.len(),
            self.risk.remaining()
        );
        outcomes
    }

    async fn evaluate(&self, ticker: &str) -> Result<TradeDecisionRecord, SkipReason> {
        let snapshot = self.build_snapshot(ticker).await?;

        let signal = self
            .strategy
            .classify(&snapshot)
            .await
            .map_err(|e| SkipReason::ClassificationFailed(e.to_string()))?;

        let gated = match signal.signal {
            Signal::Buy => true,
            Signal::Sell => self.gate_sell_signals,
            Signal::Hold => false,
        };
        if !gated {
            return Ok(TradeDecisionRecord::unassessed(ticker, signal));
        }

        let portfolio = self
            .sources
            .brokerage
            .get_portfolio_state()
            .await
            .map_err(|e| SkipReason::PortfolioUnavailable(e.to_string()))?;

        let assessment = self
            .risk
            .evaluate(&snapshot, &portfolio)
            .await
            .map_err(|e| SkipReason::AssessmentFailed(e.to_string()))?;

        Ok(TradeDecisionRecord::assessed(ticker, signal, assessment))
    }

    async fn build_snapshot(&self, ticker: &str) -> Result<StockSnapshot, SkipReason> {
        let market = &self.sources.market;
        let window = SearchWindow::recent(MEDIA_LIMIT);

        let (price, bars, overview, balance_sheet, earnings, news, posts) = tokio::try_join!(
            market.get_latest_price(ticker),
            market.get_historical_series(ticker, self.history_span),
            market.get_company_overview(ticker),
            market.get_balance_sheet(ticker),
            market.get_earnings_history(ticker),
            self.sources.news.search(ticker, window),
            self.sources.social.search(ticker, window),
        )
        .map_err(|e| SkipReason::DataUnavailable(e.to_string()))?;

        let technicals = compute_technicals(&bars);
        if technicals.sma.is_none() || technicals.rsi.is_none() || technicals.macd.is_none() {
            return Err(SkipReason::InsufficientHistory { bars: bars.len() });
        }

        let fundamentals = extract_fundamentals(ticker, &overview, &balance_sheet, &earnings);
        info!(
            "Fetched {} news articles and {} posts for {}",
            news.len(),
            posts.len(),
            ticker
        );

        let mut builder = StockSnapshot::builder(ticker)
            .price(price)
            .technicals(technicals)
            .fundamentals(fundamentals)
            .news_articles(news)
            .social_posts(posts);
        if let Some(latest) = bars.iter().max_by_key(|b| b.date) {
            builder = builder.volume(latest.volume);
        }

        builder
            .build()
            .map_err(|e| SkipReason::InvalidSnapshot(e.to_string()))
    }
}
