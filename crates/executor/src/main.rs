use dotenvy::dotenv;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use common::config::AppConfig;
use common::logger;
use common::models::TickerOutcome;
use market_data::Brokerage;
use market_data::remote::{AlphaVantageClient, NewsApiClient, RobinhoodClient, TwitterClient};
use strategy::reasoning::{GeminiClient, ReasoningService};
use strategy::services::{RiskManager, StrategyEngine};

use crate::services::{Collaborators, Orchestrator};

mod services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::setup_logger();
    dotenv().ok();
    info!("Bot starting...");

    let config = AppConfig::from_env()?;
    debug!(
        "Tickers: {:?}, strategy: {}, limits: {:?}, budget reset: {:?}",
        config.tickers, config.strategy, config.limits, config.budget_reset
    );

    let creds = &config.credentials;
    let timeout = config.request_timeout;

    let brokerage = Arc::new(RobinhoodClient::new(
        &creds.robinhood_email,
        &creds.robinhood_password,
        timeout,
    )?);
    let sources = Collaborators {
        market: Arc::new(AlphaVantageClient::new(&creds.alpha_vantage_key, timeout)?),
        news: Arc::new(NewsApiClient::new(&creds.news_api_key, timeout)?),
        social: Arc::new(TwitterClient::new(&creds.twitter_bearer_token, timeout)?),
        brokerage: brokerage.clone(),
    };

    let reasoning: Arc<dyn ReasoningService> = Arc::new(GeminiClient::new(
        &creds.gemini_api_key,
        &config.reasoning_model,
        timeout,
    )?);
    let strategy = StrategyEngine::new(reasoning.clone(), &config.strategy)?;
    let risk = RiskManager::new(reasoning, config.limits, config.budget_reset);

    let orchestrator = Orchestrator::new(sources, strategy, risk)
        .with_history_span(config.history_span)
        .with_sell_gating(config.gate_sell_signals);

    brokerage.login().await?;

    let tickers = &config.tickers;
    let orchestrator = &orchestrator;
    run_cycles(
        move || async move { log_summary(&orchestrator.run(tickers).await) },
        config.cycle_interval,
        ctrl_c(),
    )
    .await;

    if brokerage.is_authenticated().await {
        if let Err(e) = brokerage.logout().await {
            error!("Logout failed: {}", e);
        }
    }
    info!("Bot shutting down.");
    Ok(())
}

/// Runs `cycle` once, or every `period` when set, until `shutdown` resolves.
///
/// `shutdown` is raced against the wait and against each running cycle, so a
/// request arriving mid-cycle abandons that cycle. Returns completed cycles.
async fn run_cycles<C, F, S>(mut cycle: C, period: Option<Duration>, shutdown: S) -> usize
where
    C: FnMut() -> F,
    F: Future<Output = ()>,
    S: Future,
{
    tokio::pin!(shutdown);
    let mut interval = period.map(tokio::time::interval);
    let mut completed = 0;

    if let Some(period) = period {
        info!("Running every {:?}, press Ctrl-C to stop", period);
    }

    loop {
        if let Some(interval) = interval.as_mut() {
            tokio::select! {
                _ = interval.tick() => {}
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping.");
                    break;
                }
            }
        }

        tokio::select! {
            _ = cycle() => completed += 1,
            _ = &mut shutdown => {
                warn!("Shutdown requested, abandoning the running cycle.");
                break;
            }
        }

        if interval.is_none() {
            break;
        }
    }
    completed
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

fn log_summary(outcomes: &[TickerOutcome]) {
    for outcome in outcomes {
        match outcome {
            TickerOutcome::Decided(record) => info!(
                "SUMMARY {}: signal={} gate={} confidence={} size={} id={}",
                record.ticker,
                record.signal,
                record.gate,
                record.confidence.as_deref().unwrap_or("-"),
                record
                    .position_size
                    .map(|s| format!("{:.2}", s))
                    .unwrap_or_else(|| "-".to_string()),
                record.id
            ),
            TickerOutcome::Skipped { ticker, reason } => {
                info!("SUMMARY {}: skipped ({})", ticker, reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_single_run_without_interval() {
        let mut runs = 0;
        let completed = run_cycles(
            || {
                runs += 1;
                async {}
            },
            None,
            std::future::pending::<()>(),
        )
        .await;

        assert_eq!(completed, 1);
        assert_eq!(runs, 1);
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_running_cycle() {
        let (started_tx, started_rx) = oneshot::channel::<()>();
        let mut started_tx = Some(started_tx);

        let completed = run_cycles(
            || {
                if let Some(tx) = started_tx.take() {
                    let _ = tx.send(());
                }
                std::future::pending::<()>()
            },
            Some(Duration::from_secs(3600)),
            async {
                let _ = started_rx.await;
            },
        )
        .await;

        assert_eq!(completed, 0);
    }

    #[tokio::test]
    async fn test_shutdown_between_cycles() {
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let mut stop_tx = Some(stop_tx);

        let completed = run_cycles(
            || {
                if let Some(tx) = stop_tx.take() {
                    let _ = tx.send(());
                }
                async {}
            },
            Some(Duration::from_secs(3600)),
            async {
                let _ = stop_rx.await;
            },
        )
        .await;

        assert!(completed <= 1);
    }
}
