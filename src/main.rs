//! Feed poller binary.
//! Loads config, opens the article store, and polls every configured feed
//! until Ctrl-C. The cycle in flight at interrupt time is allowed to finish.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::info;

use ticker_feed::ingest::providers::sources_from_config;
use ticker_feed::{telemetry, AppConfig, ArticleStore, PollScheduler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    if let Some(addr) = telemetry::init_metrics_exporter()? {
        info!(%addr, "metrics exporter listening");
    }

    let cfg = AppConfig::load_default().context("loading config")?;

    // The only fatal failure: no usable store before the first cycle.
    let store = ArticleStore::open(&cfg.db_path)
        .with_context(|| format!("opening article store at {}", cfg.db_path.display()))?;
    let sources = sources_from_config(&cfg).context("building feed http client")?;

    let scheduler = PollScheduler::new(sources, Arc::new(store), cfg.scheduler_cfg());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, finishing current cycle");
            let _ = shutdown_tx.send(true);
        }
    });

    scheduler.run_forever(shutdown_rx).await;
    Ok(())
}
