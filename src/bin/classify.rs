//! One-shot classification run over the recent store window.
//! Meant to be triggered externally (cron, timer) alongside the poller.

use anyhow::Context;
use chrono::Utc;

use ticker_feed::analyze::classifier::build_classifier;
use ticker_feed::analyze::TopicVerdict;
use ticker_feed::{run_classification, telemetry, AppConfig, ArticleStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let cfg = AppConfig::load_default().context("loading config")?;
    let store = ArticleStore::open(&cfg.db_path)
        .with_context(|| format!("opening article store at {}", cfg.db_path.display()))?;
    let classifier = build_classifier(&cfg.classifier);

    let run = run_classification(&store, &cfg, classifier.as_ref(), Utc::now())
        .await
        .context("reading recent articles")?;

    for (symbol, verdict) in &run.verdicts {
        match verdict {
            TopicVerdict::Available(v) => println!(
                "{symbol:<10} {:<8} {:.2}  {}",
                format!("{:?}", v.direction).to_lowercase(),
                v.confidence,
                v.reason
            ),
            TopicVerdict::Unavailable => println!("{symbol:<10} unavailable"),
        }
    }
    match &run.snapshot {
        Some(path) => println!("saved predictions -> {}", path.display()),
        None => println!("no snapshot written (classifier reply unavailable)"),
    }
    Ok(())
}
