// src/telemetry.rs
use std::net::SocketAddr;

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_METRICS_ADDR: &str = "METRICS_ADDR";

/// Install the global tracing subscriber.
/// Filter comes from RUST_LOG (default `info`); `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    // try_init: a second call (tests, embedding) is a no-op instead of a panic
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

/// Serve Prometheus metrics on `$METRICS_ADDR` when set. Must run inside a Tokio runtime.
/// Returns the bound address, or `None` when metrics export is off.
pub fn init_metrics_exporter() -> anyhow::Result<Option<SocketAddr>> {
    let Ok(raw) = std::env::var(ENV_METRICS_ADDR) else {
        return Ok(None);
    };
    let addr: SocketAddr = raw
        .trim()
        .parse()
        .with_context(|| format!("parsing {ENV_METRICS_ADDR}={raw}"))?;
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("prometheus: install exporter")?;
    Ok(Some(addr))
}
