use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::EnvFilter;

use analysis::AnalysisFileConfig;
use common::{Config, DataMode, MarketDataSource, NotificationSink};
use engine::{Runner, WebhookSink, YahooClient};
use replay::ReplaySource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env().context("invalid environment configuration")?;
    info!(mode = %cfg.data_mode, "Commodity watch starting");

    let analysis_cfg = AnalysisFileConfig::load(&cfg.analysis_config_path)
        .with_context(|| format!("loading {}", cfg.analysis_config_path.display()))?;
    if analysis_cfg.instruments.is_empty() {
        bail!(
            "no instruments configured in {}",
            cfg.analysis_config_path.display()
        );
    }

    // ── Market data (injected based on DATA_MODE) ─────────────────────────────
    let source: Arc<dyn MarketDataSource> = match cfg.data_mode {
        DataMode::Live => {
            info!(base_url = %cfg.yahoo_base_url, "Live mode, using Yahoo chart API");
            Arc::new(YahooClient::new(&cfg.yahoo_base_url, cfg.http_timeout)?)
        }
        DataMode::Replay => {
            info!(dir = %cfg.replay_dir.display(), "Replay mode, reading bars from disk");
            Arc::new(
                ReplaySource::from_dir(&cfg.replay_dir)
                    .with_context(|| format!("reading {}", cfg.replay_dir.display()))?,
            )
        }
    };

    // ── Notification ──────────────────────────────────────────────────────────
    let sink: Option<Arc<dyn NotificationSink>> = match &cfg.webhook_url {
        Some(url) => Some(Arc::new(WebhookSink::new(
            url.as_str(),
            cfg.webhook_username.as_str(),
            cfg.http_timeout,
        )?)),
        None => {
            info!("WEBHOOK_URL not set, reports will only be logged");
            None
        }
    };

    // ── Run ───────────────────────────────────────────────────────────────────
    let runner = Runner::new(&analysis_cfg, source, sink);
    runner.run().await;
    Ok(())
}
