//! Runner behaviour over an offline source and an in-memory sink.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use analysis::{AnalysisFileConfig, InstrumentConfig, LookbackParams};
use common::{
    Error, Lookback, MarketDataSource, NotificationSink, PriceBar, PriceSeries, Report, Result,
    SignalKind,
};
use engine::{RunSummary, Runner};
use replay::ReplaySource;

#[derive(Default)]
struct RecordingSink {
    reports: Mutex<Vec<Report>>,
    fail_for: Option<String>,
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn deliver(&self, report: &Report) -> Result<()> {
        if let Some(symbol) = &self.fail_for {
            if report.title.contains(symbol.as_str()) {
                return Err(Error::Webhook("HTTP 500".into()));
            }
        }
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }
}

fn bars(closes: impl IntoIterator<Item = f64>) -> Vec<PriceBar> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    closes
        .into_iter()
        .enumerate()
        .map(|(i, c)| PriceBar::new(start + chrono::Duration::days(i as i64), c, c))
        .collect()
}

fn config(symbols: &[(&str, &str)]) -> AnalysisFileConfig {
    AnalysisFileConfig {
        instruments: symbols
            .iter()
            .map(|(name, symbol)| InstrumentConfig::new(*name, *symbol))
            .collect(),
        ..AnalysisFileConfig::default()
    }
}

fn full_source() -> ReplaySource {
    ReplaySource::new()
        .with_bars(
            "GC=F",
            bars((0..300).map(|i| 1800.0 + (i as f64 * 0.1).sin() * 20.0 + i as f64)),
        )
        .with_bars("CL=F", bars((0..300).map(|i| 90.0 - i as f64 * 0.1)))
        .with_bars("SI=F", bars((0..30).map(|i| 23.0 + (i % 4) as f64 * 0.2)))
}

#[tokio::test]
async fn outcomes_follow_configured_order() {
    let cfg = config(&[("Silver", "SI=F"), ("Gold", "GC=F"), ("Crude Oil", "CL=F")]);
    let runner = Runner::new(&cfg, Arc::new(full_source()), None);

    let outcomes = runner.run().await;
    let symbols: Vec<&str> = outcomes
        .iter()
        .map(|o| o.instrument.symbol.as_str())
        .collect();
    assert_eq!(symbols, ["SI=F", "GC=F", "CL=F"]);
}

#[tokio::test]
async fn short_history_skips_forecast_only() {
    let cfg = config(&[("Silver", "SI=F")]);
    let runner = Runner::new(&cfg, Arc::new(full_source()), None);

    let outcome = runner.run().await.remove(0);
    assert!(outcome.daily.is_ok());
    assert!(outcome.signal.is_ok());
    assert!(outcome.forecast.as_ref().unwrap_err().is_insufficient_history());
}

#[tokio::test]
async fn steady_decline_is_strong_buy_with_forecast() {
    let cfg = config(&[("Crude Oil", "CL=F")]);
    let runner = Runner::new(&cfg, Arc::new(full_source()), None);

    let outcome = runner.run().await.remove(0);
    assert_eq!(
        outcome.signal.as_ref().unwrap().signal.kind,
        SignalKind::StrongBuy
    );
    let forecast = outcome.forecast.as_ref().unwrap();
    assert_eq!(forecast.forecast.points.len(), 30);
    // 1y lookback keeps the trailing 252 bars.
    assert_eq!(forecast.forecast.fit.observations(), 252);
}

#[tokio::test]
async fn missing_instrument_does_not_change_others() {
    let cfg_all = config(&[("Gold", "GC=F"), ("Copper", "HG=F"), ("Crude Oil", "CL=F")]);
    let cfg_alone = config(&[("Gold", "GC=F"), ("Crude Oil", "CL=F")]);

    let with_missing = Runner::new(&cfg_all, Arc::new(full_source()), None)
        .run()
        .await;
    let without = Runner::new(&cfg_alone, Arc::new(full_source()), None)
        .run()
        .await;

    let copper = &with_missing[1];
    assert!(matches!(copper.daily, Err(Error::UpstreamDataUnavailable { .. })));
    assert!(matches!(copper.signal, Err(Error::UpstreamDataUnavailable { .. })));
    assert!(matches!(copper.forecast, Err(Error::UpstreamDataUnavailable { .. })));

    for (a, b) in [(&with_missing[0], &without[0]), (&with_missing[2], &without[1])] {
        assert_eq!(a.instrument, b.instrument);
        assert_eq!(a.signal.as_ref().ok(), b.signal.as_ref().ok());
        assert_eq!(
            a.forecast.as_ref().unwrap().forecast.points,
            b.forecast.as_ref().unwrap().forecast.points
        );
    }

    let summary = RunSummary::from_outcomes(&with_missing);
    assert_eq!(summary.instruments, 3);
    assert_eq!(summary.signals, 2);
    assert_eq!(summary.forecasts, 2);
    assert_eq!(summary.failed, 3);
}

#[tokio::test]
async fn delivery_failure_is_isolated() {
    let sink = Arc::new(RecordingSink {
        fail_for: Some("GC=F".into()),
        ..RecordingSink::default()
    });
    let cfg = config(&[("Gold", "GC=F"), ("Crude Oil", "CL=F")]);
    let as_sink: Arc<dyn NotificationSink> = sink.clone();
    let runner = Runner::new(&cfg, Arc::new(full_source()), Some(as_sink));

    let outcomes = runner.run().await;
    assert!(matches!(outcomes[0].delivery, Some(Err(Error::Webhook(_)))));
    assert!(matches!(outcomes[1].delivery, Some(Ok(()))));

    let reports = sink.reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].title, "Crude Oil (CL=F)");
}

#[tokio::test]
async fn nothing_delivered_for_fully_failed_instrument() {
    let sink = Arc::new(RecordingSink::default());
    let cfg = config(&[("Copper", "HG=F")]);
    let as_sink: Arc<dyn NotificationSink> = sink.clone();
    let runner = Runner::new(&cfg, Arc::new(full_source()), Some(as_sink));

    let outcome = runner.run().await.remove(0);
    assert!(outcome.delivery.is_none());
    assert!(sink.reports.lock().unwrap().is_empty());
}

/// Source that fails every call with a parse error and counts the calls.
#[derive(Default)]
struct BrokenFeed {
    calls: AtomicUsize,
}

#[async_trait]
impl MarketDataSource for BrokenFeed {
    async fn daily_bars(&self, _symbol: &str, _lookback: Lookback) -> Result<PriceSeries> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(serde_json::from_str::<Vec<PriceBar>>("<html>")
            .unwrap_err()
            .into())
    }
}

#[tokio::test]
async fn shared_lookback_fetches_once_and_keeps_error_kind() {
    let mut cfg = config(&[("Gold", "GC=F")]);
    cfg.lookback = LookbackParams {
        daily: Lookback::OneYear,
        signal: Lookback::OneYear,
        forecast: Lookback::OneYear,
    };
    let feed = Arc::new(BrokenFeed::default());
    let as_source: Arc<dyn MarketDataSource> = feed.clone();

    let outcome = Runner::new(&cfg, as_source, None).run().await.remove(0);
    assert_eq!(feed.calls.load(Ordering::SeqCst), 1);
    assert!(matches!(outcome.daily, Err(Error::Json(_))));
    assert!(matches!(outcome.signal, Err(Error::Json(_))));
    assert!(matches!(outcome.forecast, Err(Error::Json(_))));
}

#[tokio::test]
async fn invalid_recording_is_reported_as_invalid_series() {
    let cfg = config(&[("Copper", "HG=F")]);
    let source = full_source().with_bars("HG=F", vec![]);

    let outcome = Runner::new(&cfg, Arc::new(source), None)
        .run()
        .await
        .remove(0);
    assert!(matches!(outcome.daily, Err(Error::InvalidSeries { .. })));
    assert!(matches!(outcome.signal, Err(Error::InvalidSeries { .. })));
    assert!(matches!(outcome.forecast, Err(Error::InvalidSeries { .. })));
}
