use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use common::{Error, Lookback, MarketDataSource, PriceBar, PriceSeries, Result};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Yahoo rejects requests without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) commodity-watch/0.1";

/// Client for the Yahoo Finance chart API. Read-only, no credentials.
pub struct YahooClient {
    base_url: String,
    http: Client,
}

impl YahooClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn get_chart(&self, symbol: &str, lookback: Lookback) -> Result<String> {
        let url = format!("{}/v8/finance/chart/{symbol}", self.base_url);
        let unavailable = |reason: String| Error::UpstreamDataUnavailable {
            symbol: symbol.to_string(),
            reason,
        };

        let resp = self
            .http
            .get(&url)
            .query(&[("range", lookback.as_range()), ("interval", "1d")])
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| unavailable(e.to_string()))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ChartResponse>(&body)
                .ok()
                .and_then(|r| r.chart.error)
                .map(|e| e.description)
                .unwrap_or(body);
            return Err(unavailable(format!("HTTP {status}: {detail}")));
        }
        Ok(body)
    }
}

#[async_trait]
impl MarketDataSource for YahooClient {
    async fn daily_bars(&self, symbol: &str, lookback: Lookback) -> Result<PriceSeries> {
        debug!(symbol, lookback = %lookback, "Fetching daily bars from Yahoo");
        let body = self.get_chart(symbol, lookback).await?;
        parse_chart(symbol, &body)
    }
}

/// Turn a chart API body into a clean series.
///
/// Timestamps are shifted by the exchange `gmtoffset` before taking the
/// date, rows with a null open or close are dropped, and duplicate dates
/// keep the last row.
pub fn parse_chart(symbol: &str, body: &str) -> Result<PriceSeries> {
    let unavailable = |reason: String| Error::UpstreamDataUnavailable {
        symbol: symbol.to_string(),
        reason,
    };

    let resp: ChartResponse = serde_json::from_str(body)?;
    if let Some(err) = resp.chart.error {
        return Err(unavailable(format!("{}: {}", err.code, err.description)));
    }
    let result = resp
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| unavailable("empty chart result".to_string()))?;
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| unavailable("chart result has no quote block".to_string()))?;

    let offset = result.meta.gmtoffset;
    let bars: Vec<PriceBar> = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let open = quote.open.get(i).copied().flatten()?;
            let close = quote.close.get(i).copied().flatten()?;
            let date = DateTime::from_timestamp(ts + offset, 0)?.date_naive();
            Some(PriceBar::new(date, open, close))
        })
        .collect();

    if bars.is_empty() {
        return Err(unavailable("no complete bars in chart result".to_string()));
    }
    PriceSeries::from_unsorted(symbol, bars)
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}
