use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use common::{Error, Lookback, MarketDataSource, PriceBar, PriceSeries, Result};

/// Offline market-data source.
///
/// Serves daily bars recorded earlier, either inserted in memory or loaded
/// from a directory holding one `<SYMBOL>.json` file per instrument (a JSON
/// array of `{"date": "2024-01-02", "open": .., "close": ..}`). No network
/// access is ever made.
#[derive(Debug, Default, Clone)]
pub struct ReplaySource {
    bars: HashMap<String, Vec<PriceBar>>,
}

impl ReplaySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bars for a symbol, replacing any earlier entry.
    pub fn with_bars(mut self, symbol: impl Into<String>, bars: Vec<PriceBar>) -> Self {
        self.insert(symbol, bars);
        self
    }

    pub fn insert(&mut self, symbol: impl Into<String>, bars: Vec<PriceBar>) {
        self.bars.insert(symbol.into(), bars);
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.bars.keys().map(String::as_str)
    }

    /// Load every `*.json` file in `dir`; the file stem is the symbol.
    ///
    /// A file that cannot be read or parsed is skipped, so its symbol later
    /// reports `UpstreamDataUnavailable` while the others are still served.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut source = Self::new();

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(symbol) = path.file_stem().and_then(|s| s.to_str()) else {
                warn!(path = %path.display(), "Skipping replay file with non-UTF-8 name");
                continue;
            };
            let bars = match read_bars(&path) {
                Ok(bars) => bars,
                Err(e) => {
                    warn!(
                        symbol,
                        path = %path.display(),
                        error = %e,
                        "Skipping unreadable replay file"
                    );
                    continue;
                }
            };
            debug!(symbol, bars = bars.len(), "Loaded replay bars");
            source.insert(symbol, bars);
        }

        info!(
            dir = %dir.display(),
            symbols = source.bars.len(),
            "ReplaySource initialized"
        );
        Ok(source)
    }
}

fn read_bars(path: &Path) -> Result<Vec<PriceBar>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[async_trait]
impl MarketDataSource for ReplaySource {
    async fn daily_bars(&self, symbol: &str, lookback: Lookback) -> Result<PriceSeries> {
        let bars = self
            .bars
            .get(symbol)
            .cloned()
            .ok_or_else(|| Error::UpstreamDataUnavailable {
                symbol: symbol.to_string(),
                reason: "no replay data recorded".to_string(),
            })?;

        let series = PriceSeries::from_unsorted(symbol, bars)?;
        Ok(series.tail(lookback.trading_days()))
    }
}
