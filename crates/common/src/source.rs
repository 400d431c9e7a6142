use async_trait::async_trait;

use crate::{Lookback, PriceSeries, Report, Result};

/// Abstraction over where daily bars come from.
///
/// `YahooClient` implements this for live data.
/// `ReplaySource` implements this for offline runs and tests.
///
/// Implementations own date cleaning: the returned series is already
/// ascending, duplicate-free and expressed in exchange-local dates.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch daily bars for `symbol` covering `lookback`.
    async fn daily_bars(&self, symbol: &str, lookback: Lookback) -> Result<PriceSeries>;
}

/// Destination for finished instrument reports.
///
/// A failed delivery is reported to the caller, which logs it and moves on.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, report: &Report) -> Result<()>;
}
