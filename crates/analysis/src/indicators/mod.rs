pub mod rsi;
pub mod sma;

pub use rsi::RsiIndicator;
pub use sma::SmaIndicator;

use common::{IndicatorSnapshot, PriceSeries};

use crate::config::IndicatorParams;

/// Computes RSI and the short/long SMAs over a whole series.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    rsi: RsiIndicator,
    sma_short: SmaIndicator,
    sma_long: SmaIndicator,
}

impl IndicatorEngine {
    pub fn new(params: &IndicatorParams) -> Self {
        Self {
            rsi: RsiIndicator::new(params.rsi_period),
            sma_short: SmaIndicator::new(params.sma_short),
            sma_long: SmaIndicator::new(params.sma_long),
        }
    }

    /// Bars needed before every indicator of the latest snapshot is defined
    /// (barring a flat RSI window).
    pub fn min_history(&self) -> usize {
        self.rsi.period.max(self.sma_long.window).max(self.sma_short.window)
    }

    /// One snapshot per bar, index-aligned with `series`.
    pub fn compute(&self, series: &PriceSeries) -> Vec<IndicatorSnapshot> {
        let closes = series.closes();
        let rsi = self.rsi.series(&closes);
        let short = self.sma_short.series(&closes);
        let long = self.sma_long.series(&closes);

        rsi.into_iter()
            .zip(short)
            .zip(long)
            .map(|((rsi, sma_short), sma_long)| IndicatorSnapshot {
                rsi,
                sma_short,
                sma_long,
            })
            .collect()
    }

    /// Snapshot of the most recent bar.
    pub fn latest(&self, series: &PriceSeries) -> IndicatorSnapshot {
        self.compute(series).last().copied().unwrap_or_default()
    }
}
