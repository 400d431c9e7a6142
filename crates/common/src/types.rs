use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// One daily bar as delivered by a market-data source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub close: f64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, open: f64, close: f64) -> Self {
        Self { date, open, close }
    }
}

/// Daily bars for one instrument, oldest first.
///
/// Dates are strictly increasing and the series holds at least one bar.
/// Both are checked once in [`PriceSeries::new`]; the series is read-only
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(Error::InvalidSeries {
                symbol,
                reason: "no bars".to_string(),
            });
        }
        if let Some(w) = bars.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(Error::InvalidSeries {
                symbol,
                reason: format!("date {} does not follow {}", w[1].date, w[0].date),
            });
        }
        Ok(Self { symbol, bars })
    }

    /// Clean raw bars from a feed before validating: drop bars with a
    /// non-finite price, sort by date and keep the last bar seen per date.
    pub fn from_unsorted(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self> {
        let symbol = symbol.into();
        let raw = bars.len();
        let mut bars: Vec<PriceBar> = bars
            .into_iter()
            .filter(|b| b.open.is_finite() && b.close.is_finite())
            .collect();
        let non_finite = raw - bars.len();
        // Stable sort keeps feed order within a date, so the later
        // duplicate wins below.
        bars.sort_by_key(|b| b.date);
        let mut cleaned: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match cleaned.last_mut() {
                Some(prev) if prev.date == bar.date => *prev = bar,
                _ => cleaned.push(bar),
            }
        }
        let merged = raw - non_finite - cleaned.len();
        if non_finite > 0 || merged > 0 {
            debug!(symbol = %symbol, non_finite, merged, "Normalized raw bars");
        }
        Self::new(symbol, cleaned)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> &PriceBar {
        // Non-empty by construction.
        &self.bars[self.bars.len() - 1]
    }

    /// The trailing `n` bars as a new series (the whole series if shorter).
    pub fn tail(&self, n: usize) -> PriceSeries {
        let start = self.bars.len().saturating_sub(n.max(1));
        PriceSeries {
            symbol: self.symbol.clone(),
            bars: self.bars[start..].to_vec(),
        }
    }
}

/// How far back a market-data request reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lookback {
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
}

impl Lookback {
    /// Range token understood by the Yahoo chart API.
    pub fn as_range(&self) -> &'static str {
        match self {
            Lookback::FiveDays => "5d",
            Lookback::SixMonths => "6mo",
            Lookback::OneYear => "1y",
        }
    }

    /// Approximate number of trading sessions the range covers.
    pub fn trading_days(&self) -> usize {
        match self {
            Lookback::FiveDays => 5,
            Lookback::SixMonths => 126,
            Lookback::OneYear => 252,
        }
    }
}

impl std::fmt::Display for Lookback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_range())
    }
}

/// Indicator values for one bar. `None` means undefined: not enough
/// history yet, or a 0/0 RSI window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: Option<f64>,
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
}

/// Classification emitted by the signal classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    StrongBuy,
    Sell,
    GoldenCross,
    DeathCross,
    Neutral,
}

impl SignalKind {
    pub fn severity(&self) -> Severity {
        match self {
            SignalKind::StrongBuy => Severity::Green,
            SignalKind::Sell => Severity::Red,
            SignalKind::GoldenCross => Severity::Gold,
            SignalKind::DeathCross => Severity::Purple,
            SignalKind::Neutral => Severity::Gray,
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalKind::StrongBuy => write!(f, "STRONG BUY"),
            SignalKind::Sell => write!(f, "SELL"),
            SignalKind::GoldenCross => write!(f, "GOLDEN CROSS"),
            SignalKind::DeathCross => write!(f, "DEATH CROSS"),
            SignalKind::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Color token handed to renderers alongside a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Green,
    Red,
    Gold,
    Purple,
    Gray,
}

impl Severity {
    /// 0xRRGGBB, the form webhook embeds expect.
    pub fn rgb(&self) -> u32 {
        match self {
            Severity::Green => 0x2ECC71,
            Severity::Red => 0xE74C3C,
            Severity::Gold => 0xF1C40F,
            Severity::Purple => 0x8E44AD,
            Severity::Gray => 0x95A5A6,
        }
    }
}

/// Classifier output for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub rationale: String,
    pub severity: Severity,
}

impl Signal {
    pub fn new(kind: SignalKind, rationale: impl Into<String>) -> Self {
        Self {
            kind,
            rationale: rationale.into(),
            severity: kind.severity(),
        }
    }
}

/// One extrapolated day of the trend forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_close: f64,
}

/// Extremes of a forecast. `buy_date` may come after `sell_date`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingRecommendation {
    pub buy_date: NaiveDate,
    pub buy_price: f64,
    pub sell_date: NaiveDate,
    pub sell_price: f64,
}

impl TimingRecommendation {
    pub fn buy_precedes_sell(&self) -> bool {
        self.buy_date < self.sell_date
    }
}

/// Direction of the latest close against the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn from_change(change: f64) -> Self {
        if change > 0.0 {
            Trend::Up
        } else if change < 0.0 {
            Trend::Down
        } else {
            Trend::Flat
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            Trend::Up => "🔺",
            Trend::Down => "🔻",
            Trend::Flat => "➖",
        }
    }
}

/// Latest close compared with the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyChange {
    pub date: NaiveDate,
    pub latest_close: f64,
    pub previous_close: f64,
    pub change: f64,
    pub change_pct: f64,
    pub trend: Trend,
}

/// Data-only rendering of one instrument's results, ready for a sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub title: String,
    pub lines: Vec<String>,
    pub severity: Severity,
}

impl Report {
    pub fn body(&self) -> String {
        self.lines.join("\n")
    }
}
