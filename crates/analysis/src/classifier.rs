use common::{IndicatorSnapshot, Signal, SignalKind};

use crate::config::IndicatorParams;

/// Ordered rule list over the latest indicator snapshot. The first rule
/// that matches wins; undefined inputs make their rules not match.
#[derive(Debug, Clone)]
pub struct SignalClassifier {
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for SignalClassifier {
    fn default() -> Self {
        Self::new(&IndicatorParams::default())
    }
}

impl SignalClassifier {
    pub fn new(params: &IndicatorParams) -> Self {
        Self {
            oversold: params.oversold,
            overbought: params.overbought,
        }
    }

    /// Classify one bar given its snapshot and its open price.
    pub fn classify(&self, snapshot: &IndicatorSnapshot, open: f64) -> Signal {
        if let Some(rsi) = snapshot.rsi {
            if rsi < self.oversold {
                return Signal::new(SignalKind::StrongBuy, format!("RSI oversold ({rsi:.1})"));
            }
            if rsi > self.overbought {
                return Signal::new(SignalKind::Sell, format!("RSI overbought ({rsi:.1})"));
            }
        }

        if let (Some(short), Some(long)) = (snapshot.sma_short, snapshot.sma_long) {
            if short > long && open < long {
                return Signal::new(
                    SignalKind::GoldenCross,
                    "short-term breakout above long-term resistance",
                );
            }
            if short < long && open > long {
                return Signal::new(SignalKind::DeathCross, "breakdown below long-term support");
            }
        }

        Signal::new(SignalKind::Neutral, "no actionable setup")
    }
}
