/// RSI (Relative Strength Index) indicator.
///
/// Uses a simple rolling mean of gains and losses (not Wilder smoothing).
/// The first bar has no previous close and counts as a zero change, so the
/// first defined value sits at index `period - 1`.
#[derive(Debug, Clone)]
pub struct RsiIndicator {
    pub period: usize,
}

impl RsiIndicator {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self { period }
    }

    /// RSI for every bar of `closes` (oldest first).
    ///
    /// `None` before `period` bars exist, and wherever the window saw neither
    /// a gain nor a loss.
    pub fn series(&self, closes: &[f64]) -> Vec<Option<f64>> {
        let (gains, losses) = split_changes(closes);

        (0..closes.len())
            .map(|i| {
                if i + 1 < self.period {
                    return None;
                }
                let start = i + 1 - self.period;
                let avg_gain = gains[start..=i].iter().sum::<f64>() / self.period as f64;
                let avg_loss = losses[start..=i].iter().sum::<f64>() / self.period as f64;
                rsi_from_averages(avg_gain, avg_loss)
            })
            .collect()
    }

    /// RSI of the most recent bar.
    pub fn latest(&self, closes: &[f64]) -> Option<f64> {
        self.series(closes).last().copied().flatten()
    }
}

/// Per-bar gain and loss. Index 0 is zero in both.
fn split_changes(closes: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());
    if !closes.is_empty() {
        gains.push(0.0);
        losses.push(0.0);
    }
    for w in closes.windows(2) {
        let change = w[1] - w[0];
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }
    (gains, losses)
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        // 0/0 is undefined; x/0 saturates.
        return if avg_gain > 0.0 { Some(100.0) } else { None };
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}
