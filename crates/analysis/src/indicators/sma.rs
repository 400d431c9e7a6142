/// Simple Moving Average over the trailing `window` closes.
#[derive(Debug, Clone)]
pub struct SmaIndicator {
    pub window: usize,
}

impl SmaIndicator {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "SMA window must be >= 1");
        Self { window }
    }

    /// SMA for every bar (oldest first); `None` for the first `window - 1`.
    pub fn series(&self, closes: &[f64]) -> Vec<Option<f64>> {
        (0..closes.len())
            .map(|i| {
                if i + 1 < self.window {
                    None
                } else {
                    let slice = &closes[i + 1 - self.window..=i];
                    Some(slice.iter().sum::<f64>() / self.window as f64)
                }
            })
            .collect()
    }
}
