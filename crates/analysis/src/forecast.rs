//! Polynomial trend forecaster.
//!
//! Closes are regressed on the trading-day ordinal (0..n-1) with ordinary
//! least squares and the fitted curve is extrapolated forward. Forecast
//! dates advance by calendar days from the last bar even though the
//! ordinal counts trading days; weekends are not skipped.

use chrono::Days;
use tracing::debug;

use common::{AnalysisError, ForecastPoint, PriceSeries};

use crate::config::ForecastParams;

/// Relative pivot size below which the normal matrix counts as singular.
const PIVOT_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct TrendForecaster {
    pub degree: usize,
    pub horizon: usize,
    pub min_history: usize,
}

impl Default for TrendForecaster {
    fn default() -> Self {
        Self::new(&ForecastParams::default())
    }
}

/// A fitted polynomial in the trading-day ordinal.
///
/// Internally the ordinal is mapped onto `u = (x - center) / scale`, which
/// keeps `u` within [-1, 1] over the fitted range and the normal equations
/// well conditioned.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendFit {
    /// Coefficients in `u`, constant term first.
    coefficients: Vec<f64>,
    center: f64,
    scale: f64,
    observations: usize,
}

impl TrendFit {
    /// Fitted close at trading-day ordinal `x`.
    pub fn evaluate(&self, x: f64) -> f64 {
        let u = (x - self.center) / self.scale;
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * u + c)
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Number of bars the fit was computed from.
    pub fn observations(&self) -> usize {
        self.observations
    }

    /// In-sample fitted values for ordinals 0..observations.
    pub fn fitted(&self) -> Vec<f64> {
        (0..self.observations)
            .map(|i| self.evaluate(i as f64))
            .collect()
    }
}

/// Forecast output together with the curve that produced it.
#[derive(Debug, Clone)]
pub struct Forecast {
    pub fit: TrendFit,
    pub points: Vec<ForecastPoint>,
}

impl TrendForecaster {
    pub fn new(params: &ForecastParams) -> Self {
        Self {
            degree: params.degree,
            horizon: params.horizon,
            min_history: params.min_history,
        }
    }

    /// Fit the trend polynomial to `closes` (oldest first).
    pub fn fit(&self, closes: &[f64]) -> Result<TrendFit, AnalysisError> {
        let n = closes.len();
        let terms = self.degree + 1;

        if n < terms {
            return Err(AnalysisError::DegenerateFit(format!(
                "{n} bars cannot determine {terms} coefficients"
            )));
        }
        if closes.iter().any(|c| !c.is_finite()) {
            return Err(AnalysisError::DegenerateFit(
                "non-finite close in series".into(),
            ));
        }
        if closes.iter().all(|&c| c == closes[0]) {
            return Err(AnalysisError::DegenerateFit("constant price series".into()));
        }

        let center = (n - 1) as f64 / 2.0;
        let scale = center.max(1.0);

        // Normal equations: (XᵀX) β = Xᵀy over the basis [1, u, u², …].
        let mut moments = vec![0.0; 2 * self.degree + 1];
        let mut rhs = vec![0.0; terms];
        for (i, &y) in closes.iter().enumerate() {
            let u = (i as f64 - center) / scale;
            let mut p = 1.0;
            for (k, m) in moments.iter_mut().enumerate() {
                *m += p;
                if k < terms {
                    rhs[k] += p * y;
                }
                p *= u;
            }
        }
        let mut matrix: Vec<Vec<f64>> = (0..terms)
            .map(|r| moments[r..r + terms].to_vec())
            .collect();

        let coefficients = solve(&mut matrix, &mut rhs)?;
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(AnalysisError::DegenerateFit(
                "non-finite coefficient".into(),
            ));
        }

        Ok(TrendFit {
            coefficients,
            center,
            scale,
            observations: n,
        })
    }

    /// Extrapolate `horizon` calendar days past the last bar.
    pub fn forecast(&self, series: &PriceSeries) -> Result<Forecast, AnalysisError> {
        if series.len() < self.min_history {
            return Err(AnalysisError::InsufficientHistory {
                required: self.min_history,
                available: series.len(),
            });
        }

        let fit = self.fit(&series.closes())?;
        let n = series.len();
        let last_date = series.last().date;

        let points = (0..self.horizon)
            .map(|k| {
                let date = last_date
                    .checked_add_days(Days::new(k as u64 + 1))
                    .ok_or_else(|| {
                        AnalysisError::DegenerateFit(format!("date overflow after {last_date}"))
                    })?;
                Ok(ForecastPoint {
                    date,
                    predicted_close: fit.evaluate((n + k) as f64),
                })
            })
            .collect::<Result<Vec<_>, AnalysisError>>()?;

        debug!(
            symbol = %series.symbol(),
            bars = n,
            horizon = self.horizon,
            "Trend forecast computed"
        );

        Ok(Forecast { fit, points })
    }
}

/// Gaussian elimination with partial pivoting. `a` and `b` are overwritten.
fn solve(a: &mut [Vec<f64>], b: &mut [f64]) -> Result<Vec<f64>, AnalysisError> {
    let n = b.len();
    let magnitude = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0_f64, |m, v| m.max(v.abs()));
    if magnitude == 0.0 {
        return Err(AnalysisError::DegenerateFit("empty design matrix".into()));
    }

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot_row][col].abs() <= PIVOT_TOLERANCE * magnitude {
            return Err(AnalysisError::DegenerateFit(
                "singular design matrix".into(),
            ));
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                let delta = factor * a[col][k];
                a[row][k] -= delta;
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, NaiveDate, Weekday};
    use common::PriceBar;

    use super::*;

    fn series_from(closes: &[f64], start: NaiveDate) -> PriceSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::new(start + chrono::Duration::days(i as i64), c, c))
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    fn jan(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn linear_series_is_reproduced() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let forecast = TrendForecaster::default()
            .forecast(&series_from(&closes, jan(1)))
            .unwrap();

        for (i, fitted) in forecast.fit.fitted().iter().enumerate() {
            assert!((fitted - closes[i]).abs() < 1e-6, "bar {i}: {fitted}");
        }
        assert_eq!(forecast.points.len(), 30);
        for (k, p) in forecast.points.iter().enumerate() {
            let expected = 160.0 + k as f64;
            assert!(
                (p.predicted_close - expected).abs() < 1e-6,
                "day {k}: expected {expected}, got {}",
                p.predicted_close
            );
        }
    }

    #[test]
    fn cubic_series_is_reproduced() {
        let f = |x: f64| 50.0 + 0.5 * x - 0.02 * x * x + 0.0003 * x * x * x;
        let closes: Vec<f64> = (0..250).map(|i| f(i as f64)).collect();
        let fit = TrendForecaster::default().fit(&closes).unwrap();
        assert_eq!(fit.degree(), 3);
        for x in [0.0, 100.0, 249.0, 260.0, 279.0] {
            let rel = (fit.evaluate(x) - f(x)).abs() / f(x).abs();
            assert!(rel < 1e-8, "x={x}: {} vs {}", fit.evaluate(x), f(x));
        }
    }

    #[test]
    fn forecast_dates_use_calendar_days() {
        // 2024-03-01 is a Friday; the next point must be Saturday.
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64).sqrt()).collect();
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let series = series_from(&closes, start);
        let last = series.last().date;

        let forecast = TrendForecaster::default().forecast(&series).unwrap();
        assert_eq!(last.weekday(), Weekday::Fri);
        assert_eq!(forecast.points[0].date, last + chrono::Duration::days(1));
        assert_eq!(forecast.points[0].date.weekday(), Weekday::Sat);
        assert_eq!(forecast.points[29].date, last + chrono::Duration::days(30));
        assert!(forecast
            .points
            .windows(2)
            .all(|w| w[1].date - w[0].date == chrono::Duration::days(1)));
    }

    #[test]
    fn short_series_is_insufficient_history() {
        let closes: Vec<f64> = (0..49).map(|i| 100.0 + i as f64).collect();
        let err = TrendForecaster::default()
            .forecast(&series_from(&closes, jan(1)))
            .unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InsufficientHistory {
                required: 50,
                available: 49
            }
        );
    }

    #[test]
    fn constant_series_is_degenerate() {
        let closes = vec![42.0; 60];
        let err = TrendForecaster::default()
            .forecast(&series_from(&closes, jan(1)))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::DegenerateFit(_)));
    }

    #[test]
    fn too_few_bars_is_degenerate() {
        let err = TrendForecaster::default()
            .fit(&[1.0, 2.0, 3.0])
            .unwrap_err();
        assert_eq!(
            err,
            AnalysisError::DegenerateFit("3 bars cannot determine 4 coefficients".into())
        );
    }

    #[test]
    fn forecast_is_bit_identical_across_runs() {
        let closes: Vec<f64> = (0..120)
            .map(|i| 80.0 + (i as f64 * 0.13).sin() * 4.0 + i as f64 * 0.05)
            .collect();
        let series = series_from(&closes, jan(1));
        let forecaster = TrendForecaster::default();
        let a = forecaster.forecast(&series).unwrap();
        let b = forecaster.forecast(&series).unwrap();
        assert_eq!(a.points, b.points);
        assert_eq!(a.fit, b.fit);
    }

    #[test]
    fn horizon_is_configurable() {
        let params = ForecastParams {
            horizon: 7,
            ..ForecastParams::default()
        };
        let closes: Vec<f64> = (0..60).map(|i| 10.0 + i as f64 * 0.1).collect();
        let forecast = TrendForecaster::new(&params)
            .forecast(&series_from(&closes, jan(1)))
            .unwrap();
        assert_eq!(forecast.points.len(), 7);
    }
}
