use chrono::NaiveDate;
use tracing::debug;

use common::{
    AnalysisError, DailyChange, IndicatorSnapshot, PriceSeries, Signal, TimingRecommendation,
};

use crate::classifier::SignalClassifier;
use crate::config::AnalysisFileConfig;
use crate::daily::daily_change;
use crate::forecast::{Forecast, TrendForecaster};
use crate::indicators::IndicatorEngine;
use crate::timing::extract_timing;

/// Latest-bar classification plus the inputs that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalOutcome {
    pub date: NaiveDate,
    pub open: f64,
    pub close: f64,
    pub snapshot: IndicatorSnapshot,
    pub signal: Signal,
}

#[derive(Debug, Clone)]
pub struct ForecastOutcome {
    pub last_close: f64,
    pub forecast: Forecast,
    pub timing: TimingRecommendation,
}

/// Runs the analysis sub-paths on one instrument's series and applies the
/// minimum-history gate before each.
///
/// Every method is a pure function of its input and the configured
/// parameters. A short series yields `InsufficientHistory` for that
/// sub-path only.
#[derive(Debug, Clone)]
pub struct Analyzer {
    indicators: IndicatorEngine,
    classifier: SignalClassifier,
    forecaster: TrendForecaster,
}

impl Analyzer {
    pub fn from_config(cfg: &AnalysisFileConfig) -> Self {
        Self {
            indicators: IndicatorEngine::new(&cfg.indicators),
            classifier: SignalClassifier::new(&cfg.indicators),
            forecaster: TrendForecaster::new(&cfg.forecast),
        }
    }

    /// Bars the signal path needs: the longest indicator window.
    pub fn signal_history(&self) -> usize {
        self.indicators.min_history()
    }

    /// Bars the forecast path needs.
    pub fn forecast_history(&self) -> usize {
        self.forecaster.min_history
    }

    pub fn daily(&self, series: &PriceSeries) -> Result<DailyChange, AnalysisError> {
        daily_change(series)
    }

    pub fn signal(&self, series: &PriceSeries) -> Result<SignalOutcome, AnalysisError> {
        let required = self.signal_history();
        if series.len() < required {
            return Err(AnalysisError::InsufficientHistory {
                required,
                available: series.len(),
            });
        }

        let snapshot = self.indicators.latest(series);
        let last = series.last();
        let signal = self.classifier.classify(&snapshot, last.open);

        debug!(
            symbol = %series.symbol(),
            rsi = ?snapshot.rsi,
            sma_short = ?snapshot.sma_short,
            sma_long = ?snapshot.sma_long,
            signal = %signal.kind,
            "Signal classified"
        );

        Ok(SignalOutcome {
            date: last.date,
            open: last.open,
            close: last.close,
            snapshot,
            signal,
        })
    }

    pub fn forecast(&self, series: &PriceSeries) -> Result<ForecastOutcome, AnalysisError> {
        let forecast = self.forecaster.forecast(series)?;
        let timing = extract_timing(&forecast.points)
            .ok_or_else(|| AnalysisError::DegenerateFit("empty forecast horizon".into()))?;

        Ok(ForecastOutcome {
            last_close: series.last().close,
            forecast,
            timing,
        })
    }
}
