pub mod analyzer;
pub mod classifier;
pub mod config;
pub mod daily;
pub mod forecast;
pub mod indicators;
pub mod timing;

pub use analyzer::{Analyzer, ForecastOutcome, SignalOutcome};
pub use classifier::SignalClassifier;
pub use config::{
    AnalysisFileConfig, ForecastParams, IndicatorParams, InstrumentConfig, LookbackParams,
};
pub use daily::daily_change;
pub use forecast::{Forecast, TrendFit, TrendForecaster};
pub use indicators::{IndicatorEngine, RsiIndicator, SmaIndicator};
pub use timing::extract_timing;
