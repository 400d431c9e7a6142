use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use common::{Error, Lookback, Result};

/// Analysis config file (TOML).
///
/// Example `config/analysis.toml`:
/// ```toml
/// [[instrument]]
/// name = "Gold"
/// symbol = "GC=F"
///
/// [indicators]
/// rsi_period = 14
/// sma_short = 5
/// sma_long = 20
///
/// [forecast]
/// horizon = 30
/// ```
///
/// Every section is optional. The instrument order in the file is the
/// report order.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisFileConfig {
    #[serde(rename = "instrument")]
    pub instruments: Vec<InstrumentConfig>,
    pub indicators: IndicatorParams,
    pub forecast: ForecastParams,
    pub lookback: LookbackParams,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InstrumentConfig {
    /// Display name used in reports.
    pub name: String,
    /// Market-data ticker, e.g. "GC=F".
    pub symbol: String,
}

impl InstrumentConfig {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub rsi_period: usize,
    pub sma_short: usize,
    pub sma_long: usize,
    /// RSI below this is oversold.
    pub oversold: f64,
    /// RSI above this is overbought.
    pub overbought: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            sma_short: 5,
            sma_long: 20,
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ForecastParams {
    /// Calendar days to extrapolate.
    pub horizon: usize,
    /// Bars required before a fit is attempted.
    pub min_history: usize,
    /// Polynomial degree of the trend fit.
    pub degree: usize,
}

impl Default for ForecastParams {
    fn default() -> Self {
        Self {
            horizon: 30,
            min_history: 50,
            degree: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LookbackParams {
    pub daily: Lookback,
    pub signal: Lookback,
    pub forecast: Lookback,
}

impl Default for LookbackParams {
    fn default() -> Self {
        Self {
            daily: Lookback::FiveDays,
            signal: Lookback::SixMonths,
            forecast: Lookback::OneYear,
        }
    }
}

impl Default for AnalysisFileConfig {
    fn default() -> Self {
        Self {
            instruments: default_instruments(),
            indicators: IndicatorParams::default(),
            forecast: ForecastParams::default(),
            lookback: LookbackParams::default(),
        }
    }
}

fn default_instruments() -> Vec<InstrumentConfig> {
    vec![
        InstrumentConfig::new("Gold", "GC=F"),
        InstrumentConfig::new("Crude Oil", "CL=F"),
        InstrumentConfig::new("Copper", "HG=F"),
        InstrumentConfig::new("Silver", "SI=F"),
    ]
}

impl AnalysisFileConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "Analysis config not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let cfg = Self::parse(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
            other => other,
        })?;
        info!(
            path = %path.display(),
            instruments = cfg.instruments.len(),
            "Loaded analysis config"
        );
        Ok(cfg)
    }

    /// Parse and validate TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(content)
            .map_err(|e| Error::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let ind = &self.indicators;
        if ind.rsi_period == 0 || ind.sma_short == 0 || ind.sma_long == 0 {
            return Err(Error::Config("indicator periods must be >= 1".into()));
        }
        if ind.sma_short >= ind.sma_long {
            return Err(Error::Config(format!(
                "sma_short ({}) must be less than sma_long ({})",
                ind.sma_short, ind.sma_long
            )));
        }
        if ind.oversold >= ind.overbought {
            return Err(Error::Config(format!(
                "oversold ({}) must be below overbought ({})",
                ind.oversold, ind.overbought
            )));
        }

        let fc = &self.forecast;
        if fc.horizon == 0 {
            return Err(Error::Config("forecast horizon must be >= 1".into()));
        }
        if fc.min_history <= fc.degree {
            return Err(Error::Config(format!(
                "forecast min_history ({}) must exceed degree ({})",
                fc.min_history, fc.degree
            )));
        }

        if let Some(i) = self
            .instruments
            .iter()
            .find(|i| i.name.trim().is_empty() || i.symbol.trim().is_empty())
        {
            return Err(Error::Config(format!(
                "instrument entries need a name and a symbol, got {i:?}"
            )));
        }
        Ok(())
    }
}
