use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use analysis::{
    AnalysisFileConfig, Analyzer, ForecastOutcome, InstrumentConfig, LookbackParams,
    SignalOutcome,
};
use common::{
    AnalysisError, DailyChange, Error, Lookback, MarketDataSource, NotificationSink, PriceSeries,
    Result,
};

use crate::report::ReportAssembler;

/// Everything one run produced for one instrument. Each sub-path carries
/// its own result so a failure in one never hides the others.
#[derive(Debug)]
pub struct InstrumentOutcome {
    pub instrument: InstrumentConfig,
    pub daily: Result<DailyChange>,
    pub signal: Result<SignalOutcome>,
    pub forecast: Result<ForecastOutcome>,
    /// `None` when no sink is configured or nothing was worth sending.
    pub delivery: Option<Result<()>>,
}

impl InstrumentOutcome {
    pub fn has_any_result(&self) -> bool {
        self.daily.is_ok() || self.signal.is_ok() || self.forecast.is_ok()
    }
}

/// Per-run tallies for the closing log line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub instruments: usize,
    pub signals: usize,
    pub forecasts: usize,
    pub skipped: usize,
    pub failed: usize,
    pub delivered: usize,
}

impl RunSummary {
    pub fn from_outcomes(outcomes: &[InstrumentOutcome]) -> Self {
        let mut summary = RunSummary {
            instruments: outcomes.len(),
            ..RunSummary::default()
        };
        for o in outcomes {
            summary.signals += o.signal.is_ok() as usize;
            summary.forecasts += o.forecast.is_ok() as usize;
            for err in [
                o.daily.as_ref().err(),
                o.signal.as_ref().err(),
                o.forecast.as_ref().err(),
            ]
            .into_iter()
            .flatten()
            {
                if err.is_insufficient_history() {
                    summary.skipped += 1;
                } else {
                    summary.failed += 1;
                }
            }
            summary.delivered += matches!(o.delivery, Some(Ok(()))) as usize;
        }
        summary
    }
}

/// Runs every configured instrument through fetch, analysis and delivery.
///
/// Instruments are processed one at a time in configured order. Nothing
/// one instrument does can change another's outcome: every fetch, analysis
/// and delivery error is captured in that instrument's `InstrumentOutcome`.
pub struct Runner {
    source: Arc<dyn MarketDataSource>,
    sink: Option<Arc<dyn NotificationSink>>,
    analyzer: Analyzer,
    assembler: ReportAssembler,
    instruments: Vec<InstrumentConfig>,
    lookback: LookbackParams,
}

impl Runner {
    pub fn new(
        cfg: &AnalysisFileConfig,
        source: Arc<dyn MarketDataSource>,
        sink: Option<Arc<dyn NotificationSink>>,
    ) -> Self {
        Self {
            source,
            sink,
            analyzer: Analyzer::from_config(cfg),
            assembler: ReportAssembler,
            instruments: cfg.instruments.clone(),
            lookback: cfg.lookback.clone(),
        }
    }

    pub async fn run(&self) -> Vec<InstrumentOutcome> {
        info!(instruments = self.instruments.len(), "Run starting");
        let mut outcomes = Vec::with_capacity(self.instruments.len());
        for instrument in &self.instruments {
            outcomes.push(self.run_instrument(instrument).await);
        }

        let summary = RunSummary::from_outcomes(&outcomes);
        info!(
            instruments = summary.instruments,
            signals = summary.signals,
            forecasts = summary.forecasts,
            skipped = summary.skipped,
            failed = summary.failed,
            delivered = summary.delivered,
            "Run finished"
        );
        outcomes
    }

    pub async fn run_instrument(&self, instrument: &InstrumentConfig) -> InstrumentOutcome {
        let symbol = instrument.symbol.as_str();
        let mut fetched: HashMap<Lookback, Result<PriceSeries>> = HashMap::new();

        let daily = match self.fetch(symbol, self.lookback.daily, &mut fetched).await {
            Ok(series) => self.analyzer.daily(&series).map_err(Error::from),
            Err(e) => Err(e),
        };
        let signal = match self.fetch(symbol, self.lookback.signal, &mut fetched).await {
            Ok(series) => self.analyzer.signal(&series).map_err(Error::from),
            Err(e) => Err(e),
        };
        let forecast = match self.fetch(symbol, self.lookback.forecast, &mut fetched).await {
            Ok(series) => self.analyzer.forecast(&series).map_err(Error::from),
            Err(e) => Err(e),
        };

        log_path(instrument, "daily", &daily);
        log_path(instrument, "signal", &signal);
        log_path(instrument, "forecast", &forecast);

        let mut outcome = InstrumentOutcome {
            instrument: instrument.clone(),
            daily,
            signal,
            forecast,
            delivery: None,
        };

        if let Some(report) = self.assembler.assemble(&outcome) {
            match &self.sink {
                Some(sink) => {
                    let delivery = sink.deliver(&report).await;
                    if let Err(e) = &delivery {
                        warn!(symbol, error = %e, "Report delivery failed");
                    }
                    outcome.delivery = Some(delivery);
                }
                None => info!(symbol, report = %report.body(), "{}", report.title),
            }
        }
        outcome
    }

    /// Fetch once per distinct lookback; later sub-paths reuse the result,
    /// failures included.
    async fn fetch(
        &self,
        symbol: &str,
        lookback: Lookback,
        fetched: &mut HashMap<Lookback, Result<PriceSeries>>,
    ) -> Result<PriceSeries> {
        if let Some(cached) = fetched.get(&lookback) {
            return cached.clone();
        }
        let result = self.source.daily_bars(symbol, lookback).await;
        fetched.insert(lookback, result.clone());
        result
    }
}

fn log_path<T>(instrument: &InstrumentConfig, path: &str, result: &Result<T>) {
    match result {
        Ok(_) => {}
        Err(Error::Analysis(AnalysisError::InsufficientHistory {
            required,
            available,
        })) => info!(
            symbol = %instrument.symbol,
            path,
            required,
            available,
            "Skipping: insufficient history"
        ),
        Err(e) => warn!(symbol = %instrument.symbol, path, error = %e, "Sub-path failed"),
    }
}
