use analysis::{ForecastOutcome, SignalOutcome};
use common::{DailyChange, Report, Severity};

use crate::runner::InstrumentOutcome;

/// Formats an instrument's outcomes into a data-only [`Report`].
///
/// Sub-paths that failed or were skipped are left out. Returns `None` when
/// nothing succeeded.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReportAssembler;

impl ReportAssembler {
    pub fn assemble(&self, outcome: &InstrumentOutcome) -> Option<Report> {
        if !outcome.has_any_result() {
            return None;
        }

        let instrument = &outcome.instrument;
        let mut lines = Vec::new();

        if let Ok(daily) = &outcome.daily {
            lines.push(daily_line(&instrument.name, daily));
        }
        if let Ok(signal) = &outcome.signal {
            lines.extend(signal_lines(signal));
        }
        if let Ok(forecast) = &outcome.forecast {
            lines.extend(forecast_lines(forecast));
        }

        let severity = outcome
            .signal
            .as_ref()
            .map(|s| s.signal.severity)
            .unwrap_or(Severity::Gray);

        Some(Report {
            title: format!("{} ({})", instrument.name, instrument.symbol),
            lines,
            severity,
        })
    }
}

pub fn daily_line(name: &str, daily: &DailyChange) -> String {
    format!(
        "{} {name}: {:.2} (change: {:+.2}%)",
        daily.trend.marker(),
        daily.latest_close,
        daily.change_pct
    )
}

pub fn signal_lines(outcome: &SignalOutcome) -> Vec<String> {
    let fmt = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"));
    vec![
        format!(
            "Signal: {} ({})",
            outcome.signal.kind, outcome.signal.rationale
        ),
        format!("Price: {:.2} on {}", outcome.close, outcome.date),
        format!(
            "RSI: {} | SMA short: {} | SMA long: {}",
            fmt(outcome.snapshot.rsi),
            fmt(outcome.snapshot.sma_short),
            fmt(outcome.snapshot.sma_long)
        ),
    ]
}

pub fn forecast_lines(outcome: &ForecastOutcome) -> Vec<String> {
    let timing = &outcome.timing;
    let mut lines = vec![
        format!(
            "Forecast ({} days): buy {} @ {:.2}, sell {} @ {:.2}",
            outcome.forecast.points.len(),
            timing.buy_date,
            timing.buy_price,
            timing.sell_date,
            timing.sell_price
        ),
    ];
    if !timing.buy_precedes_sell() {
        lines.push("Note: forecast peaks before it bottoms".to_string());
    }
    if outcome.last_close != 0.0 {
        let upside = (timing.sell_price - timing.buy_price) / outcome.last_close * 100.0;
        lines.push(format!("Forecast range: {upside:.2}% of last close"));
    }
    lines
}
