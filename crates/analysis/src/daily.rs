use common::{AnalysisError, DailyChange, PriceSeries, Trend};

/// Latest close against the previous close. Needs two bars.
pub fn daily_change(series: &PriceSeries) -> Result<DailyChange, AnalysisError> {
    let bars = series.bars();
    if bars.len() < 2 {
        return Err(AnalysisError::InsufficientHistory {
            required: 2,
            available: bars.len(),
        });
    }

    let latest = bars[bars.len() - 1];
    let previous = bars[bars.len() - 2];
    let change = latest.close - previous.close;
    let change_pct = if previous.close != 0.0 {
        change / previous.close * 100.0
    } else {
        0.0
    };

    Ok(DailyChange {
        date: latest.date,
        latest_close: latest.close,
        previous_close: previous.close,
        change,
        change_pct,
        trend: Trend::from_change(change),
    })
}
