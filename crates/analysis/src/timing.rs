use common::{ForecastPoint, TimingRecommendation};

/// Buy at the lowest predicted close and sell at the highest, first
/// occurrence on ties. Returns `None` for an empty forecast.
///
/// The result is not guaranteed to be tradeable in order: when the forecast
/// peaks before it bottoms, `sell_date` precedes `buy_date`.
pub fn extract_timing(points: &[ForecastPoint]) -> Option<TimingRecommendation> {
    let first = points.first()?;
    let mut low = first;
    let mut high = first;

    for p in &points[1..] {
        if p.predicted_close < low.predicted_close {
            low = p;
        }
        if p.predicted_close > high.predicted_close {
            high = p;
        }
    }

    Some(TimingRecommendation {
        buy_date: low.date,
        buy_price: low.predicted_close,
        sell_date: high.date,
        sell_price: high.predicted_close,
    })
}
