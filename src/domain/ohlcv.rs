//! Daily OHLCV bar and series validation.

use chrono::NaiveDate;

use super::error::{DataErrorKind, DcaError};

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Reject series the engine must never simulate over: empty input, dates
/// that repeat or go backwards, non-positive prices or volume.
pub fn validate_series(code: &str, bars: &[OhlcvBar]) -> Result<(), DcaError> {
    let fail = |kind: DataErrorKind| DcaError::Data {
        code: code.to_string(),
        kind,
    };

    if bars.is_empty() {
        return Err(fail(DataErrorKind::Empty));
    }

    for (i, bar) in bars.iter().enumerate() {
        let prices = [bar.open, bar.high, bar.low, bar.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err(fail(DataErrorKind::NonPositivePrice { date: bar.date }));
        }
        if bar.volume <= 0 {
            return Err(fail(DataErrorKind::NonPositiveVolume { date: bar.date }));
        }
        if i > 0 {
            let prev = bars[i - 1].date;
            if bar.date == prev {
                return Err(fail(DataErrorKind::DuplicateDate { date: bar.date }));
            }
            if bar.date < prev {
                return Err(fail(DataErrorKind::NonChronological { index: i }));
            }
        }
    }

    Ok(())
}
