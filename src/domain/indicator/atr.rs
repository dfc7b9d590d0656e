//! Average True Range.
//!
//! TR[i] = max(H-L, |H-C[i-1]|, |L-C[i-1]|) for i >= 1; ATR is the simple
//! mean of the last n true ranges. Warmup: first n bars. A period of 0 means
//! ATR is switched off and every reading is `Absent`.

use crate::domain::indicator::{mean, Reading};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> Vec<Reading<f64>> {
    if period == 0 {
        return vec![Reading::Absent; bars.len()];
    }

    let true_ranges: Vec<f64> = bars
        .windows(2)
        .map(|w| w[1].true_range(w[0].close))
        .collect();

    (0..bars.len())
        .map(|i| {
            if i < period {
                Reading::Warmup
            } else {
                // true_ranges[j] belongs to bar j+1
                Reading::Ready(mean(&true_ranges[i - period..i]))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::OhlcvBar;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn bar(day: u32, high: f64, low: f64, close: f64) -> OhlcvBar {
        OhlcvBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn disabled_is_absent() {
        let bars = vec![bar(1, 11.0, 9.0, 10.0), bar(2, 12.0, 10.0, 11.0)];
        assert!(calculate_atr(&bars, 0).iter().all(|r| *r == Reading::Absent));
    }

    #[test]
    fn atr_warmup_and_value() {
        let bars = vec![
            bar(1, 11.0, 9.0, 10.0),
            bar(2, 12.0, 10.0, 11.0),  // TR = 2
            bar(3, 15.0, 11.0, 14.0),  // TR = max(4, 4, 0) = 4
            bar(4, 14.5, 13.5, 14.0),  // TR = 1
        ];
        let atr = calculate_atr(&bars, 2);
        assert!(atr[0].is_warmup());
        assert!(atr[1].is_warmup());
        assert_relative_eq!(atr[2].ready().unwrap(), 3.0);
        assert_relative_eq!(atr[3].ready().unwrap(), 2.5);
    }

    #[test]
    fn gap_counts_in_true_range() {
        let bars = vec![bar(1, 10.0, 10.0, 10.0), bar(2, 20.0, 19.0, 20.0)];
        assert_relative_eq!(calculate_atr(&bars, 1)[1].ready().unwrap(), 10.0);
    }
}
