//! Volume regime: current volume against its trailing mean.
//!
//! ratio = V[i] / mean(V[i-n+1..=i]); surge when ratio > surge_ratio,
//! shrink when ratio < shrink_ratio. Warmup: first (n-1) bars.

use crate::domain::indicator::{Reading, VolumeRegime};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_volume(
    bars: &[OhlcvBar],
    window: usize,
    surge_ratio: f64,
    shrink_ratio: f64,
) -> Vec<Reading<VolumeRegime>> {
    let mut values = Vec::with_capacity(bars.len());
    let mut sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        sum += bar.volume as f64;
        if window > 0 && i >= window {
            sum -= bars[i - window].volume as f64;
        }

        if window == 0 || i + 1 < window {
            values.push(Reading::Warmup);
            continue;
        }

        let avg = sum / window as f64;
        if avg <= 0.0 {
            values.push(Reading::Warmup);
            continue;
        }
        let ratio = bar.volume as f64 / avg;
        values.push(Reading::Ready(VolumeRegime {
            ratio,
            surge: ratio > surge_ratio,
            shrink: ratio < shrink_ratio,
        }));
    }

    values
}
