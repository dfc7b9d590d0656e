//! Adaptive oscillator band.
//!
//! Upper/lower bounds are rolling quantiles of the MACD line over `window`
//! bars (defaults 0.8 / 0.2), so the band widens and narrows with the
//! oscillator's own recent range. Quantiles interpolate linearly between
//! order statistics.
//!
//! Warmup: every value in the window must be `Ready`.

use crate::domain::indicator::{Band, Reading};

pub fn calculate_band(
    line: &[Reading<f64>],
    window: usize,
    lower_q: f64,
    upper_q: f64,
) -> Vec<Reading<Band>> {
    let mut values = Vec::with_capacity(line.len());
    let mut scratch: Vec<f64> = Vec::with_capacity(window);

    for i in 0..line.len() {
        if window == 0 || i + 1 < window {
            values.push(Reading::Warmup);
            continue;
        }

        scratch.clear();
        scratch.extend(line[i + 1 - window..=i].iter().filter_map(|r| r.ready()));
        if scratch.len() < window {
            values.push(Reading::Warmup);
            continue;
        }

        scratch.sort_by(f64::total_cmp);
        values.push(Reading::Ready(Band {
            upper: quantile_sorted(&scratch, upper_q),
            lower: quantile_sorted(&scratch, lower_q),
        }));
    }

    values
}

/// Linear-interpolated quantile of an ascending, non-empty slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
