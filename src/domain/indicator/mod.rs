//! Technical indicators.
//!
//! Every indicator produces one [`Reading`] per input bar, aligned by index:
//! - `Ready(v)`: the window is populated and `v` is the value
//! - `Warmup`: not enough history yet; nothing may fire on it
//! - `Absent`: the indicator is switched off by configuration
//!
//! No indicator ever substitutes a numeric default for a missing value.

pub mod atr;
pub mod band;
pub mod ema;
pub mod engine;
pub mod macd;
pub mod percentile;
pub mod volume;

use chrono::NaiveDate;

pub use engine::IndicatorEngine;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading<T> {
    Ready(T),
    Warmup,
    Absent,
}

impl<T: Copy> Reading<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Reading::Ready(v) => Some(v),
            Reading::Warmup | Reading::Absent => None,
        }
    }

    pub fn is_warmup(&self) -> bool {
        matches!(self, Reading::Warmup)
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Reading<U> {
        match self {
            Reading::Ready(v) => Reading::Ready(f(v)),
            Reading::Warmup => Reading::Warmup,
            Reading::Absent => Reading::Absent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdPoint {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Adaptive band drawn from rolling quantiles of the MACD line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub upper: f64,
    pub lower: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeRegime {
    /// Current volume over its trailing mean.
    pub ratio: f64,
    pub surge: bool,
    pub shrink: bool,
}

/// Everything the signal layer may look at for one bar.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    pub date: NaiveDate,
    pub close: f64,
    /// Close-to-close change as a fraction of the previous close.
    pub close_change: Reading<f64>,
    pub macd: Reading<MacdPoint>,
    pub band: Reading<Band>,
    pub volume: Reading<VolumeRegime>,
    /// Rank of the close within its trailing window, 0 = window low, 1 = window high.
    pub valuation: Reading<f64>,
    pub atr: Reading<f64>,
}

impl IndicatorSet {
    /// True once no input is still warming up. `Absent` inputs do not block.
    pub fn is_ready(&self) -> bool {
        !(self.close_change.is_warmup()
            || self.macd.is_warmup()
            || self.band.is_warmup()
            || self.volume.is_warmup()
            || self.valuation.is_warmup()
            || self.atr.is_warmup())
    }

    pub fn in_lower_band(&self) -> Option<bool> {
        let macd = self.macd.ready()?;
        let band = self.band.ready()?;
        Some(macd.line < band.lower)
    }

    pub fn in_upper_band(&self) -> Option<bool> {
        let macd = self.macd.ready()?;
        let band = self.band.ready()?;
        Some(macd.line > band.upper)
    }

    pub fn price_down_on_surge(&self) -> Option<bool> {
        let change = self.close_change.ready()?;
        let volume = self.volume.ready()?;
        Some(change < 0.0 && volume.surge)
    }

    /// ATR as a fraction of the close; `None` when ATR is off or warming up.
    pub fn atr_ratio(&self) -> Option<f64> {
        self.atr.ready().map(|atr| atr / self.close)
    }
}

/// Simple mean over `values`; callers guarantee a non-empty slice.
pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
