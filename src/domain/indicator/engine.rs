//! Per-symbol indicator pipeline.
//!
//! Construction validates the series, so a constructed engine only ever
//! computes over well-formed bars. `compute` is pure: the same bars and config
//! always give the same sets.

use tracing::debug;

use super::atr::calculate_atr;
use super::band::calculate_band;
use super::macd::{macd_from_line, macd_line};
use super::percentile::calculate_percentile;
use super::volume::calculate_volume;
use super::{IndicatorSet, Reading};
use crate::domain::config::IndicatorConfig;
use crate::domain::error::DcaError;
use crate::domain::ohlcv::{validate_series, OhlcvBar};

#[derive(Debug)]
pub struct IndicatorEngine<'a> {
    bars: &'a [OhlcvBar],
    config: IndicatorConfig,
}

impl<'a> IndicatorEngine<'a> {
    pub fn new(
        code: &str,
        bars: &'a [OhlcvBar],
        config: IndicatorConfig,
    ) -> Result<Self, DcaError> {
        validate_series(code, bars)?;
        Ok(IndicatorEngine { bars, config })
    }

    /// One [`IndicatorSet`] per bar, aligned by index.
    pub fn compute(&self) -> Vec<IndicatorSet> {
        let cfg = &self.config;
        let bars = self.bars;

        let line = macd_line(bars, cfg.macd_fast, cfg.macd_slow);
        let macd = macd_from_line(&line, cfg.macd_signal);
        let band = calculate_band(
            &line,
            cfg.band_window,
            cfg.band_lower_quantile,
            cfg.band_upper_quantile,
        );
        let volume = calculate_volume(
            bars,
            cfg.volume_window,
            cfg.volume_surge_ratio,
            cfg.volume_shrink_ratio,
        );
        let valuation = calculate_percentile(bars, cfg.valuation_window);
        let atr = calculate_atr(bars, cfg.atr_period);

        let sets: Vec<IndicatorSet> = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| IndicatorSet {
                date: bar.date,
                close: bar.close,
                close_change: close_change(bars, i),
                macd: macd[i],
                band: band[i],
                volume: volume[i],
                valuation: valuation[i],
                atr: atr[i],
            })
            .collect();

        let first_ready = sets.iter().position(IndicatorSet::is_ready);
        debug!(
            bars = bars.len(),
            warmup = cfg.warmup_bars(),
            first_ready = ?first_ready,
            "indicators computed"
        );
        sets
    }
}

fn close_change(bars: &[OhlcvBar], i: usize) -> Reading<f64> {
    if i == 0 {
        return Reading::Warmup;
    }
    let prev = bars[i - 1].close;
    Reading::Ready((bars[i].close - prev) / prev)
}
