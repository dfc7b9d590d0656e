#![allow(dead_code)]

use chrono::NaiveDate;
use dcatrader::domain::config::{BacktestConfig, IndicatorConfig};
use dcatrader::domain::error::DcaError;
pub use dcatrader::domain::ohlcv::OhlcvBar;
use dcatrader::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, DcaError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(DcaError::Provider {
                reason: reason.clone(),
            });
        }
        let bars: Vec<OhlcvBar> = self
            .data
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if bars.is_empty() {
            return Err(DcaError::NoData {
                code: code.to_string(),
            });
        }
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, DcaError> {
        let mut codes: Vec<String> = self.data.keys().cloned().collect();
        codes.sort();
        Ok(codes)
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, DcaError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(DcaError::Provider {
                reason: reason.clone(),
            });
        }
        match self.data.get(code) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: NaiveDate, close: f64, volume: i64) -> OhlcvBar {
    OhlcvBar {
        date,
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        volume,
    }
}

/// One bar per calendar day from `start`, volume 1000.
pub fn bars_from_closes(start: NaiveDate, closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(start + chrono::Duration::days(i as i64), c, 1000))
        .collect()
}

/// Oscillating price with a slow drift, and volume that spikes on every
/// falling bar so rotation entries get a chance to fire.
pub fn wave_bars(start: NaiveDate, n: usize, base: f64) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..n)
        .map(|i| {
            let t = i as f64;
            base * (1.0 + 0.15 * (t * 0.25).sin() + 0.0005 * t)
        })
        .collect();
    let mut bars = bars_from_closes(start, &closes);
    for i in 1..bars.len() {
        if bars[i].close < bars[i - 1].close {
            bars[i].volume = 2500;
        }
    }
    bars
}

/// Short windows so a few dozen bars are enough to get past warm-up.
pub fn short_window_config() -> BacktestConfig {
    let mut config = BacktestConfig {
        indicators: IndicatorConfig {
            macd_fast: 3,
            macd_slow: 6,
            macd_signal: 3,
            band_window: 5,
            volume_window: 5,
            valuation_window: 10,
            ..IndicatorConfig::default()
        },
        ..BacktestConfig::default()
    };
    config.accumulation.schedule = dcatrader::domain::config::Schedule::Daily;
    config
}
