//! Backtest configuration.
//!
//! Every component receives its slice of configuration by value at
//! construction time. Defaults carry the tuned constants of the strategy; they
//! are starting points, not claims of optimality.

use chrono::{NaiveDate, Weekday};

use super::config_validation;
use super::error::DcaError;

/// Starting capital of the two sub-accounts. The pools never share cash.
#[derive(Debug, Clone, PartialEq)]
pub struct CapitalConfig {
    pub accumulation: f64,
    pub rotation: f64,
}

impl CapitalConfig {
    pub fn total(&self) -> f64 {
        self.accumulation + self.rotation
    }
}

impl Default for CapitalConfig {
    fn default() -> Self {
        // 500k split 70/30
        CapitalConfig {
            accumulation: 350_000.0,
            rotation: 150_000.0,
        }
    }
}

/// Lookback windows and thresholds for the indicator engine.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    /// Number of MACD line values the adaptive band is drawn from.
    pub band_window: usize,
    pub band_upper_quantile: f64,
    pub band_lower_quantile: f64,
    pub volume_window: usize,
    pub volume_surge_ratio: f64,
    pub volume_shrink_ratio: f64,
    pub valuation_window: usize,
    /// 0 disables ATR and with it volatility-scaled sizing.
    pub atr_period: usize,
}

impl IndicatorConfig {
    /// Bars needed before every enabled indicator is defined.
    pub fn warmup_bars(&self) -> usize {
        let macd = self.macd_slow + self.macd_signal - 1;
        let band = self.macd_slow + self.band_window - 1;
        let atr = if self.atr_period > 0 {
            self.atr_period + 1
        } else {
            0
        };
        macd.max(band)
            .max(self.volume_window)
            .max(self.valuation_window)
            .max(atr)
    }
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        IndicatorConfig {
            macd_fast: 6,
            macd_slow: 13,
            macd_signal: 5,
            band_window: 20,
            band_upper_quantile: 0.8,
            band_lower_quantile: 0.2,
            volume_window: 20,
            volume_surge_ratio: 1.5,
            volume_shrink_ratio: 0.8,
            valuation_window: 252,
            atr_period: 0,
        }
    }
}

/// When an already-open accumulation book buys again without a fresh
/// lower-band entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Daily,
    Weekly(Weekday),
}

impl Schedule {
    pub fn is_due(&self, date: NaiveDate) -> bool {
        use chrono::Datelike;
        match self {
            Schedule::Daily => true,
            Schedule::Weekly(day) => date.weekday() == *day,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccumulationConfig {
    /// Base notional per scheduled buy.
    pub amount: f64,
    pub schedule: Schedule,
    pub cheap_percentile: f64,
    pub cheap_multiplier: f64,
    /// Valuation percentile above which the market counts as overheated.
    pub overheat_percentile: f64,
    pub rich_multiplier: f64,
    /// Unrealized profit that, when overheated, sells half the book.
    pub half_profit: f64,
    /// Unrealized profit that sells the whole book regardless of valuation.
    pub full_profit: f64,
    pub max_partial_reductions: u32,
}

impl Default for AccumulationConfig {
    fn default() -> Self {
        AccumulationConfig {
            amount: 1_000.0,
            schedule: Schedule::Weekly(Weekday::Mon),
            cheap_percentile: 0.2,
            cheap_multiplier: 1.5,
            overheat_percentile: 0.8,
            rich_multiplier: 0.5,
            half_profit: 0.30,
            full_profit: 0.50,
            max_partial_reductions: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RotationConfig {
    /// Fixed notional per rotation entry.
    pub amount: f64,
    /// How many entry conditions must hold at once (1..=3).
    pub confirmations: usize,
    /// Per-lot loss fraction that forces the rotation book closed. 0 disables.
    pub stop_loss: f64,
    /// Per-lot gain fraction that closes the rotation book. 0 disables.
    pub take_profit: f64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        RotationConfig {
            amount: 5_000.0,
            confirmations: 2,
            stop_loss: 0.05,
            take_profit: 0.0,
        }
    }
}

/// Fill costs. All rates are fractions of notional.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    pub commission_rate: f64,
    pub min_commission: f64,
    pub slippage_rate: f64,
    /// Round share counts down to a multiple of this. 0 trades fractional shares.
    pub lot_size: u32,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            commission_rate: 0.0,
            min_commission: 0.0,
            slippage_rate: 0.0,
            lot_size: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub capital: CapitalConfig,
    pub indicators: IndicatorConfig,
    pub accumulation: AccumulationConfig,
    pub rotation: RotationConfig,
    pub execution: ExecutionConfig,
    pub risk_free_rate: f64,
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), DcaError> {
        config_validation::validate_backtest_config(self)
    }
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            start_date: NaiveDate::MIN,
            end_date: NaiveDate::MAX,
            capital: CapitalConfig::default(),
            indicators: IndicatorConfig::default(),
            accumulation: AccumulationConfig::default(),
            rotation: RotationConfig::default(),
            execution: ExecutionConfig::default(),
            risk_free_rate: 0.0,
        }
    }
}
