//! Configuration validation.
//!
//! Validates every config field before a backtest runs. Any failure here is
//! fatal for the symbol: no ledger is created.

use crate::domain::config::{
    AccumulationConfig, BacktestConfig, CapitalConfig, ExecutionConfig, IndicatorConfig,
    RotationConfig,
};
use crate::domain::error::DcaError;

pub fn validate_backtest_config(config: &BacktestConfig) -> Result<(), DcaError> {
    validate_dates(config)?;
    validate_risk_free_rate(config.risk_free_rate)?;
    validate_capital(&config.capital)?;
    validate_indicators(&config.indicators)?;
    validate_accumulation(&config.accumulation)?;
    validate_rotation(&config.rotation)?;
    validate_execution(&config.execution)?;
    Ok(())
}

fn validate_dates(config: &BacktestConfig) -> Result<(), DcaError> {
    if config.start_date >= config.end_date {
        return Err(DcaError::invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(value: f64) -> Result<(), DcaError> {
    if !(0.0..1.0).contains(&value) {
        return Err(DcaError::invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn positive(section: &str, key: &str, value: f64) -> Result<(), DcaError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(DcaError::invalid(
            section,
            key,
            format!("{key} must be positive"),
        ));
    }
    Ok(())
}

fn non_negative(section: &str, key: &str, value: f64) -> Result<(), DcaError> {
    if !value.is_finite() || value < 0.0 {
        return Err(DcaError::invalid(
            section,
            key,
            format!("{key} must be non-negative"),
        ));
    }
    Ok(())
}

fn fraction(section: &str, key: &str, value: f64) -> Result<(), DcaError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(DcaError::invalid(
            section,
            key,
            format!("{key} must be between 0 and 1"),
        ));
    }
    Ok(())
}

fn window(section: &str, key: &str, value: usize, minimum: usize) -> Result<(), DcaError> {
    if value < minimum {
        return Err(DcaError::invalid(
            section,
            key,
            format!("{key} must be at least {minimum}"),
        ));
    }
    Ok(())
}

fn validate_capital(capital: &CapitalConfig) -> Result<(), DcaError> {
    positive("capital", "accumulation", capital.accumulation)?;
    positive("capital", "rotation", capital.rotation)?;
    Ok(())
}

fn validate_indicators(ind: &IndicatorConfig) -> Result<(), DcaError> {
    window("indicators", "macd_fast", ind.macd_fast, 1)?;
    window("indicators", "macd_slow", ind.macd_slow, 1)?;
    window("indicators", "macd_signal", ind.macd_signal, 1)?;
    if ind.macd_fast >= ind.macd_slow {
        return Err(DcaError::invalid(
            "indicators",
            "macd_fast",
            "macd_fast must be shorter than macd_slow",
        ));
    }
    window("indicators", "band_window", ind.band_window, 1)?;
    window("indicators", "volume_window", ind.volume_window, 1)?;
    window("indicators", "valuation_window", ind.valuation_window, 2)?;

    fraction("indicators", "band_upper_quantile", ind.band_upper_quantile)?;
    fraction("indicators", "band_lower_quantile", ind.band_lower_quantile)?;
    if ind.band_lower_quantile >= ind.band_upper_quantile {
        return Err(DcaError::invalid(
            "indicators",
            "band_lower_quantile",
            "band_lower_quantile must be below band_upper_quantile",
        ));
    }

    positive("indicators", "volume_surge_ratio", ind.volume_surge_ratio)?;
    positive("indicators", "volume_shrink_ratio", ind.volume_shrink_ratio)?;
    if ind.volume_shrink_ratio >= ind.volume_surge_ratio {
        return Err(DcaError::invalid(
            "indicators",
            "volume_shrink_ratio",
            "volume_shrink_ratio must be below volume_surge_ratio",
        ));
    }
    Ok(())
}

fn validate_accumulation(acc: &AccumulationConfig) -> Result<(), DcaError> {
    positive("accumulation", "amount", acc.amount)?;
    fraction("accumulation", "cheap_percentile", acc.cheap_percentile)?;
    fraction("accumulation", "overheat_percentile", acc.overheat_percentile)?;
    if acc.cheap_percentile >= acc.overheat_percentile {
        return Err(DcaError::invalid(
            "accumulation",
            "cheap_percentile",
            "cheap_percentile must be below overheat_percentile",
        ));
    }
    positive("accumulation", "cheap_multiplier", acc.cheap_multiplier)?;
    positive("accumulation", "rich_multiplier", acc.rich_multiplier)?;
    positive("accumulation", "half_profit", acc.half_profit)?;
    positive("accumulation", "full_profit", acc.full_profit)?;
    if acc.full_profit <= acc.half_profit {
        return Err(DcaError::invalid(
            "accumulation",
            "full_profit",
            "full_profit must exceed half_profit",
        ));
    }
    Ok(())
}

fn validate_rotation(rot: &RotationConfig) -> Result<(), DcaError> {
    positive("rotation", "amount", rot.amount)?;
    if !(1..=3).contains(&rot.confirmations) {
        return Err(DcaError::invalid(
            "rotation",
            "confirmations",
            "confirmations must be between 1 and 3",
        ));
    }
    if !(0.0..1.0).contains(&rot.stop_loss) {
        return Err(DcaError::invalid(
            "rotation",
            "stop_loss",
            "stop_loss must be at least 0 and below 1",
        ));
    }
    non_negative("rotation", "take_profit", rot.take_profit)?;
    Ok(())
}

fn validate_execution(exec: &ExecutionConfig) -> Result<(), DcaError> {
    non_negative("execution", "commission_rate", exec.commission_rate)?;
    non_negative("execution", "min_commission", exec.min_commission)?;
    if !(0.0..1.0).contains(&exec.slippage_rate) {
        return Err(DcaError::invalid(
            "execution",
            "slippage_rate",
            "slippage_rate must be at least 0 and below 1",
        ));
    }
    Ok(())
}
