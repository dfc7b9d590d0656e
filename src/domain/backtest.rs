//! Single-symbol backtest pipeline.
//!
//! bars -> IndicatorEngine -> ExecutionSimulator -> PerformanceSummary.
//! Configuration and data errors abort before the first bar is simulated, so
//! an `Err` never carries a partial ledger.

use tracing::info;

use super::config::BacktestConfig;
use super::error::DcaError;
use super::indicator::IndicatorEngine;
use super::lot::{Kind, Lot, Trade};
use super::metrics::PerformanceSummary;
use super::ohlcv::OhlcvBar;
use super::simulator::{DeclinedAction, EquityPoint, ExecutionSimulator};

/// Everything a report consumer needs for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestReport {
    pub code: String,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub declined: Vec<DeclinedAction>,
    /// Lots still open after the final bar.
    pub open_lots: Vec<Lot>,
    pub summary: PerformanceSummary,
}

pub fn run_backtest(
    code: &str,
    bars: &[OhlcvBar],
    config: &BacktestConfig,
) -> Result<BacktestReport, DcaError> {
    config.validate()?;
    let engine = IndicatorEngine::new(code, bars, config.indicators.clone())?;
    let sets = engine.compute();

    let result = ExecutionSimulator::new(config).run(&sets);
    let summary = PerformanceSummary::compute(&result, &config.capital, config.risk_free_rate);

    info!(
        code,
        bars = bars.len(),
        trades = summary.total_trades(),
        declined = summary.declined_actions,
        total_return = summary.total_return,
        "backtest finished"
    );

    let open_lots = result
        .ledger
        .lots(Kind::Accumulation)
        .chain(result.ledger.lots(Kind::Rotation))
        .cloned()
        .collect();

    Ok(BacktestReport {
        code: code.to_string(),
        trades: result.ledger.trades().to_vec(),
        equity_curve: result.equity_curve,
        declined: result.declined,
        open_lots,
        summary,
    })
}
