//! Multi-symbol batch driver.
//!
//! Symbols are independent: each runs on its own rayon task with its own
//! ledger, and each produces its own `Result`. One symbol failing never
//! touches another. Setting the cancel flag stops symbols that have not
//! started yet; a running simulation always finishes.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tracing::{info, info_span, warn};

use super::backtest::{run_backtest, BacktestReport};
use super::config::BacktestConfig;
use super::error::DcaError;
use crate::ports::data_port::DataPort;

#[derive(Debug)]
pub struct BatchOutcome {
    pub code: String,
    pub result: Result<BacktestReport, DcaError>,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Run every code in `codes`. Outcomes come back in input order.
///
/// An invalid `config` is rejected up front, before any data is fetched.
pub fn run_batch(
    data_port: &dyn DataPort,
    codes: &[String],
    config: &BacktestConfig,
    cancel: Option<&AtomicBool>,
) -> Result<Vec<BatchOutcome>, DcaError> {
    config.validate()?;
    info!(symbols = codes.len(), "starting batch");

    let outcomes: Vec<BatchOutcome> = codes
        .par_iter()
        .map(|code| {
            let _span = info_span!("symbol", code = %code).entered();
            let result = run_one(data_port, code, config, cancel);
            if let Err(e) = &result {
                warn!(error = %e, "symbol failed");
            }
            BatchOutcome {
                code: code.clone(),
                result,
            }
        })
        .collect();

    let ok = outcomes.iter().filter(|o| o.is_ok()).count();
    info!(ok, failed = outcomes.len() - ok, "batch finished");
    Ok(outcomes)
}

fn run_one(
    data_port: &dyn DataPort,
    code: &str,
    config: &BacktestConfig,
    cancel: Option<&AtomicBool>,
) -> Result<BacktestReport, DcaError> {
    if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
        return Err(DcaError::Cancelled {
            code: code.to_string(),
        });
    }
    let bars = data_port.fetch_ohlcv(code, config.start_date, config.end_date)?;
    run_backtest(code, &bars, config)
}
