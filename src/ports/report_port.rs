//! Report consumer port.

use std::path::Path;

use crate::domain::backtest::BacktestReport;
use crate::domain::batch::BatchOutcome;
use crate::domain::error::DcaError;

/// Persists finished backtests. Formatting and file layout belong to the
/// implementation.
pub trait ReportPort {
    fn write(&self, report: &BacktestReport, output_dir: &Path) -> Result<(), DcaError>;

    /// One row per symbol, failures included.
    fn write_batch(&self, outcomes: &[BatchOutcome], output_dir: &Path) -> Result<(), DcaError>;
}
