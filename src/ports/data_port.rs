//! Price history provider port.

use crate::domain::error::DcaError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

/// Supplies daily bars for one symbol. Implementations return bars as stored;
/// ordering and uniqueness are checked by the engine, not repaired here.
///
/// `Sync` so a batch can fan one provider out across worker threads.
pub trait DataPort: Sync {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, DcaError>;

    fn list_symbols(&self) -> Result<Vec<String>, DcaError>;

    /// First date, last date and bar count, or `None` when the symbol has no bars.
    fn get_data_range(&self, code: &str) -> Result<Option<(NaiveDate, NaiveDate, usize)>, DcaError>;
}
