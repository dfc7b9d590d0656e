//! CSV file price history adapter.
//!
//! One file per symbol, `<data_dir>/<CODE>.csv`, with a
//! `date,open,high,low,close,volume` header. Rows come back in file order:
//! the engine rejects unordered or duplicated input rather than having it
//! silently repaired here.

use crate::domain::error::DcaError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl CsvRow {
    fn into_bar(self) -> Result<OhlcvBar, DcaError> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").map_err(|e| {
            DcaError::Provider {
                reason: format!("invalid date {:?}: {e}", self.date),
            }
        })?;
        Ok(OhlcvBar {
            date,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume.round() as i64,
        })
    }
}

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{code}.csv"))
    }

    fn read_all(&self, code: &str) -> Result<Vec<OhlcvBar>, DcaError> {
        let path = self.csv_path(code);
        if !path.is_file() {
            return Err(DcaError::NoData {
                code: code.to_string(),
            });
        }
        let content = fs::read_to_string(&path).map_err(|e| DcaError::Provider {
            reason: format!("failed to read {}: {e}", path.display()),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        rdr.deserialize::<CsvRow>()
            .map(|row| {
                row.map_err(|e| DcaError::Provider {
                    reason: format!("{}: {e}", path.display()),
                })?
                .into_bar()
            })
            .collect()
    }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, DcaError> {
        let bars: Vec<OhlcvBar> = self
            .read_all(code)?
            .into_iter()
            .filter(|b| b.date >= start_date && b.date <= end_date)
            .collect();
        if bars.is_empty() {
            return Err(DcaError::NoData {
                code: code.to_string(),
            });
        }
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, DcaError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| DcaError::Provider {
            reason: format!(
                "failed to read directory {}: {e}",
                self.base_path.display()
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DcaError::Provider {
                reason: format!("directory entry error: {e}"),
            })?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(code) = name.strip_suffix(".csv") {
                symbols.push(code.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, DcaError> {
        let bars = match self.read_all(code) {
            Ok(bars) => bars,
            Err(DcaError::NoData { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        let first = bars.iter().map(|b| b.date).min();
        let last = bars.iter().map(|b| b.date).max();
        Ok(first.zip(last).map(|(f, l)| (f, l, bars.len())))
    }
}
