//! Domain error types.
//!
//! Only fatal conditions live here. A buy that exceeds its cash pool or a sell
//! that exceeds open shares is a [`Rejected`](crate::domain::ledger::Rejected)
//! outcome, not an error.

use chrono::NaiveDate;

/// What was wrong with a price series handed to the engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataErrorKind {
    #[error("no bars")]
    Empty,

    #[error("bar {index} is earlier than the bar before it")]
    NonChronological { index: usize },

    #[error("duplicate bar for {date}")]
    DuplicateDate { date: NaiveDate },

    #[error("non-positive price on {date}")]
    NonPositivePrice { date: NaiveDate },

    #[error("non-positive volume on {date}")]
    NonPositiveVolume { date: NaiveDate },
}

/// Top-level error type for dcatrader.
#[derive(Debug, thiserror::Error)]
pub enum DcaError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("bad price data for {code}: {kind}")]
    Data { code: String, kind: DataErrorKind },

    #[error("price provider error: {reason}")]
    Provider { reason: String },

    #[error("no data for {code}")]
    NoData { code: String },

    #[error("report write error: {reason}")]
    Report { reason: String },

    #[error("cancelled before {code} started")]
    Cancelled { code: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DcaError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        DcaError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(
            self,
            DcaError::ConfigParse { .. } | DcaError::ConfigInvalid { .. }
        )
    }
}

impl From<csv::Error> for DcaError {
    fn from(err: csv::Error) -> Self {
        DcaError::Report {
            reason: err.to_string(),
        }
    }
}

impl From<&DcaError> for std::process::ExitCode {
    fn from(err: &DcaError) -> Self {
        let code: u8 = match err {
            DcaError::Io(_) | DcaError::Report { .. } => 1,
            DcaError::ConfigParse { .. } | DcaError::ConfigInvalid { .. } => 2,
            DcaError::Provider { .. } => 3,
            DcaError::Cancelled { .. } => 4,
            DcaError::Data { .. } | DcaError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
