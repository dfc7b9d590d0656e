//! Symbol list resolution for batch runs.

use crate::domain::error::DcaError;
use crate::ports::data_port::DataPort;
use std::collections::HashSet;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),
}

impl From<UniverseError> for DcaError {
    fn from(err: UniverseError) -> Self {
        DcaError::invalid("backtest", "codes", err.to_string())
    }
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(UniverseError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

/// The codes to run: a command-line override wins, then the configured
/// list, and with neither every symbol the provider knows.
pub fn resolve_codes(
    code_override: Option<&str>,
    configured: Option<&str>,
    data_port: &dyn DataPort,
) -> Result<Vec<String>, DcaError> {
    match code_override.or(configured) {
        Some(list) => Ok(parse_codes(list)?),
        None => {
            let codes = data_port.list_symbols()?;
            if codes.is_empty() {
                return Err(DcaError::Provider {
                    reason: "no symbols available".to_string(),
                });
            }
            Ok(codes)
        }
    }
}
