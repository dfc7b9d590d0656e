//! Configuration access port.

use crate::domain::error::DcaError;

/// Typed lookups into a sectioned key/value source. Missing numeric values
/// fall back to `default`; present values that do not parse are
/// `ConfigInvalid`.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, DcaError>;
    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, DcaError>;
}
