//! Unified error handling for the analytics library.
//!
//! The analytics functions themselves are total: empty tracks, empty
//! histories and flat correlation axes all have defined results. Errors only
//! appear at the edges of the crate, when parsing caller-supplied keys or when
//! a storage backend fails.

use thiserror::Error;

/// Unified error type for endurance-lab operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalyticsError {
    /// A metric key that is not part of the catalogue
    #[error("Unknown metric '{key}'")]
    UnknownMetric { key: String },
    /// Profile data that cannot be used (e.g. a birthdate in the future)
    #[error("Invalid profile: {message}")]
    InvalidProfile { message: String },
    /// Storage backend error
    #[error("Store error: {message}")]
    Store { message: String },
    /// Snapshot serialization error
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl From<serde_json::Error> for AnalyticsError {
    fn from(err: serde_json::Error) -> Self {
        AnalyticsError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Result type alias for endurance-lab operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Extension trait for converting Option to AnalyticsError.
pub trait OptionExt<T> {
    /// Convert Option to Result with an unknown metric error.
    fn ok_or_unknown_metric(self, key: &str) -> Result<T>;

    /// Convert Option to Result with a store error.
    fn ok_or_store(self, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_unknown_metric(self, key: &str) -> Result<T> {
        self.ok_or_else(|| AnalyticsError::UnknownMetric {
            key: key.to_string(),
        })
    }

    fn ok_or_store(self, message: &str) -> Result<T> {
        self.ok_or_else(|| AnalyticsError::Store {
            message: message.to_string(),
        })
    }
}
