use std::fmt::Display;

use thiserror::Error;

/// Recoverable failures of the statistics core. Components that report one of
/// these keep their last-known-good state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// Network failure, non-success status, or a malformed response.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// A selection referenced an isoCode absent from the current snapshot.
    #[error("unknown country: {0}")]
    UnknownCountry(String),
}

impl TrackerError {
    pub fn data_unavailable(err: impl Display) -> Self {
        Self::DataUnavailable(err.to_string())
    }
}

impl From<anyhow::Error> for TrackerError {
    fn from(err: anyhow::Error) -> Self {
        Self::DataUnavailable(format!("{err:#}"))
    }
}
