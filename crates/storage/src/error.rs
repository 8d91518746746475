use std::fmt;

use thiserror::Error;

/// A single medium's failure, captured while walking the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediumFault {
    pub medium: String,
    pub message: String,
}

impl MediumFault {
    pub fn new(medium: &str, err: &anyhow::Error) -> Self {
        Self {
            medium: medium.to_string(),
            message: format!("{err:#}"),
        }
    }
}

impl fmt::Display for MediumFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.medium, self.message)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("preference key must not be empty")]
    InvalidKey,
    #[error("no storage media configured")]
    NoMedia,
    #[error("failed to serialize value for key '{key}'")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("stored value for key '{key}' could not be parsed")]
    Deserialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("every storage medium failed for key '{key}': {}", join_faults(.faults))]
    Unavailable {
        key: String,
        faults: Vec<MediumFault>,
    },
}

impl StoreError {
    /// True when the failure came from the media rather than from the caller's data.
    pub fn is_storage_fault(&self) -> bool {
        matches!(self, StoreError::Unavailable { .. } | StoreError::NoMedia)
    }
}

fn join_faults(faults: &[MediumFault]) -> String {
    faults
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
