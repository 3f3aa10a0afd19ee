//! Error taxonomy for the repricing pipeline.
//!
//! Library code returns [`RepriceError`]; the command-line layer wraps it in
//! `anyhow` with context, the same way every other command does.

use std::io;

use thiserror::Error;

pub type Result<T, E = RepriceError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum RepriceError {
    /// The whole source could not be read. Individual bad rows never end up here.
    #[error("failed to read {source_name}: {reason}")]
    Ingestion { source_name: String, reason: String },

    #[error("{snapshot} snapshot is missing required column '{column}'")]
    MissingColumn {
        column: &'static str,
        snapshot: &'static str,
    },

    #[error("computation failed: {0}")]
    Computation(String),

    /// Nothing usable was handed to the pipeline (no file, empty selection).
    #[error("{0}")]
    Transport(String),

    #[error("failed to write {target}")]
    Output {
        target: String,
        #[source]
        source: io::Error,
    },
}

impl RepriceError {
    pub fn ingestion(source_name: impl Into<String>, reason: impl ToString) -> Self {
        RepriceError::Ingestion {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn output(target: impl Into<String>, source: io::Error) -> Self {
        RepriceError::Output {
            target: target.into(),
            source,
        }
    }

    pub fn is_ingestion(&self) -> bool {
        matches!(self, RepriceError::Ingestion { .. })
    }
}
