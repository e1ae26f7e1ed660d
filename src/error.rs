//! Error types for the crate's two genuine fallible boundaries: kernel
//! construction and archive I/O. Everything else (configuration clamps,
//! numerical pathologies) is handled silently per the crate's error
//! handling policy and never flows through here.

use thiserror::Error;

/// Errors raised while constructing a [`crate::force::ForceKernel`] or
/// [`crate::strain::StrainKernel`] backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("requested device has no atoms to operate on (N=0)")]
    EmptySystem,

    #[error("position/velocity/mass arrays have mismatched lengths: {0} vs {1}")]
    ShapeMismatch(usize, usize),

    #[cfg(feature = "cuda")]
    #[error("CUDA device unavailable: {0}")]
    CudaUnavailable(String),
}

/// Errors raised while reading or writing a snapshot archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("I/O error accessing archive at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to (de)serialize archive parameters: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write time-series CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("archive record count mismatch: expected {expected} atoms, found {found}")]
    RecordLenMismatch { expected: usize, found: usize },
}

pub type BackendResult<T> = Result<T, BackendError>;
pub type ArchiveResult<T> = Result<T, ArchiveError>;
