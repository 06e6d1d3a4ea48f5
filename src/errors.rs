//! Storage error taxonomy.
//!
//! Mirrors the stable negative integer error codes callers outside the
//! crate match against, while giving in-process callers a normal Rust
//! `Error` to match on instead.

use thiserror::Error;

/// Storage-layer errors. Every storage operation returns one of these.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not open file")]
    OpenFile,

    #[error("term decode error: {0}")]
    ParseTerm(String),

    #[error("allocation failed")]
    AllocFail,

    #[error("short read")]
    Read,

    #[error("document not found")]
    DocNotFound,

    #[error("no valid header found")]
    NoHeader,

    #[error("write failed")]
    Write,

    #[error("unsupported header version")]
    HeaderVersion,

    #[error("chunk checksum mismatch")]
    ChecksumFail,
}

impl StoreError {
    /// Stable negative error code, matching the wire-level contract callers depend on.
    #[must_use]
    pub const fn as_code(&self) -> i32 {
        match self {
            Self::OpenFile => -1,
            Self::ParseTerm(_) => -2,
            Self::AllocFail => -3,
            Self::Read | Self::Io(_) => -4,
            Self::DocNotFound => -5,
            Self::NoHeader => -6,
            Self::Write => -7,
            Self::HeaderVersion => -8,
            Self::ChecksumFail => -9,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
