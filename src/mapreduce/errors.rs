//! Map-runtime error taxonomy, kept separate from
//! `StoreError` because the two never compose: a map context never touches
//! the storage layer, and a storage error never crosses into a map result.

use thiserror::Error;

/// A map function either fails to compile, or its inputs are malformed;
/// a per-document timeout or runtime exception is reported through
/// [`crate::mapreduce::MapCallResult`] instead, since it is a per-call
/// outcome rather than a failure of the whole context.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("syntax error compiling map function: {0}")]
    SyntaxError(String),

    #[error("doc or meta JSON is invalid: {0}")]
    InvalidJson(String),
}

pub type MapResult<T> = Result<T, MapError>;
