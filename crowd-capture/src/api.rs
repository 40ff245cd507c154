use thiserror::Error;

use crate::entries::EntryKind;

/// Failure to decode a whole file part. Only that part is dropped, the
/// remaining parts of the upload are still processed.
#[derive(Error, Debug)]
pub enum DecompressionError {
    #[error("failed to uncompress file (gz): {0}")]
    Gzip(#[source] std::io::Error),
    #[error("failed to uncompress file (default): {0}")]
    Default(String),
}

impl DecompressionError {
    pub fn cause(&self) -> &'static str {
        match self {
            DecompressionError::Gzip(_) => "gzip",
            DecompressionError::Default(_) => "default",
        }
    }
}

/// A line that could not be turned into a record. Fatal to that line only.
#[derive(Error, Debug)]
#[error("malformed record field `{field}`: {reason}")]
pub struct MalformedRecordError {
    pub field: &'static str,
    pub reason: String,
}

impl MalformedRecordError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("unknown record identifier: {identifier}")]
    UnknownKind { identifier: String },
    #[error("failed to decode {kind} payload: {source}")]
    PayloadDecode {
        kind: EntryKind,
        #[source]
        source: serde_json::Error,
    },
}

impl DispatchError {
    pub fn cause(&self) -> &'static str {
        match self {
            DispatchError::UnknownKind { .. } => "unknown_kind",
            DispatchError::PayloadDecode { .. } => "payload_decode",
        }
    }
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("persistence backend unavailable: {0}")]
    Unavailable(String),
    #[error("{command} query failed with: {error}")]
    Query {
        command: &'static str,
        error: sqlx::Error,
    },
    #[error("failed to encode entry: {0}")]
    Encode(#[from] serde_json::Error),
}

impl PersistenceError {
    pub fn cause(&self) -> &'static str {
        match self {
            PersistenceError::Unavailable(_) => "unavailable",
            PersistenceError::Query { .. } => "query",
            PersistenceError::Encode(_) => "encode",
        }
    }
}
