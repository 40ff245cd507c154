use async_trait::async_trait;

use crate::api::PersistenceError;
use crate::entries::TypedEntry;

pub mod postgres;
pub mod print;

/// Durable storage for typed entries.
///
/// A writer is opened once per upload and holds whatever backend resource the
/// upload needs (a pooled connection for Postgres). It is released when the
/// writer is dropped, whichever way the upload ends.
#[async_trait]
pub trait EntrySink {
    async fn open(&self) -> Result<Box<dyn EntryWriter>, PersistenceError>;
}

#[async_trait]
pub trait EntryWriter: Send {
    async fn persist(&mut self, entry: &TypedEntry) -> Result<(), PersistenceError>;
}
