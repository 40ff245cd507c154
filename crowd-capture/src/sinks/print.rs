use async_trait::async_trait;
use tracing::info;

use crate::api::PersistenceError;
use crate::entries::TypedEntry;
use crate::sinks::{EntrySink, EntryWriter};

pub struct PrintSink {}

#[async_trait]
impl EntrySink for PrintSink {
    async fn open(&self) -> Result<Box<dyn EntryWriter>, PersistenceError> {
        Ok(Box::new(PrintWriter {}))
    }
}

struct PrintWriter {}

#[async_trait]
impl EntryWriter for PrintWriter {
    async fn persist(&mut self, entry: &TypedEntry) -> Result<(), PersistenceError> {
        info!("entry: {:?}", entry);
        Ok(())
    }
}
