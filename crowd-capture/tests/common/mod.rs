#![allow(dead_code)]

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use crowd_capture::api::PersistenceError;
use crowd_capture::entries::{EntryKind, TypedEntry};
use crowd_capture::sinks::{EntrySink, EntryWriter};
use flate2::write::GzEncoder;
use flate2::Compression;

/// Keeps persisted entries in memory, in call order. Writes of `fail_kind`
/// entries fail, to exercise the error path.
#[derive(Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<TypedEntry>>>,
    fail_kind: Option<EntryKind>,
    opened: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
    persist_calls: Arc<AtomicUsize>,
}

impl MemorySink {
    pub fn failing_on(kind: EntryKind) -> Self {
        Self {
            fail_kind: Some(kind),
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn entries(&self) -> Vec<TypedEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<EntryKind> {
        self.entries().iter().map(TypedEntry::kind).collect()
    }

    pub fn timestamps(&self) -> Vec<i64> {
        self.entries().iter().map(TypedEntry::timestamp).collect()
    }

    pub fn persist_calls(&self) -> usize {
        self.persist_calls.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn writer(&self) -> MemoryWriter {
        self.opened.fetch_add(1, Ordering::SeqCst);
        MemoryWriter { sink: self.clone() }
    }
}

#[async_trait]
impl EntrySink for MemorySink {
    async fn open(&self) -> Result<Box<dyn EntryWriter>, PersistenceError> {
        Ok(Box::new(self.writer()))
    }
}

pub struct MemoryWriter {
    sink: MemorySink,
}

#[async_trait]
impl EntryWriter for MemoryWriter {
    async fn persist(&mut self, entry: &TypedEntry) -> Result<(), PersistenceError> {
        self.sink.persist_calls.fetch_add(1, Ordering::SeqCst);
        if self.sink.fail_kind == Some(entry.kind()) {
            return Err(PersistenceError::Unavailable(String::from("injected failure")));
        }
        self.sink.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

impl Drop for MemoryWriter {
    fn drop(&mut self) {
        self.sink.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Sink that cannot hand out writers.
pub struct UnavailableSink;

#[async_trait]
impl EntrySink for UnavailableSink {
    async fn open(&self) -> Result<Box<dyn EntryWriter>, PersistenceError> {
        Err(PersistenceError::Unavailable(String::from("no database")))
    }
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn line(timestamp: i64, identifier: &str, data_blob: &str) -> String {
    serde_json::json!({
        "timestamp": timestamp,
        "identifier": identifier,
        "location": null,
        "dataBlob": data_blob,
    })
    .to_string()
}

pub fn located_line(timestamp: i64, identifier: &str, data_blob: &str) -> String {
    serde_json::json!({
        "timestamp": timestamp,
        "identifier": identifier,
        "location": {"latitude": 52.52, "longitude": 13.40, "accuracy": 15.0},
        "dataBlob": data_blob,
    })
    .to_string()
}

pub fn lines(lines: &[String]) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}
