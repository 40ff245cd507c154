//! Runs one uploaded file part through the pipeline:
//! decompress, split into lines, decode records, dispatch, persist.
//!
//! Failures are contained at the smallest unit they affect. A bad part stops
//! that part, a bad line is skipped, a failed write drops one entry. They are
//! only reported through logs and metrics.

use bytes::Bytes;
use metrics::{counter, histogram};
use tracing::{debug, instrument, warn};

use crate::api::DecompressionError;
use crate::codec::{decompress, UploadCompressionType};
use crate::dispatch::dispatch;
use crate::framing::frame;
use crate::record::ParsedRecord;
use crate::sinks::EntryWriter;

/// What happened to the lines of one file part.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PartSummary {
    pub lines: usize,
    pub records: usize,
    pub skipped_lines: usize,
    pub persisted: usize,
    pub failed_writes: usize,
}

impl std::ops::AddAssign for PartSummary {
    fn add_assign(&mut self, other: Self) {
        self.lines += other.lines;
        self.records += other.records;
        self.skipped_lines += other.skipped_lines;
        self.persisted += other.persisted;
        self.failed_writes += other.failed_writes;
    }
}

#[instrument(skip_all, fields(codec = %codec, len = data.len()))]
pub async fn ingest_part(
    writer: &mut dyn EntryWriter,
    codec: UploadCompressionType,
    data: Bytes,
) -> Result<PartSummary, DecompressionError> {
    counter!("crowd_parts_total", "codec" => codec.as_str()).increment(1);

    let decompressed = decompress(codec, data).map_err(|err| {
        counter!("crowd_parts_dropped_total", "cause" => err.cause()).increment(1);
        err
    })?;
    histogram!("crowd_part_decompressed_bytes").record(decompressed.len() as f64);

    let text = String::from_utf8_lossy(&decompressed);
    Ok(ingest_text(writer, &text).await)
}

/// Persist every record found in already decompressed log text.
pub async fn ingest_text(writer: &mut dyn EntryWriter, text: &str) -> PartSummary {
    let mut summary = PartSummary::default();

    for (line_number, line) in frame(text) {
        summary.lines += 1;

        let record = match ParsedRecord::decode(line) {
            Ok(Some(record)) => record,
            Ok(None) => continue,
            Err(err) => {
                warn!(line = line_number, "skipping malformed record: {}", err);
                counter!("crowd_records_dropped_total", "cause" => "malformed").increment(1);
                summary.skipped_lines += 1;
                continue;
            }
        };
        summary.records += 1;
        counter!("crowd_records_received_total").increment(1);

        let entries = match dispatch(&record) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(line = line_number, "skipping record: {}", err);
                counter!("crowd_records_dropped_total", "cause" => err.cause()).increment(1);
                summary.skipped_lines += 1;
                continue;
            }
        };

        for entry in entries {
            let kind = entry.kind();
            match writer.persist(&entry).await {
                Ok(()) => {
                    debug!(line = line_number, kind = %kind, "persisted entry");
                    counter!("crowd_entries_persisted_total", "kind" => kind.identifier())
                        .increment(1);
                    summary.persisted += 1;
                }
                Err(err) => {
                    warn!(line = line_number, kind = %kind, "failed to persist entry: {}", err);
                    counter!("crowd_entries_dropped_total", "cause" => err.cause()).increment(1);
                    summary.failed_writes += 1;
                }
            }
        }
    }

    summary
}
