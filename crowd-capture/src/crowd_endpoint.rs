use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use futures::stream;
use metrics::counter;
use multer::{parse_boundary, Multipart};
use tracing::{debug, info, instrument, warn, Span};

use crate::codec::UploadCompressionType;
use crate::ingest::{ingest_part, PartSummary};
use crate::router::State as AppState;

/// Placeholder for browsers hitting the upload URL.
pub async fn crowd_get() -> StatusCode {
    StatusCode::OK
}

/// Accepts a multipart upload of telemetry log files.
///
/// Every file part is ingested on its own, in the order it was sent. The
/// response is always an empty 200: clients fire and forget, so partial or
/// total failures only show up in logs and metrics.
#[instrument(
    skip_all,
    fields(
        content_type = %headers.get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or(""),
        content_length = %headers.get("content-length")
            .and_then(|v| v.to_str().ok())
            .unwrap_or(""),
        parts = tracing::field::Empty,
    )
)]
pub async fn crowd_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> StatusCode {
    counter!("crowd_uploads_total").increment(1);

    // Oversized or unreadable bodies are acknowledged like any other upload.
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            warn!(status = %e.status(), "dropping unreadable upload: {}", e.body_text());
            counter!("crowd_uploads_dropped_total", "cause" => "body").increment(1);
            return StatusCode::OK;
        }
    };

    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let boundary = match parse_boundary(content_type) {
        Ok(boundary) => boundary,
        Err(e) => {
            warn!("ignoring upload without multipart boundary: {}", e);
            return StatusCode::OK;
        }
    };

    // The writer is dropped when this function returns, releasing whatever
    // the sink acquired for this upload.
    let mut writer = match state.sink.open().await {
        Ok(writer) => writer,
        Err(e) => {
            warn!("failed to open entry sink, dropping upload: {}", e);
            counter!("crowd_uploads_dropped_total", "cause" => e.cause()).increment(1);
            return StatusCode::OK;
        }
    };

    let body_stream = stream::once(async move { Ok::<Bytes, std::io::Error>(body) });
    let mut multipart = Multipart::new(body_stream, boundary);

    let mut parts: usize = 0;
    let mut total = PartSummary::default();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("multipart parsing failed, ignoring remaining parts: {}", e);
                break;
            }
        };

        // plain form fields carry no file
        if field.file_name().is_none() {
            debug!("skipping form field {:?}", field.name());
            continue;
        }

        let field_name = field.name().unwrap_or("").to_string();
        let codec = UploadCompressionType::from_field_name(&field_name);
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                warn!(field = field_name.as_str(), "failed to read file part: {}", e);
                break;
            }
        };
        parts += 1;

        match ingest_part(writer.as_mut(), codec, data).await {
            Ok(summary) => {
                debug!(field = field_name.as_str(), ?summary, "file part ingested");
                total += summary;
            }
            Err(e) => warn!(field = field_name.as_str(), "dropping file part: {}", e),
        }
    }

    Span::current().record("parts", parts);
    info!(
        parts,
        lines = total.lines,
        persisted = total.persisted,
        skipped_lines = total.skipped_lines,
        failed_writes = total.failed_writes,
        "upload processed"
    );

    StatusCode::OK
}
