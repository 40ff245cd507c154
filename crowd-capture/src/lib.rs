pub mod api;
pub mod codec;
pub mod config;
pub mod crowd_endpoint;
pub mod dispatch;
pub mod entries;
pub mod framing;
pub mod ingest;
pub mod prometheus;
pub mod record;
pub mod router;
pub mod server;
pub mod sinks;
