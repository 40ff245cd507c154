use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Postgres;
use tracing::{info, instrument};

use crate::api::PersistenceError;
use crate::entries::TypedEntry;
use crate::sinks::{EntrySink, EntryWriter};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS crowd_entries (
    id BIGSERIAL PRIMARY KEY,
    kind TEXT NOT NULL,
    timestamp BIGINT NOT NULL,
    latitude DOUBLE PRECISION,
    longitude DOUBLE PRECISION,
    accuracy REAL,
    payload JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const INSERT_ENTRY: &str = r#"
INSERT INTO crowd_entries (kind, timestamp, latitude, longitude, accuracy, payload)
VALUES ($1, $2, $3, $4, $5, $6)
"#;

/// Stores every entry as one row of `crowd_entries`, the kind-specific payload
/// going into a JSONB column.
#[derive(Clone)]
pub struct PostgresSink {
    pool: PgPool,
}

impl PostgresSink {
    pub async fn new(url: &str, max_connections: u32) -> Result<Self, PersistenceError> {
        info!("connecting to Postgres...");
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|error| PersistenceError::Query {
                command: "CONNECT",
                error,
            })?;

        let sink = Self::from_pool(pool);
        sink.init_schema().await?;
        info!("connected to Postgres");
        Ok(sink)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn init_schema(&self) -> Result<(), PersistenceError> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|error| PersistenceError::Query {
                command: "CREATE TABLE",
                error,
            })?;
        Ok(())
    }
}

#[async_trait]
impl EntrySink for PostgresSink {
    async fn open(&self) -> Result<Box<dyn EntryWriter>, PersistenceError> {
        let conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| PersistenceError::Unavailable(e.to_string()))?;
        Ok(Box::new(PostgresWriter { conn }))
    }
}

/// Holds one pooled connection for the lifetime of an upload. The connection
/// goes back to the pool on drop.
pub struct PostgresWriter {
    conn: PoolConnection<Postgres>,
}

#[async_trait]
impl EntryWriter for PostgresWriter {
    #[instrument(skip_all, fields(kind = %entry.kind()))]
    async fn persist(&mut self, entry: &TypedEntry) -> Result<(), PersistenceError> {
        let payload = entry.payload_json()?;
        let location = entry.location();

        sqlx::query(INSERT_ENTRY)
            .bind(entry.kind().identifier())
            .bind(entry.timestamp())
            .bind(location.map(|l| l.latitude))
            .bind(location.map(|l| l.longitude))
            .bind(location.map(|l| l.accuracy))
            .bind(sqlx::types::Json(payload))
            .execute(&mut *self.conn)
            .await
            .map_err(|error| PersistenceError::Query {
                command: "INSERT",
                error,
            })?;

        Ok(())
    }
}
