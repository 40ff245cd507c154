use std::future::Future;
use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::router;
use crate::sinks::postgres::PostgresSink;
use crate::sinks::print::PrintSink;

pub async fn serve<F>(config: Config, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = if config.print_sink {
        // Print sink is only used for local debug
        tracing::warn!("PRINT_SINK is set, entries are logged and not stored");
        router::router(
            PrintSink {},
            config.max_request_body_size_bytes,
            config.export_prometheus,
        )
    } else {
        let sink = PostgresSink::new(&config.database_url, config.max_pg_connections)
            .await
            .context("failed to start Postgres sink")?;
        router::router(
            sink,
            config.max_request_body_size_bytes,
            config.export_prometheus,
        )
    };

    tracing::info!("listening on {:?}", listener.local_addr()?);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;

    Ok(())
}
