use std::future::ready;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::crowd_endpoint;
use crate::prometheus::{setup_metrics_recorder, track_metrics};
use crate::sinks;

pub const DEFAULT_BODY_LIMIT: usize = 32 * 1024 * 1024;

#[derive(Clone)]
pub struct State {
    pub sink: Arc<dyn sinks::EntrySink + Send + Sync>,
}

async fn index() -> &'static str {
    "crowd-capture"
}

pub fn router<S: sinks::EntrySink + Send + Sync + 'static>(
    sink: S,
    body_limit: usize,
    metrics: bool,
) -> Router {
    let state = State {
        sink: Arc::new(sink),
    };

    let router = Router::new()
        .route("/", get(index))
        .route("/_readiness", get(index))
        .route("/_liveness", get(index))
        .route(
            "/crowd",
            get(crowd_endpoint::crowd_get).post(crowd_endpoint::crowd_upload),
        )
        .route(
            "/crowd/",
            get(crowd_endpoint::crowd_get).post(crowd_endpoint::crowd_upload),
        )
        .route(
            "/crowd/*path",
            get(crowd_endpoint::crowd_get).post(crowd_endpoint::crowd_upload),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(track_metrics))
        .with_state(state);

    // Don't install metrics unless asked to
    // Installing a global recorder when used as a library (during tests etc)
    // does not work well.
    if !metrics {
        return router;
    }
    match setup_metrics_recorder() {
        Ok(recorder_handle) => {
            router.route("/metrics", get(move || ready(recorder_handle.render())))
        }
        Err(e) => {
            tracing::error!("failed to install prometheus recorder: {}", e);
            router
        }
    }
}
