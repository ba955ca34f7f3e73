pub mod config;
pub mod error;
pub mod routes;

use axum::{
    Router,
    http::{HeaderValue, Request},
    middleware::{Next, from_fn},
    routing::{get, post},
};
use card_flow::FlowRunner;
use std::time::Duration;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{Instrument, error};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub runner: FlowRunner,
}

impl AppState {
    pub fn new(runner: FlowRunner) -> Self {
        Self { runner }
    }
}

/// Build the HTTP router. `allowed_origins` may send credentialed cross-origin requests.
pub fn build_router(state: AppState, allowed_origins: &[HeaderValue]) -> Router {
    Router::new()
        .route("/health", get(routes::health_check))
        .route("/chat", post(routes::chat))
        .route("/questions", get(routes::list_questions))
        .route("/session/{id}", get(routes::get_session))
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(correlation_id_middleware))
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

fn cors_layer(allowed_origins: &[HeaderValue]) -> CorsLayer {
    // Credentials rule out wildcards, so methods and headers are mirrored instead.
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins.iter().cloned()))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

/// Middleware to add correlation ID to all requests
async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let correlation_id = Uuid::new_v4().to_string();

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        request.headers_mut().insert("x-correlation-id", value);
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);

    next.run(request).instrument(span).await
}

/// Periodically drop sessions idle for longer than `max_idle`.
pub fn spawn_session_sweeper(
    runner: FlowRunner,
    max_idle: Duration,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let max_idle = match chrono::Duration::from_std(max_idle) {
            Ok(max_idle) => max_idle,
            Err(e) => {
                error!(error = %e, "Session idle timeout out of range, sweeper disabled");
                return;
            }
        };
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            if let Err(e) = runner.purge_idle(max_idle).await {
                error!(error = %e, "Failed to purge idle sessions");
            }
        }
    })
}
