use anyhow::{Context, Result};
use card_advisor_service::{
    AppState, build_router,
    config::{Config, LogFormat},
    spawn_session_sweeper,
};
use card_flow::{Catalog, FlowController, FlowRunner, InMemorySessionStorage, SessionStorage};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured tracing based on the configured log format
fn init_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "card_advisor_service=debug,card_flow=debug,tower_http=debug".into()
    });

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    info!("Starting card advisor service v{}", env!("CARGO_PKG_VERSION"));

    let catalog = Catalog::load(&config.cards_path).with_context(|| {
        format!("failed to load card catalog from {}", config.cards_path.display())
    })?;

    let session_storage: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());
    let runner = FlowRunner::new(FlowController::new(catalog), session_storage);

    match config.session_idle_timeout {
        Some(max_idle) => {
            info!(
                idle_timeout_secs = max_idle.as_secs(),
                sweep_interval_secs = config.sweep_interval.as_secs(),
                "Idle session sweeper enabled"
            );
            spawn_session_sweeper(runner.clone(), max_idle, config.sweep_interval);
        }
        None => info!("Idle session sweeper disabled (set SESSION_IDLE_TIMEOUT_SECS to enable)"),
    }

    let app = build_router(AppState::new(runner), &config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!("Server running on http://{}", config.bind_addr);
    info!("Available endpoints:");
    info!("  GET  /health        - Health check");
    info!("  POST /chat          - Answer the next question");
    info!("  GET  /questions     - Question sequence");
    info!("  GET  /session/{{id}}  - Inspect an in-flight session");

    axum::serve(listener, app).await?;

    Ok(())
}
