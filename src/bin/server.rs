//! Film sink HTTP server
//!
//! # Endpoints
//!
//! - `GET /{key}?name=..` - always answers `[]`
//! - `POST /{key}` - validate one film (`201`, `400`, `500`, or a simulated `503`)
//! - `GET /metrics` - Prometheus metrics
//!
//! # Configuration
//!
//! The server reads configuration from:
//! 1. `SINK_CONFIG` environment variable (path to TOML file)
//! 2. `./sink.toml` in current directory
//! 3. Default configuration
//!
//! Logs are JSON on stdout unless `SINK_LOG_FORMAT=text`. Levels follow
//! `RUST_LOG`, with `info` for the sink itself.
//!
//! # Example
//!
//! ```bash
//! # Start server with default config
//! ./server
//!
//! # Submit a film
//! curl -X POST http://localhost:9009/films \
//!   -H "Content-Type: application/json" \
//!   -d '{"year": 1979, "title": "Alien", "popularity": 90, "awards": "Yes", "image": "alien.png"}'
//! ```

use film_sink::server::{build_router, load_config, AppState};
use tokio::signal;
use tracing::info;

/// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("film_sink=info".parse()?)
        .add_directive("server=info".parse()?);

    let text = std::env::var("SINK_LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("text"))
        .unwrap_or(false);

    if text {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stdout)
            .with_env_filter(filter)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing()?;

    info!(version = env!("CARGO_PKG_VERSION"), "Film sink starting");

    let config = load_config();
    config.validate()?;
    let addr = config.socket_addr()?;
    info!(
        failure_rate_percent = config.failure_rate_percent,
        read_timeout_ms = config.read_timeout_ms,
        write_timeout_ms = config.write_timeout_ms,
        "Configuration ready"
    );

    let state = AppState::new(config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "starting http sink");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
