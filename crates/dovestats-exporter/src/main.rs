//! dovestats exporter
//!
//! Serves Dovecot stats socket `EXPORT` data as Prometheus metrics.
//! - Config: optional YAML file, overridden by flags / environment
//! - One collection cycle per scrape of the telemetry path
//! - Graceful shutdown on Ctrl+C / SIGTERM

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use dovestats_exporter::{app_state, config, router};

/// Prometheus exporter for Dovecot's stats socket.
#[derive(Parser, Debug)]
#[command(name = "dovestats-exporter", version, about, long_about = None)]
struct Cli {
    /// Path to a YAML configuration file (built-in defaults when omitted)
    #[arg(short, long, env = "DOVESTATS_CONFIG")]
    config: Option<String>,

    /// Address to listen on for web interface and telemetry
    #[arg(long = "web.listen-address", env = "DOVESTATS_LISTEN_ADDRESS")]
    listen_address: Option<String>,

    /// Path under which to expose metrics
    #[arg(long = "web.telemetry-path", env = "DOVESTATS_TELEMETRY_PATH")]
    telemetry_path: Option<String>,

    /// Path of Dovecot's stats socket
    #[arg(long = "dovecot.socket-path", env = "DOVESTATS_SOCKET_PATH")]
    socket_path: Option<String>,

    /// Comma-separated stats scopes to export
    #[arg(long = "dovecot.scopes", env = "DOVESTATS_SCOPES", value_delimiter = ',')]
    scopes: Option<Vec<String>>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => {
            tracing::info!(%path, "loading configuration");
            config::load_from_file(path)?
        }
        None => config::ExporterConfig::default(),
    };

    // CLI > ENV > config file
    if let Some(listen) = cli.listen_address {
        cfg.web.listen = listen;
    }
    if let Some(path) = cli.telemetry_path {
        cfg.web.telemetry_path = path;
    }
    if let Some(socket) = cli.socket_path {
        cfg.dovecot.socket_path = socket;
    }
    if let Some(scopes) = cli.scopes {
        cfg.dovecot.scopes = scopes.into_iter().map(config::ScopeConfig::named).collect();
    }
    cfg.validate()?;

    let listen = cfg.web.listen_addr()?;
    tracing::info!(
        socket = %cfg.dovecot.socket_path,
        telemetry_path = %cfg.web.telemetry_path,
        timeout_ms = cfg.dovecot.timeout_ms,
        "dovestats-exporter configured"
    );

    let state = app_state::AppState::new(cfg);
    let app = router::build_router(state.clone());

    tracing::info!(%listen, "dovestats-exporter starting");
    let listener = tokio::net::TcpListener::bind(listen).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await?;

    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal(state: app_state::AppState) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C"),
        _ = terminate => tracing::info!("received terminate signal"),
    }

    state.set_draining();
    tracing::info!("draining in-flight scrapes");
}
