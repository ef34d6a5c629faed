//! roulette-relay: WebSocket chat roulette server.
//!
//! Accepts WebSocket connections, gives each one an anonymous user id,
//! pairs users on request and forwards every message of a pair verbatim
//! to the other side. Nothing is persisted.

mod commands;
mod connection;
mod dispatch;
mod protocol;
mod registry;
mod text;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use roulette_config::RouletteConfig;
use roulette_pairing::Orchestrator;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;

use crate::connection::handle_connection;
use crate::dispatch::Dispatcher;
use crate::registry::ConnectionRegistry;
use crate::text::MessageTexts;

#[derive(Parser)]
#[command(name = "roulette-relay", about = "WebSocket chat roulette relay")]
struct Args {
    /// Path to a TOML config file. Defaults to the platform config dir.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind (overrides config).
    #[arg(long)]
    bind: Option<String>,
}

fn load_config(args: &Args) -> roulette_common::Result<RouletteConfig> {
    let mut config = match &args.config {
        Some(path) => roulette_config::load_from_path(path)?,
        None => roulette_config::load_default()?,
    };

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(bind) = &args.bind {
        config.server.bind = bind.clone();
    }
    roulette_config::validate(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> roulette_common::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    let level = config.logging.level.to_ascii_lowercase();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("roulette_relay={level},roulette_pairing={level}").into()
            }),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        max_inflight_events = config.dispatch.max_inflight_events,
        "Starting roulette-relay"
    );

    let registry = ConnectionRegistry::new(MessageTexts::new(config.messages.clone()));
    let orchestrator = Orchestrator::new(Arc::new(registry.clone()));
    let dispatcher = Dispatcher::new(orchestrator, config.dispatch.max_inflight_events);

    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("roulette-relay listening on {}", addr);

    // Spawn periodic stats logger.
    let stats_dispatcher = dispatcher.clone();
    let stats_registry = registry.clone();
    let interval = Duration::from_secs(config.dispatch.stats_interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let stats = stats_dispatcher.orchestrator().stats().await;
            let connections = stats_registry.count().await;
            tracing::debug!(
                connections,
                waiting = stats.waiting,
                pairs = stats.pairs,
                "Stats tick"
            );
        }
    });

    // Accept loop.
    let outbound_buffer = config.server.outbound_buffer;
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let dispatcher = dispatcher.clone();
                    let registry = registry.clone();
                    tokio::spawn(async move {
                        match accept_async(stream).await {
                            Ok(ws) => {
                                handle_connection(ws, addr, dispatcher, registry, outbound_buffer).await
                            }
                            Err(e) => {
                                tracing::warn!(peer = %addr, error = %e, "WS handshake failed");
                            }
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "TCP accept error");
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, shutting down");
                return Ok(());
            }
        }
    }
}
