//! Subscription gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────┐
//!                     │                 SUBSCRIPTION GATEWAY             │
//!   GET /?url=..      │  ┌────────┐   ┌────────────┐   ┌──────────────┐  │
//!   ──────────────────┼─▶│  http  │──▶│  pipeline  │──▶│  generators  │──┼──▶ converter
//!                     │  │ server │   │ descriptor │   │ v2ray/mihomo │  │    backend
//!                     │  └────────┘   │ + dispatch │   │  / sing-box  │◀─┼──  + templates
//!                     │               └─────┬──────┘   └──────┬───────┘  │
//!   JSON / HTML       │  ┌──────────┐       │                 │          │
//!   ◀─────────────────┼──│ response │◀──────┴─────────────────┘          │
//!                     │  │ assembly │   (page when no links given)       │
//!                     │  └──────────┘                                    │
//!                     │                                                  │
//!                     │   config · observability · lifecycle             │
//!                     └──────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use sub_gateway::config::load_config;
use sub_gateway::lifecycle::{signals, startup, Shutdown};
use sub_gateway::observability::{logging, metrics};
use sub_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "sub-gateway", version, about = "Subscription conversion gateway")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init_tracing(&config.observability.log_level);
    startup::log_banner(&config);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(signals::watch_signals(shutdown.clone()));

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
