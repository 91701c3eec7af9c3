//! Forwarding resolver service.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │             FORWARDING RESOLVER              │
//!                        │                                              │
//!   Proxied request      │  ┌──────────┐   ┌──────────┐   ┌──────────┐  │
//!   ─────────────────────┼─▶│ listener │──▶│ request  │──▶│ client   │  │
//!   (Forwarded,          │  │ TCP/TLS  │   │   id     │   │  info    │  │
//!    X-Forwarded-*)      │  └──────────┘   └──────────┘   └────┬─────┘  │
//!                        │                                     │        │
//!                        │                        ┌────────────▼──────┐ │
//!                        │                        │ForwardingResolver │ │
//!                        │                        │ (policy, ArcSwap) │ │
//!                        │                        └────────────┬──────┘ │
//!   JSON identity        │                                     ▼        │
//!   ◀────────────────────┼─────────────────────────────── echo handler  │
//!                        │                                              │
//!                        │   config + watcher · logging · metrics ·     │
//!                        │   shutdown                                   │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use forwarding_resolver::config::{load_config, ConfigWatcher, ServiceConfig};
use forwarding_resolver::lifecycle::{signals, Shutdown};
use forwarding_resolver::observability::{logging, metrics};
use forwarding_resolver::HttpServer;

#[derive(Parser)]
#[command(name = "forwarding-resolver")]
#[command(about = "Echo service that resolves real client identity behind proxies", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload the forwarding policy when the config file changes.
    #[arg(short, long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    logging::init_logging(&config.observability)?;

    tracing::info!("forwarding-resolver v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        support_forwarded = config.forwarding.support_forwarded,
        support_x_forwarded = config.forwarding.support_x_forwarded,
        prefer_forwarded = config.forwarding.prefer_forwarded,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Held for the lifetime of the process; dropping it stops watching.
    let (config_updates, _watcher) = match (&args.config, args.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (updates, Some(watcher.run()?))
        }
        _ => (mpsc::unbounded_channel().1, None),
    };

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(&shutdown);

    let tls_enabled = config.listener.tls.is_some();
    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    if tls_enabled {
        server.run_tls(config_updates, shutdown.subscribe()).await?;
    } else {
        let listener = TcpListener::bind(&bind_address).await?;
        server.run(listener, config_updates, shutdown.subscribe()).await?;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
