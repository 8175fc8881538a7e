//! Deferred Hashing Service
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌───────────────────────────────────────────────────────┐
//!                   │                     HASH VAULT                        │
//!                   │                                                       │
//!  POST /hash       │  ┌────────┐   ┌─────────────┐   ┌──────────────┐      │
//!  ─────────────────┼─▶│  http  │──▶│ HashService │──▶│ JobScheduler │      │
//!  GET /hash/{id}   │  │ server │   └──────┬──────┘   └──────┬───────┘      │
//!  GET /stats       │  └───┬────┘          │ lookup          │ after delay  │
//!                   │      │               ▼                 ▼              │
//!                   │      │        ┌────────────┐    ┌────────────┐        │
//!                   │      │        │  JobStore  │◀───│   digest   │        │
//!                   │      │        └────────────┘    └────────────┘        │
//!                   │      │                                                │
//!  GET /shutdown    │      ▼                                                │
//!  SIGINT/SIGTERM ──┼─▶ ShutdownCoordinator: disable → drain → stop → done   │
//!                   └───────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use hash_vault::config::validation::validate_config;
use hash_vault::config::watcher::ConfigWatcher;
use hash_vault::config::{load_config, ConfigError, ServiceConfig};
use hash_vault::lifecycle::signals::spawn_signal_handler;
use hash_vault::lifecycle::startup::bind_listener;
use hash_vault::observability::{logging, metrics};
use hash_vault::HttpServer;

#[derive(Parser)]
#[command(name = "hash-vault", version)]
#[command(about = "Deferred password hashing service", long_about = None)]
struct Cli {
    /// Port to listen on (1024-49150)
    port: Option<u16>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Delay before a submitted password's digest becomes available
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Reload hashing settings when the configuration file changes
    #[arg(long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(port) = cli.port {
        config.listener.set_port(port);
    }
    if let Some(delay_ms) = cli.delay_ms {
        config.hashing.delay_ms = delay_ms;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability)?;
    tracing::info!("hash-vault v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        delay_ms = config.hashing.delay_ms,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let listener = bind_listener(&config.listener).await?;

    let mut server = HttpServer::new(config);
    let complete = server.shutdown_complete();
    spawn_signal_handler(server.shutdown_handle());

    let _watcher = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path, server.config().clone());
            server.watch_config_updates(updates);
            Some(watcher.run()?)
        }
        _ => None,
    };

    server.run(listener).await?;

    if let Some(complete) = complete {
        complete.wait().await;
    }
    tracing::info!("Shutdown complete");
    Ok(())
}
