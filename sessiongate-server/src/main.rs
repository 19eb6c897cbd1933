//! sessiongate server binary

use anyhow::Context;
use clap::Parser;
use sessiongate_server::{AppState, ServerArgs, SessionGateServer};
use sessiongate_store::StorageEngine;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();
    init_tracing(args.log_json);

    let config = args.auth_config().context("invalid authentication settings")?;

    info!("Starting sessiongate server");
    info!("Data directory: {}", args.data_dir.display());
    info!("Bind address: {}", args.bind);

    if !args.data_dir.exists() {
        std::fs::create_dir_all(&args.data_dir)
            .with_context(|| format!("failed to create {}", args.data_dir.display()))?;
        info!("Created data directory: {}", args.data_dir.display());
    }

    let engine = StorageEngine::new(&args.data_dir).context("failed to initialize storage engine")?;
    info!("Storage engine initialized");

    let state = AppState::new(&config, &engine)?;
    let server = SessionGateServer::new(state, args.sweep_interval());

    tokio::select! {
        result = server.serve(args.bind) => {
            if let Err(e) = result {
                warn!("Server error: {}", e);
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    engine.persist()?;
    info!("Server shutdown gracefully");
    Ok(())
}
