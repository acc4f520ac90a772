use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use copysmith_server::{CopysmithConfig, ServerError};

/// Copysmith marketing-collateral generation server.
#[derive(Debug, Parser)]
#[command(name = "copysmith-server", version)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let args = Args::parse();
    let config = CopysmithConfig::load(args.config.as_deref())?;

    copysmith_server::telemetry::init();

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = copysmith_server::bootstrap::build_state(config).await?;
    let router = copysmith_server::api::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "copysmith server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to install ctrl-c handler");
        return;
    }
    info!("shutdown signal received");
}
