use anyhow::{anyhow, Result};
use clap::Args;
use school_reviews::database::ensure_data_dir;
use school_reviews::server::{start_server, ServerConfig};
use school_reviews::{ReviewDatabase, ReviewsConfig};
use std::sync::Arc;
use tracing::info;

/// Arguments for the Serve command
#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind to (overrides configuration)
    #[clap(long)]
    pub address: Option<String>,

    /// Port to listen on (overrides configuration)
    #[clap(short, long)]
    pub port: Option<u16>,
}

pub fn run(config: &ReviewsConfig, args: ServeArgs) -> Result<()> {
    let ServeArgs { address, port } = args;

    let mut server_config = ServerConfig::from(config);
    if let Some(address) = address {
        server_config = server_config.with_address(address);
    }
    if let Some(port) = port {
        server_config = server_config.with_port(port);
    }

    ensure_data_dir(&config.data_dir)?;

    // The store must be usable before any request is accepted
    let db = ReviewDatabase::from_config(config);
    let report = db
        .ensure_schema()
        .map_err(|e| anyhow!("Failed to start: database initialization failed: {}", e))?;
    info!(
        "Database {} ready with {} reviews",
        db.path().display(),
        report.review_count
    );

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| anyhow!("Failed to start async runtime: {}", e))?;
    runtime.block_on(start_server(Arc::new(db), server_config))
}
