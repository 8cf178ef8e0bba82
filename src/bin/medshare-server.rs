#![forbid(unsafe_code)]
//! MedShare API server

use clap::Parser;
use medshare::api::{run_api_server, AppState};
use medshare::config::{load_config, ChainBackend};
use medshare::logging::{init_logging, DEFAULT_FILTER};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about = "MedShare API server", long_about = None)]
struct Cli {
    /// Path to the configuration file (TOML). Defaults to `config.toml`.
    #[arg(long, short = 'c', env = "MEDSHARE_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on; overrides the configuration and `PORT`.
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// Serve against the in-memory mock chain instead of a node.
    #[arg(long)]
    mock_chain: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(DEFAULT_FILTER);

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.mock_chain {
        config.chain.backend = ChainBackend::Mock;
    }

    tracing::info!(
        port = config.server.port,
        users = ?config.database.backend,
        chain = ?config.chain.backend,
        node_url = %config.chain.node_url,
        "starting medshare-server"
    );

    let state = Arc::new(AppState::from_config(&config)?);
    run_api_server(state, config.server.port).await?;

    Ok(())
}
