#![forbid(unsafe_code)]
//! powledger node: keeps an in-memory ledger and serves it over HTTP

use clap::Parser;
use powledger::api::run_api_server;
use powledger::config::{load_config, load_config_from};
use powledger::node::Node;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./config.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Address to bind the API to
    #[arg(long)]
    host: Option<String>,
    /// Port to bind the API to
    #[arg(short, long)]
    port: Option<u16>,
    /// Leading hex zeros required of every proof
    #[arg(long)]
    difficulty: Option<usize>,
    /// Peer to register at startup; may be given several times
    #[arg(long = "peer")]
    peers: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    if let Some(host) = cli.host {
        config.network.host = host;
    }
    if let Some(port) = cli.port {
        config.network.port = port;
    }
    if let Some(difficulty) = cli.difficulty {
        config.miner.difficulty = difficulty;
    }
    config.network.bootstrap_peers.extend(cli.peers);
    config.validate()?;

    let addr = tokio::net::lookup_host((config.network.host.as_str(), config.network.port))
        .await?
        .next()
        .ok_or("API host did not resolve to any address")?;

    let node = Arc::new(Node::new(config)?);
    info!(
        node_id = %node.identifier(),
        difficulty = node.pow().difficulty(),
        "starting powledger node"
    );

    // Reconcile with bootstrap peers in the background so the API comes up immediately.
    let bootstrap_node = node.clone();
    tokio::spawn(async move {
        bootstrap_node.bootstrap().await;
    });

    run_api_server(node, addr).await
}
