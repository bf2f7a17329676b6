#![forbid(unsafe_code)]
//! Command-line client for a running powledger node

use clap::{Parser, Subcommand};
use colored::*;
use reqwest::{Client, Response};
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the node to talk to
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    node: String,
    /// Request timeout in seconds; mining can take a while at high difficulty
    #[arg(long, default_value_t = 120)]
    timeout: u64,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prints the node's full chain
    Chain,
    /// Mines the next block
    Mine,
    /// Submits a transaction
    Send {
        sender: String,
        recipient: String,
        amount: f64,
    },
    /// Registers one or more peers with the node
    Register {
        #[arg(required = true)]
        peers: Vec<String>,
    },
    /// Lists the node's peers
    Peers,
    /// Runs chain resolution against the node's peers
    Resolve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = Client::builder()
        .timeout(Duration::from_secs(cli.timeout))
        .build()?;
    let base = cli.node.trim_end_matches('/');

    let response = match &cli.command {
        Commands::Chain => client.get(format!("{}/chain", base)).send().await?,
        Commands::Mine => {
            println!("{}", "⛏️  Mining...".bright_cyan());
            client.get(format!("{}/mine", base)).send().await?
        }
        Commands::Send {
            sender,
            recipient,
            amount,
        } => {
            client
                .post(format!("{}/transactions/new", base))
                .json(&json!({ "sender": sender, "recipient": recipient, "amount": amount }))
                .send()
                .await?
        }
        Commands::Register { peers } => {
            client
                .post(format!("{}/nodes/register", base))
                .json(&json!({ "nodes": peers }))
                .send()
                .await?
        }
        Commands::Peers => client.get(format!("{}/nodes", base)).send().await?,
        Commands::Resolve => client.get(format!("{}/nodes/resolve", base)).send().await?,
    };

    print_response(response).await
}

async fn print_response(response: Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = response.status();
    let body: Value = response.json().await?;
    let pretty = serde_json::to_string_pretty(&body)?;

    if status.is_success() {
        println!("{} {}", "✅".green(), status.to_string().green());
        println!("{}", pretty);
        Ok(())
    } else {
        eprintln!("{} {}", "❌".red(), status.to_string().red());
        eprintln!("{}", pretty);
        Err(format!("node answered {}", status).into())
    }
}
