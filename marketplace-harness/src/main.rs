//! Marketplace harness binary: serves the seeded mock backend

use anyhow::Result;
use clap::Parser;
use marketplace_harness::HarnessServer;

#[derive(Parser, Debug)]
#[command(name = "marketplace-harness")]
#[command(about = "Mock marketplace backend for local development", long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    HarnessServer::new(format!("{}:{}", args.host, args.port)).run().await
}
