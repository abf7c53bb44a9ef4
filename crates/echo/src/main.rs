//! Turnguard Echo — a fake chat-completions endpoint for local debugging.
//!
//! Point a structured-request sender at this server to see exactly what
//! arrived: every request is dumped as JSON and summarized in the log,
//! and a minimal canned completion keeps the caller happy.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

mod server;

#[derive(Parser)]
#[command(
    name = "turnguard-echo",
    about = "Turnguard Echo — fake chat-completions endpoint for request inspection",
    version
)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 10030)]
    port: u16,

    /// Directory receiving one JSON file per request
    #[arg(long, default_value = "./echo_dumps")]
    dump_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let addr = format!("{}:{}", cli.host, cli.port);
    let state = Arc::new(server::EchoState {
        dump_dir: cli.dump_dir,
    });

    server::serve(&addr, state).await
}
