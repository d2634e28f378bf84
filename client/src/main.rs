use clap::Parser;
use client::ClientConfig;
use log::info;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Player name shown to others
    #[arg(short = 'n', long, default_value = "player")]
    name: String,

    /// Simulate network latency in milliseconds
    #[arg(short = 'l', long, default_value = "0")]
    fake_ping: u64,

    /// State polling interval in milliseconds
    #[arg(long, default_value = "100")]
    sync_ms: u64,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value = "2000")]
    timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = ClientConfig {
        server_addr: args.server,
        name: args.name,
        sync_interval: Duration::from_millis(args.sync_ms),
        request_timeout: Duration::from_millis(args.timeout_ms),
        fake_ping: Duration::from_millis(args.fake_ping),
    };

    info!("Starting client...");
    client::run(config).await?;

    Ok(())
}
