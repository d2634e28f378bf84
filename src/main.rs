use clap::Parser;
use client::ClientConfig;
use log::info;
use server::ServerConfig;

/// Runs either side of the treasure hunt from one binary.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run the sync server instead of a client
    #[arg(long)]
    server: bool,

    /// Address to listen on (server) or connect to (client)
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    addr: String,

    /// Map file, server only
    #[arg(short, long, default_value = "map.txt")]
    map: std::path::PathBuf,

    /// Player name, client only
    #[arg(short, long, default_value = "player")]
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    if args.server {
        info!("Starting server on {}", args.addr);
        let config = ServerConfig {
            bind_addr: args.addr,
            map_path: args.map,
            ..ServerConfig::default()
        };
        server::run(config).await?;
    } else {
        let config = ClientConfig {
            server_addr: args.addr,
            name: args.name,
            ..ClientConfig::default()
        };
        client::run(config).await?;
    }

    Ok(())
}
