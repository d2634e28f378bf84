use clap::Parser;
use log::info;
use server::{BoxQuotas, ServerConfig};
use shared::{DEFAULT_EMPTY_BOXES, DEFAULT_TRAPS, DEFAULT_TREASURES};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Map file to load
    #[arg(short, long, default_value = "map.txt")]
    map: std::path::PathBuf,

    /// Number of treasure boxes
    #[arg(long, default_value_t = DEFAULT_TREASURES)]
    treasures: usize,

    /// Number of trap boxes
    #[arg(long, default_value_t = DEFAULT_TRAPS)]
    traps: usize,

    /// Number of empty boxes
    #[arg(long, default_value_t = DEFAULT_EMPTY_BOXES)]
    empties: usize,

    /// Seed for a reproducible box layout
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = ServerConfig {
        bind_addr: format!("{}:{}", args.host, args.port),
        map_path: args.map,
        quotas: BoxQuotas {
            treasures: args.treasures,
            traps: args.traps,
            empties: args.empties,
        },
        seed: args.seed,
    };

    info!("Starting server on {}", config.bind_addr);
    server::run(config).await?;

    Ok(())
}
