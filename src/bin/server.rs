//! Circulation protocol server binary.
//!
//! Binds the listening socket and serves terminal connections until
//! ctrl-c.

use circ_protocol::config::Config;
use circ_protocol::utils::logging;
use circ_protocol::{service, VERSION};
use clap::Parser;

/// Circulation protocol server
#[derive(Parser, Debug)]
#[command(name = "circ-server")]
#[command(about = "Wire protocol server for library circulation terminals")]
#[command(version)]
struct Args {
    /// Listen address (host:port); overrides the config file
    #[arg(short, long)]
    listen: Option<String>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Maximum concurrent connections; overrides the config file
    #[arg(short, long)]
    max_connections: Option<usize>,

    /// Drop frames whose checksum does not match instead of accepting them
    #[arg(long)]
    strict_checksums: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match Config::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("failed to load configuration: {e}");
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    if let Some(listen) = args.listen {
        config.server.address = listen;
    }
    if let Some(limit) = args.max_connections {
        config.server.max_connections = limit;
    }
    if args.strict_checksums {
        config.protocol.strict_checksums = true;
    }

    // Initialize tracing/logging
    logging::init(&config.logging);

    tracing::info!("circ-server v{}", VERSION);
    tracing::info!("Listen address: {}", config.server.address);

    if let Err(e) = config.validate_strict() {
        tracing::error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = service::start_server(&config.server, &config.protocol).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
