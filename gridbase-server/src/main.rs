//! Gridbase server: HTTP backing store for the collaborative sheet.
//!
//! Configuration comes from flags or the environment (a `.env` file in the
//! working directory is loaded first). Logging is controlled by `RUST_LOG`.

use clap::Parser;
use log::info;
use std::path::PathBuf;

use gridbase_store::server::{ServerConfig, SheetServer};

#[derive(Parser)]
#[command(name = "gridbase-server")]
#[command(about = "Gridbase - persistent cell store for the collaborative sheet", long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "GRIDBASE_BIND", default_value = "127.0.0.1:5000")]
    bind: String,

    /// RocksDB directory; data is kept in memory only when omitted
    #[arg(long, env = "GRIDBASE_DB_PATH")]
    db_path: Option<PathBuf>,

    /// HTML file served at `/`
    #[arg(long, env = "GRIDBASE_INDEX_PAGE")]
    index_page: Option<PathBuf>,
}

impl From<Cli> for ServerConfig {
    fn from(cli: Cli) -> Self {
        ServerConfig {
            bind_addr: cli.bind,
            storage_path: cli.db_path,
            index_page: cli.index_page,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Optional .env in the working directory
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = ServerConfig::from(Cli::parse());
    info!(
        "Starting Gridbase server (storage: {})",
        config
            .storage_path
            .as_ref()
            .map_or_else(|| "in-memory".to_string(), |p| p.display().to_string())
    );

    let server = SheetServer::new(config)?;
    server.run().await
}
