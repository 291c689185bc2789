use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use seedvault::cli::{self, Cli};
use seedvault::{Bip39Deriver, FileStore, Vault, VaultConfig};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = VaultConfig::load_or_default(&cli.config);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let storage = Arc::new(FileStore::new(&config.store_path));
    let vault = Vault::new(storage, Arc::new(Bip39Deriver));

    if let Err(msg) = cli::run(&vault, cli.command).await {
        eprintln!("{}", msg);
        std::process::exit(1);
    }
}
