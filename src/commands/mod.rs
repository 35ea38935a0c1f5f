pub mod config;
pub mod page;
pub mod profile;
pub mod transfer;

use std::path::PathBuf;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;
use crate::store::{self, StoreHandle};

/// Resolve the vault directory: CLI flag, then config, then platform default.
pub fn vault_dir(cli: &Cli) -> Result<PathBuf> {
    if let Some(dir) = &cli.data_dir {
        return Ok(PathBuf::from(dir));
    }
    Ok(Config::load()?.vault_dir())
}

/// Spawn the store task for this invocation.
pub async fn open_store(cli: &Cli) -> Result<StoreHandle> {
    store::spawn(&vault_dir(cli)?).await
}
