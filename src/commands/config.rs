use colored::Colorize;
use serde_json::json;

use crate::cli::{Cli, ConfigCommands};
use crate::config::Config;
use crate::error::{FormVaultError, Result};

pub async fn run(cli: &Cli, command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(cli).await,
        ConfigCommands::Set { key, value } => set(cli, key, value).await,
        ConfigCommands::Get { key } => get(cli, key).await,
        ConfigCommands::Path => path(cli),
    }
}

async fn show(cli: &Cli) -> Result<()> {
    let store = super::open_store(cli).await?;
    let settings = store.get_settings().await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    println!("{}", "Settings:".bold());
    println!("  autoSave: {}", settings.auto_save);
    println!("  autoFill: {}", settings.auto_fill);
    println!("  showNotifications: {}", settings.show_notifications);
    println!("  excludeDomains: {}", settings.exclude_domains.join(", "));
    println!("  maxProfiles: {}", settings.max_profiles);
    Ok(())
}

async fn set(cli: &Cli, key: &str, value: &str) -> Result<()> {
    // Values are JSON; bare words that are not valid JSON pass as strings,
    // so `config set excludeDomains '["a.com"]'` and `config set autoFill
    // true` both work.
    let parsed: serde_json::Value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));

    let store = super::open_store(cli).await?;
    let mut settings = store.get_settings().await?;
    settings.merge_partial(&json!({ key: parsed }))?;
    store.save_settings(settings).await?;

    if cli.json {
        println!("{}", json!({ "success": true, "key": key }));
    } else {
        println!("{} Set {} = {}", "✓".green(), key.bold(), value);
    }
    Ok(())
}

async fn get(cli: &Cli, key: &str) -> Result<()> {
    let store = super::open_store(cli).await?;
    let settings = store.get_settings().await?;

    let object = serde_json::to_value(&settings)?;
    let value = object
        .get(key)
        .ok_or_else(|| FormVaultError::ConfigError(format!("unknown settings key: {}", key)))?;

    if cli.json {
        println!("{}", json!({ "key": key, "value": value }));
    } else {
        println!("{}", value);
    }
    Ok(())
}

fn path(cli: &Cli) -> Result<()> {
    let config_path = Config::config_path();
    let vault_dir = super::vault_dir(cli)?;

    if cli.json {
        println!(
            "{}",
            json!({
                "config": config_path.display().to_string(),
                "vault": vault_dir.join("vault.json").display().to_string()
            })
        );
    } else {
        println!("Config: {}", config_path.display());
        println!("Vault:  {}", vault_dir.join("vault.json").display());
    }
    Ok(())
}
