use colored::Colorize;

use crate::cli::Cli;
use crate::error::{FormVaultError, Result};
use crate::export::{build_export, parse_import};

pub async fn export(cli: &Cli, path: &str) -> Result<()> {
    let store = super::open_store(cli).await?;
    let profiles = store.all_profiles().await?;
    let settings = store.get_settings().await?;

    let document = build_export(profiles, settings);
    let content = serde_json::to_string_pretty(&document)?;
    std::fs::write(path, content)?;

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "success": true,
                "path": path,
                "profiles": document.profiles.len()
            })
        );
    } else {
        println!(
            "{} Exported {} profile(s) to {}",
            "✓".green(),
            document.profiles.len(),
            path.bold()
        );
    }
    Ok(())
}

pub async fn import(cli: &Cli, path: &str) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| FormVaultError::ImportError(format!("cannot read {}: {}", path, e)))?;
    let payload = parse_import(&content)?;

    let store = super::open_store(cli).await?;
    let imported = store
        .import_profiles(payload.profiles, payload.settings)
        .await?;

    if cli.json {
        println!(
            "{}",
            serde_json::json!({ "success": true, "imported": imported })
        );
    } else {
        println!("{} Imported {} profile(s)", "✓".green(), imported);
    }
    Ok(())
}
