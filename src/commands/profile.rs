use colored::Colorize;

use crate::cli::{Cli, ProfileCommands};
use crate::error::{FormVaultError, Result};
use crate::store::Profile;

pub async fn run(cli: &Cli, command: &ProfileCommands) -> Result<()> {
    match command {
        ProfileCommands::List => list(cli).await,
        ProfileCommands::Show { id } => show(cli, id).await,
        ProfileCommands::Delete { id } => delete(cli, id).await,
        ProfileCommands::Clear => clear(cli).await,
    }
}

async fn list(cli: &Cli) -> Result<()> {
    let store = super::open_store(cli).await?;
    let profiles = store.all_profiles().await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }

    if profiles.is_empty() {
        println!("{} No saved profiles", "!".yellow());
        return Ok(());
    }

    println!("{}", "Profiles:".bold());
    println!();
    for profile in &profiles {
        println!("  {} {} ({})", "●".cyan(), profile.name.bold(), profile.id.dimmed());
        println!("    Page: {}{}", profile.domain, profile.path);
        println!("    Fields: {}", profile.values.len());
        println!("    Updated: {}", profile.last_written().to_rfc3339().dimmed());
        println!();
    }
    Ok(())
}

async fn show(cli: &Cli, id: &str) -> Result<()> {
    let store = super::open_store(cli).await?;
    let profile = find(store.all_profiles().await?, id)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    println!("{} {}", "Profile:".bold(), profile.name.cyan());
    println!();
    println!("  Id: {}", profile.id);
    println!("  Page: {}{}", profile.domain, profile.path);
    if !profile.url.is_empty() {
        println!("  URL: {}", profile.url);
    }
    println!("  Created: {}", profile.created_at.to_rfc3339());
    if let Some(updated) = profile.updated_at {
        println!("  Updated: {}", updated.to_rfc3339());
    }
    println!("  Values:");
    for field in &profile.values {
        println!("    {} [{}]", field.id, field.kind.to_string().dimmed());
    }
    Ok(())
}

async fn delete(cli: &Cli, id: &str) -> Result<()> {
    let store = super::open_store(cli).await?;
    store.delete_profile(id).await?;

    if cli.json {
        println!("{}", serde_json::json!({ "success": true, "id": id }));
    } else {
        println!("{} Deleted profile: {}", "✓".green(), id);
    }
    Ok(())
}

async fn clear(cli: &Cli) -> Result<()> {
    let store = super::open_store(cli).await?;
    let removed = store.clear_profiles().await?;

    if cli.json {
        println!("{}", serde_json::json!({ "success": true, "removed": removed }));
    } else {
        println!("{} Removed {} profile(s)", "✓".green(), removed);
    }
    Ok(())
}

fn find(profiles: Vec<Profile>, id: &str) -> Result<Profile> {
    profiles
        .into_iter()
        .find(|p| p.id == id)
        .ok_or_else(|| FormVaultError::ProfileNotFound(id.to_string()))
}
