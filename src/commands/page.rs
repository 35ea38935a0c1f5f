use colored::Colorize;

use crate::agent::PageSession;
use crate::cli::Cli;
use crate::config::Config;
use crate::engine::{Field, FieldValue, Form};
use crate::error::{FormVaultError, Result};
use crate::page::PageSnapshot;
use crate::protocol::{dispatch_vault_request, PageRequest, PageResponse, VaultRequest};
use crate::store::{ProfileDraft, StoreHandle};

fn load_snapshot(path: &str) -> Result<PageSnapshot> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        FormVaultError::SnapshotError(format!("cannot read snapshot {}: {}", path, e))
    })?;
    PageSnapshot::from_json(&content)
}

async fn open_session(cli: &Cli, snapshot_path: &str) -> Result<(PageSession, StoreHandle)> {
    let snapshot = load_snapshot(snapshot_path)?;
    let store = super::open_store(cli).await?;
    let config = Config::load()?;
    let session = PageSession::new(snapshot, store.clone(), config.display);
    Ok((session, store))
}

pub async fn scan(cli: &Cli, snapshot_path: &str) -> Result<()> {
    let (mut session, _store) = open_session(cli, snapshot_path).await?;
    let response = session.send(PageRequest::ScanForms).await?;
    let PageResponse::Scan(outcome) = response else {
        return Err(FormVaultError::ProtocolError(
            "unexpected reply to scanForms".to_string(),
        ));
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    if outcome.forms.is_empty() {
        println!("{} No forms found", "!".yellow());
        return Ok(());
    }

    println!(
        "{} Found {} form(s), {} field(s) ({} inputs total)",
        "✓".green(),
        outcome.forms.len(),
        outcome.total_fields,
        outcome.total_inputs
    );
    println!();
    for form in &outcome.forms {
        print_form(form);
    }
    Ok(())
}

pub async fn fill(cli: &Cli, snapshot_path: &str, profile_id: Option<&str>) -> Result<()> {
    let (mut session, store) = open_session(cli, snapshot_path).await?;

    let response = match profile_id {
        Some(id) => {
            let profile = store
                .all_profiles()
                .await?
                .into_iter()
                .find(|p| p.id == id)
                .ok_or_else(|| FormVaultError::ProfileNotFound(id.to_string()))?;
            session
                .send(PageRequest::FillForms {
                    data: profile.values,
                })
                .await?
        }
        None => session.send(PageRequest::QuickFill).await?,
    };
    let PageResponse::Fill(fill) = response else {
        return Err(FormVaultError::ProtocolError(
            "unexpected reply to fill".to_string(),
        ));
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&fill)?);
    } else {
        let source = fill
            .message
            .as_deref()
            .map(|name| format!(" from \"{}\"", name))
            .unwrap_or_default();
        println!("{} Filled {} field(s){}", "✓".green(), fill.filled_count, source);
    }
    Ok(())
}

pub async fn save(cli: &Cli, snapshot_path: &str, name: Option<&str>) -> Result<()> {
    let (mut session, store) = open_session(cli, snapshot_path).await?;
    let location = session.location();
    let url = session.snapshot().url.clone();
    let title = session.snapshot().title.clone();

    // Scan first so the value capture has fields to read.
    session.send(PageRequest::ScanForms).await?;
    let response = session.send(PageRequest::GetCurrentValues).await?;
    let PageResponse::Values(values) = response else {
        return Err(FormVaultError::ProtocolError(
            "unexpected reply to getCurrentValues".to_string(),
        ));
    };

    if values.values.is_empty() {
        println!("{} Nothing to save: no fields carry values", "!".yellow());
        return Ok(());
    }

    let draft = ProfileDraft {
        name: name.unwrap_or(&location.host).to_string(),
        domain: location.host.clone(),
        path: location.path.clone(),
        url,
        title,
        values: values.values,
    };
    let reply = dispatch_vault_request(&store, VaultRequest::SaveProfile { profile: draft }).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
    } else {
        let id = reply["profile"]["id"].as_str().unwrap_or("?");
        let count = reply["profile"]["values"]
            .as_array()
            .map(|v| v.len())
            .unwrap_or(0);
        println!(
            "{} Saved {} value(s) as {} ({})",
            "✓".green(),
            count,
            reply["profile"]["name"].as_str().unwrap_or("?").bold(),
            id.dimmed()
        );
    }
    Ok(())
}

pub async fn values(cli: &Cli, snapshot_path: &str) -> Result<()> {
    let (mut session, _store) = open_session(cli, snapshot_path).await?;
    let response = session.send(PageRequest::GetCurrentValues).await?;
    let PageResponse::Values(values) = response else {
        return Err(FormVaultError::ProtocolError(
            "unexpected reply to getCurrentValues".to_string(),
        ));
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&values)?);
        return Ok(());
    }

    if values.values.is_empty() {
        println!("{} No field values on this page", "!".yellow());
        return Ok(());
    }

    println!("{}", "Current values:".bold());
    for field in &values.values {
        print_value(field);
    }
    Ok(())
}

fn print_form(form: &Form) {
    let marker = if form.is_orphan {
        " (orphan inputs)".dimmed()
    } else {
        "".into()
    };
    println!("  {} {}{}", "●".cyan(), form.id.bold(), marker);
    for field in &form.fields {
        let caption = if field.label.is_empty() {
            field.name.as_str()
        } else {
            field.label.as_str()
        };
        println!(
            "    {} [{}] {}",
            caption,
            field.kind.to_string().dimmed(),
            field.selector.dimmed()
        );
    }
    println!();
}

fn print_value(field: &Field) {
    let shown = match &field.value {
        FieldValue::Bool(b) => b.to_string(),
        FieldValue::Text(s) => s.clone(),
    };
    println!("  {} = {}", field.id.bold(), shown);
}
