use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FormVaultError, Result};
use crate::store::profiles::{generate_profile_id, Profile, ProfileDraft};
use crate::store::settings::Settings;

/// Vault file name inside the data directory.
const VAULT_FILE: &str = "vault.json";

/// The persisted vault: every profile plus the settings object, under the
/// same top-level keys the browser storage area used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VaultDocument {
    #[serde(rename = "formProfiles", default)]
    pub form_profiles: Vec<Profile>,
    #[serde(default)]
    pub settings: Settings,
}

impl VaultDocument {
    /// Save a draft: merge into the existing profile for the same page when
    /// one exists, otherwise create a new profile, then evict down to the
    /// configured cap. Returns the written profile.
    pub fn save_profile(&mut self, draft: ProfileDraft, now: DateTime<Utc>) -> Profile {
        let seq = self.next_seq();

        let existing = self
            .form_profiles
            .iter_mut()
            .find(|p| p.domain == draft.domain && p.path == draft.path);

        let written = match existing {
            Some(profile) => {
                merge_values(&mut profile.values, draft.values);
                profile.name = draft.name;
                profile.url = draft.url;
                profile.title = draft.title;
                profile.updated_at = Some(now);
                profile.seq = seq;
                debug!(id = %profile.id, "merged into existing profile");
                profile.clone()
            }
            None => {
                let profile = Profile {
                    id: generate_profile_id(),
                    name: draft.name,
                    domain: draft.domain,
                    path: draft.path,
                    url: draft.url,
                    title: draft.title,
                    values: draft.values,
                    created_at: now,
                    updated_at: Some(now),
                    seq,
                };
                debug!(id = %profile.id, "created new profile");
                self.form_profiles.push(profile.clone());
                profile
            }
        };

        self.evict();
        written
    }

    /// Profiles matching the optional page filters, most recently written
    /// first. Every read path goes through here so callers always see the
    /// same ordering.
    pub fn query(&self, domain: Option<&str>, path: Option<&str>) -> Vec<Profile> {
        let mut matches: Vec<Profile> = self
            .form_profiles
            .iter()
            .filter(|p| domain.map_or(true, |d| p.domain == d))
            .filter(|p| path.map_or(true, |x| p.path == x))
            .cloned()
            .collect();
        matches.sort_by(recency_desc);
        matches
    }

    /// Append imported profiles, then apply the eviction cap.
    pub fn import_profiles(&mut self, profiles: Vec<Profile>) -> usize {
        let imported = profiles.len();
        self.form_profiles.extend(profiles);
        self.evict();
        imported
    }

    pub fn delete_profile(&mut self, id: &str) -> Result<()> {
        let before = self.form_profiles.len();
        self.form_profiles.retain(|p| p.id != id);
        if self.form_profiles.len() == before {
            return Err(FormVaultError::ProfileNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Remove every profile, returning how many were removed. Settings are
    /// untouched.
    pub fn clear_profiles(&mut self) -> usize {
        let removed = self.form_profiles.len();
        self.form_profiles.clear();
        removed
    }

    /// Drop the oldest profiles until the cap holds.
    fn evict(&mut self) {
        let cap = self.settings.max_profiles;
        if self.form_profiles.len() <= cap {
            return;
        }
        self.form_profiles.sort_by(recency_desc);
        let evicted = self.form_profiles.len() - cap;
        self.form_profiles.truncate(cap);
        debug!(evicted, cap, "evicted oldest profiles");
    }

    fn next_seq(&self) -> u64 {
        self.form_profiles.iter().map(|p| p.seq).max().unwrap_or(0) + 1
    }
}

/// Most recently written first; seq breaks timestamp ties.
fn recency_desc(a: &Profile, b: &Profile) -> std::cmp::Ordering {
    b.last_written()
        .cmp(&a.last_written())
        .then(b.seq.cmp(&a.seq))
}

/// Replace saved values for fields the new save also carries, keep the rest.
fn merge_values(existing: &mut Vec<crate::engine::Field>, incoming: Vec<crate::engine::Field>) {
    for value in incoming {
        match existing.iter_mut().find(|f| f.id == value.id) {
            Some(slot) => *slot = value,
            None => existing.push(value),
        }
    }
}

/// On-disk persistence for the vault document.
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(VAULT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the vault; a missing file is a fresh vault, not an error.
    pub async fn load(&self) -> Result<VaultDocument> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                FormVaultError::StorageError(format!(
                    "corrupt vault file {}: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(VaultDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist the vault with mode 0600.
    /// Uses atomic write pattern: write to temp file with restricted permissions, then rename.
    pub async fn save(&self, document: &VaultDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(document)?;

        #[cfg(unix)]
        {
            let tmp_path = self.path.with_extension("tmp");
            let mut opts = tokio::fs::OpenOptions::new();
            opts.write(true).create(true).truncate(true).mode(0o600);
            let mut file = opts.open(&tmp_path).await?;
            tokio::io::AsyncWriteExt::write_all(&mut file, content.as_bytes()).await?;
            tokio::io::AsyncWriteExt::flush(&mut file).await?;
            drop(file);
            // Atomic rename
            tokio::fs::rename(&tmp_path, &self.path).await?;
        }

        #[cfg(not(unix))]
        {
            tokio::fs::write(&self.path, content).await?;
        }

        Ok(())
    }
}
