//! Store task: single owner of the vault document, serving requests over a
//! channel so page agents and the CLI never contend on the file.

use std::path::Path;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

use crate::error::{FormVaultError, Result};
use crate::store::document::{Storage, VaultDocument};
use crate::store::profiles::{Profile, ProfileDraft};
use crate::store::settings::Settings;

/// Notification severity forwarded from page agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyKind {
    Success,
    Error,
    Info,
}

impl NotifyKind {
    pub fn parse(kind: &str) -> NotifyKind {
        match kind {
            "success" => NotifyKind::Success,
            "error" => NotifyKind::Error,
            _ => NotifyKind::Info,
        }
    }
}

#[derive(Debug)]
pub enum StoreRequest {
    GetSettings {
        reply: oneshot::Sender<Settings>,
    },
    SaveSettings {
        settings: Settings,
        reply: oneshot::Sender<Result<()>>,
    },
    SaveProfile {
        draft: ProfileDraft,
        reply: oneshot::Sender<Result<Profile>>,
    },
    GetProfiles {
        domain: Option<String>,
        path: Option<String>,
        reply: oneshot::Sender<Vec<Profile>>,
    },
    DeleteProfile {
        id: String,
        reply: oneshot::Sender<Result<()>>,
    },
    ClearProfiles {
        reply: oneshot::Sender<Result<usize>>,
    },
    ImportProfiles {
        profiles: Vec<Profile>,
        settings: Option<serde_json::Value>,
        reply: oneshot::Sender<Result<usize>>,
    },
    /// Fire-and-forget: surface a message from a page agent to the user.
    Notify {
        kind: NotifyKind,
        message: String,
    },
}

/// Handle for talking to the store task.
#[derive(Debug, Clone)]
pub struct StoreHandle {
    tx: mpsc::Sender<StoreRequest>,
}

/// Load the vault and spawn the store task, returning its handle.
pub async fn spawn(data_dir: &Path) -> Result<StoreHandle> {
    let storage = Storage::new(data_dir);
    let document = storage.load().await?;
    let (tx, rx) = mpsc::channel(32);

    tokio::spawn(run(storage, document, rx));
    Ok(StoreHandle { tx })
}

impl StoreHandle {
    pub async fn get_settings(&self) -> Result<Settings> {
        let (reply, rx) = oneshot::channel();
        self.send(StoreRequest::GetSettings { reply }).await?;
        recv(rx).await
    }

    pub async fn save_settings(&self, settings: Settings) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(StoreRequest::SaveSettings { settings, reply }).await?;
        recv(rx).await?
    }

    pub async fn save_profile(&self, draft: ProfileDraft) -> Result<Profile> {
        let (reply, rx) = oneshot::channel();
        self.send(StoreRequest::SaveProfile { draft, reply }).await?;
        recv(rx).await?
    }

    /// Profiles matching the optional page filters, most recently written
    /// first.
    pub async fn get_profiles(
        &self,
        domain: Option<&str>,
        path: Option<&str>,
    ) -> Result<Vec<Profile>> {
        let (reply, rx) = oneshot::channel();
        self.send(StoreRequest::GetProfiles {
            domain: domain.map(str::to_string),
            path: path.map(str::to_string),
            reply,
        })
        .await?;
        recv(rx).await
    }

    pub async fn all_profiles(&self) -> Result<Vec<Profile>> {
        self.get_profiles(None, None).await
    }

    pub async fn delete_profile(&self, id: &str) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(StoreRequest::DeleteProfile {
            id: id.to_string(),
            reply,
        })
        .await?;
        recv(rx).await?
    }

    pub async fn clear_profiles(&self) -> Result<usize> {
        let (reply, rx) = oneshot::channel();
        self.send(StoreRequest::ClearProfiles { reply }).await?;
        recv(rx).await?
    }

    pub async fn import_profiles(
        &self,
        profiles: Vec<Profile>,
        settings: Option<serde_json::Value>,
    ) -> Result<usize> {
        let (reply, rx) = oneshot::channel();
        self.send(StoreRequest::ImportProfiles {
            profiles,
            settings,
            reply,
        })
        .await?;
        recv(rx).await?
    }

    pub async fn notify(&self, kind: NotifyKind, message: String) -> Result<()> {
        self.send(StoreRequest::Notify { kind, message }).await
    }

    async fn send(&self, request: StoreRequest) -> Result<()> {
        self.tx
            .send(request)
            .await
            .map_err(|_| FormVaultError::StorageError("store task is gone".to_string()))
    }
}

async fn recv<T>(rx: oneshot::Receiver<T>) -> Result<T> {
    rx.await
        .map_err(|_| FormVaultError::StorageError("store task dropped the reply".to_string()))
}

async fn run(storage: Storage, mut document: VaultDocument, mut rx: mpsc::Receiver<StoreRequest>) {
    while let Some(request) = rx.recv().await {
        match request {
            StoreRequest::GetSettings { reply } => {
                let _ = reply.send(document.settings.clone());
            }
            StoreRequest::SaveSettings { settings, reply } => {
                document.settings = settings;
                let _ = reply.send(persist(&storage, &document).await);
            }
            StoreRequest::SaveProfile { draft, reply } => {
                let profile = document.save_profile(draft, Utc::now());
                let result = persist(&storage, &document).await.map(|_| profile);
                let _ = reply.send(result);
            }
            StoreRequest::GetProfiles { domain, path, reply } => {
                let _ = reply.send(document.query(domain.as_deref(), path.as_deref()));
            }
            StoreRequest::DeleteProfile { id, reply } => {
                let result = match document.delete_profile(&id) {
                    Ok(()) => persist(&storage, &document).await,
                    Err(e) => Err(e),
                };
                let _ = reply.send(result);
            }
            StoreRequest::ClearProfiles { reply } => {
                let removed = document.clear_profiles();
                let result = persist(&storage, &document).await.map(|_| removed);
                let _ = reply.send(result);
            }
            StoreRequest::ImportProfiles {
                profiles,
                settings,
                reply,
            } => {
                let _ = reply.send(import(&storage, &mut document, profiles, settings).await);
            }
            StoreRequest::Notify { kind, message } => {
                match kind {
                    NotifyKind::Error => error!("{}", message),
                    _ => info!("{}", message),
                }
            }
        }
    }
}

/// Import is all-or-nothing: settings are merged (and validated) before any
/// profile lands in the document, so a rejected key leaves both halves
/// untouched. The eviction cap applies after the merge, under the imported
/// cap when the payload carries one.
async fn import(
    storage: &Storage,
    document: &mut VaultDocument,
    profiles: Vec<Profile>,
    settings: Option<serde_json::Value>,
) -> Result<usize> {
    if let Some(partial) = &settings {
        document.settings.merge_partial(partial)?;
    }
    let imported = document.import_profiles(profiles);
    persist(storage, document).await?;
    Ok(imported)
}

async fn persist(storage: &Storage, document: &VaultDocument) -> Result<()> {
    storage.save(document).await.map_err(|e| {
        error!("failed to persist vault: {}", e);
        e
    })
}
