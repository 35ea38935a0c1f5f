mod document;
mod profiles;
mod service;
mod settings;

pub use document::{Storage, VaultDocument};
pub use profiles::{generate_profile_id, Profile, ProfileDraft};
pub use service::{spawn, NotifyKind, StoreHandle, StoreRequest};
pub use settings::Settings;
