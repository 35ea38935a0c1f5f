use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::engine::Field;

/// Id prefix for all stored profiles.
const PROFILE_ID_PREFIX: &str = "fvp_";

/// Generate a new profile id: `fvp_` + 16 random hex characters.
pub fn generate_profile_id() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 8] = rng.gen();
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}{}", PROFILE_ID_PREFIX, hex)
}

/// A saved set of field values for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub domain: String,
    pub path: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub values: Vec<Field>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Monotonic write counter, the recency tiebreaker when timestamps
    /// collide within clock resolution.
    #[serde(default)]
    pub seq: u64,
}

impl Profile {
    /// The instant this profile was last written.
    pub fn last_written(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }
}

/// The caller-supplied part of a profile save; id, timestamps and seq are
/// assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDraft {
    pub name: String,
    pub domain: String,
    pub path: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub values: Vec<Field>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_ids_carry_prefix_and_hex_payload() {
        let id = generate_profile_id();
        assert!(id.starts_with("fvp_"));
        assert_eq!(id.len(), 4 + 16);
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn profile_ids_are_unique() {
        let a = generate_profile_id();
        let b = generate_profile_id();
        assert_ne!(a, b);
    }

    #[test]
    fn last_written_prefers_updated_at() {
        let created = "2026-01-01T00:00:00Z".parse().unwrap();
        let updated = "2026-02-01T00:00:00Z".parse().unwrap();
        let mut profile = Profile {
            id: generate_profile_id(),
            name: "n".to_string(),
            domain: "example.org".to_string(),
            path: "/".to_string(),
            url: String::new(),
            title: String::new(),
            values: Vec::new(),
            created_at: created,
            updated_at: None,
            seq: 0,
        };
        assert_eq!(profile.last_written(), created);

        profile.updated_at = Some(updated);
        assert_eq!(profile.last_written(), updated);
    }
}
