use serde::{Deserialize, Serialize};

use crate::error::{FormVaultError, Result};

/// User settings stored alongside profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub auto_save: bool,
    #[serde(default)]
    pub auto_fill: bool,
    #[serde(default = "default_true")]
    pub show_notifications: bool,
    #[serde(default = "default_exclude_domains")]
    pub exclude_domains: Vec<String>,
    #[serde(default = "default_max_profiles")]
    pub max_profiles: usize,
}

fn default_true() -> bool {
    true
}

fn default_exclude_domains() -> Vec<String> {
    vec!["example.com".to_string()]
}

fn default_max_profiles() -> usize {
    100
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_save: false,
            auto_fill: false,
            show_notifications: true,
            exclude_domains: default_exclude_domains(),
            max_profiles: default_max_profiles(),
        }
    }
}

impl Settings {
    /// True when a host matches any excluded domain by substring, the rule
    /// the exclusion list has always used.
    pub fn is_excluded(&self, domain: &str) -> bool {
        self.exclude_domains.iter().any(|d| domain.contains(d))
    }

    /// Overlay a partial settings object onto this one. Unknown keys are
    /// rejected so an import typo fails loudly instead of silently.
    pub fn merge_partial(&mut self, partial: &serde_json::Value) -> Result<()> {
        let Some(object) = partial.as_object() else {
            return Err(FormVaultError::ImportError(
                "settings must be an object".to_string(),
            ));
        };

        let mut merged = serde_json::to_value(&*self)?;
        let merged_map = merged
            .as_object_mut()
            .ok_or_else(|| FormVaultError::Other("settings did not serialize to an object".to_string()))?;
        for (key, value) in object {
            if !merged_map.contains_key(key) {
                return Err(FormVaultError::ImportError(format!(
                    "unknown settings key: {}",
                    key
                )));
            }
            merged_map.insert(key.clone(), value.clone());
        }

        *self = serde_json::from_value(merged)
            .map_err(|e| FormVaultError::ImportError(format!("invalid settings: {}", e)))?;
        Ok(())
    }
}
