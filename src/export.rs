//! Import/export of the whole vault as one portable JSON document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FormVaultError, Result};
use crate::store::{Profile, Settings};

/// Format version stamped into every export.
pub const EXPORT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub profiles: Vec<Profile>,
    pub settings: Settings,
    pub exported_at: DateTime<Utc>,
    pub version: String,
}

/// Assemble an export document from a store snapshot.
pub fn build_export(profiles: Vec<Profile>, settings: Settings) -> ExportDocument {
    ExportDocument {
        profiles,
        settings,
        exported_at: Utc::now(),
        version: EXPORT_VERSION.to_string(),
    }
}

/// Parsed and validated import payload. Settings stay a raw JSON value so a
/// partial settings object shallow-merges instead of resetting defaults.
#[derive(Debug, Clone)]
pub struct ImportPayload {
    pub profiles: Vec<Profile>,
    pub settings: Option<serde_json::Value>,
}

/// Validate an import document in full before anything is applied.
pub fn parse_import(content: &str) -> Result<ImportPayload> {
    let value: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| FormVaultError::ImportError(format!("not valid JSON: {}", e)))?;
    let object = value
        .as_object()
        .ok_or_else(|| FormVaultError::ImportError("expected a JSON object".to_string()))?;

    match object.get("version").and_then(|v| v.as_str()) {
        Some(_) => {}
        None => {
            return Err(FormVaultError::ImportError(
                "missing version string".to_string(),
            ))
        }
    }

    let profiles_value = object
        .get("profiles")
        .ok_or_else(|| FormVaultError::ImportError("missing profiles array".to_string()))?;
    let profiles: Vec<Profile> = serde_json::from_value(profiles_value.clone())
        .map_err(|e| FormVaultError::ImportError(format!("malformed profile: {}", e)))?;

    let settings = match object.get("settings") {
        Some(v) if v.is_object() => Some(v.clone()),
        Some(_) => {
            return Err(FormVaultError::ImportError(
                "settings must be an object".to_string(),
            ))
        }
        None => None,
    };

    Ok(ImportPayload { profiles, settings })
}
