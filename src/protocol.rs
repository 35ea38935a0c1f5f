//! Message protocol between the CLI, page agents and the store.
//!
//! Every message is JSON with an `action` discriminator and camelCase
//! fields, the shape existing page tooling already speaks.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::engine::{Field, Form};
use crate::error::Result;
use crate::store::{NotifyKind, ProfileDraft, StoreHandle};

/// Requests a page agent answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PageRequest {
    /// Liveness probe.
    Ping,
    /// Full scan with transient highlights.
    ScanForms,
    /// Fill previously scanned fields from saved values.
    FillForms { data: Vec<Field> },
    /// Read back the current values of previously scanned fields.
    GetCurrentValues,
    /// Scan without touching agent state, for the save flow.
    QuickScan,
    /// Re-scan and fill from the most recent matching profile.
    QuickFill,
}

/// Requests the store answers, as sent by page agents and outer surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum VaultRequest {
    GetSettings,
    SaveProfile {
        profile: ProfileDraft,
    },
    GetProfiles {
        domain: String,
        path: String,
    },
    ShowNotification {
        #[serde(rename = "type")]
        kind: String,
        message: String,
    },
}

/// Replies from a page agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageResponse {
    Scan(ScanResponse),
    Fill(FillResponse),
    Values(ValuesResponse),
    Pong(PongResponse),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub success: bool,
    pub forms: Vec<Form>,
    pub total_fields: usize,
    pub total_inputs: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillResponse {
    pub success: bool,
    pub filled_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuesResponse {
    pub success: bool,
    pub values: Vec<Field>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PongResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Route a store-directed request to the store task, returning the reply as
/// wire JSON.
pub async fn dispatch_vault_request(
    store: &StoreHandle,
    request: VaultRequest,
) -> Result<serde_json::Value> {
    match request {
        VaultRequest::GetSettings => {
            let settings = store.get_settings().await?;
            Ok(json!({ "success": true, "settings": settings }))
        }
        VaultRequest::SaveProfile { profile } => {
            let saved = store.save_profile(profile).await?;
            Ok(json!({ "success": true, "profile": saved }))
        }
        VaultRequest::GetProfiles { domain, path } => {
            let profiles = store
                .get_profiles(Some(domain.as_str()), Some(path.as_str()))
                .await?;
            Ok(json!({ "success": true, "profiles": profiles }))
        }
        VaultRequest::ShowNotification { kind, message } => {
            store.notify(NotifyKind::parse(&kind), message).await?;
            Ok(json!({ "success": true }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_requests_carry_action_tags() {
        let ping = serde_json::to_value(&PageRequest::Ping).unwrap();
        assert_eq!(ping, json!({"action": "ping"}));

        let scan = serde_json::to_value(&PageRequest::ScanForms).unwrap();
        assert_eq!(scan, json!({"action": "scanForms"}));

        let fill: PageRequest =
            serde_json::from_value(json!({"action": "fillForms", "data": []})).unwrap();
        assert!(matches!(fill, PageRequest::FillForms { data } if data.is_empty()));
    }

    #[test]
    fn vault_requests_round_trip() {
        let request: VaultRequest = serde_json::from_value(json!({
            "action": "getProfiles",
            "domain": "example.org",
            "path": "/signup"
        }))
        .unwrap();
        assert!(matches!(
            request,
            VaultRequest::GetProfiles { ref domain, .. } if domain == "example.org"
        ));

        let notify = serde_json::to_value(&VaultRequest::ShowNotification {
            kind: "success".to_string(),
            message: "saved".to_string(),
        })
        .unwrap();
        assert_eq!(
            notify,
            json!({"action": "showNotification", "type": "success", "message": "saved"})
        );
    }

    #[test]
    fn fill_response_serializes_camel_case() {
        let response = FillResponse {
            success: true,
            filled_count: 3,
            message: None,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, json!({"success": true, "filledCount": 3}));
    }

    #[tokio::test]
    async fn dispatch_routes_to_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = crate::store::spawn(dir.path()).await.unwrap();

        let reply = dispatch_vault_request(&store, VaultRequest::GetSettings)
            .await
            .unwrap();
        assert_eq!(reply["success"], json!(true));
        assert_eq!(reply["settings"]["maxProfiles"], json!(100));

        let reply = dispatch_vault_request(
            &store,
            VaultRequest::SaveProfile {
                profile: ProfileDraft {
                    name: "signup".to_string(),
                    domain: "example.org".to_string(),
                    path: "/signup".to_string(),
                    url: "https://example.org/signup".to_string(),
                    title: String::new(),
                    values: Vec::new(),
                },
            },
        )
        .await
        .unwrap();
        assert_eq!(reply["success"], json!(true));
        assert!(reply["profile"]["id"].as_str().unwrap().starts_with("fvp_"));
    }
}
