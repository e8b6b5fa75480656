// Data shapes exchanged with the portal API. Field names are camelCase here;
// the client converts them to and from the wire's snake_case.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::eip712::PluginUpdateMessage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plugin {
    pub id: String,
    pub title: String,
    pub description: String,
    pub server_endpoint: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    pub logo_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub public_key: Option<String>,
}

impl Plugin {
    /// The fields a developer can edit, in display order.
    pub fn editable_fields(&self) -> [(&'static str, &str); 3] {
        [
            ("title", self.title.as_str()),
            ("description", self.description.as_str()),
            ("serverEndpoint", self.server_endpoint.as_str()),
        ]
    }
}

/// Body of `PUT /plugins/{id}`.
#[derive(Debug, Clone)]
pub struct PluginUpdate {
    pub title: String,
    pub description: String,
    pub server_endpoint: String,
    pub signature: String,
    pub signed_message: PluginUpdateMessage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PricingType {
    #[serde(rename = "per-tx")]
    PerTx,
    #[serde(rename = "once")]
    Once,
    #[serde(rename = "recurring")]
    Recurring,
}

impl fmt::Display for PricingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PricingType::PerTx => "Per tx",
            PricingType::Once => "Once",
            PricingType::Recurring => "Recurring",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginPricing {
    pub id: String,
    pub plugin_id: String,
    pub asset: String,
    #[serde(rename = "type")]
    pub kind: PricingType,
    pub frequency: Option<String>,
    pub amount: f64,
    #[serde(default)]
    pub metric: String,
}

pub const API_KEY_DISABLED: i32 = 0;
pub const API_KEY_ENABLED: i32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginApiKey {
    pub id: String,
    pub plugin_id: String,
    /// Masked except in the response that created it.
    pub apikey: String,
    pub created_at: String,
    pub expires_at: Option<String>,
    pub status: i32,
}

impl PluginApiKey {
    pub fn is_enabled(&self) -> bool {
        self.status == API_KEY_ENABLED
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApiKeyRequest {
    /// RFC3339
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EarningStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningTransaction {
    pub id: String,
    pub plugin_id: String,
    pub plugin_name: String,
    pub amount: f64,
    pub asset: String,
    #[serde(rename = "type")]
    pub kind: PricingType,
    pub created_at: String,
    pub from_address: String,
    pub tx_hash: String,
    pub status: EarningStatus,
}

#[derive(Debug, Clone, Default)]
pub struct EarningsFilters {
    pub plugin_id: Option<String>,
    pub status: Option<EarningStatus>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub kind: Option<PricingType>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsPage {
    pub data: Vec<EarningTransaction>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsSummary {
    pub total_earnings: f64,
    pub total_transactions: u64,
    #[serde(default)]
    pub earnings_by_plugin: HashMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    Admin,
    Staff,
    Editor,
    Viewer,
}

impl TeamRole {
    /// Whether this role may change `field` of a plugin. Staff only manage the
    /// kill switch; editors can't move the server endpoint.
    pub fn can_edit_field(self, field: &str) -> bool {
        match self {
            TeamRole::Admin => true,
            TeamRole::Editor => field != "serverEndpoint",
            TeamRole::Staff | TeamRole::Viewer => false,
        }
    }

    pub fn can_manage_kill_switch(self) -> bool {
        matches!(self, TeamRole::Admin | TeamRole::Staff)
    }
}

impl fmt::Display for TeamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TeamRole::Admin => "admin",
            TeamRole::Staff => "staff",
            TeamRole::Editor => "editor",
            TeamRole::Viewer => "viewer",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyRole {
    pub role: TeamRole,
    pub can_edit: bool,
}

impl MyRole {
    pub fn can_edit_field(&self, field: &str) -> bool {
        self.can_edit && self.role.can_edit_field(field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub public_key: String,
    pub role: TeamRole,
    #[serde(default)]
    pub added_via: String,
    pub added_by: Option<String>,
    pub created_at: Option<String>,
    #[serde(default)]
    pub is_current_user: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invite {
    pub link: String,
    pub expires_at: String,
    pub role: TeamRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteInfo {
    pub plugin_id: String,
    #[serde(default)]
    pub plugin_name: String,
    pub role: TeamRole,
    #[serde(default)]
    pub invited_by: String,
    #[serde(default)]
    pub expires_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedInvite {
    pub message: String,
    pub role: TeamRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KillSwitch {
    #[serde(default)]
    pub plugin_id: String,
    pub keygen_enabled: bool,
    pub keysign_enabled: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KillSwitchUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keygen_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keysign_enabled: Option<bool>,
}

/// Body of `POST /auth`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    pub message: String,
    pub signature: String,
    pub public_key: String,
    pub chain_code_hex: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pricing_type_uses_wire_values() {
        let pricing: PluginPricing = serde_json::from_value(json!({
            "id": "1",
            "pluginId": "p",
            "asset": "usdc",
            "type": "per-tx",
            "frequency": null,
            "amount": 0.5,
            "metric": "tx"
        }))
        .unwrap();
        assert_eq!(pricing.kind, PricingType::PerTx);
        assert_eq!(pricing.kind.to_string(), "Per tx");
    }

    #[test]
    fn role_gating() {
        let editor = MyRole { role: TeamRole::Editor, can_edit: true };
        assert!(editor.can_edit_field("title"));
        assert!(!editor.can_edit_field("serverEndpoint"));

        let admin = MyRole { role: TeamRole::Admin, can_edit: true };
        assert!(admin.can_edit_field("serverEndpoint"));

        let locked_admin = MyRole { role: TeamRole::Admin, can_edit: false };
        assert!(!locked_admin.can_edit_field("title"));

        assert!(!TeamRole::Viewer.can_edit_field("title"));
        assert!(!TeamRole::Staff.can_edit_field("title"));
        assert!(TeamRole::Staff.can_manage_kill_switch());
        assert!(!TeamRole::Editor.can_manage_kill_switch());
    }

    #[test]
    fn kill_switch_update_omits_unset_flags() {
        let body = serde_json::to_value(KillSwitchUpdate {
            keygen_enabled: Some(false),
            keysign_enabled: None,
        })
        .unwrap();
        assert_eq!(body, json!({ "keygenEnabled": false }));
    }
}
