// EIP-712 typed data for plugin updates. Saving a plugin sends the list of
// changed fields together with a wallet signature over it, so every edit is
// attributable to the vault that approved it.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const DOMAIN_NAME: &str = "Vultisig Developer Portal";
pub const DOMAIN_VERSION: &str = "1";
pub const CHAIN_ID: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldUpdate {
    pub field: String,
    pub old_value: String,
    pub new_value: String,
}

/// The signed payload. Serialized camelCase, exactly as the wallet sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginUpdateMessage {
    pub plugin_id: String,
    pub signer: String,
    pub nonce: u64,
    pub timestamp: i64,
    pub updates: Vec<FieldUpdate>,
}

impl PluginUpdateMessage {
    pub fn new(plugin_id: &str, signer: &str, updates: Vec<FieldUpdate>) -> Self {
        PluginUpdateMessage {
            plugin_id: plugin_id.to_string(),
            signer: signer.to_string(),
            nonce: generate_nonce(),
            timestamp: Utc::now().timestamp(),
            updates,
        }
    }
}

/// Every field of `updated` whose value differs from `original`, in the order
/// of `updated`. A field missing on either side counts as empty.
pub fn compute_field_updates(original: &[(&str, &str)], updated: &[(&str, &str)]) -> Vec<FieldUpdate> {
    updated
        .iter()
        .filter_map(|(field, new_value)| {
            let old_value = original
                .iter()
                .find(|(k, _)| k == field)
                .map(|(_, v)| *v)
                .unwrap_or("");
            (old_value != *new_value).then(|| FieldUpdate {
                field: field.to_string(),
                old_value: old_value.to_string(),
                new_value: new_value.to_string(),
            })
        })
        .collect()
}

pub fn domain() -> Value {
    json!({
        "name": DOMAIN_NAME,
        "version": DOMAIN_VERSION,
        "chainId": CHAIN_ID,
    })
}

pub fn types() -> Value {
    json!({
        "EIP712Domain": [
            { "name": "name", "type": "string" },
            { "name": "version", "type": "string" },
            { "name": "chainId", "type": "uint256" },
        ],
        "PluginUpdate": [
            { "name": "pluginId", "type": "string" },
            { "name": "signer", "type": "address" },
            { "name": "nonce", "type": "uint256" },
            { "name": "timestamp", "type": "uint256" },
            { "name": "updates", "type": "FieldUpdate[]" },
        ],
        "FieldUpdate": [
            { "name": "field", "type": "string" },
            { "name": "oldValue", "type": "string" },
            { "name": "newValue", "type": "string" },
        ],
    })
}

/// Full `eth_signTypedData_v4` payload for `message`.
pub fn typed_data(message: &PluginUpdateMessage) -> Value {
    json!({
        "types": types(),
        "primaryType": "PluginUpdate",
        "domain": domain(),
        "message": message,
    })
}

/// Seconds since the epoch, times 1000, plus a random 0..1000 so two edits in
/// the same second still differ.
pub fn generate_nonce() -> u64 {
    let secs = Utc::now().timestamp().max(0) as u64;
    secs * 1000 + rand::thread_rng().gen_range(0..1000)
}

pub fn format_updates_summary(updates: &[FieldUpdate]) -> String {
    if updates.is_empty() {
        return "No changes".to_string();
    }
    updates
        .iter()
        .map(|u| format!("{}: \"{}\" → \"{}\"", u.field, u.old_value, u.new_value))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_changed_field() {
        let updates = compute_field_updates(
            &[("title", "A"), ("desc", "X")],
            &[("title", "A"), ("desc", "Y")],
        );
        assert_eq!(
            updates,
            vec![FieldUpdate {
                field: "desc".into(),
                old_value: "X".into(),
                new_value: "Y".into(),
            }]
        );
    }

    #[test]
    fn identical_maps_have_no_updates() {
        assert!(compute_field_updates(&[("a", "1")], &[("a", "1")]).is_empty());
    }

    #[test]
    fn missing_keys_count_as_empty() {
        let updates = compute_field_updates(&[("gone", "x")], &[("new", "v"), ("blank", "")]);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].field, "new");
        assert_eq!(updates[0].old_value, "");
    }

    #[test]
    fn order_follows_updated_fields() {
        let updates = compute_field_updates(
            &[("a", "1"), ("b", "1"), ("c", "1")],
            &[("c", "2"), ("a", "2"), ("b", "1")],
        );
        let fields: Vec<_> = updates.iter().map(|u| u.field.as_str()).collect();
        assert_eq!(fields, ["c", "a"]);
    }

    #[test]
    fn typed_data_carries_camel_case_message() {
        let message = PluginUpdateMessage {
            plugin_id: "p1".into(),
            signer: "0xabc".into(),
            nonce: 1_700_000_000_123,
            timestamp: 1_700_000_000,
            updates: compute_field_updates(&[("title", "old")], &[("title", "new")]),
        };
        let data = typed_data(&message);

        assert_eq!(data["primaryType"], "PluginUpdate");
        assert_eq!(data["domain"]["name"], DOMAIN_NAME);
        assert_eq!(data["domain"]["chainId"], 1);
        assert_eq!(data["message"]["pluginId"], "p1");
        assert_eq!(data["message"]["updates"][0]["oldValue"], "old");
        assert_eq!(data["types"]["FieldUpdate"][2]["name"], "newValue");
    }

    #[test]
    fn nonce_is_time_based() {
        let before = Utc::now().timestamp() as u64 * 1000;
        let nonce = generate_nonce();
        let after = (Utc::now().timestamp() as u64 + 1) * 1000;
        assert!(nonce >= before && nonce < after);
    }

    #[test]
    fn summary_lines() {
        assert_eq!(format_updates_summary(&[]), "No changes");
        let updates = compute_field_updates(&[("title", "A")], &[("title", "B")]);
        assert_eq!(format_updates_summary(&updates), "title: \"A\" → \"B\"");
    }
}
