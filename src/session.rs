// Signing in and out with a vault, plus the signed plugin-update flow.

use chrono::Utc;

use crate::api::ApiClient;
use crate::eip712::{self, FieldUpdate, PluginUpdateMessage};
use crate::error::ApiError;
use crate::models::{AuthRequest, Plugin, PluginUpdate};
use crate::storage::StorageError;
use crate::wallet::{self, VaultInfo, Wallet, WalletError};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("No vault connected")]
    NotConnected,

    #[error("No changes to save")]
    NothingToSave,
}

/// Sign the sign-in message with `wallet`, exchange it for tokens and make the
/// vault the active identity.
pub async fn connect(api: &ApiClient, wallet: &dyn Wallet) -> Result<VaultInfo, SessionError> {
    let address = wallet
        .request_account()
        .await
        .map_err(|_| WalletError::ConnectionFailed)?;
    let vault = wallet::validated_vault(wallet).await?;

    let message = wallet::sign_in_message(&address, Utc::now());
    let signature = wallet.personal_sign(&address, &message).await?;

    let token = api
        .issue_token(&AuthRequest {
            message,
            signature,
            public_key: vault.public_key_ecdsa.clone(),
            chain_code_hex: vault.hex_chain_code.clone(),
        })
        .await?;

    api.storage().add_vault(vault.clone(), token)?;
    tracing::info!(vault = %vault.name, "vault connected");
    Ok(vault)
}

/// Revoke the session server-side and in the wallet, then forget it locally.
/// Remote failures don't stop the local sign-out.
pub async fn disconnect(api: &ApiClient, wallet: &dyn Wallet) -> Result<(), SessionError> {
    let storage = api.storage();
    if let Some(token) = storage.active_vault_id().and_then(|id| storage.token(&id)) {
        if let Err(err) = api.revoke_token(&token.access_token).await {
            tracing::warn!("token revocation failed: {err}");
        }
    }
    if let Err(err) = wallet.revoke_permissions().await {
        tracing::warn!("wallet permission revocation failed: {err}");
    }
    storage.clear_session()?;
    tracing::info!("session cleared");
    Ok(())
}

/// Edited values for a plugin's editable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginEdits {
    pub title: String,
    pub description: String,
    pub server_endpoint: String,
}

impl PluginEdits {
    pub fn from_plugin(plugin: &Plugin) -> Self {
        PluginEdits {
            title: plugin.title.clone(),
            description: plugin.description.clone(),
            server_endpoint: plugin.server_endpoint.clone(),
        }
    }

    pub fn fields(&self) -> [(&'static str, &str); 3] {
        [
            ("title", self.title.as_str()),
            ("description", self.description.as_str()),
            ("serverEndpoint", self.server_endpoint.as_str()),
        ]
    }

    pub fn updates_from(&self, plugin: &Plugin) -> Vec<FieldUpdate> {
        eip712::compute_field_updates(&plugin.editable_fields(), &self.fields())
    }
}

/// Diff, sign and save. Fails with `NothingToSave` before touching the wallet
/// when nothing changed.
pub async fn save_plugin(
    api: &ApiClient,
    wallet: &dyn Wallet,
    plugin: &Plugin,
    edits: &PluginEdits,
) -> Result<Plugin, SessionError> {
    let updates = edits.updates_from(plugin);
    if updates.is_empty() {
        return Err(SessionError::NothingToSave);
    }
    if api.storage().active_vault().is_none() {
        return Err(SessionError::NotConnected);
    }

    let signer = wallet.request_account().await?;
    let message = PluginUpdateMessage::new(&plugin.id, &signer, updates);
    let typed_data = eip712::typed_data(&message);
    let signature = wallet.sign_typed_data(&signer, &typed_data).await?;
    if signature.trim().is_empty() {
        return Err(WalletError::Rejected("Signature was not provided".into()).into());
    }

    let saved = api
        .update_plugin(
            &plugin.id,
            &PluginUpdate {
                title: edits.title.clone(),
                description: edits.description.clone(),
                server_endpoint: edits.server_endpoint.clone(),
                signature,
                signed_message: message,
            },
        )
        .await?;
    tracing::info!(plugin = %plugin.id, "plugin updated");
    Ok(saved)
}
