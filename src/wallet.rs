// Wallet bridge: the external signer the portal relies on. The portal never
// holds keys; it asks a `Wallet` for the account, the vault metadata and
// signatures, and checks that the vault is one it can work with.

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// How long a sign-in message stays valid.
pub const SIGN_IN_TTL_MINUTES: i64 = 15;

pub const SIGN_IN_TEXT: &str = "Sign into Vultisig Plugin Marketplace";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("Wallet is not available")]
    Unavailable,

    #[error("Connection failed")]
    ConnectionFailed,

    #[error("Vault not found")]
    VaultNotFound,

    #[error("Missing required vault data")]
    MissingVaultData,

    #[error("Only Fast Vaults can connect to the Developer Portal")]
    NotFastVault,

    #[error("{0}")]
    Rejected(String),
}

/// Vault metadata as reported by the wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultInfo {
    pub hex_chain_code: String,
    pub is_fast_vault: bool,
    #[serde(default)]
    pub local_party_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parties: Vec<String>,
    pub public_key_ecdsa: String,
    #[serde(default)]
    pub public_key_eddsa: String,
    #[serde(default)]
    pub uid: String,
}

impl VaultInfo {
    /// The identity tokens are stored under.
    pub fn id(&self) -> &str {
        &self.public_key_ecdsa
    }

    pub fn validate(&self) -> Result<(), WalletError> {
        if self.hex_chain_code.is_empty() || self.public_key_ecdsa.is_empty() {
            return Err(WalletError::MissingVaultData);
        }
        if !self.is_fast_vault {
            return Err(WalletError::NotFastVault);
        }
        Ok(())
    }
}

/// Signing operations offered by the user's wallet.
#[async_trait]
pub trait Wallet: Send + Sync {
    async fn request_account(&self) -> Result<String, WalletError>;

    async fn vault(&self) -> Result<VaultInfo, WalletError>;

    async fn personal_sign(&self, address: &str, message: &str) -> Result<String, WalletError>;

    /// EIP-712 `eth_signTypedData_v4`.
    async fn sign_typed_data(
        &self,
        address: &str,
        typed_data: &serde_json::Value,
    ) -> Result<String, WalletError>;

    async fn revoke_permissions(&self) -> Result<(), WalletError>;
}

/// Fetch the vault and reject the ones the portal can't authenticate.
pub async fn validated_vault(wallet: &dyn Wallet) -> Result<VaultInfo, WalletError> {
    let vault = wallet.vault().await?;
    vault.validate()?;
    Ok(vault)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInMessage<'a> {
    address: &'a str,
    expires_at: String,
    message: &'a str,
    nonce: String,
}

/// The JSON message a user signs to obtain a token pair.
pub fn sign_in_message(address: &str, now: DateTime<Utc>) -> String {
    let mut nonce = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut nonce);

    let message = SignInMessage {
        address,
        expires_at: (now + Duration::minutes(SIGN_IN_TTL_MINUTES))
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        message: SIGN_IN_TEXT,
        nonce: format!("0x{}", hex::encode(nonce)),
    };
    // A struct of plain strings always serializes.
    serde_json::to_string(&message).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_vault() -> VaultInfo {
        VaultInfo {
            hex_chain_code: "abcd".into(),
            is_fast_vault: true,
            name: "Main".into(),
            public_key_ecdsa: "02ff".into(),
            ..Default::default()
        }
    }

    #[test]
    fn fast_vault_with_keys_is_accepted() {
        assert_eq!(fast_vault().validate(), Ok(()));
        assert_eq!(fast_vault().id(), "02ff");
    }

    #[test]
    fn secure_vault_is_rejected() {
        let vault = VaultInfo {
            is_fast_vault: false,
            ..fast_vault()
        };
        assert_eq!(vault.validate(), Err(WalletError::NotFastVault));
    }

    #[test]
    fn missing_chain_code_is_rejected_first() {
        let vault = VaultInfo {
            hex_chain_code: String::new(),
            is_fast_vault: false,
            ..fast_vault()
        };
        assert_eq!(vault.validate(), Err(WalletError::MissingVaultData));
    }

    #[test]
    fn sign_in_message_shape() {
        let now = DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let raw = sign_in_message("0xabc", now);
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(parsed["address"], "0xabc");
        assert_eq!(parsed["message"], SIGN_IN_TEXT);
        assert_eq!(parsed["expiresAt"], "2025-01-01T00:15:00.000Z");
        let nonce = parsed["nonce"].as_str().unwrap();
        assert!(nonce.starts_with("0x"));
        assert_eq!(nonce.len(), 2 + 32);
        assert_ne!(raw, sign_in_message("0xabc", now));
    }
}
