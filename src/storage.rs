// Persisted client state: preferences, the connected vaults with their token
// pairs, and which vault is active. One small JSON file, rewritten on every
// change. No schema versioning: unknown or broken files are reported, not
// migrated.

use std::path::PathBuf;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::auth::AuthToken;
use crate::wallet::VaultInfo;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Cannot find a data directory")]
    NoDataDir,

    #[error("Unknown vault: {0}")]
    UnknownVault(String),

    #[error("state file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Jpy,
    Cny,
    Aud,
    Cad,
    Chf,
    Sgd,
    Sek,
}

impl Currency {
    pub const ALL: [Currency; 10] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Jpy,
        Currency::Cny,
        Currency::Aud,
        Currency::Cad,
        Currency::Chf,
        Currency::Sgd,
        Currency::Sek,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Currency::Usd => "usd",
            Currency::Eur => "eur",
            Currency::Gbp => "gbp",
            Currency::Jpy => "jpy",
            Currency::Cny => "cny",
            Currency::Aud => "aud",
            Currency::Cad => "cad",
            Currency::Chf => "chf",
            Currency::Sgd => "sgd",
            Currency::Sek => "sek",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
            Currency::Jpy | Currency::Cny => "¥",
            Currency::Aud => "A$",
            Currency::Cad => "C$",
            Currency::Chf => "CHF ",
            Currency::Sgd => "S$",
            Currency::Sek => "kr ",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredVault {
    #[serde(flatten)]
    vault: VaultInfo,
    #[serde(flatten)]
    token: AuthToken,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct State {
    #[serde(default)]
    theme: Theme,
    #[serde(default)]
    currency: Currency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    active_vault: Option<String>,
    #[serde(default)]
    vaults: Vec<StoredVault>,
}

/// Key-value client state, shared by the API client and the UI.
pub struct Storage {
    path: Option<PathBuf>,
    state: Mutex<State>,
}

impl Storage {
    /// `<data dir>/devportal/state.json`.
    pub fn default_path() -> Result<PathBuf, StorageError> {
        let dir = dirs::data_dir().ok_or(StorageError::NoDataDir)?;
        Ok(dir.join("devportal").join("state.json"))
    }

    /// Load state from `path`; a missing file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let state = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            State::default()
        };
        tracing::debug!(path = %path.display(), "opened state file");
        Ok(Storage {
            path: Some(path),
            state: Mutex::new(state),
        })
    }

    /// State that lives only as long as this value.
    pub fn in_memory() -> Self {
        Storage {
            path: None,
            state: Mutex::new(State::default()),
        }
    }

    fn update<R>(&self, f: impl FnOnce(&mut State) -> Result<R, StorageError>) -> Result<R, StorageError> {
        let mut state = self.state.lock();
        let out = f(&mut state)?;
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = serde_json::to_string_pretty(&*state)?;
            std::fs::write(path, content).map_err(|e| {
                tracing::warn!(path = %path.display(), "failed to write state: {e}");
                e
            })?;
        }
        Ok(out)
    }

    pub fn theme(&self) -> Theme {
        self.state.lock().theme
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), StorageError> {
        self.update(|s| {
            s.theme = theme;
            Ok(())
        })
    }

    pub fn currency(&self) -> Currency {
        self.state.lock().currency
    }

    pub fn set_currency(&self, currency: Currency) -> Result<(), StorageError> {
        self.update(|s| {
            s.currency = currency;
            Ok(())
        })
    }

    pub fn vaults(&self) -> Vec<VaultInfo> {
        self.state.lock().vaults.iter().map(|v| v.vault.clone()).collect()
    }

    pub fn active_vault_id(&self) -> Option<String> {
        self.state.lock().active_vault.clone()
    }

    pub fn active_vault(&self) -> Option<VaultInfo> {
        let state = self.state.lock();
        let id = state.active_vault.as_deref()?;
        state
            .vaults
            .iter()
            .find(|v| v.vault.id() == id)
            .map(|v| v.vault.clone())
    }

    /// Switch the active vault; `None` signs out of the current one but keeps
    /// its tokens.
    pub fn set_active(&self, id: Option<&str>) -> Result<(), StorageError> {
        self.update(|s| {
            if let Some(id) = id {
                if !s.vaults.iter().any(|v| v.vault.id() == id) {
                    return Err(StorageError::UnknownVault(id.to_string()));
                }
            }
            s.active_vault = id.map(str::to_string);
            Ok(())
        })
    }

    pub fn token(&self, id: &str) -> Option<AuthToken> {
        self.state
            .lock()
            .vaults
            .iter()
            .find(|v| v.vault.id() == id)
            .map(|v| v.token.clone())
    }

    pub fn set_token(&self, id: &str, token: AuthToken) -> Result<(), StorageError> {
        self.update(|s| {
            let stored = s
                .vaults
                .iter_mut()
                .find(|v| v.vault.id() == id)
                .ok_or_else(|| StorageError::UnknownVault(id.to_string()))?;
            stored.token = token;
            Ok(())
        })
    }

    /// Store (or replace) a vault with its tokens and make it active.
    pub fn add_vault(&self, vault: VaultInfo, token: AuthToken) -> Result<(), StorageError> {
        self.update(|s| {
            let id = vault.id().to_string();
            s.vaults.retain(|v| v.vault.id() != id);
            s.vaults.push(StoredVault { vault, token });
            s.active_vault = Some(id);
            Ok(())
        })
    }

    /// Forget every vault and token. Preferences survive.
    pub fn clear_session(&self) -> Result<(), StorageError> {
        self.update(|s| {
            s.vaults.clear();
            s.active_vault = None;
            Ok(())
        })
    }
}
