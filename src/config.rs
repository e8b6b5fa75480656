// Runtime configuration. Every option can come from a flag or from the
// environment, falling back to a local development backend.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::storage::{Storage, StorageError};

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_THIRD_PARTY_URL: &str = "https://api.vultisig.com";

#[derive(Debug, Clone, Parser)]
#[command(name = "devportal", version, about = "Plugin developer portal in the terminal")]
pub struct Config {
    /// Developer portal API base URL
    #[arg(long, env = "API_GATEWAY_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Proxy for price and token lookups
    #[arg(long, env = "VULTISIG_SERVER_URL", default_value = DEFAULT_THIRD_PARTY_URL)]
    pub third_party_url: String,

    /// Where the session and preferences are kept
    #[arg(long, env = "DEVPORTAL_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, env = "DEVPORTAL_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Log filter, e.g. `devportal_cli=debug`
    #[arg(long, env = "DEVPORTAL_LOG", default_value = "devportal_cli=info")]
    pub log: String,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn state_file(&self) -> Result<PathBuf, StorageError> {
        match &self.state_dir {
            Some(dir) => Ok(dir.join("state.json")),
            None => Storage::default_path(),
        }
    }
}
