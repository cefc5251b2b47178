//! `.lifeledger/config.toml` loading.
//!
//! Every key is optional. A missing file means defaults, not an error.

use crate::core::error::LedgerError;
use crate::core::schemas;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct LedgerConfig {
    #[serde(default)]
    pub ledger: LedgerSection,
    #[serde(default)]
    pub identity: IdentitySection,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LedgerSection {
    #[serde(default = "default_db_name")]
    pub db_name: String,
    #[serde(default = "default_audit_log")]
    pub audit_log: String,
}

impl Default for LedgerSection {
    fn default() -> Self {
        Self {
            db_name: default_db_name(),
            audit_log: default_audit_log(),
        }
    }
}

/// Default caller used when neither flags nor environment name one.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct IdentitySection {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

fn default_db_name() -> String {
    schemas::LEDGER_DB_NAME.to_string()
}

fn default_audit_log() -> String {
    schemas::AUDIT_LOG_NAME.to_string()
}

pub fn load_config(store_root: &Path) -> Result<LedgerConfig, LedgerError> {
    let config_path = store_root.join(schemas::CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(LedgerConfig::default());
    }
    let content = fs::read_to_string(&config_path).map_err(LedgerError::IoError)?;
    toml::from_str(&content).map_err(|e| {
        LedgerError::ConfigError(format!("{}: {}", config_path.display(), e))
    })
}

/// Writes the default config unless one is already present.
pub fn write_default_config(store_root: &Path) -> Result<bool, LedgerError> {
    let config_path = store_root.join(schemas::CONFIG_FILE_NAME);
    if config_path.exists() {
        return Ok(false);
    }
    let body = toml::to_string_pretty(&LedgerConfig::default())
        .map_err(|e| LedgerError::ConfigError(e.to_string()))?;
    fs::write(&config_path, body).map_err(LedgerError::IoError)?;
    Ok(true)
}
