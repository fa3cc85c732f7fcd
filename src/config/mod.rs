use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    ledger::DEFAULT_PAYMENT_METHOD,
    utils::{
        app_data_dir, config_file_in, ensure_dir, persistence::write_atomic, DEFAULT_LOG_FILTER,
    },
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ledger file name, resolved against the data directory when relative.
    pub ledger_file: String,
    pub default_payment_method: String,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ledger_file: "ledger.json".into(),
            default_payment_method: DEFAULT_PAYMENT_METHOD.into(),
            log_filter: DEFAULT_LOG_FILTER.into(),
        }
    }
}

pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    /// Manager rooted at the application data directory.
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        ensure_dir(&base)?;
        Ok(Self {
            path: config_file_in(&base),
            base,
        })
    }

    /// Reads `config.json`, falling back to defaults when it does not exist.
    pub fn load(&self) -> Result<Config, ConfigError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)?;
        Ok(())
    }

    /// Absolute location of the ledger file named by `config`.
    pub fn ledger_path(&self, config: &Config) -> PathBuf {
        let candidate = Path::new(&config.ledger_file);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.base.join(candidate)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
