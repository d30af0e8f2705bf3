use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    domain::money::{CurrencyCode, MoneyError},
    errors::StorageResult,
    utils::{app_data_dir, ensure_dir, write_atomic, DEFAULT_LOG_FILTER},
};

const CONFIG_FILE: &str = "config.json";
const DEFAULT_RETENTION: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub currency: String,
    pub locale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub log_filter: String,
    pub backup_retention: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency: "USD".into(),
            locale: "en-US".into(),
            data_dir: None,
            log_filter: DEFAULT_LOG_FILTER.into(),
            backup_retention: DEFAULT_RETENTION,
        }
    }
}

impl Config {
    pub fn currency_code(&self) -> Result<CurrencyCode, MoneyError> {
        CurrencyCode::new(self.currency.as_str())
    }

    /// Explicit `data_dir`, then `$BUDGET_TRACKING_HOME`, then `~/.budget_tracking`.
    pub fn resolve_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(app_data_dir)
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> StorageResult<Self> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: impl Into<PathBuf>) -> StorageResult<Self> {
        let base = base.into();
        ensure_dir(&base)?;
        Ok(Self {
            path: base.join(CONFIG_FILE),
        })
    }

    /// Reads the stored configuration, or the defaults when none was saved yet.
    pub fn load(&self) -> StorageResult<Config> {
        if !self.path.exists() {
            debug!("no config at {}, using defaults", self.path.display());
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, config: &Config) -> StorageResult<()> {
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
