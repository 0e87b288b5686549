use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::data::loader::{DEFAULT_SHEET, LoadOptions};
use crate::data::source::DataSource;
use crate::error::{Error, Result};

/// Points at a JSON config file.
pub const CONFIG_ENV: &str = "CREDIT_DASH_CONFIG";
/// Read from the working directory when [`CONFIG_ENV`] is unset.
pub const DEFAULT_CONFIG_FILE: &str = "credit-dash.json";

pub const DATASET_ENV: &str = "CREDIT_DASH_DATASET";
pub const SHEET_ENV: &str = "CREDIT_DASH_SHEET";
pub const MODEL_ENV: &str = "CREDIT_DASH_MODEL";

/// Where the dashboard reads its data and model from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Local path or URL of the tabular source.
    pub dataset: DataSource,
    pub sheet: String,
    pub model_path: PathBuf,
    pub fetch_timeout_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            dataset: DataSource::parse("Dashboard/Processed_data_for_dashboard.xlsx"),
            sheet: DEFAULT_SHEET.to_string(),
            model_path: PathBuf::from("Dashboard/default_model.json"),
            fetch_timeout_secs: 30,
        }
    }
}

impl DashboardConfig {
    /// Defaults, then the JSON file (if any), then environment overrides.
    pub fn load() -> Result<Self> {
        let file = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Some(PathBuf::from(path)),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.is_file()),
        };

        let mut config = match file {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// [`load`](Self::load) that always yields a config. A rejected file falls
    /// back to the defaults, environment overrides still apply, and the error
    /// is handed back for the status line.
    pub fn load_or_default() -> (Self, Option<Error>) {
        match Self::load() {
            Ok(config) => (config, None),
            Err(e) => {
                log::error!("Ignoring configuration file: {e}");
                let mut config = Self::default();
                config.apply_overrides(|key| std::env::var(key).ok());
                (config, Some(e))
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).map_err(|e| Error::unavailable(path.display().to_string(), e))?;
        let config: Self = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply `CREDIT_DASH_*` overrides. Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get(DATASET_ENV) {
            self.dataset = DataSource::parse(&v);
        }
        if let Some(v) = get(SHEET_ENV) {
            self.sheet = v;
        }
        if let Some(v) = get(MODEL_ENV) {
            self.model_path = PathBuf::from(v);
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            sheet: self.sheet.clone(),
            format: None,
            timeout: Duration::from_secs(self.fetch_timeout_secs),
        }
    }
}
