use std::{
    fs::File,
    path::{Path, PathBuf},
    time::Duration,
};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    PitwallError,
    simulation::{
        GRID_POSITIONS, InvokerConfig,
        invoker::{DEFAULT_CALL_TIMEOUT_MS, DEFAULT_MIN_DURATION_MS},
        orchestrator::OrchestratorConfig,
    },
};

const CONFIG_DIR_NAME: &str = "pitwall";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Interpreter used to run the prediction modules
    pub python: String,
    /// Directory containing `qualifying.py` and `strategy.py`
    pub module_dir: PathBuf,
    pub min_duration_ms: u64,
    pub call_timeout_ms: u64,
    pub sweep_concurrency: usize,
    /// Number of grid positions a strategy run covers, starting from pole
    pub grid_size: u8,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            module_dir: PathBuf::from("python"),
            min_duration_ms: DEFAULT_MIN_DURATION_MS,
            call_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            sweep_concurrency: 1,
            grid_size: *GRID_POSITIONS.end(),
        }
    }
}

impl AppConfig {
    pub fn path() -> Result<PathBuf, PitwallError> {
        Ok(dirs::config_dir()
            .ok_or(PitwallError::NoConfigDir)?
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME))
    }

    /// Load the config saved in the user's config directory, if there is one
    pub fn from_local_file() -> Result<Option<Self>, PitwallError> {
        match dirs::config_dir() {
            Some(dir) => Self::from_file(&dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)),
            None => Ok(None),
        }
    }

    pub fn from_file(config_path: &Path) -> Result<Option<Self>, PitwallError> {
        if !config_path.exists() {
            return Ok(None);
        }
        debug!("Loading config from {:?}", config_path);
        let file = File::open(config_path).map_err(|e| PitwallError::ConfigIOError { source: e })?;
        serde_json::from_reader(file)
            .map(Some)
            .map_err(|e| PitwallError::ConfigSerializeError { source: e })
    }

    pub fn save(&self) -> Result<(), PitwallError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<(), PitwallError> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PitwallError::ConfigIOError { source: e })?;
        }

        let file =
            File::create(config_path).map_err(|e| PitwallError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| PitwallError::ConfigSerializeError { source: e })
    }

    pub fn invoker_config(&self) -> InvokerConfig {
        InvokerConfig {
            min_duration: Duration::from_millis(self.min_duration_ms),
            call_timeout: Duration::from_millis(self.call_timeout_ms),
        }
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            sweep_concurrency: self.sweep_concurrency.max(1),
            run_deadline: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "python": "/usr/bin/python3.11", "sweep_concurrency": 4 }"#)
                .unwrap();
        assert_eq!(config.python, "/usr/bin/python3.11");
        assert_eq!(config.sweep_concurrency, 4);
        assert_eq!(config.min_duration_ms, 1500);
        assert_eq!(config.call_timeout_ms, 120_000);
        assert_eq!(config.grid_size, 20);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        assert_eq!(AppConfig::from_file(&path).unwrap(), None);

        let config = AppConfig {
            module_dir: PathBuf::from("/opt/pitwall/models"),
            grid_size: 10,
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::from_file(&path).unwrap(), Some(config));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            AppConfig::from_file(&path),
            Err(PitwallError::ConfigSerializeError { .. })
        ));
    }

    #[test]
    fn test_runtime_settings() {
        let config = AppConfig {
            min_duration_ms: 0,
            sweep_concurrency: 0,
            ..Default::default()
        };
        assert_eq!(config.invoker_config().min_duration, Duration::ZERO);
        assert_eq!(config.orchestrator_config().sweep_concurrency, 1);
    }
}
