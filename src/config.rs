use directories::ProjectDirs;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::combo::check_size;
use crate::error::ConfigError;
use crate::scoring::ScoringRule;
use crate::session::SessionConfig;

/// Persisted experiment defaults, overridden per run from the command line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub trial_count: usize,
    pub max_combo_size: usize,
    pub inter_trial_delay_ms: u64,
    pub end_delay_ms: u64,
    pub scoring_rule: ScoringRule,
    pub output: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trial_count: 10,
            max_combo_size: 3,
            inter_trial_delay_ms: 500,
            end_delay_ms: 2000,
            scoring_rule: ScoringRule::Exact,
            output: PathBuf::from("data.csv"),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<SessionConfig, ConfigError> {
        if self.trial_count == 0 {
            return Err(ConfigError::NoTrials);
        }
        check_size(self.max_combo_size)?;

        Ok(SessionConfig {
            trial_count: self.trial_count,
            max_combo_size: self.max_combo_size,
            inter_trial_delay: Duration::from_millis(self.inter_trial_delay_ms),
            end_delay: Duration::from_millis(self.end_delay_ms),
            scoring_rule: self.scoring_rule,
        })
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "chordtime") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("chordtime_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => return Config::default(),
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("ignoring unreadable config {}: {e}", self.path.display());
                Config::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn loads_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let cfg = Config {
            trial_count: 12,
            max_combo_size: 4,
            inter_trial_delay_ms: 250,
            end_delay_ms: 0,
            scoring_rule: ScoringRule::Proportional,
            output: PathBuf::from("out.csv"),
        };
        fs::write(&path, serde_json::to_vec_pretty(&cfg).unwrap()).unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), cfg);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "trial_count": 30, "scoring_rule": "proportional" }"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.trial_count, 30);
        assert_eq!(cfg.scoring_rule, ScoringRule::Proportional);
        assert_eq!(cfg.max_combo_size, 3);
    }

    #[test]
    fn garbage_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn validate_builds_session_config() {
        let session = Config::default().validate().unwrap();
        assert_eq!(session, SessionConfig::default());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let cfg = Config {
            trial_count: 0,
            ..Config::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::NoTrials));

        let cfg = Config {
            max_combo_size: 28,
            ..Config::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidComboSize(_))
        ));

        let cfg = Config {
            max_combo_size: 0,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }
}
