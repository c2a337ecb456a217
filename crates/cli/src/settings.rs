//! Settings file for the `mine` command.
//!
//! A JSON document with optional `session`, `sequential` and `parallel`
//! sections. Missing fields take their defaults.

use anyhow::{Context, Result};
use powbench_chain::SessionConfig;
use powbench_miner::{ParallelConfig, SequentialConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub session: SessionConfig,
    pub sequential: SequentialConfig,
    pub parallel: ParallelConfig,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("Invalid settings file: {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.session.validate().context("session settings")?;
        self.sequential.validate().context("sequential settings")?;
        self.parallel.validate().context("parallel settings")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        Settings::default().validate().unwrap();
    }

    #[test]
    fn test_partial_sections() {
        let settings = Settings::from_json(
            r#"{"session": {"difficulty": 3}, "parallel": {"workers": 8, "max_wait_ms": 5000}}"#,
        )
        .unwrap();

        assert_eq!(settings.session.difficulty, 3);
        assert_eq!(settings.session.blocks, 5);
        assert_eq!(settings.parallel.workers, 8);
        assert_eq!(settings.parallel.max_wait_ms, Some(5000));
        assert_eq!(settings.sequential, SequentialConfig::default());
    }

    #[test]
    fn test_zero_values_rejected() {
        let settings = Settings::from_json(r#"{"parallel": {"workers": 0}}"#).unwrap();
        assert!(settings.validate().is_err());

        let settings = Settings::from_json(r#"{"session": {"blocks": 0}}"#).unwrap();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.json");
        fs::write(&path, r#"{"sequential": {"progress_interval": 500}}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.sequential.progress_interval, 500);

        assert!(Settings::load(&tmp.path().join("missing.json")).is_err());
    }
}
