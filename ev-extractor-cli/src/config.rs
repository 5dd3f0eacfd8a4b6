//! Batch configuration loading and parsing

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Batch run configuration (loaded from a TOML file)
///
/// Each `[[units]]` entry is one independent (events file, task) unit of
/// work; units are processed in parallel and failures are reported per unit.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub units: Vec<UnitConfig>,
}

/// One (events file, task) unit of work
#[derive(Debug, Clone, Deserialize)]
pub struct UnitConfig {
    /// Path to the tab-delimited events file
    pub events: PathBuf,
    /// Task identifier (e.g. "stopSignal")
    pub task: String,
    /// Whether to include the response-time regressor
    #[serde(default = "default_regress_rt")]
    pub regress_rt: bool,
    /// Where to write the design JSON (default: next to the events file)
    pub output: Option<PathBuf>,
}

fn default_regress_rt() -> bool {
    true
}

/// Load a batch configuration from a TOML file
pub fn load_config(path: &Path) -> Result<BatchConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: BatchConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    if config.units.is_empty() {
        anyhow::bail!("config file {:?} declares no [[units]]", path);
    }

    log::info!("Loaded {} units from {:?}", config.units.len(), path);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_batch_config() {
        let content = r#"
            [[units]]
            events = "sub-01_task-stopSignal_events.tsv"
            task = "stopSignal"

            [[units]]
            events = "sub-01_task-WATT3_events.tsv"
            task = "WATT3"
            regress_rt = false
            output = "watt3_design.json"
        "#;
        let config: BatchConfig = toml::from_str(content).unwrap();
        assert_eq!(config.units.len(), 2);
        assert!(config.units[0].regress_rt);
        assert!(!config.units[1].regress_rt);
        assert_eq!(
            config.units[1].output.as_deref(),
            Some(Path::new("watt3_design.json"))
        );
    }
}
