//! Pipeline configuration file

use anyhow::{Context, Result};
use lowpoly_simplification::{CleanupConfig, DecimationConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Contents of a `lowpoly.toml` file.
///
/// Every field is optional; missing ones keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Run one session per worker thread
    pub parallel: bool,
    pub decimation: DecimationConfig,
    pub cleanup: CleanupConfig,
}

impl PipelineConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("invalid pipeline configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        assert_eq!(PipelineConfig::from_toml("").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = PipelineConfig::from_toml(
            r#"
parallel = true

[decimation]
preset = "custom"
custom_target = 5000
relative_threshold = 0.002

[decimation.targets]
low = 10000

[cleanup]
merge_distance = 0.0
"#,
        )
        .unwrap();

        assert!(config.parallel);
        assert_eq!(config.decimation.preset, "custom");
        assert_eq!(config.decimation.custom_target, Some(5000));
        assert_eq!(config.decimation.relative_threshold, 0.002);
        assert_eq!(config.decimation.max_attempts, 6);
        assert_eq!(config.decimation.targets.low, 10_000);
        assert_eq!(config.decimation.targets.medium, 100_000);
        assert_eq!(config.cleanup.merge_distance, 0.0);
        assert!(config.cleanup.remove_loose);
        assert_eq!(config.decimation.initial_target().unwrap(), 5000);
    }

    #[test]
    fn test_type_errors_are_reported() {
        assert!(PipelineConfig::from_toml("[decimation]\nmax_attempts = \"many\"\n").is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(PipelineConfig::load(Path::new("/nonexistent/lowpoly.toml")).is_err());
    }
}
