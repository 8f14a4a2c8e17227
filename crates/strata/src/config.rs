//! Run configuration shared by the pipelines and the CLI.

use serde::{Deserialize, Serialize};
use std::path::Path;
use strata_combine::OptimizerConfig;
use strata_core::{PreprocessConfig, Result, StrataError};
use strata_eval::IcConfig;
use strata_groups::GroupConfig;

/// Every tunable of a strata run.
///
/// Missing sections and fields fall back to their defaults, so a config file
/// only needs to name what it changes:
///
/// ```json
/// { "groups": { "group_count": 10 }, "ic": { "window": 24 } }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StrataConfig {
    /// Hierarchical backtest settings
    pub groups: GroupConfig,
    /// IC estimation settings
    pub ic: IcConfig,
    /// ICIR optimizer settings
    pub optimizer: OptimizerConfig,
    /// Exposure preprocessing settings
    pub preprocess: PreprocessConfig,
}

impl StrataConfig {
    /// Parse a config from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| StrataError::Config(e.to_string()))
    }

    /// Read a config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded config");
        Ok(config)
    }

    /// Check values the components cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.groups.group_count == 0 {
            return Err(StrataError::Config("groups.group_count must be at least 1".into()));
        }
        if self.groups.periods_per_year == 0 {
            return Err(StrataError::Config("groups.periods_per_year must be at least 1".into()));
        }
        if self.ic.window == 0 {
            return Err(StrataError::Config("ic.window must be at least 1".into()));
        }
        if !self.preprocess.mad_multiple.is_finite() || self.preprocess.mad_multiple < 0.0 {
            return Err(StrataError::Config(format!(
                "preprocess.mad_multiple must be a finite non-negative number, got {}",
                self.preprocess.mad_multiple
            )));
        }
        if self.optimizer.max_iterations == 0 {
            return Err(StrataError::Config("optimizer.max_iterations must be at least 1".into()));
        }
        Ok(())
    }
}
