//! Engine configuration, loaded from an optional TOML file.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Decode analyzable classes on the rayon pool.
    pub parallel: bool,
    /// Drop the class's own accessors from RFC.
    pub rfc_exclude_accessors: bool,
    /// Replace accessors by the field they access when building LCOM4 blocks.
    pub lcom4_exclude_accessors: bool,
    /// Field names ignored for LCOM4 connectivity (loggers and the like).
    pub lcom4_excluded_fields: Vec<String>,
    pub rfc_distribution_limits: Vec<u32>,
    pub lcom4_distribution_limits: Vec<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            rfc_exclude_accessors: false,
            lcom4_exclude_accessors: true,
            lcom4_excluded_fields: Vec::new(),
            rfc_distribution_limits: vec![0, 5, 10, 20, 30, 50, 90, 150],
            lcom4_distribution_limits: vec![2, 3, 4, 5, 10],
        }
    }
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when given, else the defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_limits("rfc_distribution_limits", &self.rfc_distribution_limits)?;
        check_limits("lcom4_distribution_limits", &self.lcom4_distribution_limits)
    }

    pub fn is_lcom4_excluded(&self, field_name: &str) -> bool {
        self.lcom4_excluded_fields.iter().any(|f| f == field_name)
    }
}

fn check_limits(name: &str, limits: &[u32]) -> Result<()> {
    if limits.is_empty() {
        bail!("{name} must not be empty");
    }
    if limits.windows(2).any(|w| w[0] >= w[1]) {
        bail!("{name} must be strictly increasing, got {limits:?}");
    }
    Ok(())
}
