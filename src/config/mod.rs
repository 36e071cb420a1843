use crate::auth::AuthConfig;
use crate::constants::{defaults, label};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Node label holding the architecture
    #[serde(default = "default_arch_label")]
    pub arch_label: String,

    /// Images evaluated concurrently per invocation (1 = sequential)
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// Upper bound on each registry call
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Overall deadline for one `check` invocation
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,

    /// Registry transport configuration
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Registry credentials keyed by host
    #[serde(default)]
    pub registries: HashMap<String, AuthConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RegistryConfig {
    /// Registries reached over plain HTTP
    #[serde(default)]
    pub insecure: Vec<String>,

    /// Skip TLS certificate verification
    #[serde(default)]
    pub accept_invalid_certificates: bool,
}

fn default_arch_label() -> String {
    label::ARCH.to_string()
}

fn default_max_concurrent_fetches() -> usize {
    defaults::MAX_CONCURRENT_FETCHES
}

fn default_fetch_timeout_secs() -> u64 {
    defaults::FETCH_TIMEOUT_SECS
}

fn default_deadline_secs() -> u64 {
    defaults::DEADLINE_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            arch_label: default_arch_label(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            deadline_secs: default_deadline_secs(),
            registry: RegistryConfig::default(),
            registries: HashMap::new(),
        }
    }
}

impl Config {
    /// Load `archfilter/config.toml` from the user config directory, or defaults
    pub fn load() -> anyhow::Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Config::default()),
        }
    }

    /// Load a config file; missing keys take their defaults
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// `<config dir>/archfilter/config.toml`, when the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("archfilter").join("config.toml"))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}
