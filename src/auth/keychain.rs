//! Keychains map a registry host to credentials

use super::{AuthConfig, DockerConfig};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Resolves credentials for a registry host such as `ghcr.io` or `localhost:5000`
pub trait Keychain: Send + Sync {
    fn resolve(&self, registry: &str) -> Result<AuthConfig>;
}

/// Host spellings that may appear as keys in credential files
pub fn registry_variants(registry: &str) -> Vec<String> {
    if registry == "docker.io" || registry == "index.docker.io" {
        return vec![
            "docker.io".to_string(),
            "index.docker.io".to_string(),
            "https://index.docker.io/v1/".to_string(),
        ];
    }

    vec![
        registry.to_string(),
        format!("https://{}", registry),
        format!("https://{}/v1/", registry),
        format!("https://{}/v2/", registry),
        format!("http://{}", registry),
    ]
}

/// Credentials configured explicitly, keyed by registry host
#[derive(Debug, Clone, Default)]
pub struct StaticKeychain {
    entries: HashMap<String, AuthConfig>,
}

impl StaticKeychain {
    pub fn new(entries: HashMap<String, AuthConfig>) -> Self {
        Self { entries }
    }
}

impl Keychain for StaticKeychain {
    fn resolve(&self, registry: &str) -> Result<AuthConfig> {
        Ok(registry_variants(registry)
            .iter()
            .find_map(|v| self.entries.get(v).cloned())
            .unwrap_or_default())
    }
}

/// Reads Docker-style config files and runs the credential helpers they name
pub struct DockerConfigKeychain {
    paths: Vec<PathBuf>,
    loaded: OnceLock<DockerConfig>,
}

impl DockerConfigKeychain {
    /// Look in `DOCKER_CONFIG`, `REGISTRY_AUTH_FILE`, the containers auth file
    /// under `XDG_RUNTIME_DIR`, then `~/.docker/config.json`
    pub fn new() -> Self {
        let mut paths = Vec::new();
        if let Ok(dir) = std::env::var("DOCKER_CONFIG") {
            paths.push(PathBuf::from(dir).join("config.json"));
        }
        if let Ok(file) = std::env::var("REGISTRY_AUTH_FILE") {
            paths.push(PathBuf::from(file));
        }
        if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
            paths.push(PathBuf::from(dir).join("containers/auth.json"));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".docker/config.json"));
        }
        Self::with_paths(paths)
    }

    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            loaded: OnceLock::new(),
        }
    }

    fn config(&self) -> &DockerConfig {
        self.loaded.get_or_init(|| {
            for path in &self.paths {
                if !path.exists() {
                    continue;
                }
                let parsed = std::fs::read_to_string(path)
                    .map_err(anyhow::Error::from)
                    .and_then(|content| Ok(serde_json::from_str::<DockerConfig>(&content)?));
                match parsed {
                    Ok(config) => {
                        debug!("Loaded Docker config from: {}", path.display());
                        return config;
                    }
                    Err(e) => warn!("Skipping Docker config at {}: {}", path.display(), e),
                }
            }
            DockerConfig::default()
        })
    }

    fn run_helper(helper: &str, registry: &str) -> Result<AuthConfig> {
        use std::io::Write;
        use std::process::{Command, Stdio};

        #[derive(serde::Deserialize)]
        struct HelperResponse {
            #[serde(rename = "Username")]
            username: Option<String>,
            #[serde(rename = "Secret")]
            secret: Option<String>,
        }

        let program = format!("docker-credential-{}", helper);
        debug!("Running credential helper {} for {}", program, registry);

        let mut child = Command::new(&program)
            .arg("get")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn credential helper: {}", program))?;

        if let Some(mut stdin) = child.stdin.take() {
            writeln!(stdin, "{}", registry)?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            anyhow::bail!(
                "Credential helper {} failed: {}",
                program,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let response: HelperResponse = serde_json::from_slice(&output.stdout)
            .context("Failed to parse credential helper response")?;
        Ok(AuthConfig {
            username: response.username,
            password: response.secret,
            auth: None,
        })
    }
}

impl Default for DockerConfigKeychain {
    fn default() -> Self {
        Self::new()
    }
}

impl Keychain for DockerConfigKeychain {
    fn resolve(&self, registry: &str) -> Result<AuthConfig> {
        let config = self.config();

        if let Some(entry) = registry_variants(registry)
            .iter()
            .find_map(|v| config.auths.get(v))
        {
            if !entry.is_anonymous() {
                return Ok(entry.clone());
            }
        }

        let helper = config
            .cred_helpers
            .get(registry)
            .or(config.creds_store.as_ref());
        if let Some(helper) = helper {
            match Self::run_helper(helper, registry) {
                Ok(auth) => return Ok(auth),
                Err(e) => warn!("Credential helper failed for {}: {}", registry, e),
            }
        }

        Ok(AuthConfig::anonymous())
    }
}

/// Tries each keychain in order and returns the first non-anonymous credentials
pub struct ChainKeychain {
    keychains: Vec<Box<dyn Keychain>>,
}

impl ChainKeychain {
    pub fn new(keychains: Vec<Box<dyn Keychain>>) -> Self {
        Self { keychains }
    }
}

impl Keychain for ChainKeychain {
    fn resolve(&self, registry: &str) -> Result<AuthConfig> {
        for keychain in &self.keychains {
            match keychain.resolve(registry) {
                Ok(auth) if !auth.is_anonymous() => return Ok(auth),
                Ok(_) => {}
                Err(e) => debug!("Keychain failed for {}: {}", registry, e),
            }
        }
        debug!("No credentials found for {}, using anonymous", registry);
        Ok(AuthConfig::anonymous())
    }
}
