//! Registry credentials
//!
//! Credentials come from the archfilter config file first, then from Docker
//! config files and the credential helpers they name, and finally default to
//! anonymous access.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

mod keychain;

pub use keychain::{registry_variants, ChainKeychain, DockerConfigKeychain, Keychain, StaticKeychain};

/// Credentials for one registry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// base64 `user:password`, as stored in Docker config files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
}

impl AuthConfig {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            auth: None,
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_anonymous(&self) -> bool {
        self.username.is_none() && self.password.is_none() && self.auth.is_none()
    }

    /// Convert to oci-distribution RegistryAuth
    pub fn to_registry_auth(&self) -> oci_distribution::secrets::RegistryAuth {
        use oci_distribution::secrets::RegistryAuth;

        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            return RegistryAuth::Basic(username.clone(), password.clone());
        }

        if let Some(auth) = &self.auth {
            if let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(auth) {
                if let Ok(decoded) = String::from_utf8(decoded) {
                    if let Some((user, pass)) = decoded.split_once(':') {
                        return RegistryAuth::Basic(user.to_string(), pass.to_string());
                    }
                }
            }
        }

        RegistryAuth::Anonymous
    }
}

/// Docker config file structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DockerConfig {
    #[serde(default)]
    pub auths: HashMap<String, AuthConfig>,
    #[serde(rename = "credHelpers", default)]
    pub cred_helpers: HashMap<String, String>,
    #[serde(rename = "credsStore", skip_serializing_if = "Option::is_none")]
    pub creds_store: Option<String>,
}

#[cfg(test)]
mod tests;
