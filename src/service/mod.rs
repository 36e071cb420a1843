//! Service layer for business logic orchestration
//!
//! Wires configuration, credentials and the registry client together for the
//! CLI commands in main.rs.

pub mod check;
pub mod inspect;

pub use check::{CheckRequest, CheckService};
pub use inspect::{InspectReport, InspectService};

use crate::auth::{ChainKeychain, DockerConfigKeychain, StaticKeychain};
use crate::config::Config;
use crate::registry::RegistryClient;
use std::sync::Arc;


/// Registry client using configured credentials, then Docker config files
pub fn registry_client(config: &Config) -> RegistryClient {
    let keychain = ChainKeychain::new(vec![
        Box::new(StaticKeychain::new(config.registries.clone())),
        Box::new(DockerConfigKeychain::new()),
    ]);
    RegistryClient::new(&config.registry, Arc::new(keychain))
}
