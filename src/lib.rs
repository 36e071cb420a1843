pub mod auth;
pub mod cli;
pub mod config;
pub mod constants;
pub mod filter;
pub mod manifest;
pub mod node;
pub mod registry;
pub mod service;
pub mod workload;

pub use anyhow::Result;
pub use filter::{ArchFilter, Decision, FilterOptions, FilterResult, Verdict};
pub use registry::{FetchContext, ManifestSource, RegistryClient};
