//! Candidate node model and architecture resolution

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[cfg(test)]
mod tests;

/// A CPU architecture token such as `amd64` or `arm64`.
///
/// Compared by exact, case-sensitive equality. `aarch64` and `arm64` are
/// different architectures as far as this type is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Architecture(String);

impl Architecture {
    pub fn new(arch: impl Into<String>) -> Self {
        Self(arch.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for Architecture {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

#[derive(Debug, Clone, Default)]
pub struct Node {
    pub name: String,
    pub labels: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct NodeDocument {
    #[serde(default)]
    metadata: NodeMetadata,
}

#[derive(Deserialize, Default)]
struct NodeMetadata {
    #[serde(default)]
    name: String,
    #[serde(default)]
    labels: BTreeMap<String, String>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Parse a Kubernetes Node document (YAML or JSON)
    pub fn from_node_document(content: &str) -> Result<Self> {
        let doc: NodeDocument =
            serde_yaml::from_str(content).context("Failed to parse node document")?;
        Ok(Self {
            name: doc.metadata.name,
            labels: doc.metadata.labels,
        })
    }

    /// The node's declared architecture under `label_key`.
    ///
    /// A missing or empty label is reported as `None`. The value is used as
    /// written, without trimming or case folding.
    pub fn architecture(&self, label_key: &str) -> Option<Architecture> {
        self.labels
            .get(label_key)
            .filter(|v| !v.is_empty())
            .map(|v| Architecture::new(v.as_str()))
    }
}
