//! Workload model and image reference extraction
//!
//! Only the parts of a Pod that matter for architecture checks are modelled:
//! its identity and the image of every container.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;


/// An image identifier as written in a container spec.
///
/// Equality is exact string equality after trimming. Registry defaults
/// (`docker.io/library/`, `:latest`) are applied later by the fetcher, so
/// `nginx` and `docker.io/library/nginx:latest` are distinct references here.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageReference(String);

impl ImageReference {
    pub fn new(image: impl AsRef<str>) -> Self {
        Self(image.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageReference {
    fn from(image: &str) -> Self {
        Self::new(image)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Container {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
}

impl Container {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
        }
    }
}

/// The schedulable unit whose images are checked
#[derive(Debug, Clone, Default)]
pub struct Workload {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub containers: Vec<Container>,
    pub init_containers: Vec<Container>,
}

#[derive(Deserialize)]
struct PodDocument {
    #[serde(default)]
    metadata: PodMetadata,
    #[serde(default)]
    spec: PodSpec,
}

#[derive(Deserialize, Default)]
struct PodMetadata {
    name: Option<String>,
    namespace: Option<String>,
}

#[derive(Deserialize, Default)]
struct PodSpec {
    #[serde(default)]
    containers: Vec<Container>,
    #[serde(rename = "initContainers", default)]
    init_containers: Vec<Container>,
}

impl Workload {
    pub fn new(containers: Vec<Container>, init_containers: Vec<Container>) -> Self {
        Self {
            containers,
            init_containers,
            ..Default::default()
        }
    }

    /// Parse a Kubernetes Pod document (YAML or JSON)
    pub fn from_pod_document(content: &str) -> Result<Self> {
        let doc: PodDocument =
            serde_yaml::from_str(content).context("Failed to parse pod document")?;
        Ok(Self {
            name: doc.metadata.name,
            namespace: doc.metadata.namespace,
            containers: doc.spec.containers,
            init_containers: doc.spec.init_containers,
        })
    }

    /// Deduplicated set of images referenced by init and main containers.
    ///
    /// Malformed references are passed through untouched; empty ones are dropped.
    pub fn image_references(&self) -> BTreeSet<ImageReference> {
        self.init_containers
            .iter()
            .chain(self.containers.iter())
            .map(|c| ImageReference::new(&c.image))
            .filter(|r| !r.as_str().is_empty())
            .collect()
    }

    /// `namespace/name` when known, for log lines
    pub fn display_name(&self) -> String {
        match (&self.namespace, &self.name) {
            (Some(ns), Some(name)) => format!("{}/{}", ns, name),
            (None, Some(name)) => name.clone(),
            _ => "<unnamed>".to_string(),
        }
    }
}
