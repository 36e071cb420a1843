//! Manifest classification
//!
//! Turns raw manifest bytes into either a multi-platform index or a
//! single-platform manifest. Classification looks only at the media type and
//! the document's shape, never at what the image contains.

use crate::constants::media_type;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;


#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("invalid manifest document: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("manifest of type {media_type} has no config descriptor")]
    MissingConfig { media_type: String },

    #[error("invalid image config: {0}")]
    InvalidConfig(serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    SinglePlatform,
    PlatformIndex,
}

/// Content descriptor pointing at a blob or manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    #[serde(rename = "mediaType", default)]
    pub media_type: String,
    #[serde(default)]
    pub size: i64,
    pub digest: String,
}

/// Platform information attached to an index entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    #[serde(default)]
    pub architecture: String,
    #[serde(default)]
    pub os: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

/// One per-platform manifest listed in an index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformEntry {
    #[serde(rename = "mediaType", default)]
    pub media_type: String,
    pub digest: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
}

impl PlatformEntry {
    /// Entries without a platform object advertise no architecture
    pub fn architecture(&self) -> Option<&str> {
        self.platform
            .as_ref()
            .map(|p| p.architecture.as_str())
            .filter(|a| !a.is_empty())
    }
}

/// OCI image index or Docker manifest list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformIndex {
    #[serde(rename = "schemaVersion", default)]
    pub schema_version: i32,
    #[serde(rename = "mediaType", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default)]
    pub manifests: Vec<PlatformEntry>,
}

/// Image configuration; only the platform fields are read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Empty when the document omits it, which matches no node
    #[serde(default)]
    pub architecture: String,
    #[serde(default)]
    pub os: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl ImageConfig {
    pub fn from_slice(data: &[u8]) -> Result<Self, ManifestError> {
        serde_json::from_slice(data).map_err(ManifestError::InvalidConfig)
    }
}

/// Where a single-platform manifest keeps its architecture
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// A config blob that must be fetched separately
    Blob(Descriptor),
    /// Docker schema1 manifests carry the architecture inline
    Inline(ImageConfig),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageManifest {
    pub media_type: String,
    pub config: ConfigSource,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedManifest {
    PlatformIndex(PlatformIndex),
    SinglePlatform(ImageManifest),
}

impl ClassifiedManifest {
    pub fn kind(&self) -> ManifestKind {
        match self {
            ClassifiedManifest::PlatformIndex(_) => ManifestKind::PlatformIndex,
            ClassifiedManifest::SinglePlatform(_) => ManifestKind::SinglePlatform,
        }
    }
}

#[derive(Deserialize)]
struct V2Manifest {
    config: Option<Descriptor>,
}

#[derive(Deserialize)]
struct V1Manifest {
    architecture: Option<String>,
}

/// Classify raw manifest bytes.
///
/// `hint` is the media type reported by the transport, if any. Index media
/// types always produce [`ClassifiedManifest::PlatformIndex`]; anything else
/// is single-platform.
pub fn classify(raw: &[u8], hint: Option<&str>) -> Result<ClassifiedManifest, ManifestError> {
    let value: Value = serde_json::from_slice(raw)?;
    let resolved = resolve_media_type(hint, &value);

    if media_type::is_index(&resolved) {
        let index: PlatformIndex = serde_json::from_value(value)?;
        return Ok(ClassifiedManifest::PlatformIndex(index));
    }

    let config = if is_schema1(&resolved) {
        let manifest: V1Manifest = serde_json::from_value(value)?;
        ConfigSource::Inline(ImageConfig {
            architecture: manifest.architecture.unwrap_or_default(),
            os: String::new(),
            variant: None,
        })
    } else {
        let manifest: V2Manifest = serde_json::from_value(value)?;
        let descriptor = manifest.config.ok_or_else(|| ManifestError::MissingConfig {
            media_type: resolved.clone(),
        })?;
        ConfigSource::Blob(descriptor)
    };

    Ok(ClassifiedManifest::SinglePlatform(ImageManifest {
        media_type: resolved,
        config,
    }))
}

/// Pick the media type: a known transport hint, then the document's own
/// `mediaType`, then a guess from its structure.
pub fn resolve_media_type(hint: Option<&str>, document: &Value) -> String {
    if let Some(hint) = hint.map(strip_parameters) {
        if media_type::is_known(hint) {
            return hint.to_string();
        }
    }

    if let Some(declared) = document.get("mediaType").and_then(Value::as_str) {
        if media_type::is_known(declared) {
            return declared.to_string();
        }
    }

    if document.get("schemaVersion").and_then(Value::as_i64) == Some(1) {
        return if document.get("signatures").is_some() {
            media_type::DOCKER_MANIFEST_V1_SIGNED.to_string()
        } else {
            media_type::DOCKER_MANIFEST_V1.to_string()
        };
    }

    if document.get("manifests").map(Value::is_array).unwrap_or(false) {
        return media_type::OCI_INDEX.to_string();
    }

    media_type::OCI_MANIFEST.to_string()
}

fn strip_parameters(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or(content_type).trim()
}

fn is_schema1(resolved: &str) -> bool {
    resolved == media_type::DOCKER_MANIFEST_V1 || resolved == media_type::DOCKER_MANIFEST_V1_SIGNED
}
