//! Inspect service: report an image's manifest kind and architectures

use anyhow::{Context, Result};
use std::fmt;
use std::time::Duration;
use tracing::info;

use crate::{
    manifest::{self, ClassifiedManifest, ConfigSource, ImageConfig, ManifestKind},
    registry::{FetchContext, ManifestSource},
    workload::ImageReference,
};

#[derive(Debug, Clone, PartialEq)]
pub struct InspectReport {
    pub image: ImageReference,
    pub kind: ManifestKind,
    pub media_type: String,
    pub digest: Option<String>,
    pub architectures: Vec<String>,
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ManifestKind::PlatformIndex => "platform index",
            ManifestKind::SinglePlatform => "single platform",
        };
        writeln!(f, "image: {}", self.image)?;
        if let Some(digest) = &self.digest {
            writeln!(f, "digest: {}", digest)?;
        }
        writeln!(f, "kind: {} ({})", kind, self.media_type)?;
        write!(f, "architectures: {}", self.architectures.join(", "))
    }
}

/// Unlike the filter, inspection reports errors instead of failing open
pub struct InspectService;

impl InspectService {
    pub async fn inspect(
        source: &dyn ManifestSource,
        ctx: &FetchContext,
        fetch_timeout: Option<Duration>,
        image: &ImageReference,
    ) -> Result<InspectReport> {
        info!("Inspecting {}", image);

        let raw = ctx
            .run(fetch_timeout, source.fetch_manifest(image))
            .await
            .context("Failed to get image manifest")?;
        let classified = manifest::classify(&raw.bytes, raw.media_type.as_deref())
            .context("Failed to parse image manifest")?;

        let kind = classified.kind();
        let (media_type, architectures) = match classified {
            ClassifiedManifest::PlatformIndex(index) => {
                let mut archs: Vec<String> = index
                    .manifests
                    .iter()
                    .filter_map(|m| m.architecture().map(str::to_string))
                    .collect();
                archs.sort();
                archs.dedup();
                let media_type = index
                    .media_type
                    .unwrap_or_else(|| crate::constants::media_type::OCI_INDEX.to_string());
                (media_type, archs)
            }
            ClassifiedManifest::SinglePlatform(single) => {
                let config = match single.config {
                    ConfigSource::Inline(config) => config,
                    ConfigSource::Blob(descriptor) => {
                        let data = ctx
                            .run(fetch_timeout, source.fetch_blob(image, &descriptor))
                            .await
                            .context("Failed to get image config")?;
                        ImageConfig::from_slice(&data).context("Failed to parse image config")?
                    }
                };
                (single.media_type, vec![config.architecture])
            }
        };

        Ok(InspectReport {
            image: image.clone(),
            kind,
            media_type,
            digest: raw.digest,
            architectures,
        })
    }
}
