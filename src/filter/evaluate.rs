//! Per-image compatibility checks

use super::{ImageOutcome, Verdict};
use crate::manifest::{self, ClassifiedManifest, ConfigSource, ImageConfig, PlatformIndex};
use crate::node::Architecture;
use crate::registry::{FetchContext, ManifestSource};
use crate::workload::ImageReference;
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, info};

/// Compatible if any entry advertises exactly `arch`.
///
/// Every entry is scanned so the detail lists what the index offers. An
/// empty index is incompatible.
pub fn evaluate_index(
    image: &ImageReference,
    index: &PlatformIndex,
    arch: &Architecture,
) -> ImageOutcome {
    let mut available = Vec::new();
    let mut found = false;
    for entry in &index.manifests {
        if let Some(entry_arch) = entry.architecture() {
            found |= *arch == *entry_arch;
            if !available.contains(&entry_arch) {
                available.push(entry_arch);
            }
        }
    }

    let listed = if available.is_empty() {
        "none".to_string()
    } else {
        available.join(", ")
    };

    if found {
        info!("{} has a manifest for {}", image, arch);
        ImageOutcome::new(
            image.clone(),
            Verdict::Compatible,
            format!("index provides {}", listed),
        )
    } else {
        info!("{} does not have a manifest for {}", image, arch);
        ImageOutcome::new(
            image.clone(),
            Verdict::Incompatible,
            format!("index provides {}", listed),
        )
    }
}

pub fn evaluate_config(
    image: &ImageReference,
    config: &ImageConfig,
    arch: &Architecture,
) -> ImageOutcome {
    let detail = if config.architecture.is_empty() {
        "image declares no architecture".to_string()
    } else {
        format!("image architecture is {}", config.architecture)
    };
    if *arch == *config.architecture {
        info!("{} is built for {}", image, arch);
        ImageOutcome::new(image.clone(), Verdict::Compatible, detail)
    } else {
        info!("{} is built for {}, not {}", image, config.architecture, arch);
        ImageOutcome::new(image.clone(), Verdict::Incompatible, detail)
    }
}

/// Fetch, classify and evaluate one image.
///
/// Any failure along the way, including an exhausted context, yields
/// [`Verdict::Unknown`].
pub async fn evaluate_image(
    source: &dyn ManifestSource,
    ctx: &FetchContext,
    fetch_timeout: Option<Duration>,
    image: &ImageReference,
    arch: &Architecture,
) -> ImageOutcome {
    match check_image(source, ctx, fetch_timeout, image, arch).await {
        Ok(outcome) => outcome,
        Err(e) => {
            info!("Could not check image {}: {:#}", image, e);
            ImageOutcome::new(image.clone(), Verdict::Unknown, format!("{:#}", e))
        }
    }
}

async fn check_image(
    source: &dyn ManifestSource,
    ctx: &FetchContext,
    fetch_timeout: Option<Duration>,
    image: &ImageReference,
    arch: &Architecture,
) -> Result<ImageOutcome> {
    debug!("Checking image: {}", image);

    let raw = ctx
        .run(fetch_timeout, source.fetch_manifest(image))
        .await
        .context("Failed to get image manifest")?;

    let classified = manifest::classify(&raw.bytes, raw.media_type.as_deref())
        .context("Failed to parse image manifest")?;

    match classified {
        ClassifiedManifest::PlatformIndex(index) => {
            debug!(
                "{} is a platform index with {} entries",
                image,
                index.manifests.len()
            );
            Ok(evaluate_index(image, &index, arch))
        }
        ClassifiedManifest::SinglePlatform(single) => {
            debug!("{} is a single-platform manifest ({})", image, single.media_type);
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
            Ok(evaluate_config(image, &config, arch))
        }
    }
}
