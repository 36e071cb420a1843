use crate::auth::Keychain;
use crate::config::RegistryConfig;
use crate::constants::media_type;
use crate::manifest::Descriptor;
use crate::workload::ImageReference;
use anyhow::{Context, Result};
use async_trait::async_trait;
use oci_distribution::client::{ClientConfig, ClientProtocol};
use oci_distribution::manifest::OciDescriptor;
use oci_distribution::secrets::RegistryAuth;
use oci_distribution::{Client, Reference};
use std::sync::Arc;
use tracing::debug;

mod context;

pub use context::FetchContext;


/// Manifest bytes as served by a registry
#[derive(Debug, Clone, Default)]
pub struct RawManifest {
    pub bytes: Vec<u8>,
    /// Content type reported by the transport, when it reports one
    pub media_type: Option<String>,
    pub digest: Option<String>,
}

/// Where manifests and config blobs come from.
///
/// Implementations are shared across concurrent filter invocations and must
/// not retry indefinitely.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    async fn fetch_manifest(&self, image: &ImageReference) -> Result<RawManifest>;

    /// Fetch a blob, such as an image config, from the image's repository
    async fn fetch_blob(&self, image: &ImageReference, descriptor: &Descriptor) -> Result<Vec<u8>>;
}

/// `ManifestSource` backed by a real OCI distribution registry
pub struct RegistryClient {
    client: Client,
    keychain: Arc<dyn Keychain>,
}

impl RegistryClient {
    pub fn new(config: &RegistryConfig, keychain: Arc<dyn Keychain>) -> Self {
        let protocol = if config.insecure.is_empty() {
            ClientProtocol::Https
        } else {
            ClientProtocol::HttpsExcept(config.insecure.clone())
        };
        let client = Client::new(ClientConfig {
            protocol,
            accept_invalid_certificates: config.accept_invalid_certificates,
            ..Default::default()
        });
        Self { client, keychain }
    }

    async fn registry_auth(&self, reference: &Reference) -> Result<RegistryAuth> {
        let keychain = Arc::clone(&self.keychain);
        let registry = reference.registry().to_string();
        // Credential helpers are external processes
        let auth = tokio::task::spawn_blocking(move || keychain.resolve(&registry))
            .await
            .context("Credential lookup task failed")??;
        Ok(auth.to_registry_auth())
    }
}

#[async_trait]
impl ManifestSource for RegistryClient {
    async fn fetch_manifest(&self, image: &ImageReference) -> Result<RawManifest> {
        let reference = parse_reference(image)?;
        let auth = self.registry_auth(&reference).await?;

        debug!("Fetching manifest for {}", reference);
        let (bytes, digest) = self
            .client
            .pull_manifest_raw(&reference, &auth, media_type::ACCEPTED)
            .await
            .with_context(|| format!("Failed to pull manifest for {}", reference))?;

        Ok(RawManifest {
            bytes: bytes.to_vec(),
            media_type: None,
            digest: Some(digest),
        })
    }

    async fn fetch_blob(&self, image: &ImageReference, descriptor: &Descriptor) -> Result<Vec<u8>> {
        let reference = parse_reference(image)?;

        debug!("Fetching blob {} from {}", descriptor.digest, reference);
        let oci_descriptor = OciDescriptor {
            media_type: descriptor.media_type.clone(),
            digest: descriptor.digest.clone(),
            size: descriptor.size,
            urls: None,
            annotations: None,
        };

        // Registry tokens were stored by the preceding manifest pull
        let mut data: Vec<u8> = Vec::new();
        self.client
            .pull_blob(&reference, &oci_descriptor, &mut data)
            .await
            .with_context(|| format!("Failed to pull blob {}", descriptor.digest))?;
        Ok(data)
    }
}

/// Parse an image reference, applying registry defaults (`docker.io`,
/// `library/`, `:latest`)
pub fn parse_reference(image: &ImageReference) -> Result<Reference> {
    image
        .as_str()
        .parse::<Reference>()
        .with_context(|| format!("Failed to parse image reference: {}", image))
}
