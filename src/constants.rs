/// Node label keys
pub mod label {
    /// Well-known label carrying a node's CPU architecture
    pub const ARCH: &str = "kubernetes.io/arch";
}

/// Registry manifest media types
pub mod media_type {
    /// OCI image index (multi-platform)
    pub const OCI_INDEX: &str = "application/vnd.oci.image.index.v1+json";

    /// OCI single-platform image manifest
    pub const OCI_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";

    /// Docker manifest list (multi-platform)
    pub const DOCKER_MANIFEST_LIST: &str =
        "application/vnd.docker.distribution.manifest.list.v2+json";

    /// Docker v2 schema 2 single-platform manifest
    pub const DOCKER_MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";

    /// Docker v2 schema 1 manifest (signed)
    pub const DOCKER_MANIFEST_V1_SIGNED: &str =
        "application/vnd.docker.distribution.manifest.v1+prettyjws";

    /// Docker v2 schema 1 manifest (unsigned)
    pub const DOCKER_MANIFEST_V1: &str = "application/vnd.docker.distribution.manifest.v1+json";

    /// Every manifest media type the fetcher asks the registry for
    pub const ACCEPTED: &[&str] = &[
        OCI_INDEX,
        DOCKER_MANIFEST_LIST,
        OCI_MANIFEST,
        DOCKER_MANIFEST_V2,
        DOCKER_MANIFEST_V1_SIGNED,
        DOCKER_MANIFEST_V1,
    ];

    /// Media types that describe a multi-platform index
    pub fn is_index(media_type: &str) -> bool {
        media_type == OCI_INDEX || media_type == DOCKER_MANIFEST_LIST
    }

    /// Media types this crate knows how to classify
    pub fn is_known(media_type: &str) -> bool {
        ACCEPTED.contains(&media_type)
    }
}

/// Filter tuning defaults
pub mod defaults {
    /// Images evaluated concurrently within one invocation
    pub const MAX_CONCURRENT_FETCHES: usize = 4;

    /// Upper bound on a single registry call, in seconds
    pub const FETCH_TIMEOUT_SECS: u64 = 10;

    /// Overall per-invocation deadline used by the CLI, in seconds
    pub const DEADLINE_SECS: u64 = 30;
}
