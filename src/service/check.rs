//! Check service: run the filter for one pod and node read from disk

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::{
    config::Config,
    filter::{ArchFilter, FilterOptions, FilterResult},
    node::Node,
    registry::{FetchContext, ManifestSource},
    workload::Workload,
};

/// Inputs for a check operation
pub struct CheckRequest {
    pub pod_path: PathBuf,
    pub node_path: PathBuf,
    /// Overrides the configured architecture label
    pub arch_label: Option<String>,
}

pub struct CheckService;

impl CheckService {
    /// Read and parse the pod and node documents
    pub fn load_inputs(request: &CheckRequest) -> Result<(Workload, Node)> {
        let pod = std::fs::read_to_string(&request.pod_path)
            .with_context(|| format!("Failed to read pod file: {}", request.pod_path.display()))?;
        let node = std::fs::read_to_string(&request.node_path).with_context(|| {
            format!("Failed to read node file: {}", request.node_path.display())
        })?;

        let workload = Workload::from_pod_document(&pod)
            .with_context(|| format!("Invalid pod file: {}", request.pod_path.display()))?;
        let node = Node::from_node_document(&node)
            .with_context(|| format!("Invalid node file: {}", request.node_path.display()))?;
        Ok((workload, node))
    }

    /// Errors only when the input documents cannot be loaded; the filter
    /// itself always decides
    pub async fn check(
        config: &Config,
        source: Arc<dyn ManifestSource>,
        ctx: &FetchContext,
        request: &CheckRequest,
    ) -> Result<FilterResult> {
        let (workload, node) = Self::load_inputs(request)?;

        let mut options = FilterOptions::from(config);
        if let Some(label) = &request.arch_label {
            options.arch_label = label.clone();
        }

        let filter = ArchFilter::with_options(source, options);
        info!(
            "Running {} for {} on node {}",
            filter.name(),
            workload.display_name(),
            node.name
        );
        Ok(filter.filter(ctx, &workload, &node).await)
    }
}
