//! Architecture compatibility filter
//!
//! Decides whether a workload's images can run on a candidate node. The
//! filter fails open: it rejects only when a manifest it could fetch and parse
//! proves an image lacks the node's architecture.

use crate::config::Config;
use crate::constants::{defaults, label};
use crate::node::{Architecture, Node};
use crate::registry::{FetchContext, ManifestSource};
use crate::workload::{ImageReference, Workload};
use futures::stream::{self, StreamExt};
use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

mod evaluate;

pub use evaluate::{evaluate_config, evaluate_image, evaluate_index};


/// Compatibility of one image with the node architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Compatible,
    Incompatible,
    /// The image could not be checked; aggregated like `Compatible`
    Unknown,
}

/// Verdict for one image plus a human-readable detail
#[derive(Debug, Clone, PartialEq)]
pub struct ImageOutcome {
    pub image: ImageReference,
    pub verdict: Verdict,
    pub detail: String,
}

impl ImageOutcome {
    pub fn new(image: ImageReference, verdict: Verdict, detail: impl Into<String>) -> Self {
        Self {
            image,
            verdict,
            detail: detail.into(),
        }
    }
}

/// Whether the workload may be placed on the node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admit,
    Reject,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Admit => f.write_str("ADMIT"),
            Decision::Reject => f.write_str("REJECT"),
        }
    }
}

/// Outcome of one filter invocation.
///
/// `reason` names the offending image on Reject and lists unchecked images on
/// Admit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterResult {
    pub decision: Decision,
    pub reason: String,
}

impl FilterResult {
    pub fn admit(reason: impl Into<String>) -> Self {
        Self {
            decision: Decision::Admit,
            reason: reason.into(),
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            decision: Decision::Reject,
            reason: reason.into(),
        }
    }

    pub fn is_admitted(&self) -> bool {
        self.decision == Decision::Admit
    }
}

impl fmt::Display for FilterResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.decision, self.reason)
    }
}

/// Tuning for [`ArchFilter`]
#[derive(Debug, Clone)]
pub struct FilterOptions {
    /// Node label holding the architecture
    pub arch_label: String,
    /// Images evaluated at once; zero is treated as one
    pub max_concurrent_fetches: usize,
    /// Limit on each registry call, on top of the context deadline
    pub fetch_timeout: Option<Duration>,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            arch_label: label::ARCH.to_string(),
            max_concurrent_fetches: defaults::MAX_CONCURRENT_FETCHES,
            fetch_timeout: Some(Duration::from_secs(defaults::FETCH_TIMEOUT_SECS)),
        }
    }
}

impl From<&Config> for FilterOptions {
    fn from(config: &Config) -> Self {
        Self {
            arch_label: config.arch_label.clone(),
            max_concurrent_fetches: config.max_concurrent_fetches,
            fetch_timeout: Some(config.fetch_timeout()),
        }
    }
}

/// Folds per-image outcomes into a decision, stopping at the first
/// incompatible image
struct Tally<'a> {
    arch: &'a Architecture,
    compatible: usize,
    unresolved: Vec<ImageOutcome>,
}

impl<'a> Tally<'a> {
    fn new(arch: &'a Architecture) -> Self {
        Self {
            arch,
            compatible: 0,
            unresolved: Vec::new(),
        }
    }

    fn record(&mut self, outcome: ImageOutcome) -> ControlFlow<FilterResult> {
        match outcome.verdict {
            Verdict::Incompatible => ControlFlow::Break(FilterResult::reject(format!(
                "image {} does not support the node architecture {} ({})",
                outcome.image, self.arch, outcome.detail
            ))),
            Verdict::Compatible => {
                self.compatible += 1;
                ControlFlow::Continue(())
            }
            Verdict::Unknown => {
                self.unresolved.push(outcome);
                ControlFlow::Continue(())
            }
        }
    }

    fn finish(mut self) -> FilterResult {
        if self.unresolved.is_empty() {
            return FilterResult::admit(format!(
                "all {} image(s) support {}",
                self.compatible, self.arch
            ));
        }

        self.unresolved.sort_by(|a, b| a.image.cmp(&b.image));
        let images: Vec<String> = self
            .unresolved
            .iter()
            .map(|o| o.image.to_string())
            .collect();
        warn!(
            "Admitting without checking {} image(s): {}. Images with an unknown architecture may not run on this node.",
            images.len(),
            images.join(", ")
        );
        FilterResult::admit(format!(
            "{} image(s) support {}; {} could not be checked: {}",
            self.compatible,
            self.arch,
            images.len(),
            images.join(", ")
        ))
    }
}

/// The architecture compatibility filter.
///
/// Holds no per-invocation state, so one instance can serve concurrent
/// invocations for many nodes.
pub struct ArchFilter {
    source: Arc<dyn ManifestSource>,
    options: FilterOptions,
}

impl ArchFilter {
    pub const NAME: &'static str = "ArchitectureCompatibility";

    pub fn new(source: Arc<dyn ManifestSource>) -> Self {
        Self::with_options(source, FilterOptions::default())
    }

    pub fn with_options(source: Arc<dyn ManifestSource>, options: FilterOptions) -> Self {
        Self { source, options }
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// Decide whether `workload` can run on `node`. Never fails.
    pub async fn filter(&self, ctx: &FetchContext, workload: &Workload, node: &Node) -> FilterResult {
        let images = workload.image_references();
        debug!(
            "Images for {}: {:?}",
            workload.display_name(),
            images.iter().map(ImageReference::as_str).collect::<Vec<_>>()
        );

        let Some(arch) = node.architecture(&self.options.arch_label) else {
            info!(
                "Node {} has no {} label; ignoring architecture compatibility filtering. \
                 This may place pods on nodes with incompatible architectures.",
                node.name, self.options.arch_label
            );
            return FilterResult::admit(
                "node architecture not found; ignoring architecture compatibility filtering",
            );
        };

        if images.is_empty() {
            return FilterResult::admit("no images to check");
        }

        info!(
            "Checking {} image(s) of {} against node {} ({})",
            images.len(),
            workload.display_name(),
            node.name,
            arch
        );

        let source = self.source.as_ref();
        let fetch_timeout = self.options.fetch_timeout;
        let arch_ref = &arch;
        // Futures are lazy; none fetches until the buffer polls it
        let pending: Vec<_> = images
            .iter()
            .map(|image| evaluate_image(source, ctx, fetch_timeout, image, arch_ref))
            .collect();
        let mut outcomes =
            stream::iter(pending).buffer_unordered(self.options.max_concurrent_fetches.max(1));

        let mut tally = Tally::new(&arch);
        while let Some(outcome) = outcomes.next().await {
            if let ControlFlow::Break(rejected) = tally.record(outcome) {
                // Dropping the stream abandons fetches still in flight
                info!("Node {} rejected: {}", node.name, rejected.reason);
                return rejected;
            }
        }

        tally.finish()
    }
}
