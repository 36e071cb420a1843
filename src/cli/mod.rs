use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "archfilter")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a config file (defaults to ~/.config/archfilter/config.toml)
    #[arg(long, global = true, env = "ARCHFILTER_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check whether a pod's images can run on a node's architecture
    ///
    /// Prints ADMIT or REJECT with a reason. Exits 0 on admit, 1 on reject
    /// and 2 when the inputs cannot be read.
    Check {
        /// Pod manifest (YAML or JSON)
        #[arg(long, value_name = "FILE")]
        pod: PathBuf,

        /// Node manifest (YAML or JSON)
        #[arg(long, value_name = "FILE")]
        node: PathBuf,

        /// Node label holding the architecture (e.g., kubernetes.io/arch)
        #[arg(long)]
        arch_label: Option<String>,
    },

    /// Show the manifest kind and architectures of an image
    Inspect {
        /// Image reference (e.g., quay.io/org/app:1.0)
        image: String,
    },

    /// Show version information
    Version,
}
