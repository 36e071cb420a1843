use anyhow::Result;
use archfilter::{
    cli::{Cli, Commands},
    config::Config,
    filter::Decision,
    registry::FetchContext,
    service::{self, CheckRequest, CheckService, InspectService},
    workload::ImageReference,
};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const EXIT_REJECT: u8 = 1;
const EXIT_ERROR: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let Cli {
        command,
        config: config_path,
        ..
    } = cli;

    match command {
        Commands::Check {
            pod,
            node,
            arch_label,
        } => {
            let config = load_config(config_path.as_deref())?;
            let ctx = cancel_on_ctrl_c(FetchContext::new().with_timeout(config.deadline()));
            let source = Arc::new(service::registry_client(&config));
            let request = CheckRequest {
                pod_path: pod,
                node_path: node,
                arch_label,
            };

            let result = CheckService::check(&config, source, &ctx, &request).await?;

            // Only the decision goes to stdout
            println!("{}", result);
            match result.decision {
                Decision::Admit => Ok(ExitCode::SUCCESS),
                Decision::Reject => Ok(ExitCode::from(EXIT_REJECT)),
            }
        }
        Commands::Inspect { image } => {
            let config = load_config(config_path.as_deref())?;
            let ctx = cancel_on_ctrl_c(FetchContext::new().with_timeout(config.deadline()));
            let client = service::registry_client(&config);

            let report = InspectService::inspect(
                &client,
                &ctx,
                Some(config.fetch_timeout()),
                &ImageReference::new(&image),
            )
            .await?;
            println!("{}", report);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Version => {
            println!("archfilter {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn cancel_on_ctrl_c(ctx: FetchContext) -> FetchContext {
    let canceller = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted; abandoning outstanding registry requests");
            canceller.cancel();
        }
    });
    ctx
}
