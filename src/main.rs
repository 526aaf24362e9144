//! packman - Node.js runtime compatibility analyzer and dependency updater CLI
//!
//! - `analyze`: resolve the Node.js range every installed package accepts,
//!   classify dependency health and flag range outliers
//! - `apply`: update or replace dependencies with rollback on failure

use anyhow::Context;
use clap::Parser;
use packman::cli::{CliArgs, Command};
use packman::compat::current_runtime_version;
use packman::config::Config;
use packman::logging::init_logging;
use packman::orchestrator::{project_dirs, ApplyPlan, Orchestrator};
use packman::output::{create_formatter, OutputConfig};
use packman::package_manager::{PackageManagerKind, SystemPackageManager};
use packman::registry::{HttpClient, NpmRegistry};
use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let scope = args.scope().clone();

    let config = Config::load(&scope.path, args.config.as_deref())?;
    let mut logging = config.logging.clone();
    if args.verbose {
        logging.level = "debug".to_string();
    }
    if let Some(format) = args.log_format {
        logging.format = format;
    }
    init_logging(&logging);
    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        path = %scope.path.display(),
        "starting packman"
    );

    if let Command::Apply(apply) = &args.command {
        apply.validate()?;
    }

    let root = scope
        .path
        .canonicalize()
        .unwrap_or_else(|_| scope.path.clone());
    let dirs = project_dirs(&root, scope.recursive)?;

    let client = HttpClient::with_timeout(config.timeout()).context("failed to build HTTP client")?;
    let registry_url = args.registry.clone().unwrap_or_else(|| config.registry_url.clone());
    let registry = NpmRegistry::with_url(client, registry_url)
        .with_alternatives(config.alternatives_catalog());

    let show_progress = !args.quiet && !args.json && io::stderr().is_terminal();
    let orchestrator = Orchestrator::new(Arc::new(registry))
        .with_scope(scope)
        .with_concurrency(config.concurrency)
        .with_runtime(current_runtime_version())
        .with_progress(show_progress);

    let mut output_config = OutputConfig::from_cli(args.json, args.verbose, args.quiet);
    if !io::stdout().is_terminal() {
        output_config = output_config.without_color();
    }
    let formatter = create_formatter(output_config);
    let mut stdout = io::stdout().lock();

    let has_problems = match &args.command {
        Command::Analyze(_) => {
            let run = orchestrator.analyze_all(&dirs).await;
            formatter.format_analysis(&run, &mut stdout)?;
            run.has_problems()
        }
        Command::Apply(apply) => {
            let kind = match apply.package_manager {
                Some(kind) => Some(kind),
                None => config
                    .package_manager
                    .as_deref()
                    .map(str::parse::<PackageManagerKind>)
                    .transpose()?,
            };
            let runner = match kind {
                Some(kind) => SystemPackageManager::with_kind(kind),
                None => SystemPackageManager::new(),
            };
            let plan = ApplyPlan {
                updates: apply.updates.clone(),
                replaces: apply.replaces.clone(),
                all_highest: apply.all_highest,
                set_engines: apply.set_engines,
            };

            let run = orchestrator.apply_all(&dirs, &plan, &runner).await;
            formatter.format_apply(&run, &mut stdout)?;
            run.has_errors()
        }
    };
    stdout.flush()?;

    if has_problems {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
