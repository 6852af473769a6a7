//! poetry-upgrade - Interactive upgrade of Poetry dependency constraints
//!
//! Finds dependencies whose latest release lies above the range declared in
//! pyproject.toml, lets the operator pick which ones to advance, and writes
//! the new constraints back in a single write.

use clap::Parser;
use poetry_upgrade::cli::CliArgs;
use poetry_upgrade::config::{ProjectSettings, Settings};
use poetry_upgrade::manifest::{ConstraintRewriter, FileManifestStore, ManifestStore};
use poetry_upgrade::orchestrator::UpgradeOrchestrator;
use poetry_upgrade::output::{create_formatter, OutputConfig};
use poetry_upgrade::registry::{HttpClient, PackageIndex, PyPIAdapter};
use poetry_upgrade::selection::{AcceptAll, Selector, TerminalSelector};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(&args);

    // Run the main logic and handle errors
    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr; RUST_LOG takes precedence over -v/-q
fn init_tracing(args: &CliArgs) {
    let level = match args.verbose {
        0 if args.quiet => Level::ERROR,
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let store = FileManifestStore::locate(&args.path)?;

    // Project settings live in the manifest itself
    let document = store.read()?;
    let settings = Settings::resolve(&args, ProjectSettings::from_document(&document)?);
    debug!(
        strategy = %settings.strategy,
        index_url = %settings.index_url,
        timeout = ?settings.timeout,
        "resolved settings for {}",
        store.path().display()
    );

    let client = HttpClient::with_timeout(settings.timeout)?;
    let registry = PyPIAdapter::with_base_url(client, settings.index_url.as_str());
    let index = PackageIndex::new(Box::new(registry), store.project_root());

    let selector: Box<dyn Selector> = if args.yes {
        Box::new(AcceptAll)
    } else {
        Box::new(TerminalSelector::stdio())
    };

    let mut orchestrator = UpgradeOrchestrator::new(&index, selector)
        .with_rewriter(ConstraintRewriter::new(settings.strategy))
        .with_dry_run(args.dry_run)
        .with_progress(args.show_progress());
    let report = orchestrator.run_with_document(&store, document).await?;

    // Create output formatter based on CLI options
    let formatter = create_formatter(OutputConfig::from_cli(args.json, args.verbose, args.quiet));

    // Output results
    let mut stdout = io::stdout().lock();
    formatter.format(&report, &mut stdout)?;
    stdout.flush()?;

    Ok(ExitCode::SUCCESS)
}
