//! Docbay - documentation build CLI
//!
//! The `docbay` command drives the documentation registry from the shell.
//!
//! ## Commands
//!
//! - `scan`: Re-scan repository branches and queue missing renders
//! - `retrigger`: Re-queue a failed build by its build key
//! - `build-done`: Record the outcome of a finished build
//! - `redirect`: Manage docs-server redirects
//! - `logs`: Show recent build trigger log entries

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;

use docbay_clients::{
    BambooClient, GitBranchLister, GraylogClient, HttpManifestFetcher, SlackClient,
};
use docbay_core::{BuildTrigger, DocsOrchestrator, OrchestratorConfig};
use docbay_state::{DocsRegistry, Redirect, RedirectStore, SurrealDocsRegistry};

#[derive(Parser)]
#[command(name = "docbay")]
#[command(author = "Docbay Maintainers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Documentation build orchestration", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Re-scan repository branches and queue missing renders
    Scan {
        /// Repository clone URL to re-scan
        #[arg(long, conflicts_with = "all", required_unless_present = "all")]
        repository_url: Option<String>,

        /// Re-scan every repository the registry knows
        #[arg(long)]
        all: bool,
    },

    /// Re-queue a failed build by its build key
    Retrigger {
        /// Build key, e.g. CORE-DR-4711
        #[arg(long)]
        build_key: String,
    },

    /// Record the outcome of a finished build
    BuildDone {
        /// Build key the build system reported
        #[arg(long)]
        build_key: String,

        /// Record the build as failed instead of successful
        #[arg(long)]
        failed: bool,
    },

    /// Manage docs-server redirects
    Redirect {
        #[command(subcommand)]
        action: RedirectAction,
    },

    /// Show recent build trigger log entries
    Logs {
        /// Maximum number of entries to show
        #[arg(short, long, default_value = "40")]
        limit: u32,
    },
}

#[derive(Subcommand)]
enum RedirectAction {
    /// Add a redirect
    Add {
        /// Source path, e.g. /p/acme/docs-demo/main
        #[arg(long)]
        source: String,

        /// Target path the source redirects to
        #[arg(long)]
        target: String,

        /// HTTP status code (301, 302, 303 or 307; default 303)
        #[arg(long)]
        status_code: Option<u16>,
    },

    /// List all redirects
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    docbay_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Scan {
            repository_url,
            all,
        } => {
            let registry = connect_registry().await?;
            let orchestrator = build_orchestrator(registry);
            cmd_scan(&orchestrator, repository_url.as_deref(), all, cli.json).await
        }
        Commands::Retrigger { build_key } => {
            let builds = BambooClient::from_env();
            cmd_retrigger(&builds, &build_key).await
        }
        Commands::BuildDone { build_key, failed } => {
            let registry = connect_registry().await?;
            let orchestrator = build_orchestrator(registry);
            cmd_build_done(&orchestrator, &build_key, failed).await
        }
        Commands::Redirect { action } => {
            let registry = connect_registry().await?;
            let store = registry.redirect_store();
            match action {
                RedirectAction::Add {
                    source,
                    target,
                    status_code,
                } => cmd_redirect_add(&store, &source, &target, status_code).await,
                RedirectAction::List => cmd_redirect_list(&store, cli.json).await,
            }
        }
        Commands::Logs { limit } => {
            let logs = GraylogClient::from_env();
            cmd_logs(&logs, limit, cli.json).await
        }
    }
}

async fn connect_registry() -> Result<Arc<SurrealDocsRegistry>> {
    let registry = SurrealDocsRegistry::from_env()
        .await
        .context("Failed to connect to docbay registry")?;
    Ok(Arc::new(registry))
}

/// Wire the orchestrator with env-configured collaborator clients.
fn build_orchestrator(registry: Arc<SurrealDocsRegistry>) -> DocsOrchestrator<SurrealDocsRegistry> {
    DocsOrchestrator::new(
        registry,
        Arc::new(HttpManifestFetcher::new()),
        Arc::new(GitBranchLister::new()),
        Arc::new(BambooClient::from_env()),
        Arc::new(SlackClient::from_env()),
        orchestrator_config(),
    )
}

fn orchestrator_config() -> OrchestratorConfig {
    let mut config = OrchestratorConfig::default();
    if let Ok(root) = std::env::var("DOCBAY_WORKSPACE_ROOT") {
        config.workspace_root = PathBuf::from(root);
    }
    config
}

/// Re-scan one repository, or every known one
async fn cmd_scan<R: DocsRegistry>(
    orchestrator: &DocsOrchestrator<R>,
    repository_url: Option<&str>,
    all: bool,
    json: bool,
) -> Result<()> {
    let report = if all {
        orchestrator.rescan_all().await?
    } else {
        let url = repository_url.context("pass --repository-url <url> or --all")?;
        orchestrator.rescan_repository(url).await?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }

    Ok(())
}

/// Re-queue a failed build
async fn cmd_retrigger(builds: &dyn BuildTrigger, build_key: &str) -> Result<()> {
    let triggered = builds
        .retrigger(build_key)
        .await
        .context(format!("Failed to re-queue build {}", build_key))?;

    println!("Re-queued build: {}", triggered.build_result_key);
    Ok(())
}

/// Record a build outcome reported by the build system
async fn cmd_build_done<R: DocsRegistry>(
    orchestrator: &DocsOrchestrator<R>,
    build_key: &str,
    failed: bool,
) -> Result<()> {
    let outcome = if failed { "failure" } else { "success" };

    match orchestrator.record_build_outcome(build_key, !failed).await? {
        Some(record) => {
            println!(
                "Recorded {} for {} ({} -> {})",
                outcome, build_key, record.package_name, record.target_branch_directory
            );
        }
        None => {
            println!("No registry row carries build key '{}'", build_key);
        }
    }

    Ok(())
}

/// Add a docs-server redirect
async fn cmd_redirect_add(
    store: &dyn RedirectStore,
    source: &str,
    target: &str,
    status_code: Option<u16>,
) -> Result<()> {
    let redirect = match status_code {
        Some(code) => Redirect::with_status_code(source, target, code)?,
        None => Redirect::new(source, target),
    };

    let saved = store.persist(redirect).await?;
    println!(
        "Added redirect {} -> {} ({})",
        saved.source,
        saved.target,
        saved.status_code()
    );
    Ok(())
}

/// List all docs-server redirects
async fn cmd_redirect_list(store: &dyn RedirectStore, json: bool) -> Result<()> {
    let redirects = store.list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&redirects)?);
        return Ok(());
    }

    if redirects.is_empty() {
        println!("No redirects configured.");
        return Ok(());
    }

    for redirect in redirects {
        println!(
            "{} {} -> {}",
            redirect.status_code(),
            redirect.source,
            redirect.target
        );
    }

    Ok(())
}

/// Show recent build trigger log entries from the central log store
async fn cmd_logs(logs: &GraylogClient, limit: u32, json: bool) -> Result<()> {
    let entries = logs.recent_build_triggers(limit).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No recent build trigger log entries.");
        return Ok(());
    }

    for entry in entries {
        println!("{} {} {}", entry.timestamp, entry.source, entry.message);
    }

    Ok(())
}
