//! Docsweep CLI
//!
//! Search a document store and delete the matches in batches

mod config;
mod render;
mod session;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use config::DocsweepConfig;
use docsweep_core::{Invocation, SearchRequest, StatusLevel, SweepController, TypeChoice};
use docsweep_egress::HttpDocumentStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "docsweep")]
#[command(about = "Docsweep - Find and bulk-delete documents in a content store", long_about = None)]
struct Cli {
    /// Path to a YAML or TOML config file
    #[arg(long, global = true, env = "DOCSWEEP_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the searchable document types
    Types,
    /// Search and print the matching documents
    Search(SearchArgs),
    /// Search, then delete every match in batches
    Delete {
        #[command(flatten)]
        search: SearchArgs,

        /// Count what would be deleted without writing
        #[arg(long)]
        preview: bool,

        /// Documents per delete transaction
        #[arg(long)]
        batch_size: Option<usize>,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Search, select and delete from a command prompt
    Interactive,
}

#[derive(Args)]
struct SearchArgs {
    /// Document type to search, or `all`
    #[arg(long = "type", default_value = "all")]
    doc_type: String,

    /// Text to match against title, name, slug and id
    #[arg(long, required_unless_present = "query")]
    term: Option<String>,

    /// Custom GROQ query, sent as-is
    #[arg(long, conflicts_with_all = ["term", "doc_type"])]
    query: Option<String>,

    /// Maximum number of results
    #[arg(long)]
    limit: Option<usize>,
}

impl SearchArgs {
    fn request(&self) -> SearchRequest {
        match &self.query {
            Some(query) => SearchRequest::custom(query),
            None => SearchRequest::term(
                TypeChoice::parse(&self.doc_type),
                self.term.clone().unwrap_or_default(),
            ),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            // Expand tilde in path
            let path = shellexpand::tilde(&path.to_string_lossy()).to_string();
            DocsweepConfig::from_file(&path)?
        }
        None => DocsweepConfig::default(),
    };
    config.merge_env();
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }

    init_tracing(&config.logging.level)?;

    match cli.command {
        Commands::Types => {
            let controller = build_controller(config)?;
            let types = controller.load_types().await;
            fail_on_error_status(&controller).await?;
            print!("{}", render::types(&types));
        }
        Commands::Search(args) => {
            if let Some(limit) = args.limit {
                config.sweep = config.sweep.with_result_cap(limit)?;
            }
            let controller = build_controller(config)?;
            run_search(&controller, &args).await?;
            let state = controller.snapshot().await;
            print!("{}", render::results(&state));
        }
        Commands::Delete {
            search,
            preview,
            batch_size,
            yes,
        } => {
            if let Some(limit) = search.limit {
                config.sweep = config.sweep.with_result_cap(limit)?;
            }
            if let Some(batch_size) = batch_size {
                config.sweep = config.sweep.with_batch_size(batch_size)?;
            }
            if preview {
                config.sweep = config.sweep.with_preview_only(true);
            }

            let controller = build_controller(config)?;
            run_search(&controller, &search).await?;
            controller.select_all().await;

            let Some(plan) = controller.pending_delete().await else {
                println!("Nothing to delete");
                return Ok(());
            };
            print!("{}", render::results(&controller.snapshot().await));

            if !yes {
                let stdin = std::io::stdin();
                let confirmed = session::confirm(
                    &mut stdin.lock(),
                    &mut std::io::stdout(),
                    &render::confirm_prompt(&plan),
                )?;
                if !confirmed {
                    println!("Cancelled");
                    return Ok(());
                }
            }

            match controller.delete_selected().await {
                Invocation::Completed(outcome) => {
                    print!("{}", render::outcome(&outcome, plan.preview));
                    if !outcome.errors.is_empty() {
                        bail!("{} of {} batches failed", outcome.errors.len(), plan.chunk_count());
                    }
                }
                Invocation::Rejected(rejection) => bail!(render::rejection(rejection)),
                Invocation::Failed => {
                    fail_on_error_status(&controller).await?;
                    bail!("Delete run failed");
                }
            }
        }
        Commands::Interactive => {
            let controller = build_controller(config)?;
            let stdin = std::io::stdin();
            session::Session::new(&controller, stdin.lock(), std::io::stdout())
                .run()
                .await?;
        }
    }

    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    let log_level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Keep connection-level noise out of debug output
    let mut filter = EnvFilter::new(format!("{}", log_level));
    for directive in ["hyper_util=warn", "reqwest=warn"] {
        match directive.parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => tracing::warn!("Failed to set log filter {}: {}", directive, e),
        }
    }

    // Logs go to stderr so results on stdout stay pipeable
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;
    Ok(())
}

fn build_controller(config: DocsweepConfig) -> Result<SweepController> {
    let store = HttpDocumentStore::new(config.store.to_http_config())
        .context("Failed to set up the document store")?;
    info!(
        project = %config.store.project_id,
        dataset = %config.store.dataset,
        preview = config.sweep.preview_only,
        "Connected store"
    );
    Ok(SweepController::new(Arc::new(store), config.sweep))
}

/// Load types, then run one search; any refusal or failure becomes an error
async fn run_search(controller: &SweepController, args: &SearchArgs) -> Result<usize> {
    controller.load_types().await;
    fail_on_error_status(controller).await?;

    match controller.search(&args.request()).await {
        Invocation::Completed(count) => Ok(count),
        Invocation::Rejected(rejection) => Err(anyhow!(render::rejection(rejection))),
        Invocation::Failed => {
            fail_on_error_status(controller).await?;
            bail!("Search failed")
        }
    }
}

async fn fail_on_error_status(controller: &SweepController) -> Result<()> {
    let state = controller.snapshot().await;
    match state.status() {
        Some(status) if status.level == StatusLevel::Error => bail!("{}", status.text),
        _ => Ok(()),
    }
}
