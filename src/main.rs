//! gtd - aggregated task reports.
//!
//! Runs the configured report extensions in parallel and renders their
//! merged output.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gtd::core::{
    generate_aggregate_report_with, run_extension, Config, ExtensionContext, ExtensionId,
    Isolation, IsolationMode, ParallelExecutor, ProcessRunner,
};
use gtd::render::{render, OutputFormat};
use gtd::{discover_extensions, APP_NAME};

/// Aggregated task reports from Jira, Trello and local sources
#[derive(Parser)]
#[command(name = "gtd")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the aggregated report (default)
    Report {
        /// Output format (html, json, text)
        #[arg(short, long, default_value = "html")]
        format: OutputFormat,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum number of extensions running at once
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// List the extensions enabled by the current config
    Extensions {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ListFormat::Text)]
        format: ListFormat,
    },

    /// Show configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },

    /// Run a single extension and print its elements as JSON
    #[command(name = RUN_EXTENSION, hide = true)]
    RunExtension {
        /// Extension identifier
        id: String,
    },
}

/// Subcommand the report runs in each child process.
const RUN_EXTENSION: &str = "run-extension";

/// Output format of the extension listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ListFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging; stdout carries the report
    let filter = if cli.verbose { EnvFilter::new("debug") } else { EnvFilter::new("warn") };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();

    match cli.command {
        None => {
            cmd_report(OutputFormat::default(), None, None)?;
        }
        Some(Commands::Report { format, output, workers }) => {
            cmd_report(format, output, workers)?;
        }
        Some(Commands::Extensions { format }) => {
            cmd_extensions(format)?;
        }
        Some(Commands::Config { path }) => {
            cmd_config(path)?;
        }
        Some(Commands::Completions { shell }) => {
            cmd_completions(shell);
        }
        Some(Commands::RunExtension { id }) => {
            cmd_run_extension(&id)?;
        }
    }

    Ok(())
}

/// Generate the report.
fn cmd_report(format: OutputFormat, output: Option<PathBuf>, workers: Option<usize>) -> Result<()> {
    let config = Config::load()?;
    let title = config.report.title.clone();

    let registry = discover_extensions(&config);
    if registry.is_empty() {
        tracing::warn!("No extensions enabled; the report will be empty");
    }

    let mut executor =
        ParallelExecutor::new().max_workers(workers.unwrap_or(config.report.max_workers));
    if config.report.isolation == IsolationMode::Process {
        let exe = std::env::current_exe().context("Failed to locate the gtd executable")?;
        let runner = ProcessRunner::new(exe).arg(RUN_EXTENSION);
        executor = executor.isolation(Isolation::Process(runner));
    }
    let ctx = ExtensionContext::new(config);

    let elements = generate_aggregate_report_with(&executor, &registry, &ctx)?;
    let rendered = render(format, &title, &elements)?;

    match output {
        Some(path) => {
            fs::write(&path, rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            tracing::info!(path = %path.display(), "Report written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

/// List enabled extensions.
fn cmd_extensions(format: ListFormat) -> Result<()> {
    let config = Config::load()?;
    let registry = discover_extensions(&config);

    match format {
        ListFormat::Json => {
            let entries: Vec<serde_json::Value> = registry
                .iter()
                .map(|(id, ext)| {
                    serde_json::json!({ "name": id.as_str(), "description": ext.description() })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        ListFormat::Text => {
            for (id, ext) in registry.iter() {
                println!("{id} - {}", ext.description());
            }
            println!("\nTotal: {} extensions", registry.len());
        }
    }

    Ok(())
}

/// Run one extension in this process; used by process isolation.
fn cmd_run_extension(id: &str) -> Result<()> {
    let config = Config::load()?;
    let registry = discover_extensions(&config);
    let id = ExtensionId::new(id);
    let extension = registry.get(&id).with_context(|| format!("Unknown extension '{id}'"))?;

    let ctx = ExtensionContext::new(config);
    let report = run_extension(&id, extension.as_ref(), &ctx);

    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, report.elements())?;
    stdout.flush()?;
    Ok(())
}

/// Generate shell completions.
fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, APP_NAME, &mut io::stdout());
}

/// Show configuration.
fn cmd_config(show_path: bool) -> Result<()> {
    if show_path {
        if let Some(path) = Config::config_dir() {
            println!("{}", path.display());
        }
        return Ok(());
    }

    let config = Config::load()?;
    let toml = toml::to_string_pretty(&config.redacted())?;
    println!("{toml}");

    Ok(())
}
