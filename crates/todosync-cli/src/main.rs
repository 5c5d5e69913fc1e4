//! todosync CLI
//!
//! Command-line caller for the todosync core: read, upsert and clear the
//! todo list of a context.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use todosync_core::{Config, ContextId, SqliteTodoStore, TodoError, TodoSyncService};

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "todosync")]
#[command(about = "todosync - context-scoped todo lists")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Context the list belongs to (omit for the default list)
    #[arg(short, long, global = true)]
    context: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the todo list (created on first access)
    #[command(alias = "ls")]
    Read,
    /// Add or update items; items not mentioned are kept
    Write {
        /// Item as <id>:<content> or <id>:<status>:<priority>:<content>
        #[arg(short, long)]
        item: Vec<String>,
        /// Non-empty JSON array of items ("-" reads stdin)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Remove every item from the list
    Clear,
    /// Show storage status
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, log_level, busy_timeout_ms)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands don't need the store
    if let Commands::Config { command } = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(config_path, &output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, config_path, &output)
            }
        };
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    let store = SqliteTodoStore::open(&config).map_err(|e| {
        let hint = e.recovery_suggestion();
        let err = anyhow::Error::new(e);
        match hint {
            Some(hint) => err.context(hint),
            None => err,
        }
    })?;
    let service = TodoSyncService::new(Arc::new(store.clone()));
    let context = cli.context.map(ContextId::from);
    debug!("Running with context {:?}", context);

    let result = match cli.command {
        Commands::Read => commands::todo::read(&service, context.as_ref(), &output).await,
        Commands::Write { item, file } => {
            commands::todo::write(&service, context.as_ref(), item, file.as_deref(), &output)
                .await
        }
        Commands::Clear => commands::todo::clear(&service, context.as_ref(), &output).await,
        Commands::Status => commands::status::show(&config, &store, &output).await,
        Commands::Config { .. } => unreachable!(), // Handled above
    };

    if let Err(ref e) = result {
        if let Some(todo_err) = e.downcast_ref::<TodoError>() {
            if todo_err.is_retryable() && output.format != OutputFormat::Quiet {
                eprintln!("⚠ This error is transient; retrying the command may succeed.");
            }
        }
    }

    result
}

/// Send tracing output to stderr so stdout stays parseable
///
/// RUST_LOG wins over the configured level.
fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "todosync_core={level},todosync_cli={level}",
            level = config.log_level
        ))
    });

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .try_init();
}
