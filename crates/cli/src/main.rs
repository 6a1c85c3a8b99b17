//! Docent CLI — the main entry point.
//!
//! Commands:
//! - `chat`          — Interactive grounded chat, or a single message
//! - `corpus build`  — Embed source records into a corpus file
//! - `corpus check`  — Validate a corpus file and its content hashes
//! - `config`        — Show, locate, or initialize the configuration

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use docent_config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "docent",
    about = "Docent — a chat assistant grounded in your own corpus",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.docent/config.toml)
    #[arg(short, long, global = true, env = "DOCENT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant
    Chat {
        /// Corpus file to ground answers in
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Corpus positions eligible for context (0-20)
        #[arg(long)]
        context_limit: Option<usize>,

        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Build or check corpus files
    Corpus {
        #[command(subcommand)]
        action: CorpusAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum CorpusAction {
    /// Embed a JSON array of {name, text} records into a corpus file
    Build {
        /// Source records
        #[arg(short, long)]
        input: PathBuf,

        /// Corpus file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Texts sent per embedding request
        #[arg(long, default_value_t = 16)]
        batch_size: usize,
    },

    /// Validate a corpus file and verify its content hashes
    Check {
        /// Corpus file to check
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Write a default config file if none exists
    Init,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so replies on stdout stay clean
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", error_line(e.as_ref()));
            ExitCode::FAILURE
        }
    }
}

/// Errors reach the terminal as a single `Error: ...` line.
fn error_line(err: &dyn std::error::Error) -> String {
    format!("Error: {err}")
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = cli
        .config
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));

    match cli.command {
        Commands::Chat {
            corpus,
            context_limit,
            message,
        } => {
            let config = commands::load_config(&config_path, corpus, context_limit)?;
            commands::chat::run(config, message).await?
        }
        Commands::Corpus { action } => match action {
            CorpusAction::Build {
                input,
                output,
                batch_size,
            } => {
                let config = commands::load_config(&config_path, None, None)?;
                commands::corpus::build(&config, &input, &output, batch_size).await?
            }
            CorpusAction::Check { path } => commands::corpus::check(&path)?,
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(&config_path)?,
            ConfigAction::Path => commands::config_cmd::path(&config_path),
            ConfigAction::Init => commands::config_cmd::init(&config_path)?,
        },
    }

    Ok(())
}
