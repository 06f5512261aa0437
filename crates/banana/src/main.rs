//! Banana Vision CLI - generate and edit images from natural-language prompts.
//!
//! Text-to-image and instruction-based editing through a hosted image model,
//! with automatic retries when the service is rate limited or overloaded.
//!
//! # Usage
//!
//! ```bash
//! # Generate a new image
//! banana generate "A cozy cabin in snowy mountains, oil painting"
//!
//! # Edit an existing image
//! banana edit photo.jpg "Add sunglasses" --output edited.png
//!
//! # View configuration
//! banana config show
//!
//! # Guided mode
//! banana
//! ```

use clap::{Parser, Subcommand};
use std::io::IsTerminal;

mod cli;
mod logging;

/// Banana Vision - generate and edit images from natural-language prompts.
#[derive(Parser, Debug)]
#[command(name = "banana")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new image from a text prompt
    Generate(cli::generate::GenerateArgs),

    /// Edit an existing image with a natural-language instruction
    Edit(cli::generate::EditArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match banana_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `banana config path`."
            );
            banana_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Banana Vision v{}", banana_core::VERSION);

    match cli.command {
        Some(Commands::Generate(args)) => cli::generate::execute_generate(args, &config).await,
        Some(Commands::Edit(args)) => cli::generate::execute_edit(args, &config).await,
        Some(Commands::Config(args)) => cli::config::execute(args).await,
        None if std::io::stdin().is_terminal() && std::io::stderr().is_terminal() => {
            cli::interactive::run(&config).await
        }
        None => {
            anyhow::bail!("No command given. Run `banana --help` for usage.")
        }
    }
}
