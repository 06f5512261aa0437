//! The `banana config` command for configuration management.

use super::interactive::theme::banana_theme;
use banana_core::Config;
use clap::{Args, Subcommand};
use console::Style;
use dialoguer::Password;
use std::path::Path;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,

    /// Show config file path
    Path,

    /// Initialize a new config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Store a Gemini API key in the config file
    SetKey {
        /// The key; prompted for (hidden input) when omitted
        key: Option<String>,
    },
}

/// Execute the config command.
pub async fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let config = Config::load()?;
            let toml = config.to_toml()?;
            println!("{}", toml);
        }

        ConfigCommand::Path => {
            let path = Config::default_path();
            println!("{}", path.display());
        }

        ConfigCommand::Init { force } => {
            let path = Config::default_path();

            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let config = Config::default();
            let toml = config.to_toml()?;
            std::fs::write(&path, toml)?;

            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }

        ConfigCommand::SetKey { key } => {
            let key = match key {
                Some(key) => key,
                None => Password::with_theme(&banana_theme())
                    .with_prompt("Gemini API key")
                    .interact()?,
            };
            let key = key.trim();
            if key.is_empty() {
                anyhow::bail!("API key must not be empty");
            }
            save_key_to_config(key)?;
        }
    }

    Ok(())
}

/// Save an API key to the config file, preserving existing comments.
pub(crate) fn save_key_to_config(key: &str) -> anyhow::Result<()> {
    let config_path = Config::default_path();
    write_key(&config_path, key)?;

    let dim = Style::new().for_stderr().dim();
    eprintln!(
        "  {}",
        dim.apply_to(format!("Key saved to {}", config_path.display()))
    );
    Ok(())
}

/// Set `[gemini] api_key` in the file at `path`, creating it if needed.
fn write_key(path: &Path, key: &str) -> anyhow::Result<()> {
    let content = if path.exists() {
        std::fs::read_to_string(path)?
    } else {
        String::new()
    };

    let updated = set_key_in_document(&content, key)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, updated)?;
    tracing::debug!("Wrote API key to {}", path.display());
    Ok(())
}

fn set_key_in_document(content: &str, key: &str) -> anyhow::Result<String> {
    let mut doc: toml_edit::DocumentMut = content.parse()?;

    if !doc.contains_key("gemini") {
        doc["gemini"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    if !doc["gemini"].is_table_like() {
        anyhow::bail!("`gemini` in the config file is not a table");
    }
    doc["gemini"]["api_key"] = toml_edit::value(key);

    Ok(doc.to_string())
}
