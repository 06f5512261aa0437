//! API key detection, input, and optional persistence.

use crate::cli::config::save_key_to_config;
use banana_core::config::FALLBACK_API_KEY_VAR;
use banana_core::Config;
use console::Style;
use dialoguer::{Password, Select};

use super::theme::banana_theme;

/// Environment variable the default config points `api_key` at.
const GEMINI_KEY_VAR: &str = "GEMINI_API_KEY";

/// Make sure a key is available before the first request.
///
/// Returns a key entered during this session, or `None` when one is
/// already configured or the user chose to continue without.
pub fn ensure_api_key(config: &Config) -> anyhow::Result<Option<String>> {
    if config.api_key().is_some() {
        return Ok(None);
    }

    let theme = banana_theme();
    let dim = Style::new().for_stderr().dim();
    let warn = Style::new().for_stderr().yellow();

    eprintln!("  {}", warn.apply_to(missing_key_notice(config)));

    let key = match Password::with_theme(&theme)
        .with_prompt("Enter your Gemini API key (leave empty to skip)")
        .allow_empty_password(true)
        .interact()
    {
        Ok(k) if !k.trim().is_empty() => k.trim().to_string(),
        _ => {
            eprintln!(
                "  {}",
                dim.apply_to("Continuing without a key; requests will be rejected.")
            );
            return Ok(None);
        }
    };

    let save_options = &["Yes, save to config file", "No, use for this session only"];
    let save_choice = Select::with_theme(&theme)
        .with_prompt("Save this key for future sessions?")
        .items(save_options)
        .default(0)
        .interact_opt()?;

    if save_choice == Some(0) {
        if let Err(e) = save_key_to_config(&key) {
            eprintln!(
                "  {}",
                warn.apply_to(format!("Could not save to config: {e}"))
            );
            eprintln!("  Using key for this session only.");
        }
    }

    Ok(Some(key))
}

/// Explain where a key would have come from.
fn missing_key_notice(config: &Config) -> String {
    let configured = config.gemini.api_key.trim();
    if let Some(var) = configured
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
    {
        format!("{var} and {FALLBACK_API_KEY_VAR} are not set.")
    } else if configured.is_empty() {
        format!("No API key in config; {GEMINI_KEY_VAR} and {FALLBACK_API_KEY_VAR} are not set.")
    } else {
        "No usable API key found.".to_string()
    }
}
