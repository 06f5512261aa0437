//! Interactive CLI mode: guided experience for bare `banana` invocation.
//!
//! When `banana` is invoked with no subcommand on a TTY, this module provides
//! a menu-driven interface over the same session and orchestrator as the
//! flag-based commands. One session lives for the whole run.

pub mod setup;
pub mod studio;
pub mod theme;

use crate::cli::generate::build_orchestrator;
use banana_core::{Config, Mode, RetryPolicy, Session};
use console::Style;
use dialoguer::Select;
use std::time::Duration;

/// Convert a dialoguer result into `Ok(Some(value))` on success, `Ok(None)` on
/// interrupt (Ctrl+C / terminal disconnect), and `Err` for other I/O failures.
///
/// Use this to wrap `interact_text()` / `interact()` calls that lack an `_opt`
/// variant, so interrupts exit the current flow cleanly instead of panicking.
fn handle_interrupt<T>(result: dialoguer::Result<T>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(dialoguer::Error::IO(e)) if e.kind() == std::io::ErrorKind::Interrupted => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Main menu options presented to the user.
const MENU_ITEMS: &[&str] = &["Generate an image", "Edit an image", "Settings", "Exit"];

/// Entry point for interactive mode.
pub async fn run(config: &Config) -> anyhow::Result<()> {
    theme::print_banner();

    let theme = theme::banana_theme();
    let session_key = setup::ensure_api_key(config)?;
    let orchestrator = build_orchestrator(config, session_key.as_deref(), None)?;
    let mut session = Session::new(Duration::from_millis(config.ui.toast_ttl_ms));

    loop {
        let selection = Select::with_theme(&theme)
            .with_prompt("What would you like to do?")
            .items(MENU_ITEMS)
            .default(menu_default(session.mode()))
            .interact_opt()?;

        match selection {
            Some(0) => {
                studio::guided_request(&mut session, &orchestrator, config, Mode::Generate)
                    .await?
            }
            Some(1) => {
                studio::guided_request(&mut session, &orchestrator, config, Mode::Edit).await?
            }
            Some(2) => show_config(config, session_key.is_some())?,
            Some(3) | None => break,
            _ => unreachable!(),
        }
    }

    Ok(())
}

fn menu_default(mode: Mode) -> usize {
    match mode {
        Mode::Generate => 0,
        Mode::Edit => 1,
    }
}

/// Shows a summary of current settings and offers to display the full TOML,
/// the config file path, or store a new key.
fn show_config(config: &Config, session_key: bool) -> anyhow::Result<()> {
    let theme = theme::banana_theme();
    let dim = Style::new().for_stderr().dim();
    let yellow = Style::new().for_stderr().yellow();
    let label = Style::new().for_stderr().bold();

    loop {
        eprintln!();
        eprintln!("  {}", yellow.apply_to("Current configuration:"));
        eprintln!();

        let config_path = Config::default_path();
        let path_note = if config_path.exists() {
            "(exists)"
        } else {
            "(using defaults)"
        };

        eprintln!(
            "    {:<20} {} {}",
            label.apply_to("Config file:"),
            config_path.display(),
            dim.apply_to(path_note)
        );
        eprintln!(
            "    {:<20} {}",
            label.apply_to("Model:"),
            config.gemini.model
        );
        eprintln!(
            "    {:<20} {}",
            label.apply_to("API key:"),
            key_summary(config, session_key)
        );
        eprintln!(
            "    {:<20} {}",
            label.apply_to("Retries:"),
            retry_summary(&RetryPolicy::from(&config.retry))
        );
        eprintln!(
            "    {:<20} {}",
            label.apply_to("Output dir:"),
            config.output_dir().display()
        );
        eprintln!(
            "    {:<20} {}",
            label.apply_to("Log level:"),
            config.logging.level
        );
        eprintln!();

        let items = &[
            "View full config (TOML)",
            "Show config file path",
            "Set API key",
            "Back",
        ];

        let selection = Select::with_theme(&theme)
            .with_prompt("Settings")
            .items(items)
            .default(0)
            .interact_opt()?;

        match selection {
            Some(0) => match config.to_toml() {
                Ok(toml) => {
                    eprintln!();
                    eprintln!("{}", dim.apply_to("─".repeat(50)));
                    eprintln!("{toml}");
                    eprintln!("{}", dim.apply_to("─".repeat(50)));
                    eprintln!();
                }
                Err(e) => {
                    let err = Style::new().for_stderr().red();
                    eprintln!("  {} Failed to serialize config: {e}", err.apply_to("✗"));
                    eprintln!();
                }
            },
            Some(1) => {
                eprintln!();
                eprintln!("  {}", Config::default_path().display());
                eprintln!();
            }
            Some(2) => {
                let Some(key) = handle_interrupt(
                    dialoguer::Password::with_theme(&theme)
                        .with_prompt("Gemini API key")
                        .interact(),
                )?
                else {
                    continue;
                };
                if key.trim().is_empty() {
                    continue;
                }
                crate::cli::config::save_key_to_config(key.trim())?;
                eprintln!(
                    "  {}",
                    dim.apply_to("The new key is used from the next start.")
                );
            }
            Some(3) | None => break,
            _ => unreachable!(),
        }
    }

    Ok(())
}

/// Retry budget and the waits it implies, e.g. `2 (waits 5s, 10s)`.
fn retry_summary(policy: &RetryPolicy) -> String {
    if policy.max_retries == 0 {
        return "disabled".to_string();
    }
    let waits: Vec<String> = policy
        .delays()
        .map(|d| format!("{}s", d.as_secs_f64()))
        .collect();
    format!("{} (waits {})", policy.max_retries, waits.join(", "))
}

/// Where the active API key comes from, without revealing it.
fn key_summary(config: &Config, session_key: bool) -> &'static str {
    if session_key {
        "entered for this session"
    } else if config.api_key().is_some() {
        "configured"
    } else {
        "missing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_default_follows_mode() {
        assert_eq!(MENU_ITEMS[menu_default(Mode::Generate)], "Generate an image");
        assert_eq!(MENU_ITEMS[menu_default(Mode::Edit)], "Edit an image");
    }

    #[test]
    fn retry_summary_lists_waits() {
        assert_eq!(
            retry_summary(&RetryPolicy::default()),
            "5 (waits 5s, 10s, 20s, 40s, 80s)"
        );
        let short = RetryPolicy {
            max_retries: 2,
            initial_delay: Duration::from_millis(1500),
        };
        assert_eq!(retry_summary(&short), "2 (waits 1.5s, 3s)");
        assert_eq!(retry_summary(&RetryPolicy::none()), "disabled");
    }

    #[test]
    fn key_summary_prefers_session_key() {
        let mut config = Config::default();
        config.gemini.api_key = "literal".to_string();
        assert_eq!(key_summary(&config, true), "entered for this session");
        assert_eq!(key_summary(&config, false), "configured");
    }

    #[test]
    fn handle_interrupt_maps_interrupted_to_none() {
        let interrupted: dialoguer::Result<u8> = Err(dialoguer::Error::IO(std::io::Error::new(
            std::io::ErrorKind::Interrupted,
            "ctrl-c",
        )));
        assert!(handle_interrupt(interrupted).unwrap().is_none());
        assert_eq!(handle_interrupt(Ok(3u8)).unwrap(), Some(3));

        let other: dialoguer::Result<u8> = Err(dialoguer::Error::IO(std::io::Error::other("boom")));
        assert!(handle_interrupt(other).is_err());
    }
}
