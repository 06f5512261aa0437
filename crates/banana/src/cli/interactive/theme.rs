//! Look and feel of interactive mode: one accent colour shared by the
//! prompts and the start-up header.

use console::{style, Style, StyledObject};
use dialoguer::theme::ColorfulTheme;

const TAGLINE: &str = "describe it, and it appears";

fn accent() -> Style {
    Style::new().for_stderr().yellow()
}

fn marker(symbol: &str) -> StyledObject<String> {
    style(symbol.to_string()).for_stderr()
}

/// Prompt theme: yellow prompts and selection, green answers, red errors.
pub fn banana_theme() -> ColorfulTheme {
    let defaults = ColorfulTheme::default();
    ColorfulTheme {
        prompt_prefix: marker("◆").yellow(),
        active_item_prefix: marker("›").yellow(),
        active_item_style: accent().bold(),
        inactive_item_prefix: marker(" "),
        success_prefix: marker("✓").green(),
        error_prefix: marker("✗").red(),
        values_style: Style::new().for_stderr().green(),
        hint_style: Style::new().for_stderr().dim(),
        ..defaults
    }
}

/// Header text, one entry per line.
fn header_lines() -> Vec<String> {
    let title = format!("Banana Vision {}", banana_core::VERSION);
    let width = title.chars().count().max(TAGLINE.chars().count());
    vec![title, TAGLINE.to_string(), "─".repeat(width)]
}

/// Prints the start-up header to stderr so stdout stays clean for piped output.
pub fn print_banner() {
    let lines = header_lines();
    eprintln!();
    for (i, line) in lines.iter().enumerate() {
        let styled = match i {
            0 => accent().bold().apply_to(line),
            1 => Style::new().for_stderr().italic().apply_to(line),
            _ => Style::new().for_stderr().dim().apply_to(line),
        };
        eprintln!("  {styled}");
    }
    eprintln!();
}
