//! Guided generate and edit flows.
//!
//! Walks the user through: source image (edit only) → prompt → request →
//! save. The session outlives a single flow, so a loaded source image is
//! offered again on the next edit.

use crate::cli::generate::submit_with_spinner;
use crate::cli::output;
use banana_core::{Config, Mode, Orchestrator, Session, SourceImage, ToastKind};
use console::Style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use std::path::PathBuf;

use super::theme::banana_theme;

const WRITE_OWN: &str = "Write my own...";

/// Run one guided request in `mode`.
pub async fn guided_request(
    session: &mut Session,
    orchestrator: &Orchestrator,
    config: &Config,
    mode: Mode,
) -> anyhow::Result<()> {
    let theme = banana_theme();
    session.set_mode(mode);

    if mode == Mode::Edit && !choose_source_image(session, &theme)? {
        return Ok(());
    }

    let Some(prompt) = choose_prompt(session, &theme)? else {
        return Ok(());
    };
    session.set_prompt(prompt);

    let Ok(Some(image)) = submit_with_spinner(session, orchestrator).await else {
        return Ok(());
    };

    let dim = Style::new().for_stderr().dim();
    eprintln!(
        "  {}",
        dim.apply_to(format!(
            "{} image, {} characters of base64",
            image.artifact.media_type,
            image.artifact.encoded.len()
        ))
    );

    let save = Confirm::with_theme(&theme)
        .with_prompt("Save the image?")
        .default(true)
        .interact_opt()?;
    if save != Some(true) {
        return Ok(());
    }

    let Some(path) = prompt_output_path(&theme, output::output_path(&image, None, config))? else {
        return Ok(());
    };
    let path = output::save_result(&image, Some(&path), config)?;
    session
        .toasts_mut()
        .push(ToastKind::Info, format!("Saved to {}", path.display()));
    output::flush_toasts(session.toasts_mut());

    Ok(())
}

/// Keep or replace the session's source image. Returns false when the user
/// backs out.
fn choose_source_image(session: &mut Session, theme: &ColorfulTheme) -> anyhow::Result<bool> {
    if let Some(current) = session.source_image() {
        let items = [
            format!("Keep current image ({})", current.media_type),
            "Choose a different image".to_string(),
        ];
        match Select::with_theme(theme)
            .with_prompt("Image to edit")
            .items(&items)
            .default(0)
            .interact_opt()?
        {
            Some(0) => return Ok(true),
            Some(_) => session.clear_source_image(),
            None => return Ok(false),
        }
    }

    loop {
        let Some(raw_path) = super::handle_interrupt(
            Input::<String>::with_theme(theme)
                .with_prompt("Path to image (PNG, JPEG, WebP, HEIC, HEIF)")
                .interact_text(),
        )?
        else {
            return Ok(false);
        };

        let path = PathBuf::from(shellexpand::tilde(raw_path.trim()).into_owned());
        let warn = Style::new().for_stderr().yellow();

        if !path.is_file() {
            eprintln!(
                "  {}",
                warn.apply_to(format!("File not found: {}", path.display()))
            );
            continue;
        }

        match SourceImage::from_path(&path) {
            Ok(image) => {
                let dim = Style::new().for_stderr().dim();
                eprintln!(
                    "  {}",
                    dim.apply_to(format!("Loaded {} ({})", path.display(), image.media_type))
                );
                session.set_source_image(image);
                return Ok(true);
            }
            Err(e) => {
                eprintln!("  {}", warn.apply_to(e.to_string()));
            }
        }
    }
}

/// Pick a sample prompt or type one. `None` when the user backs out.
fn choose_prompt(session: &Session, theme: &ColorfulTheme) -> anyhow::Result<Option<String>> {
    let samples = session.mode().sample_prompts();
    let mut items: Vec<&str> = samples.to_vec();
    items.push(WRITE_OWN);

    let label = match session.mode() {
        Mode::Generate => "What should the image show?",
        Mode::Edit => "What should change?",
    };

    let choice = Select::with_theme(theme)
        .with_prompt(label)
        .items(&items)
        .default(items.len() - 1)
        .interact_opt()?;

    match choice {
        Some(i) if i < samples.len() => Ok(Some(samples[i].to_string())),
        Some(_) => {
            let mut input = Input::<String>::with_theme(theme)
                .with_prompt("Prompt")
                .allow_empty(true);
            if !session.prompt().is_empty() {
                input = input.with_initial_text(session.prompt());
            }
            super::handle_interrupt(input.interact_text())
        }
        None => Ok(None),
    }
}

fn prompt_output_path(
    theme: &ColorfulTheme,
    default: PathBuf,
) -> anyhow::Result<Option<PathBuf>> {
    let Some(path) = super::handle_interrupt(
        Input::<String>::with_theme(theme)
            .with_prompt("Output file path")
            .default(default.display().to_string())
            .interact_text(),
    )?
    else {
        return Ok(None);
    };
    Ok(Some(PathBuf::from(shellexpand::tilde(&path).into_owned())))
}
