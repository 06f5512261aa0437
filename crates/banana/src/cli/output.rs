//! Terminal feedback shared by the flag-based and interactive commands:
//! the in-flight spinner, notification printing, and saving results.

use banana_core::{Config, GeneratedImage, OrchestratorState, Toast, ToastKind, ToastQueue};
use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Create the spinner shown while a request is in flight.
pub fn create_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.yellow} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Some(message) = state_message(&OrchestratorState::default()) {
        pb.set_message(message);
    }
    pb
}

/// Spinner text for an orchestrator state, or `None` to leave it unchanged.
pub fn state_message(state: &OrchestratorState) -> Option<String> {
    match state {
        OrchestratorState::Idle => Some("Preparing request...".to_string()),
        OrchestratorState::Sending { attempt: 1 } => Some("Creating your image...".to_string()),
        OrchestratorState::Sending { attempt } => Some(format!("Attempt {attempt}...")),
        OrchestratorState::Waiting { delay, remaining } => Some(format!(
            "Service busy, retrying in {}s ({remaining} {} left)",
            delay.as_secs(),
            if *remaining == 1 { "retry" } else { "retries" }
        )),
        OrchestratorState::Succeeded
        | OrchestratorState::Failed { .. } => None,
    }
}

/// Print a notification to stderr with a coloured marker.
pub fn print_toast(toast: &Toast) {
    let (marker, style) = match toast.kind {
        ToastKind::Success => ("✓", Style::new().for_stderr().green()),
        ToastKind::Error => ("✗", Style::new().for_stderr().red()),
        ToastKind::Info => ("•", Style::new().for_stderr().cyan()),
    };
    eprintln!("  {} {}", style.apply_to(marker), toast.message);
}

/// Print every live notification once, then dismiss it.
pub fn flush_toasts(queue: &mut ToastQueue) -> usize {
    queue.expire();
    let live: Vec<Toast> = queue.active().cloned().collect();
    for toast in &live {
        print_toast(toast);
        queue.dismiss(toast.id);
    }
    live.len()
}

/// Where a result is written: the explicit path, or `<output dir>/<prefix>-<millis>.<ext>`.
pub fn output_path(image: &GeneratedImage, explicit: Option<&Path>, config: &Config) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => config
            .output_dir()
            .join(image.file_name(&config.output.file_prefix)),
    }
}

/// Decode and write a result, creating parent directories as needed.
pub fn save_result(
    image: &GeneratedImage,
    explicit: Option<&Path>,
    config: &Config,
) -> anyhow::Result<PathBuf> {
    let path = output_path(image, explicit, config);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    image.artifact.save(&path)?;
    tracing::info!("Saved image to {}", path.display());
    Ok(path)
}
