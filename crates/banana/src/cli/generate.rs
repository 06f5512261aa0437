//! The `banana generate` and `banana edit` commands.

use super::output;
use banana_core::{
    orchestrator_from_config, Config, GeneratedImage, GenerationError, Mode, Orchestrator,
    RetryPolicy, Session, SessionError, SourceImage,
};
use clap::Args;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Arguments for the `generate` command.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Description of the image to create
    pub prompt: String,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for the `edit` command.
#[derive(Args, Debug)]
pub struct EditArgs {
    /// Image to edit: a PNG, JPEG, WebP, HEIC or HEIF file, or a `data:` URL
    pub image: String,

    /// What to change, e.g. "add sunglasses"
    pub instruction: String,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Options shared by both commands.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Output file (default: <output dir>/<prefix>-<timestamp>.<ext>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override the number of retries on rate limiting / overload
    #[arg(long)]
    pub retries: Option<u32>,

    /// API key (overrides config and environment)
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Print a JSON record of the result to stdout
    #[arg(long)]
    pub json: bool,
}

/// Execute the generate command.
pub async fn execute_generate(args: GenerateArgs, config: &Config) -> anyhow::Result<()> {
    let mut session = Session::new(Duration::from_millis(config.ui.toast_ttl_ms));
    session.set_mode(Mode::Generate);
    session.set_prompt(args.prompt);
    run(session, &args.common, config).await
}

/// Execute the edit command.
pub async fn execute_edit(args: EditArgs, config: &Config) -> anyhow::Result<()> {
    let source = load_source(&args.image)?;
    tracing::debug!("Loaded source image as {}", source.media_type);

    let mut session = Session::new(Duration::from_millis(config.ui.toast_ttl_ms));
    session.set_mode(Mode::Edit);
    session.set_source_image(source);
    session.set_prompt(args.instruction);
    run(session, &args.common, config).await
}

/// Read the image to edit from a `data:` URL or a file path.
fn load_source(arg: &str) -> Result<SourceImage, GenerationError> {
    if arg.starts_with("data:") {
        SourceImage::from_data_url(arg)
    } else {
        SourceImage::from_path(Path::new(shellexpand::tilde(arg).as_ref()))
    }
}

/// Build the orchestrator, applying per-invocation overrides.
pub fn build_orchestrator(
    config: &Config,
    api_key: Option<&str>,
    retries: Option<u32>,
) -> anyhow::Result<Orchestrator> {
    let mut config = config.clone();
    if let Some(key) = api_key {
        config.gemini.api_key = key.to_string();
    }
    if let Some(retries) = retries {
        config.retry.max_retries = retries;
    }
    let orchestrator = orchestrator_from_config(&config)?;
    tracing::debug!(policy = ?RetryPolicy::from(&config.retry), "Orchestrator ready");
    Ok(orchestrator)
}

/// Submit the session with a spinner and print the notifications it raised.
///
/// Returns the new result, `None` when the request failed, or the
/// validation error that stopped it from being sent.
pub async fn submit_with_spinner(
    session: &mut Session,
    orchestrator: &Orchestrator,
) -> Result<Option<GeneratedImage>, SessionError> {
    let spinner = output::create_spinner();
    let observer_spinner = spinner.clone();
    let orchestrator = orchestrator.clone().with_observer(move |state| {
        if let Some(message) = output::state_message(state) {
            observer_spinner.set_message(message);
        }
    });

    let submitted = session.submit(&orchestrator).await;
    spinner.finish_and_clear();
    output::flush_toasts(session.toasts_mut());

    submitted?;
    Ok(session.result().cloned())
}

async fn run(mut session: Session, common: &CommonArgs, config: &Config) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(config, common.api_key.as_deref(), common.retries)?;

    let Some(image) = submit_with_spinner(&mut session, &orchestrator).await? else {
        anyhow::bail!("Image request failed");
    };

    let path = output::save_result(&image, common.output.as_deref(), config)?;
    report(&image, &path, common.json)
}

fn report(image: &GeneratedImage, path: &Path, json: bool) -> anyhow::Result<()> {
    if json {
        let bytes = image.artifact.decode()?.len();
        let record = serde_json::json!({
            "path": path,
            "media_type": image.artifact.media_type,
            "prompt": image.prompt,
            "bytes": bytes,
        });
        println!("{}", serde_json::to_string(&record)?);
    } else {
        println!("{}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use banana_core::MediaType;

    #[test]
    fn build_orchestrator_applies_overrides() {
        let config = Config::default();
        let orchestrator = build_orchestrator(&config, Some("cli-key"), Some(1)).unwrap();
        assert_eq!(orchestrator.policy().max_retries, 1);
        assert_eq!(
            orchestrator.policy().initial_delay,
            Duration::from_millis(5000)
        );
    }

    #[test]
    fn load_source_accepts_data_url() {
        let source = load_source("data:image/jpeg;base64,/9j/4AAQ").unwrap();
        assert_eq!(source.media_type, MediaType::Jpeg);
        assert_eq!(source.payload(), "/9j/4AAQ");
    }

    #[test]
    fn load_source_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.png");
        std::fs::write(&path, [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]).unwrap();
        let source = load_source(path.to_str().unwrap()).unwrap();
        assert_eq!(source.media_type, MediaType::Png);

        assert!(load_source("data:application/pdf;base64,JVBE").is_err());
    }

    #[test]
    fn build_orchestrator_keeps_config_policy() {
        let mut config = Config::default();
        config.retry.max_retries = 4;
        config.gemini.api_key = "k".to_string();
        let orchestrator = build_orchestrator(&config, None, None).unwrap();
        assert_eq!(orchestrator.policy().max_retries, 4);
    }
}
