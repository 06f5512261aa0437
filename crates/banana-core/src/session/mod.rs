//! Front-end application state.
//!
//! `Session` is the state a front end keeps between user actions: the
//! selected mode, the prompt, the image being edited, the in-flight flag, the
//! last result, and the notification queue. Each user action is one method
//! call; the orchestrator is only touched by `submit`.

mod toast;

pub use toast::{Toast, ToastKind, ToastQueue};

use crate::error::{ErrorKind, GenerationError, SessionError};
use crate::generate::Orchestrator;
use crate::types::{Artifact, GeneratedImage, ImageRequest, SourceImage};
use std::time::Duration;

/// What the next submission does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Text-to-image
    #[default]
    Generate,
    /// Instruction-driven edit of an uploaded image
    Edit,
}

impl Mode {
    /// Example prompts offered for this mode.
    pub fn sample_prompts(&self) -> &'static [&'static str] {
        match self {
            Mode::Generate => &[
                "A futuristic city made of clear crystal at sunset",
                "A cute robot watering plants on Mars, digital art",
                "An oil painting of a cozy cabin in snowy mountains",
            ],
            Mode::Edit => &[
                "Add sunglasses",
                "Change the background to a cyberpunk city",
                "Make it look like a vintage pencil sketch",
            ],
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Generate => write!(f, "generate"),
            Mode::Edit => write!(f, "edit"),
        }
    }
}

/// Message shown to the user for a failed request.
pub fn user_message(error: &GenerationError) -> &'static str {
    match error.kind() {
        ErrorKind::RateLimited => {
            "Usage is currently limited. Please try again in about a minute."
        }
        ErrorKind::RejectedRequest => {
            "The request was rejected. The content type may not be supported."
        }
        ErrorKind::ServiceUnavailable => {
            "The service is temporarily unstable. Please try again shortly."
        }
        ErrorKind::NoArtifact | ErrorKind::Unknown => "Something went wrong. Please try again.",
    }
}

/// Application state driven by discrete user actions.
#[derive(Debug, Default)]
pub struct Session {
    mode: Mode,
    prompt: String,
    source_image: Option<SourceImage>,
    loading: bool,
    /// Mode and trimmed prompt of the request in flight
    submitted: Option<(Mode, String)>,
    result: Option<GeneratedImage>,
    toasts: ToastQueue,
}

impl Session {
    pub fn new(toast_ttl: Duration) -> Self {
        Self {
            toasts: ToastQueue::new(toast_ttl),
            ..Self::default()
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn source_image(&self) -> Option<&SourceImage> {
        self.source_image.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn result(&self) -> Option<&GeneratedImage> {
        self.result.as_ref()
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub fn toasts_mut(&mut self) -> &mut ToastQueue {
        &mut self.toasts
    }

    /// Switch mode. Changing mode clears the previous result; a loaded
    /// source image is kept for when the user switches back.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            self.mode = mode;
            self.result = None;
        }
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Copy sample prompt `index` for the current mode into the prompt.
    /// Returns false if there is no such sample.
    pub fn use_sample_prompt(&mut self, index: usize) -> bool {
        match self.mode.sample_prompts().get(index) {
            Some(sample) => {
                self.prompt = (*sample).to_string();
                true
            }
            None => false,
        }
    }

    pub fn set_source_image(&mut self, image: SourceImage) {
        self.source_image = Some(image);
    }

    pub fn clear_source_image(&mut self) {
        self.source_image = None;
    }

    /// Validate the form and mark a request as in flight.
    ///
    /// Validation failures raise an error toast and leave the session idle.
    pub fn begin_submit(&mut self) -> Result<ImageRequest, SessionError> {
        if self.loading {
            return Err(SessionError::Busy);
        }

        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            let err = SessionError::EmptyPrompt;
            self.toasts.push(ToastKind::Error, err.to_string());
            return Err(err);
        }

        let request = match (self.mode, &self.source_image) {
            (Mode::Generate, _) => ImageRequest::generate(prompt),
            (Mode::Edit, Some(source)) => ImageRequest::edit(prompt, source.clone()),
            (Mode::Edit, None) => {
                let err = SessionError::MissingSourceImage;
                self.toasts.push(ToastKind::Error, err.to_string());
                return Err(err);
            }
        };

        self.loading = true;
        self.submitted = Some((self.mode, request.instruction.clone()));
        self.result = None;
        Ok(request)
    }

    /// Record the outcome of the request started by `begin_submit`.
    ///
    /// The result and toast describe the form as it was submitted, even if
    /// the mode or prompt changed while the request was in flight.
    pub fn finish_submit(&mut self, outcome: Result<Artifact, GenerationError>) {
        self.loading = false;
        let (mode, prompt) = self
            .submitted
            .take()
            .unwrap_or_else(|| (self.mode, self.prompt.trim().to_string()));
        match outcome {
            Ok(artifact) => {
                self.result = Some(GeneratedImage::new(artifact, prompt));
                let message = match mode {
                    Mode::Generate => "Image generated successfully!",
                    Mode::Edit => "Image edited successfully!",
                };
                self.toasts.push(ToastKind::Success, message);
            }
            Err(e) => {
                tracing::debug!("Request failed ({:?}): {e}", e.kind());
                self.toasts.push(ToastKind::Error, user_message(&e));
            }
        }
    }

    /// Validate, send through `orchestrator`, and record the outcome.
    ///
    /// Returns the validation error, if any; request failures end up as an
    /// error toast rather than an `Err`.
    pub async fn submit(&mut self, orchestrator: &Orchestrator) -> Result<(), SessionError> {
        let request = self.begin_submit()?;
        let outcome = orchestrator.request_image(&request).await;
        self.finish_submit(outcome);
        Ok(())
    }
}
