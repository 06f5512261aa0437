//! Banana Vision Core - generate and edit images with a hosted model.
//!
//! A prompt (and, for edits, a source image) goes in; an image artifact comes
//! out. Rate-limited and overloaded calls are retried with exponential backoff
//! before an error is surfaced.
//!
//! # Architecture
//!
//! ```text
//! Session (form state) → Orchestrator (parts, retry) → ImageModel (Gemini) → Artifact
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use banana_core::{Config, GeminiClientBuilder, ImageRequest, Orchestrator, RetryPolicy};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> banana_core::Result<()> {
//!     let config = Config::load()?;
//!     let model = GeminiClientBuilder::from_config(&config).build()?;
//!     let orchestrator = Orchestrator::new(Arc::new(model), RetryPolicy::from(&config.retry));
//!
//!     let artifact = orchestrator
//!         .request_image(&ImageRequest::generate("A golden retriever puppy"))
//!         .await?;
//!     artifact.save("puppy.png")?;
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod generate;
pub mod session;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{
    BananaError, ConfigError, ErrorKind, GenerationError, GenerationResult, Result, SessionError,
};
pub use generate::{
    GeminiClient, GeminiClientBuilder, ImageModel, Orchestrator, OrchestratorState, RetryPolicy,
};
pub use session::{user_message, Mode, Session, Toast, ToastKind, ToastQueue};
pub use types::{Artifact, GeneratedImage, ImageRequest, MediaType, SourceImage};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build an orchestrator for the configured Gemini model and retry policy.
pub fn orchestrator_from_config(config: &Config) -> GenerationResult<Orchestrator> {
    let model = GeminiClientBuilder::from_config(config).build()?;
    tracing::debug!(
        "Banana Vision v{} using {}",
        VERSION,
        config.gemini.model
    );
    Ok(Orchestrator::new(
        std::sync::Arc::new(model),
        RetryPolicy::from(&config.retry),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_orchestrator_from_config() {
        let mut config = Config::default();
        config.gemini.api_key = "test-key".to_string();
        config.retry.max_retries = 3;
        let orchestrator = orchestrator_from_config(&config).unwrap();
        assert_eq!(orchestrator.policy().max_retries, 3);
        assert_eq!(orchestrator.model().model_id(), "gemini-2.5-flash-image");
        assert_eq!(orchestrator.model().name(), "gemini");
    }
}
