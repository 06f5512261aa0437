//! Image generation against a hosted model.
//!
//! Provides the `ImageModel` seam over the remote call, the Gemini
//! implementation, and the `Orchestrator` that builds requests, extracts the
//! image from replies, and retries rate-limited or overloaded calls with
//! exponential backoff.

pub(crate) mod gemini;
pub(crate) mod orchestrator;
pub(crate) mod provider;
pub(crate) mod retry;

pub use gemini::{GeminiClient, GeminiClientBuilder};
pub use orchestrator::{build_parts, parse_artifact, Orchestrator, OrchestratorState};
pub use provider::{
    Candidate, CandidateContent, ImageModel, InlineData, ModelResponse, RequestPart, ResponsePart,
};
pub use retry::{backoff_duration, is_retryable, RetryPolicy};
