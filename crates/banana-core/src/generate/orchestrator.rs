//! Request orchestration: build the parts, call the model, pull out the
//! image, and retry transient failures with exponential backoff.
//!
//! The orchestrator keeps no state between calls. Each `request_image`
//! invocation owns its retry budget and current delay, so one instance can be
//! shared behind an `Arc` and called concurrently if the host allows it.

use super::provider::{ImageModel, InlineData, ModelResponse, RequestPart};
use super::retry::{self, RetryPolicy};
use crate::error::{ErrorKind, GenerationError};
use crate::types::{Artifact, ImageRequest};
use std::sync::Arc;
use std::time::Duration;

/// MIME type assumed when the model omits one.
const DEFAULT_MEDIA_TYPE: &str = "image/png";

/// Lifecycle of one `request_image` call, reported to the observer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OrchestratorState {
    /// Before `request_image` is called. Never reported by the orchestrator.
    #[default]
    Idle,
    /// Attempt `attempt` (1-based) is on the wire.
    Sending { attempt: u32 },
    /// Sleeping `delay` before the next attempt; `remaining` retries are left
    /// including the one about to happen.
    Waiting { delay: Duration, remaining: u32 },
    Succeeded,
    Failed { kind: ErrorKind },
}

type Observer = Arc<dyn Fn(&OrchestratorState) + Send + Sync>;

/// Sends image requests to a model and applies the retry policy.
#[derive(Clone)]
pub struct Orchestrator {
    model: Arc<dyn ImageModel>,
    policy: RetryPolicy,
    observer: Option<Observer>,
}

impl Orchestrator {
    pub fn new(model: Arc<dyn ImageModel>, policy: RetryPolicy) -> Self {
        Self {
            model,
            policy,
            observer: None,
        }
    }

    /// Register a callback for state transitions (e.g. to drive a spinner).
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&OrchestratorState) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn model(&self) -> &dyn ImageModel {
        self.model.as_ref()
    }

    /// Generate or edit an image.
    ///
    /// Retries only rate-limit and overload failures, waiting
    /// `initial_delay * 2^n` before retry `n`. The wait cannot be interrupted
    /// from outside; dropping the future is the only way to abandon it.
    pub async fn request_image(&self, request: &ImageRequest) -> Result<Artifact, GenerationError> {
        let parts = build_parts(request);
        tracing::debug!(
            model = self.model.model_id(),
            edit = request.is_edit(),
            parts = parts.len(),
            "Sending image request"
        );

        let mut retries_done = 0u32;
        loop {
            self.notify(OrchestratorState::Sending {
                attempt: retries_done + 1,
            });

            let outcome = match self.model.generate_content(&parts).await {
                Ok(response) => parse_artifact(&response),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(artifact) => {
                    tracing::debug!(
                        media_type = %artifact.media_type,
                        attempts = retries_done + 1,
                        "Image received"
                    );
                    self.notify(OrchestratorState::Succeeded);
                    return Ok(artifact);
                }
                Err(e) if retry::is_retryable(&e) && retries_done < self.policy.max_retries => {
                    let remaining = self.policy.max_retries - retries_done;
                    let delay = retry::backoff_duration(retries_done, self.policy.initial_delay);
                    tracing::warn!(
                        attempt = retries_done + 1,
                        remaining,
                        delay_ms = delay.as_millis() as u64,
                        "Transient failure from {}, retrying: {e}",
                        self.model.name()
                    );
                    self.notify(OrchestratorState::Waiting { delay, remaining });
                    tokio::time::sleep(delay).await;
                    retries_done += 1;
                }
                Err(e) => {
                    let kind = e.kind();
                    tracing::error!(
                        attempts = retries_done + 1,
                        ?kind,
                        "Image request failed: {e}"
                    );
                    self.notify(OrchestratorState::Failed { kind });
                    return Err(e);
                }
            }
        }
    }

    fn notify(&self, state: OrchestratorState) {
        if let Some(observer) = &self.observer {
            observer(&state);
        }
    }
}

/// Assemble the ordered parts: image first (if any), then the instruction.
///
/// Any `data:` URL prefix on the source image is stripped so only the raw
/// base64 payload is sent.
pub fn build_parts(request: &ImageRequest) -> Vec<RequestPart> {
    let mut parts = Vec::with_capacity(2);

    if let Some(source) = &request.source_image {
        parts.push(RequestPart::InlineData {
            inline_data: InlineData {
                mime_type: Some(source.media_type.as_str().to_string()),
                data: source.payload().to_string(),
            },
        });
    }

    parts.push(RequestPart::Text {
        text: request.instruction.clone(),
    });

    parts
}

/// Return the first inline-data part of the first candidate.
pub fn parse_artifact(response: &ModelResponse) -> Result<Artifact, GenerationError> {
    let parts = response
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .map(|content| content.parts.as_slice())
        .unwrap_or_default();

    parts
        .iter()
        .filter_map(|part| part.inline_data.as_ref())
        .find(|inline| !inline.data.is_empty())
        .map(|inline| Artifact {
            media_type: inline
                .mime_type
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string()),
            encoded: inline.data.clone(),
        })
        .ok_or(GenerationError::NoArtifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::provider::{Candidate, CandidateContent, ResponsePart};
    use crate::types::SourceImage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// A scripted model for orchestrator tests.
    ///
    /// Each call to `generate_content()` invokes the response factory with the
    /// current call index and records the parts and the (paused) clock time.
    struct MockModel {
        response_fn: Box<dyn Fn(u32) -> Result<ModelResponse, GenerationError> + Send + Sync>,
        call_count: Arc<AtomicU32>,
        calls: Arc<Mutex<Vec<(Instant, Vec<RequestPart>)>>>,
    }

    impl MockModel {
        fn new(
            response_fn: impl Fn(u32) -> Result<ModelResponse, GenerationError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                response_fn: Box::new(response_fn),
                call_count: Arc::new(AtomicU32::new(0)),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn succeeding() -> Self {
            Self::new(|_| Ok(image_response("image/png", "iVBORw0KGgo=")))
        }

        fn failing(status: u16, message: &str) -> Self {
            let message = message.to_string();
            Self::new(move |_| {
                Err(GenerationError::Api {
                    status,
                    message: message.clone(),
                })
            })
        }

        /// First `failures` calls return `status`, later calls succeed.
        fn fail_then_succeed(failures: u32, status: u16) -> Self {
            Self::new(move |idx| {
                if idx < failures {
                    Err(GenerationError::Api {
                        status,
                        message: "RESOURCE_EXHAUSTED".to_string(),
                    })
                } else {
                    Ok(image_response("image/jpeg", "/9j/4AAQ"))
                }
            })
        }

        fn call_count_handle(&self) -> Arc<AtomicU32> {
            self.call_count.clone()
        }

        fn calls_handle(&self) -> Arc<Mutex<Vec<(Instant, Vec<RequestPart>)>>> {
            self.calls.clone()
        }
    }

    #[async_trait]
    impl ImageModel for MockModel {
        fn name(&self) -> &str {
            "mock"
        }

        fn model_id(&self) -> &str {
            "mock-image-v1"
        }

        async fn generate_content(
            &self,
            parts: &[RequestPart],
        ) -> Result<ModelResponse, GenerationError> {
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            self.calls
                .lock()
                .unwrap()
                .push((Instant::now(), parts.to_vec()));
            (self.response_fn)(idx)
        }
    }

    fn image_response(mime: &str, data: &str) -> ModelResponse {
        ModelResponse {
            candidates: vec![Candidate {
                content: Some(CandidateContent {
                    parts: vec![
                        ResponsePart {
                            text: Some("Here you go".to_string()),
                            inline_data: None,
                        },
                        ResponsePart {
                            text: None,
                            inline_data: Some(InlineData {
                                mime_type: Some(mime.to_string()),
                                data: data.to_string(),
                            }),
                        },
                    ],
                }),
                finish_reason: Some("STOP".to_string()),
            }],
        }
    }

    /// Orchestrator plus a log of every `Waiting` delay it reported.
    fn harness(model: MockModel) -> (Orchestrator, Arc<Mutex<Vec<Duration>>>) {
        let waits = Arc::new(Mutex::new(Vec::new()));
        let waits_clone = waits.clone();
        let orchestrator = Orchestrator::new(Arc::new(model), RetryPolicy::default())
            .with_observer(move |state| {
                if let OrchestratorState::Waiting { delay, .. } = state {
                    waits_clone.lock().unwrap().push(*delay);
                }
            });
        (orchestrator, waits)
    }

    fn millis(durations: &[Duration]) -> Vec<u64> {
        durations.iter().map(|d| d.as_millis() as u64).collect()
    }

    #[test]
    fn test_build_parts_generate_is_text_only() {
        let parts = build_parts(&ImageRequest::generate("a crystal city at dusk"));
        assert_eq!(
            parts,
            vec![RequestPart::Text {
                text: "a crystal city at dusk".to_string()
            }]
        );
    }

    #[test]
    fn test_build_parts_edit_puts_image_first_and_strips_prefix() {
        let source = SourceImage::new("data:image/png;base64,XXXX", "image/png").unwrap();
        let parts = build_parts(&ImageRequest::edit("add sunglasses", source));

        assert_eq!(parts.len(), 2);
        match &parts[0] {
            RequestPart::InlineData { inline_data } => {
                assert_eq!(inline_data.data, "XXXX");
                assert_eq!(inline_data.mime_type.as_deref(), Some("image/png"));
            }
            other => panic!("Expected inline data first, got {other:?}"),
        }
        assert!(matches!(&parts[1], RequestPart::Text { text } if text == "add sunglasses"));
    }

    #[test]
    fn test_parse_artifact_takes_first_inline_part() {
        let mut response = image_response("image/webp", "UklGRg==");
        response.candidates[0]
            .content
            .as_mut()
            .unwrap()
            .parts
            .push(ResponsePart {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: Some("image/png".to_string()),
                    data: "second".to_string(),
                }),
            });

        let first = parse_artifact(&response).unwrap();
        assert_eq!(first.media_type, "image/webp");
        assert_eq!(first.encoded, "UklGRg==");
        // Parsing is pure.
        assert_eq!(parse_artifact(&response).unwrap(), first);
    }

    #[test]
    fn test_parse_artifact_defaults_media_type() {
        let json = r#"{"candidates":[{"content":{"parts":[{"inlineData":{"data":"AAAA"}}]}}]}"#;
        let response: ModelResponse = serde_json::from_str(json).unwrap();
        let artifact = parse_artifact(&response).unwrap();
        assert_eq!(artifact.media_type, "image/png");
        assert_eq!(artifact.data_url(), "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_parse_artifact_ignores_later_candidates() {
        let json = r#"{"candidates":[
            {"content":{"parts":[{"text":"no image here"}]}},
            {"content":{"parts":[{"inlineData":{"mimeType":"image/png","data":"AAAA"}}]}}
        ]}"#;
        let response: ModelResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            parse_artifact(&response),
            Err(GenerationError::NoArtifact)
        ));
    }

    #[test]
    fn test_parse_artifact_skips_empty_inline_data() {
        let json = r#"{"candidates":[{"content":{"parts":[
            {"inlineData":{"mimeType":"image/png","data":""}},
            {"inlineData":{"mimeType":"image/jpeg","data":"/9j/"}}
        ]}}]}"#;
        let response: ModelResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parse_artifact(&response).unwrap().media_type, "image/jpeg");
    }

    #[test]
    fn test_parse_artifact_missing_content() {
        let json = r#"{"candidates":[{"finishReason":"IMAGE_SAFETY"}]}"#;
        let response: ModelResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            parse_artifact(&response),
            Err(GenerationError::NoArtifact)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_returns_inline_part() {
        let model = MockModel::succeeding();
        let call_count = model.call_count_handle();
        let (orchestrator, waits) = harness(model);

        let artifact = orchestrator
            .request_image(&ImageRequest::generate("a cozy cabin"))
            .await
            .unwrap();

        assert_eq!(artifact.media_type, "image/png");
        assert_eq!(artifact.encoded, "iVBORw0KGgo=");
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(waits.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transmits_payload_without_data_url_prefix() {
        let model = MockModel::succeeding();
        let calls = model.calls_handle();
        let (orchestrator, _) = harness(model);
        let source = SourceImage::new("data:image/png;base64,XXXX", "image/png").unwrap();

        orchestrator
            .request_image(&ImageRequest::edit("make it a pencil sketch", source))
            .await
            .unwrap();

        let calls = calls.lock().unwrap();
        let sent = serde_json::to_string(&calls[0].1).unwrap();
        assert!(sent.contains("\"data\":\"XXXX\""));
        assert!(!sent.contains("data:image/png;base64"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_four_times_then_succeeds() {
        let model = MockModel::fail_then_succeed(4, 429);
        let call_count = model.call_count_handle();
        let calls = model.calls_handle();
        let (orchestrator, waits) = harness(model);

        let artifact = orchestrator
            .request_image(&ImageRequest::generate("a robot watering plants"))
            .await
            .unwrap();

        assert_eq!(artifact.media_type, "image/jpeg");
        assert_eq!(call_count.load(Ordering::SeqCst), 5);
        assert_eq!(
            millis(&waits.lock().unwrap()),
            vec![5000, 10_000, 20_000, 40_000]
        );

        // The clock only moves while sleeping, so call spacing equals the waits.
        let calls = calls.lock().unwrap();
        let gaps: Vec<Duration> = calls.windows(2).map(|w| w[1].0 - w[0].0).collect();
        assert_eq!(millis(&gaps), vec![5000, 10_000, 20_000, 40_000]);
        // Every retry re-sends the identical request.
        assert!(calls.iter().all(|(_, parts)| parts == &calls[0].1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_six_times_exhausts_budget() {
        let model = MockModel::failing(429, "Too Many Requests");
        let call_count = model.call_count_handle();
        let (orchestrator, waits) = harness(model);
        let start = Instant::now();

        let err = orchestrator
            .request_image(&ImageRequest::generate("a lighthouse"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert!(err.to_string().contains("429"));
        // 1 initial + 5 retries, never a seventh.
        assert_eq!(call_count.load(Ordering::SeqCst), 6);
        assert_eq!(
            millis(&waits.lock().unwrap()),
            vec![5000, 10_000, 20_000, 40_000, 80_000]
        );
        assert_eq!(start.elapsed(), Duration::from_millis(155_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_service_unavailable_is_retried() {
        let model = MockModel::fail_then_succeed(1, 503);
        let call_count = model.call_count_handle();
        let (orchestrator, waits) = harness(model);

        orchestrator
            .request_image(&ImageRequest::generate("a harbour at night"))
            .await
            .unwrap();

        assert_eq!(call_count.load(Ordering::SeqCst), 2);
        assert_eq!(millis(&waits.lock().unwrap()), vec![5000]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_request_fails_immediately() {
        let model = MockModel::failing(400, "Unsupported MIME type");
        let call_count = model.call_count_handle();
        let (orchestrator, waits) = harness(model);
        let start = Instant::now();

        let err = orchestrator
            .request_image(&ImageRequest::generate("x"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RejectedRequest);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(waits.lock().unwrap().is_empty());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_failure_fails_immediately() {
        let model = MockModel::failing(403, "API key not valid");
        let call_count = model.call_count_handle();
        let (orchestrator, _) = harness(model);

        let err = orchestrator
            .request_image(&ImageRequest::generate("x"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_candidates_is_no_artifact_without_retry() {
        let model = MockModel::new(|_| Ok(ModelResponse::default()));
        let call_count = model.call_count_handle();
        let (orchestrator, waits) = harness(model);

        let err = orchestrator
            .request_image(&ImageRequest::generate("x"))
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::NoArtifact));
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(waits.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_budget_never_waits() {
        let model = MockModel::failing(429, "rate limited");
        let call_count = model.call_count_handle();
        let orchestrator = Orchestrator::new(Arc::new(model), RetryPolicy::none());

        let err = orchestrator
            .request_image(&ImageRequest::generate("x"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_sees_full_state_sequence() {
        let model = MockModel::fail_then_succeed(1, 429);
        let states = Arc::new(Mutex::new(Vec::new()));
        let states_clone = states.clone();
        let orchestrator = Orchestrator::new(Arc::new(model), RetryPolicy::default())
            .with_observer(move |s| states_clone.lock().unwrap().push(s.clone()));

        orchestrator
            .request_image(&ImageRequest::generate("x"))
            .await
            .unwrap();

        assert_eq!(
            *states.lock().unwrap(),
            vec![
                OrchestratorState::Sending { attempt: 1 },
                OrchestratorState::Waiting {
                    delay: Duration::from_millis(5000),
                    remaining: 5
                },
                OrchestratorState::Sending { attempt: 2 },
                OrchestratorState::Succeeded,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_calls_are_independent() {
        let model = MockModel::fail_then_succeed(1, 503);
        let orchestrator = Arc::new(Orchestrator::new(Arc::new(model), RetryPolicy::default()));

        let a = {
            let o = orchestrator.clone();
            tokio::spawn(async move { o.request_image(&ImageRequest::generate("a")).await })
        };
        let b = {
            let o = orchestrator.clone();
            tokio::spawn(async move { o.request_image(&ImageRequest::generate("b")).await })
        };

        // Only the very first call fails; both still succeed.
        assert!(a.await.unwrap().is_ok());
        assert!(b.await.unwrap().is_ok());
    }
}
