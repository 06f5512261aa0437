//! The remote model seam and the wire shapes it exchanges.
//!
//! Request and response types mirror the `generateContent` JSON so the Gemini
//! client can send and receive them directly, and mocks can be built from
//! plain JSON fixtures in tests.

use crate::error::GenerationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Inline binary payload: MIME type plus base64 data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub data: String,
}

/// One part of an outgoing request, either an image or text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestPart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

/// Top-level reply from the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

/// One part of a reply. Image models often mix text and inline data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

/// A hosted model that turns an ordered list of parts into a reply.
///
/// Uses `async_trait` because the orchestrator holds `Arc<dyn ImageModel>`.
#[async_trait]
pub trait ImageModel: Send + Sync {
    /// Provider name for logging (e.g., "gemini").
    fn name(&self) -> &str;

    /// Model identifier sent with each call.
    fn model_id(&self) -> &str;

    /// Send one request and return the parsed reply.
    ///
    /// Non-success HTTP statuses must be reported as `GenerationError::Api`
    /// so the retry policy can classify them.
    async fn generate_content(
        &self,
        parts: &[RequestPart],
    ) -> Result<ModelResponse, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_parts_serialize_in_wire_shape() {
        let parts = vec![
            RequestPart::InlineData {
                inline_data: InlineData {
                    mime_type: Some("image/png".to_string()),
                    data: "XXXX".to_string(),
                },
            },
            RequestPart::Text {
                text: "add sunglasses".to_string(),
            },
        ];
        let json = serde_json::to_value(&parts).unwrap();
        assert_eq!(json[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(json[0]["inlineData"]["data"], "XXXX");
        assert_eq!(json[1]["text"], "add sunglasses");
        assert!(json[0].get("inline_data").is_none());
    }

    #[test]
    fn test_response_deserialization_mixed_parts() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Here is your image"},
                        {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}}
                    ]
                },
                "finishReason": "STOP"
            }]
        }"#;
        let resp: ModelResponse = serde_json::from_str(json).unwrap();
        let parts = &resp.candidates[0].content.as_ref().unwrap().parts;
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].text.as_deref(), Some("Here is your image"));
        let inline = parts[1].inline_data.as_ref().unwrap();
        assert_eq!(inline.mime_type.as_deref(), Some("image/png"));
        assert_eq!(inline.data, "iVBORw0KGgo=");
    }

    #[test]
    fn test_response_deserialization_empty_object() {
        let resp: ModelResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.candidates.is_empty());
    }
}
