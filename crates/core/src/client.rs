//! Chat-completion client.
//!
//! [`CompletionBackend`] is the seam between the pipeline and the text
//! generation service. [`OpenAiClient`] speaks the OpenAI-compatible
//! `chat/completions` wire format; tests plug in their own backends.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{GradedError, Result};

/// Default chat-completions endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for the completion client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Full URL of the chat-completions endpoint
    pub endpoint: String,
    /// Model identifier sent with every request
    pub model: String,
    /// Request timeout in seconds
    pub timeout: u64,
    /// Output token bound for rewrite requests
    pub rewrite_max_tokens: u32,
    /// Output token bound for summary requests
    pub summary_max_tokens: u32,
    /// Sampling temperature for rewrites (low: consistent)
    pub rewrite_temperature: f32,
    /// Sampling temperature for summaries (higher: fluent)
    pub summary_temperature: f32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: 60,
            rewrite_max_tokens: 2000,
            summary_max_tokens: 1500,
            rewrite_temperature: 0.3,
            summary_temperature: 0.7,
        }
    }
}

/// A system/user prompt pair plus sampling bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Something that turns a prompt into generated text.
///
/// Implementations return the trimmed, non-empty model output; an empty
/// completion is [`GradedError::EmptyCompletion`].
pub trait CompletionBackend: Send + Sync {
    fn complete(&self, request: &CompletionRequest) -> impl Future<Output = Result<String>> + Send;
}

/// Builds a backend for the credential carried by a command.
pub trait Connector {
    type Backend: CompletionBackend;

    fn connect(&self, api_key: &str) -> Result<Self::Backend>;
}

impl Connector for ClientConfig {
    type Backend = OpenAiClient;

    fn connect(&self, api_key: &str) -> Result<OpenAiClient> {
        OpenAiClient::new(api_key, self.clone())
    }
}

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// HTTP client for OpenAI-compatible chat-completion endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    config: ClientConfig,
}

impl OpenAiClient {
    /// Create a client for `api_key`.
    ///
    /// # Errors
    ///
    /// [`GradedError::MissingApiKey`] for a blank key, [`GradedError::InvalidUrl`]
    /// for a bad endpoint.
    pub fn new(api_key: &str, config: ClientConfig) -> Result<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(GradedError::MissingApiKey);
        }
        url::Url::parse(&config.endpoint).map_err(|e| GradedError::InvalidUrl(e.to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(GradedError::HttpError)?;

        Ok(Self { client, api_key: api_key.to_string(), config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn build_request<'a>(&'a self, request: &'a CompletionRequest) -> ApiRequest<'a> {
        ApiRequest {
            model: &self.config.model,
            messages: vec![
                ApiMessage { role: "system", content: &request.system },
                ApiMessage { role: "user", content: &request.user },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

impl CompletionBackend for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = self.build_request(request);
        debug!(model = %self.config.model, chars = request.user.len(), "sending completion request");

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GradedError::Timeout { timeout: self.config.timeout }
                } else {
                    GradedError::HttpError(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GradedError::Api { status: status.as_u16(), message });
        }

        let text = response.text().await?;
        let parsed: ApiResponse =
            serde_json::from_str(&text).map_err(|e| GradedError::MalformedResponse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GradedError::MalformedResponse("response has no choices".to_string()))?
            .message
            .content
            .unwrap_or_default();

        let content = content.trim();
        if content.is_empty() {
            return Err(GradedError::EmptyCompletion);
        }

        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

    fn request() -> CompletionRequest {
        CompletionRequest { system: "sys".to_string(), user: "Rewrite this.".to_string(), max_tokens: 100, temperature: 0.3 }
    }

    fn client_for(server: &MockServer) -> OpenAiClient {
        let config = ClientConfig { endpoint: format!("{}/v1/chat/completions", server.uri()), ..Default::default() };
        OpenAiClient::new("test-key", config).unwrap()
    }

    fn completion_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": content }, "finish_reason": "stop" }]
        })
    }

    #[test]
    fn test_blank_key_rejected() {
        let result = OpenAiClient::new("   ", ClientConfig::default());
        assert!(matches!(result, Err(GradedError::MissingApiKey)));
    }

    #[test]
    fn test_bad_endpoint_rejected() {
        let config = ClientConfig { endpoint: "not a url".to_string(), ..Default::default() };
        assert!(matches!(OpenAiClient::new("key", config), Err(GradedError::InvalidUrl(_))));
    }

    #[test]
    fn test_request_body_shape() {
        let client = OpenAiClient::new("key", ClientConfig::default()).unwrap();
        let req = request();
        let body = serde_json::to_value(client.build_request(&req)).unwrap();
        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Rewrite this.");
        assert_eq!(body["max_tokens"], 100);
    }

    #[tokio::test]
    async fn test_complete_success_sends_bearer() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/v1/chat/completions"))
            .and(matchers::header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("  Simple text.  ")))
            .expect(1)
            .mount(&server)
            .await;

        let text = client_for(&server).complete(&request()).await.unwrap();
        assert_eq!(text, "Simple text.");
    }

    #[tokio::test]
    async fn test_complete_api_error() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"error":{"message":"Invalid API key"}}"#))
            .mount(&server)
            .await;

        match client_for(&server).complete(&request()).await {
            Err(GradedError::Api { status, message }) => {
                assert_eq!(status, 401);
                assert!(message.contains("Invalid API key"));
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_empty_content() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("   ")))
            .mount(&server)
            .await;

        let result = client_for(&server).complete(&request()).await;
        assert!(matches!(result, Err(GradedError::EmptyCompletion)));
    }

    #[tokio::test]
    async fn test_complete_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let result = client_for(&server).complete(&request()).await;
        assert!(matches!(result, Err(GradedError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_complete_no_choices() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
            .mount(&server)
            .await;

        let result = client_for(&server).complete(&request()).await;
        assert!(matches!(result, Err(GradedError::MalformedResponse(_))));
    }
}
