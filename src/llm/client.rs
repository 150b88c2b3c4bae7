//! Capability traits and the `ApiClient` implementation.
//!
//! The reading companion consumes three external capabilities:
//!
//! | Trait | Endpoint used by [`ApiClient`] | Success value |
//! |-------|--------------------------------|---------------|
//! | [`TextGenerator`] | `/v1/chat/completions` | response text (JSON when a schema is given) |
//! | [`SpeechSynthesizer`] | `/v1/audio/speech` (`pcm`) | base64 audio payload |
//! | [`ImageGenerator`] | `/v1/images/generations` (`b64_json`) | `data:` URI |
//!
//! All connection details come from [`LlmConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use base64::Engine as _;
use thiserror::Error;

use crate::config::LlmConfig;
use crate::llm::prompt::PromptBuilder;

// ---------------------------------------------------------------------------
// LlmError
// ---------------------------------------------------------------------------

/// Errors that can occur while calling a capability.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("LLM request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse LLM response: {0}")]
    Parse(String),

    /// The provider returned a response with no usable content.
    #[error("LLM returned an empty response")]
    EmptyResponse,

    /// The provider's safety filter rejected the request.
    #[error("response blocked by provider: {0}")]
    Blocked(String),

    /// The provider demanded authentication and no key is configured.
    #[error("no API key configured")]
    MissingApiKey,

    /// Structured output did not match the expected shape.
    #[error("response failed validation: {0}")]
    Schema(String),

    /// Capabilities are switched off in the configuration.
    #[error("AI capabilities are disabled")]
    Disabled,
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// One text-generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Optional system instruction.
    pub system: Option<String>,
    /// JSON schema constraining the response.  `None` means free text.
    pub schema: Option<serde_json::Value>,
}

impl GenerationRequest {
    /// Free-text request.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            schema: None,
        }
    }

    /// Request whose response must be JSON matching `schema`.
    pub fn json(prompt: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            schema: Some(schema),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Async text generation.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// (e.g. wrapped in `Arc<dyn TextGenerator>`).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError>;
}

/// Async speech synthesis.
///
/// `Ok(None)` means the input is not worth synthesising (empty after
/// normalisation); callers fall back to a local speech path.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Option<String>, LlmError>;
}

/// Async cover-art generation.  `Ok(None)` is always a valid outcome.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, title: &str, content: &str)
        -> Result<Option<String>, LlmError>;
}

// ---------------------------------------------------------------------------
// Speech text normalisation
// ---------------------------------------------------------------------------

/// Strip zero-width characters, collapse whitespace runs and trim.
///
/// ```
/// use smartread::llm::normalize_speech_text;
///
/// assert_eq!(normalize_speech_text("  荷塘\u{200B}\n\n 月色 "), "荷塘 月色");
/// ```
pub fn normalize_speech_text(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '\u{200B}'..='\u{200D}' | '\u{FEFF}'))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// ApiClient
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible REST endpoint for all three capabilities.
///
/// Works with OpenAI, Ollama (OpenAI mode), LM Studio, vLLM and any
/// provider that speaks the same wire format.  Providers lacking the speech
/// or image endpoints simply fail those calls; the reading assistant falls
/// back gracefully.
pub struct ApiClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl ApiClient {
    /// Build an `ApiClient` from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`.  A default client is used if the builder fails.
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn api_key(&self) -> Option<&str> {
        self.config.api_key.as_deref().filter(|k| !k.is_empty())
    }

    /// POST `body` to `path`, attaching `Authorization: Bearer …` only when a
    /// non-empty key is configured.
    async fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, LlmError> {
        let mut req = self.client.post(self.endpoint(path)).json(body);
        if let Some(key) = self.api_key() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED && self.api_key().is_none() {
            return Err(LlmError::MissingApiKey);
        }
        if !status.is_success() {
            return Err(LlmError::Request(format!("HTTP {status} from {path}")));
        }
        Ok(response)
    }

    fn chat_body(&self, request: &GenerationRequest) -> serde_json::Value {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(serde_json::json!({ "role": "system", "content": system }));
        }
        messages.push(serde_json::json!({ "role": "user", "content": request.prompt }));

        let mut body = serde_json::json!({
            "model":       self.config.model,
            "messages":    messages,
            "stream":      false,
            "temperature": self.config.temperature,
        });

        if let Some(schema) = &request.schema {
            body["response_format"] = serde_json::json!({
                "type": "json_schema",
                "json_schema": { "name": "response", "schema": schema }
            });
        }
        body
    }
}

#[async_trait]
impl TextGenerator for ApiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError> {
        let body = self.chat_body(&request);
        let response = self.post("/v1/chat/completions", &body).await?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let choice = &json["choices"][0];
        if choice["finish_reason"].as_str() == Some("content_filter") {
            return Err(LlmError::Blocked("content_filter".into()));
        }

        let text = choice["message"]["content"]
            .as_str()
            .ok_or(LlmError::EmptyResponse)?
            .trim()
            .to_string();

        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        Ok(text)
    }
}

#[async_trait]
impl SpeechSynthesizer for ApiClient {
    async fn synthesize(&self, text: &str) -> Result<Option<String>, LlmError> {
        let input = normalize_speech_text(text);
        if input.is_empty() {
            return Ok(None);
        }

        let body = serde_json::json!({
            "model":           self.config.tts_model,
            "voice":           self.config.tts_voice,
            "input":           input,
            "response_format": "pcm",
        });

        let bytes = self.post("/v1/audio/speech", &body).await?.bytes().await?;
        if bytes.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        Ok(Some(base64::engine::general_purpose::STANDARD.encode(&bytes)))
    }
}

#[async_trait]
impl ImageGenerator for ApiClient {
    async fn generate_image(
        &self,
        title: &str,
        content: &str,
    ) -> Result<Option<String>, LlmError> {
        let body = serde_json::json!({
            "model":  self.config.image_model,
            "prompt": PromptBuilder::cover_image(title, content),
            "size":   "1536x1024",
            "n":      1,
        });

        let json: serde_json::Value = self
            .post("/v1/images/generations", &body)
            .await?
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        Ok(json["data"][0]["b64_json"]
            .as_str()
            .filter(|data| !data.is_empty())
            .map(|data| format!("data:image/png;base64,{data}")))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            base_url: "http://localhost:11434/".into(),
            api_key: api_key.map(|s| s.to_string()),
            model: "qwen2.5:3b".into(),
            temperature: 0.3,
            timeout_secs: 10,
            ..LlmConfig::default()
        }
    }

    #[test]
    fn from_config_accepts_empty_api_key() {
        let client = ApiClient::from_config(&make_config(Some("")));
        assert!(client.api_key().is_none());
    }

    #[test]
    fn from_config_accepts_real_api_key() {
        let client = ApiClient::from_config(&make_config(Some("sk-test-1234")));
        assert_eq!(client.api_key(), Some("sk-test-1234"));
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let client = ApiClient::from_config(&make_config(None));
        assert_eq!(
            client.endpoint("/v1/chat/completions"),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn chat_body_includes_schema_only_when_requested() {
        let client = ApiClient::from_config(&make_config(None));

        let plain = client.chat_body(&GenerationRequest::text("hi"));
        assert!(plain.get("response_format").is_none());
        assert_eq!(plain["messages"].as_array().map(Vec::len), Some(1));

        let schema = serde_json::json!({ "type": "object" });
        let structured = client
            .chat_body(&GenerationRequest::json("hi", schema.clone()).with_system("tutor"));
        assert_eq!(structured["response_format"]["json_schema"]["schema"], schema);
        assert_eq!(structured["messages"][0]["role"], "system");
        assert_eq!(structured["messages"][1]["content"], "hi");
    }

    #[test]
    fn normalisation_strips_zero_width_and_collapses_whitespace() {
        assert_eq!(normalize_speech_text("\u{FEFF}a\u{200C}b \t c\n"), "ab c");
        assert!(normalize_speech_text(" \u{200B} ").is_empty());
    }

    #[tokio::test]
    async fn empty_speech_input_short_circuits() {
        let client = ApiClient::from_config(&make_config(None));
        let payload = client.synthesize("\u{200B}  ").await.unwrap();
        assert!(payload.is_none());
    }

    /// Verify that `ApiClient` is usable as each capability trait object.
    #[test]
    fn client_is_object_safe() {
        let config = make_config(None);
        let _: Box<dyn TextGenerator> = Box::new(ApiClient::from_config(&config));
        let _: Box<dyn SpeechSynthesizer> = Box::new(ApiClient::from_config(&config));
        let _: Box<dyn ImageGenerator> = Box::new(ApiClient::from_config(&config));
    }
}
