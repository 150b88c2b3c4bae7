//! Test doubles for the capability traits.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;

use crate::llm::assistant::ReadingAssistant;
use crate::llm::client::{
    GenerationRequest, ImageGenerator, LlmError, SpeechSynthesizer, TextGenerator,
};

type Responder = Box<dyn Fn(&GenerationRequest) -> Result<String, LlmError> + Send + Sync>;

// ---------------------------------------------------------------------------
// MockGenerator
// ---------------------------------------------------------------------------

pub struct MockGenerator {
    respond: Responder,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
    last_prompt: Arc<Mutex<Option<String>>>,
}

impl MockGenerator {
    pub fn new(
        respond: impl Fn(&GenerationRequest) -> Result<String, LlmError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
            last_prompt: Arc::new(Mutex::new(None)),
        }
    }

    /// Always answers `text`.
    pub fn fixed(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| Ok(text.clone()))
    }

    /// Answers with the prompt itself.
    pub fn echo() -> Self {
        Self::new(|req| Ok(req.prompt.clone()))
    }

    pub fn failing() -> Self {
        Self::new(|_| Err(LlmError::Request("connection refused".into())))
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    pub fn last_prompt(&self) -> Arc<Mutex<Option<String>>> {
        self.last_prompt.clone()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(request.prompt.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.respond)(&request)
    }
}

// ---------------------------------------------------------------------------
// MockSpeech
// ---------------------------------------------------------------------------

pub struct MockSpeech {
    result: Result<Option<String>, ()>,
    calls: Arc<AtomicUsize>,
}

impl MockSpeech {
    pub fn payload(base64: &str) -> Self {
        Self {
            result: Ok(Some(base64.to_string())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A valid raw PCM payload holding `samples` mono samples.
    pub fn pcm(samples: usize) -> Self {
        Self::payload(&pcm_payload(samples))
    }

    pub fn failing() -> Self {
        Self {
            result: Err(()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSpeech {
    async fn synthesize(&self, _text: &str) -> Result<Option<String>, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result
            .clone()
            .map_err(|_| LlmError::Request("speech endpoint unavailable".into()))
    }
}

/// Base64 of `samples` silent 16-bit little-endian samples.
pub fn pcm_payload(samples: usize) -> String {
    base64::engine::general_purpose::STANDARD.encode(vec![0u8; samples * 2])
}

// ---------------------------------------------------------------------------
// MockImages
// ---------------------------------------------------------------------------

pub struct MockImages(Option<String>);

impl MockImages {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn data_uri(uri: &str) -> Self {
        Self(Some(uri.to_string()))
    }
}

#[async_trait]
impl ImageGenerator for MockImages {
    async fn generate_image(&self, _: &str, _: &str) -> Result<Option<String>, LlmError> {
        Ok(self.0.clone())
    }
}

// ---------------------------------------------------------------------------
// Assistants
// ---------------------------------------------------------------------------

/// Assistant over `generator` with working speech and no images.
pub fn assistant(generator: MockGenerator) -> ReadingAssistant {
    ReadingAssistant::new(
        Arc::new(generator),
        Arc::new(MockSpeech::pcm(2_400)),
        Arc::new(MockImages::none()),
    )
}

/// Assistant whose every capability fails.
pub fn failing_assistant() -> ReadingAssistant {
    ReadingAssistant::new(
        Arc::new(MockGenerator::failing()),
        Arc::new(MockSpeech::failing()),
        Arc::new(MockImages::none()),
    )
}
