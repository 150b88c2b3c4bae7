//! AI capability layer for the reading companion.
//!
//! This module provides:
//! * [`TextGenerator`], [`SpeechSynthesizer`], [`ImageGenerator`] — async
//!   capability traits, shared as `Arc<dyn …>`.
//! * [`ApiClient`] — OpenAI-compatible REST implementation of all three.
//! * [`ReadingAssistant`] — the injected service handle; every domain
//!   operation with its graceful fallback.
//! * [`PromptBuilder`] — prompt templates, parameterised by grade level.
//! * [`schema`] — JSON schemas and validated parsing into session types.
//! * [`LlmError`] — error variants for capability calls.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use smartread::config::AppConfig;
//! use smartread::llm::ReadingAssistant;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let assistant = ReadingAssistant::from_config(&config);
//!
//!     // Never fails: falls back to the input text.
//!     let tidy = assistant.proofread("曲曲折折的荷塘上面,弥望的是田田的叶子.").await;
//!     println!("{tidy}");
//!
//!     // Primary generation surfaces errors so callers can offer a retry.
//!     match assistant.generate_outline(&tidy).await {
//!         Ok(script) => println!("{}", script.intro),
//!         Err(e) => eprintln!("outline unavailable: {e}"),
//!     }
//! }
//! ```

pub mod assistant;
pub mod client;
#[cfg(test)]
pub mod mock;
pub mod prompt;
pub mod schema;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use assistant::{ReadingAssistant, SpeechOutcome, GUIDANCE_RETRY_REPLY};
pub use client::{
    normalize_speech_text, ApiClient, GenerationRequest, ImageGenerator, LlmError,
    SpeechSynthesizer, TextGenerator,
};
#[cfg(test)]
pub use mock::{MockGenerator, MockImages, MockSpeech};
pub use prompt::{truncate_chars, PromptBuilder};
pub use schema::GuidanceReply;
