//! `ReadingAssistant` — the service handle every phase talks to.
//!
//! It wraps the three capabilities and gives each domain operation a
//! graceful fallback, so a provider outage never propagates into the
//! session state machine:
//!
//! | Operation | On failure |
//! |-----------|------------|
//! | `analyze_selection` | `Err` (reader shows a distinct failed state) |
//! | `generate_outline` | `Err` (outline view offers retry) |
//! | `teacher_script` | the analysis text |
//! | `outline_lecture` | the section content |
//! | `proofread` | the original text |
//! | `pinyin` | the text itself |
//! | `extract_vocabulary` / `generate_quiz` | empty list |
//! | `workshop_exercise` | empty exercise |
//! | `enrich_vocabulary` | input unchanged |
//! | `writing_guidance` | fixed retry reply |
//! | `cover_image` | `None` |
//! | `speech` | [`SpeechOutcome::Unavailable`] |
//! | `synthesize` | `None` |
//!
//! Every fallback logs exactly one `warn!` naming the operation.

use std::sync::Arc;

use crate::config::{AppConfig, GenerationLimits, GradeLevel};
use crate::llm::client::{
    normalize_speech_text, ApiClient, GenerationRequest, ImageGenerator, LlmError,
    SpeechSynthesizer, TextGenerator,
};
use crate::llm::prompt::{truncate_chars, PromptBuilder};
use crate::llm::schema::{self, GuidanceReply};
use crate::session::{
    now_millis, ChatMessage, GeneratedExercise, Note, QuizQuestion, VideoScript, Vocabulary,
};

/// Reply used when the writing coach cannot reach the provider.
pub const GUIDANCE_RETRY_REPLY: &str = "网络连接不太稳定，请稍后再试。";

// ---------------------------------------------------------------------------
// SpeechOutcome
// ---------------------------------------------------------------------------

/// How a piece of text should be spoken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechOutcome {
    /// Synthesised base64 payload ready for decoding.
    Audio(String),
    /// Text too short for synthesis; speak it with the local speech path.
    Local(String),
    /// Nothing to say, or synthesis failed.
    Unavailable,
}

// ---------------------------------------------------------------------------
// ReadingAssistant
// ---------------------------------------------------------------------------

/// Shared, cloneable handle over the generation, speech and image
/// capabilities.
///
/// # Example
/// ```rust
/// use smartread::config::AppConfig;
/// use smartread::llm::ReadingAssistant;
///
/// let assistant = ReadingAssistant::from_config(&AppConfig::default());
/// // `assistant` is cheap to clone into spawned tasks.
/// let _for_task = assistant.clone();
/// ```
#[derive(Clone)]
pub struct ReadingAssistant {
    text: Arc<dyn TextGenerator>,
    speech: Arc<dyn SpeechSynthesizer>,
    images: Arc<dyn ImageGenerator>,
    prompts: PromptBuilder,
    limits: GenerationLimits,
    enabled: bool,
}

impl ReadingAssistant {
    pub fn new(
        text: Arc<dyn TextGenerator>,
        speech: Arc<dyn SpeechSynthesizer>,
        images: Arc<dyn ImageGenerator>,
    ) -> Self {
        Self {
            text,
            speech,
            images,
            prompts: PromptBuilder::default(),
            limits: GenerationLimits::default(),
            enabled: true,
        }
    }

    /// One [`ApiClient`] serving all three capabilities.
    pub fn from_config(config: &AppConfig) -> Self {
        let client = Arc::new(ApiClient::from_config(&config.llm));
        Self::new(client.clone(), client.clone(), client)
            .with_grade(config.reader.grade_level)
            .with_limits(config.limits.clone())
            .with_enabled(config.llm.enabled)
    }

    pub fn with_grade(mut self, grade: GradeLevel) -> Self {
        self.prompts = PromptBuilder::new(grade);
        self
    }

    pub fn with_limits(mut self, limits: GenerationLimits) -> Self {
        self.limits = limits;
        self
    }

    /// A disabled assistant answers every call with its fallback.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn limits(&self) -> &GenerationLimits {
        &self.limits
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError> {
        if !self.enabled {
            return Err(LlmError::Disabled);
        }
        self.text.generate(request).await
    }

    // ----- Reading -------------------------------------------------------

    /// Literary analysis of `text`.  `context` should already be truncated
    /// to the configured analysis window.
    pub async fn analyze_selection(&self, text: &str, context: &str) -> Result<String, LlmError> {
        let result = self.generate(self.prompts.analysis(text, context)).await;
        if let Err(e) = &result {
            log::error!("selection analysis failed: {e}");
        }
        result
    }

    /// Spoken-form rewrite of an analysis.
    pub async fn teacher_script(&self, analysis: &str, original: &str) -> String {
        let result = self.generate(self.prompts.teacher_script(analysis, original)).await;
        fallback("teacher_script", result, || analysis.to_string())
    }

    pub async fn pinyin(&self, text: &str) -> String {
        let result = self.generate(self.prompts.pinyin(text)).await;
        fallback("pinyin", result, || text.to_string())
    }

    /// Decide how `text` is spoken: synthesised audio, the local speech path
    /// for very short text, or unavailable.
    pub async fn speech(&self, text: &str) -> SpeechOutcome {
        let normalized = normalize_speech_text(text);
        if normalized.is_empty() {
            return SpeechOutcome::Unavailable;
        }
        if normalized.chars().count() <= self.limits.direct_tts_max_chars {
            log::debug!("short text ({} chars) routed to local speech", normalized.chars().count());
            return SpeechOutcome::Local(normalized);
        }
        match self.synthesize(&normalized).await {
            Some(payload) => SpeechOutcome::Audio(payload),
            None => SpeechOutcome::Unavailable,
        }
    }

    /// Synthesise `text` regardless of its length.
    pub async fn synthesize(&self, text: &str) -> Option<String> {
        let normalized = normalize_speech_text(text);
        if normalized.is_empty() {
            return None;
        }
        let result = if self.enabled {
            self.speech.synthesize(&normalized).await
        } else {
            Err(LlmError::Disabled)
        };
        fallback("synthesize", result, || None)
    }

    // ----- Compose / outline ---------------------------------------------

    pub async fn proofread(&self, text: &str) -> String {
        let result = self.generate(self.prompts.proofread(text)).await;
        fallback("proofread", result, || text.to_string())
    }

    pub async fn generate_outline(&self, content: &str) -> Result<VideoScript, LlmError> {
        let source = truncate_chars(content, self.limits.outline_source_chars);
        let result = match self.generate(self.prompts.outline(source)).await {
            Ok(text) => schema::parse_outline(&text),
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            log::error!("outline generation failed: {e}");
        }
        result
    }

    pub async fn outline_lecture(
        &self,
        section_title: &str,
        section_content: &str,
        article_title: &str,
    ) -> String {
        let request = self
            .prompts
            .outline_lecture(section_title, section_content, article_title);
        let result = self.generate(request).await;
        fallback("outline_lecture", result, || section_content.to_string())
    }

    pub async fn cover_image(&self, title: &str, content: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let hint = truncate_chars(content, self.limits.cover_hint_chars);
        let result = self.images.generate_image(title, hint).await;
        fallback("cover_image", result, || None)
    }

    // ----- Vocabulary ----------------------------------------------------

    pub async fn extract_vocabulary(&self, text: &str) -> Vec<Vocabulary> {
        let source = truncate_chars(text, self.limits.vocab_source_chars);
        let result = match self.generate(self.prompts.extract_vocabulary(source)).await {
            Ok(body) => schema::parse_vocabulary(&body, now_millis()),
            Err(e) => Err(e),
        };
        fallback("extract_vocabulary", result, Vec::new)
    }

    /// Quiz for `vocab`; an empty list never reaches the provider.
    pub async fn generate_quiz(&self, vocab: &[Vocabulary]) -> Vec<QuizQuestion> {
        if vocab.is_empty() {
            return Vec::new();
        }
        let result = match self.generate(self.prompts.quiz(vocab)).await {
            Ok(body) => schema::parse_quiz(&body),
            Err(e) => Err(e),
        };
        fallback("generate_quiz", result, Vec::new)
    }

    /// Attach missing metadata by matching on `word`.  Present fields are
    /// never overwritten.
    pub async fn enrich_vocabulary(&self, mut vocab: Vec<Vocabulary>) -> Vec<Vocabulary> {
        if vocab.is_empty() {
            return vocab;
        }
        let result = match self.generate(self.prompts.enrich(&vocab)).await {
            Ok(body) => schema::parse_enrichment(&body),
            Err(e) => Err(e),
        };
        let enriched = fallback("enrich_vocabulary", result, Vec::new);

        for v in &mut vocab {
            if let Some(extra) = enriched.iter().find(|e| e.word == v.word) {
                v.enrich_from(extra);
            }
        }
        vocab
    }

    // ----- Workshop ------------------------------------------------------

    pub async fn workshop_exercise(
        &self,
        content: &str,
        vocab: &[Vocabulary],
        notes: &[Note],
    ) -> GeneratedExercise {
        let source = truncate_chars(content, self.limits.workshop_source_chars);
        let result = match self.generate(self.prompts.workshop(source, vocab, notes)).await {
            Ok(body) => schema::parse_exercise(&body),
            Err(e) => Err(e),
        };
        fallback("workshop_exercise", result, GeneratedExercise::default)
    }

    pub async fn writing_guidance(
        &self,
        prompt: &str,
        draft: &str,
        query: &str,
        history: &[ChatMessage],
        article_context: &str,
    ) -> GuidanceReply {
        let context = truncate_chars(article_context, self.limits.coach_context_chars);
        let request = self
            .prompts
            .writing_guidance(prompt, draft, query, history, context);
        let result = match self.generate(request).await {
            Ok(body) => schema::parse_guidance(&body),
            Err(e) => Err(e),
        };
        fallback("writing_guidance", result, || GuidanceReply {
            reply: GUIDANCE_RETRY_REPLY.to_string(),
            draft_content: None,
        })
    }
}

fn fallback<T>(operation: &str, result: Result<T, LlmError>, default: impl FnOnce() -> T) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            log::warn!("{operation} failed, using fallback: {e}");
            default()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::{failing_assistant, MockGenerator, MockImages, MockSpeech};

    fn assistant_with(generator: MockGenerator) -> ReadingAssistant {
        ReadingAssistant::new(
            Arc::new(generator),
            Arc::new(MockSpeech::payload("AAAA")),
            Arc::new(MockImages::none()),
        )
    }

    fn vocab(word: &str) -> Vocabulary {
        Vocabulary {
            id: word.into(),
            word: word.into(),
            ..Vocabulary::default()
        }
    }

    #[tokio::test]
    async fn text_fallbacks_return_inputs() {
        let assistant = failing_assistant();

        assert_eq!(assistant.teacher_script("解析", "原文").await, "解析");
        assert_eq!(assistant.outline_lecture("开场", "内容", "题目").await, "内容");
        assert_eq!(assistant.proofread("原文").await, "原文");
        assert_eq!(assistant.pinyin("荷塘").await, "荷塘");
    }

    #[tokio::test]
    async fn list_fallbacks_are_empty() {
        let assistant = failing_assistant();

        assert!(assistant.extract_vocabulary("文章").await.is_empty());
        assert!(assistant.generate_quiz(&[vocab("荷塘")]).await.is_empty());
        assert!(assistant.workshop_exercise("文章", &[], &[]).await.is_empty());
        assert!(assistant.cover_image("t", "c").await.is_none());
    }

    #[tokio::test]
    async fn primary_generation_failures_surface() {
        let assistant = failing_assistant();

        assert!(assistant.analyze_selection("月色", "上下文").await.is_err());
        assert!(assistant.generate_outline("文章").await.is_err());
    }

    #[tokio::test]
    async fn guidance_fallback_is_retry_reply() {
        let reply = failing_assistant()
            .writing_guidance("题目", "", "帮帮我", &[], "文章")
            .await;
        assert_eq!(reply.reply, GUIDANCE_RETRY_REPLY);
        assert!(reply.draft_content.is_none());
    }

    #[tokio::test]
    async fn empty_quiz_input_skips_provider() {
        let generator = MockGenerator::fixed("{}");
        let calls = generator.calls();
        let assistant = assistant_with(generator);

        assert!(assistant.generate_quiz(&[]).await.is_empty());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn enrichment_is_non_destructive() {
        let assistant = assistant_with(MockGenerator::fixed(
            r#"{"enriched":[{"word":"荷塘","pinyin":"hé táng","definition":"池塘"},
                            {"word":"不相干","definition":"x"}]}"#,
        ));
        let mut mine = vocab("荷塘");
        mine.pinyin = Some("mine".into());

        let out = assistant.enrich_vocabulary(vec![mine, vocab("月色")]).await;

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].pinyin.as_deref(), Some("mine"));
        assert_eq!(out[0].definition, "池塘");
        assert!(out[1].definition.is_empty());
    }

    #[tokio::test]
    async fn vocabulary_source_is_truncated() {
        let generator = MockGenerator::echo();
        let seen = generator.last_prompt();
        let assistant = assistant_with(generator).with_limits(GenerationLimits {
            vocab_source_chars: 3,
            ..GenerationLimits::default()
        });

        let _ = assistant.extract_vocabulary("一二三四五六").await;
        let prompt = seen.lock().unwrap().clone().unwrap_or_default();
        assert!(prompt.contains("一二三..."));
        assert!(!prompt.contains("四"));
    }

    #[tokio::test]
    async fn speech_routing() {
        let assistant = assistant_with(MockGenerator::fixed(""));

        assert_eq!(assistant.speech(" \u{200B} ").await, SpeechOutcome::Unavailable);
        assert_eq!(
            assistant.speech("荷塘").await,
            SpeechOutcome::Local("荷塘".into())
        );
        assert_eq!(
            assistant.speech("曲曲折折的荷塘上面，弥望的是田田的叶子。").await,
            SpeechOutcome::Audio("AAAA".into())
        );
        assert_eq!(assistant.synthesize("荷塘").await, Some("AAAA".into()));
        assert_eq!(failing_assistant().synthesize("荷塘").await, None);
    }

    #[tokio::test]
    async fn disabled_assistant_never_calls_provider() {
        let generator = MockGenerator::fixed("ok");
        let calls = generator.calls();
        let assistant = assistant_with(generator).with_enabled(false);

        assert_eq!(assistant.proofread("原文").await, "原文");
        assert!(matches!(
            assistant.analyze_selection("a", "b").await,
            Err(LlmError::Disabled)
        ));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }
}
