//! Vocabulary learning: extracted word cards and a short quiz before
//! reading.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use smartread::config::AppConfig;
//! use smartread::llm::ReadingAssistant;
//! use smartread::vocab::{load_flow, VocabStage};
//!
//! # async fn example(article: smartread::session::Article) {
//! let assistant = ReadingAssistant::from_config(&AppConfig::default());
//! let mut flow = load_flow(&assistant, &article).await;
//! while flow.stage() == VocabStage::Learning {
//!     flow.next();
//! }
//! # }
//! ```

pub mod flow;

use crate::audio::{speak, AudioEngine, LocalSpeech, SpeakError, Slot, Spoken};
use crate::config::AudioConfig;
use crate::llm::{ReadingAssistant, SpeechOutcome};
use crate::session::Article;

pub use flow::{AnswerFeedback, VocabFlow, VocabStage};

/// Extract vocabulary from the article, then generate its quiz.
///
/// Either step failing degrades to an empty list, so the flow is always
/// usable; no words means an immediately completable flow.
pub async fn load_flow(assistant: &ReadingAssistant, article: &Article) -> VocabFlow {
    let vocab = assistant.extract_vocabulary(&article.content).await;
    let questions = assistant.generate_quiz(&vocab).await;
    log::info!(
        "vocab: {} words, {} quiz questions",
        vocab.len(),
        questions.len()
    );
    VocabFlow::new(vocab, questions)
}

/// Say a word or example sentence.
///
/// The local speech path is tried first; when it cannot speak, the text is
/// synthesised and played on the selection-read slot.
pub async fn pronounce(
    text: &str,
    assistant: &ReadingAssistant,
    engine: &mut AudioEngine,
    local: &dyn LocalSpeech,
    audio: &AudioConfig,
) -> Result<Spoken, SpeakError> {
    if text.trim().is_empty() {
        return Err(SpeakError::Unavailable);
    }
    local.cancel();
    if local.speak(text) {
        return Ok(Spoken::Local);
    }

    let outcome = match assistant.synthesize(text).await {
        Some(payload) => SpeechOutcome::Audio(payload),
        None => SpeechOutcome::Unavailable,
    };
    speak(engine, Slot::SelectionRead, outcome, local, audio)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::audio::playback::tests::{ManualClock, RecordingOutput};
    use crate::audio::{LogSpeech, NoSpeech};
    use crate::compose::sample_article;
    use crate::llm::mock::{assistant, failing_assistant, MockGenerator};

    const VOCAB_JSON: &str = r#"{"words":[
        {"word":"弥望","pinyin":"mí wàng","definition":"满眼","context":"弥望的是田田的叶子","difficulty":2}
    ]}"#;
    const QUIZ_JSON: &str = r#"{"questions":[
        {"id":"q1","type":"judge","question":"弥望是满眼的意思","correctAnswer":"true","explanation":"对","relatedWord":"弥望"}
    ]}"#;

    fn engine() -> AudioEngine {
        AudioEngine::new(
            Arc::new(RecordingOutput::default()),
            Arc::new(ManualClock::default()),
        )
    }

    #[tokio::test]
    async fn loads_words_then_quiz() {
        let generator = MockGenerator::new(|req| {
            if req.prompt.contains("quiz") {
                Ok(QUIZ_JSON.to_string())
            } else {
                Ok(VOCAB_JSON.to_string())
            }
        });
        let flow = load_flow(&assistant(generator), &sample_article()).await;

        assert_eq!(flow.stage(), VocabStage::Learning);
        assert_eq!(flow.vocab()[0].word, "弥望");
        assert!(flow.vocab()[0].id.starts_with("auto-vocab-"));
        assert_eq!(flow.total(), 1);
    }

    #[tokio::test]
    async fn failed_extraction_gives_empty_flow() {
        let flow = load_flow(&failing_assistant(), &sample_article()).await;
        assert_eq!(flow.stage(), VocabStage::Empty);
    }

    #[tokio::test]
    async fn pronounce_prefers_local_speech() {
        let a = assistant(MockGenerator::echo());
        let mut engine = engine();
        let spoken = pronounce("荷塘", &a, &mut engine, &LogSpeech, &AudioConfig::default())
            .await
            .unwrap();
        assert_eq!(spoken, Spoken::Local);
        assert!(!engine.slot(Slot::SelectionRead).has_buffer());
    }

    #[tokio::test]
    async fn pronounce_falls_back_to_synthesis() {
        let a = assistant(MockGenerator::echo());
        let mut engine = engine();
        let spoken = pronounce("荷塘", &a, &mut engine, &NoSpeech, &AudioConfig::default())
            .await
            .unwrap();
        assert!(matches!(spoken, Spoken::Slot(_)));
        assert!(engine.slot(Slot::SelectionRead).is_playing());

        let none = pronounce("荷塘", &failing_assistant(), &mut engine, &NoSpeech, &AudioConfig::default()).await;
        assert_eq!(none, Err(SpeakError::Unavailable));
    }
}
