//! Guided-reading outline: the phase between composition and reading.
//!
//! # Flow
//!
//! ```text
//! OutlineGuide::new(session)      seeded from LearningSession::outline()
//!   ├─ cached  → Ready(script)
//!   └─ none    → Idle
//!
//! generate()  Idle | Failed ──▶ Generating ──▶ Ready(script) ──▶ session.set_outline
//!                                        └──▶ Failed(msg)      (retry allowed)
//!
//! play_section(s)   same section while playing → stop
//!                   otherwise → stop, outline_lecture → speech → AnalysisLecture slot
//! ```
//!
//! The cover image is requested at most once per guide; `None` is a normal
//! outcome and simply means no cover is shown.

pub mod section;

use thiserror::Error;

use crate::audio::{speak, AudioEngine, LocalSpeech, SpeakError, Slot, Spoken};
use crate::config::AudioConfig;
use crate::llm::{LlmError, ReadingAssistant};
use crate::session::{Article, LearningSession, VideoScript};

pub use section::{full_text, OutlineSection};

/// Shown when outline generation fails.
pub const GENERATION_FAILED: &str = "脚本生成失败，请检查 API Key 或稍后再试。";
/// Shown when a section lecture could not be voiced.
pub const LECTURE_FAILED: &str = "音频生成失败，请稍后再试。";

/// Lectures play on the same slot as analysis narration; the two views are
/// never visible together.
const LECTURE_SLOT: Slot = Slot::AnalysisLecture;

// ---------------------------------------------------------------------------
// OutlineError / OutlineStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum OutlineError {
    #[error("the session has no article")]
    NoArticle,

    #[error("the outline has not been generated")]
    NotReady,

    #[error("outline generation failed: {0}")]
    Generation(#[source] LlmError),

    #[error("lecture audio failed: {0}")]
    Lecture(#[source] SpeakError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutlineStatus {
    Idle,
    Generating,
    Ready(VideoScript),
    Failed(String),
}

/// Result of [`OutlineGuide::play_section`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SectionPlayback {
    /// The section was already playing and has been stopped.
    Stopped,
    Started(Spoken),
}

// ---------------------------------------------------------------------------
// OutlineGuide
// ---------------------------------------------------------------------------

pub struct OutlineGuide {
    article: Article,
    status: OutlineStatus,
    cover: Option<String>,
    cover_requested: bool,
    playing: Option<OutlineSection>,
}

impl OutlineGuide {
    /// Guide for the session's article, reusing a cached outline when the
    /// session has one.
    pub fn new(session: &LearningSession) -> Result<Self, OutlineError> {
        let article = session.article().cloned().ok_or(OutlineError::NoArticle)?;
        let status = match session.outline() {
            Some(script) => OutlineStatus::Ready(script.clone()),
            None => OutlineStatus::Idle,
        };
        Ok(Self {
            article,
            status,
            cover: None,
            cover_requested: false,
            playing: None,
        })
    }

    pub fn article(&self) -> &Article {
        &self.article
    }

    pub fn status(&self) -> &OutlineStatus {
        &self.status
    }

    pub fn script(&self) -> Option<&VideoScript> {
        match &self.status {
            OutlineStatus::Ready(script) => Some(script),
            _ => None,
        }
    }

    pub fn cover(&self) -> Option<&str> {
        self.cover.as_deref()
    }

    /// Section whose lecture is currently playing.
    pub fn playing(&self) -> Option<OutlineSection> {
        self.playing
    }

    /// Plain text of the whole outline, empty until it is ready.
    pub fn full_text(&self) -> String {
        self.script().map(full_text).unwrap_or_default()
    }

    /// Produce the outline, from the cache when one exists, and hand it to
    /// the session.
    pub async fn generate(
        &mut self,
        assistant: &ReadingAssistant,
        session: &mut LearningSession,
    ) -> Result<&VideoScript, OutlineError> {
        let script = match self.script().cloned() {
            Some(script) => script,
            None => {
                self.status = OutlineStatus::Generating;
                match assistant.generate_outline(&self.article.content).await {
                    Ok(script) => script,
                    Err(e) => {
                        self.status = OutlineStatus::Failed(GENERATION_FAILED.to_string());
                        return Err(OutlineError::Generation(e));
                    }
                }
            }
        };

        if let Err(e) = session.set_outline(script.clone()) {
            log::warn!("outline not cached: {e}");
        }
        self.status = OutlineStatus::Ready(script);
        self.script().ok_or(OutlineError::NotReady)
    }

    /// Fetch the cover art on first call; later calls return the stored
    /// result without asking again.
    pub async fn load_cover(&mut self, assistant: &ReadingAssistant) -> Option<&str> {
        if !self.cover_requested {
            self.cover_requested = true;
            self.cover = assistant
                .cover_image(&self.article.title, &self.article.content)
                .await;
        }
        self.cover.as_deref()
    }

    /// Spoken lecture text for one section.
    pub async fn lecture_for(
        &self,
        assistant: &ReadingAssistant,
        section: OutlineSection,
    ) -> Result<String, OutlineError> {
        let script = self.script().ok_or(OutlineError::NotReady)?;
        Ok(assistant
            .outline_lecture(&section.title(), section.content(script), &self.article.title)
            .await)
    }

    /// Toggle the lecture for `section`.
    pub async fn play_section(
        &mut self,
        section: OutlineSection,
        assistant: &ReadingAssistant,
        engine: &mut AudioEngine,
        local: &dyn LocalSpeech,
        audio: &AudioConfig,
    ) -> Result<SectionPlayback, OutlineError> {
        self.sync(engine);
        engine.stop(LECTURE_SLOT);
        local.cancel();
        if self.playing.take() == Some(section) {
            return Ok(SectionPlayback::Stopped);
        }

        let lecture = self.lecture_for(assistant, section).await?;
        let outcome = assistant.speech(&lecture).await;
        match speak(engine, LECTURE_SLOT, outcome, local, audio) {
            Ok(spoken) => {
                if matches!(spoken, Spoken::Slot(_)) {
                    self.playing = Some(section);
                }
                Ok(SectionPlayback::Started(spoken))
            }
            Err(e) => {
                log::error!("lecture for {} failed: {e}", section.key());
                Err(OutlineError::Lecture(e))
            }
        }
    }

    /// Clear the playing marker once the lecture has run out.
    pub fn sync(&mut self, engine: &AudioEngine) {
        if self.playing.is_some() && !engine.slot(LECTURE_SLOT).is_playing() {
            self.playing = None;
        }
    }

    /// Stop any lecture; call when leaving the outline.
    pub fn close(&mut self, engine: &mut AudioEngine) {
        engine.stop(LECTURE_SLOT);
        self.playing = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
