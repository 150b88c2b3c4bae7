//! The learning-session state machine.
//!
//! [`LearningSession`] is the single owner of the session aggregates
//! ([`Article`], vocabulary, notes, cached outline).  Every mutation goes
//! through one of its command methods; the reader, vocabulary flow and
//! workshop only ever hand it new artifacts.
//!
//! A command invoked from the wrong phase returns
//! [`SessionError::InvalidTransition`] and leaves every aggregate untouched.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use super::model::{Article, Note, VideoScript, Vocabulary};
use super::state::{Phase, SessionSnapshot};
use super::usage::{NoopUsage, UsageRecorder};

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A command was issued from a phase that does not allow it.
    #[error("`{action}` is not valid in the {phase} phase")]
    InvalidTransition { action: &'static str, phase: Phase },

    /// A note id did not match any note.
    #[error("no note with id {0}")]
    UnknownNote(String),
}

// ---------------------------------------------------------------------------
// LearningSession
// ---------------------------------------------------------------------------

pub struct LearningSession {
    phase: Phase,
    article: Option<Article>,
    vocab: Vec<Vocabulary>,
    notes: Vec<Note>,
    outline: Option<VideoScript>,
    sidebar_open: bool,
    usage: Arc<dyn UsageRecorder>,
    phase_tx: watch::Sender<Phase>,
}

impl LearningSession {
    /// Session in the compose phase that records no usage.
    pub fn new() -> Self {
        Self::with_usage(Arc::new(NoopUsage))
    }

    /// Session that reports one unit of usage per entry into reading.
    pub fn with_usage(usage: Arc<dyn UsageRecorder>) -> Self {
        let (phase_tx, _) = watch::channel(Phase::Compose);
        Self {
            phase: Phase::Compose,
            article: None,
            vocab: Vec::new(),
            notes: Vec::new(),
            outline: None,
            sidebar_open: true,
            usage,
            phase_tx,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn article(&self) -> Option<&Article> {
        self.article.as_ref()
    }

    pub fn vocab(&self) -> &[Vocabulary] {
        &self.vocab
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Cached outline for the current article, if one was generated.
    pub fn outline(&self) -> Option<&VideoScript> {
        self.outline.as_ref()
    }

    pub fn sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    /// Receiver notified on every phase change.
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase_tx.subscribe()
    }

    /// Owned copy of the four aggregates for export.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            article: self.article.clone(),
            vocab: self.vocab.clone(),
            notes: self.notes.clone(),
            outline: self.outline.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Phase transitions
    // -----------------------------------------------------------------------

    /// Store the composed article and move on to the outline.
    ///
    /// Composing a different article drops the cached outline; re-submitting
    /// the same article keeps it.
    pub fn complete(&mut self, article: Article) -> Result<(), SessionError> {
        self.guard("complete", &[Phase::Compose])?;

        if self.article.as_ref() != Some(&article) {
            self.outline = None;
        }
        self.article = Some(article);
        self.set_phase(Phase::Outline);
        Ok(())
    }

    pub fn start_reading(&mut self) -> Result<(), SessionError> {
        self.guard("start_reading", &[Phase::Outline, Phase::VocabLearning])?;
        self.enter_reading();
        Ok(())
    }

    pub fn start_vocab(&mut self) -> Result<(), SessionError> {
        self.guard("start_vocab", &[Phase::Outline])?;
        self.set_phase(Phase::VocabLearning);
        Ok(())
    }

    /// Append the learned vocabulary and move on to reading.
    pub fn complete_vocab(&mut self, learned: Vec<Vocabulary>) -> Result<(), SessionError> {
        self.guard("complete_vocab", &[Phase::VocabLearning])?;
        self.vocab.extend(learned);
        self.enter_reading();
        Ok(())
    }

    pub fn finish_reading(&mut self) -> Result<(), SessionError> {
        self.guard("finish_reading", &[Phase::Reading])?;
        self.sidebar_open = false;
        self.set_phase(Phase::Workshop);
        Ok(())
    }

    /// Step back one phase without losing data.
    ///
    /// Outline → Compose keeps the article so the editor can offer it for
    /// editing; VocabLearning and Reading return to the outline.
    pub fn back(&mut self) -> Result<(), SessionError> {
        let target = match self.phase {
            Phase::Outline => Phase::Compose,
            Phase::VocabLearning | Phase::Reading => Phase::Outline,
            phase => {
                return Err(SessionError::InvalidTransition {
                    action: "back",
                    phase,
                })
            }
        };
        self.set_phase(target);
        Ok(())
    }

    /// Clear every aggregate and return to composition.  Valid from any phase.
    pub fn reset(&mut self) {
        self.article = None;
        self.vocab.clear();
        self.notes.clear();
        self.outline = None;
        self.sidebar_open = true;
        self.set_phase(Phase::Compose);
    }

    // -----------------------------------------------------------------------
    // Aggregate mutation
    // -----------------------------------------------------------------------

    /// Cache the generated outline.  Valid while the outline phase is shown.
    pub fn set_outline(&mut self, script: VideoScript) -> Result<(), SessionError> {
        self.guard("set_outline", &[Phase::Outline])?;
        self.outline = Some(script);
        Ok(())
    }

    pub fn add_vocab(&mut self, vocab: Vocabulary) -> Result<(), SessionError> {
        self.guard("add_vocab", &[Phase::Reading])?;
        log::debug!("session: vocab added ({})", vocab.word);
        self.vocab.push(vocab);
        Ok(())
    }

    pub fn add_note(&mut self, note: Note) -> Result<(), SessionError> {
        self.guard("add_note", &[Phase::Reading])?;
        self.notes.push(note);
        Ok(())
    }

    /// Remove one vocabulary entry.  Returns whether anything was removed.
    pub fn remove_vocab(&mut self, id: &str) -> bool {
        let before = self.vocab.len();
        self.vocab.retain(|v| v.id != id);
        self.vocab.len() != before
    }

    /// Remove one note.  Returns whether anything was removed.
    pub fn remove_note(&mut self, id: &str) -> bool {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        self.notes.len() != before
    }

    /// Replace a note's analysis text with the user's edit.
    pub fn update_note(&mut self, id: &str, analysis: &str) -> Result<(), SessionError> {
        let note = self
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| SessionError::UnknownNote(id.to_string()))?;
        note.ai_analysis = analysis.to_string();
        Ok(())
    }

    /// Merge enriched entries into the vocabulary list, matched by `word`.
    ///
    /// Non-destructive: only absent fields are filled.  Entries without a
    /// match are left as they are; extra enriched entries are ignored.
    pub fn apply_enrichment(&mut self, enriched: &[Vocabulary]) {
        for v in &mut self.vocab {
            if let Some(extra) = enriched.iter().find(|e| e.word == v.word) {
                v.enrich_from(extra);
            }
        }
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn guard(&self, action: &'static str, allowed: &[Phase]) -> Result<(), SessionError> {
        if allowed.contains(&self.phase) {
            return Ok(());
        }
        log::warn!("session: rejected `{action}` in {} phase", self.phase);
        Err(SessionError::InvalidTransition {
            action,
            phase: self.phase,
        })
    }

    fn enter_reading(&mut self) {
        self.set_phase(Phase::Reading);
        self.usage.record();
    }

    fn set_phase(&mut self, phase: Phase) {
        log::debug!("session: {} → {}", self.phase, phase);
        self.phase = phase;
        self.phase_tx.send_replace(phase);
    }
}

impl Default for LearningSession {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
