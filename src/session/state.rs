//! Learning-session phases and the read-only session snapshot.
//!
//! [`Phase`] drives the session's state machine.  The surrounding
//! application watches it (see [`LearningSession::subscribe`]) to decide
//! which view and which auxiliary panels to show.
//!
//! [`LearningSession::subscribe`]: crate::session::LearningSession::subscribe

use super::model::{Article, Note, VideoScript, Vocabulary};

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Phases of a learning session.
///
/// ```text
/// Compose ──complete──▶ Outline ──start_vocab──▶ VocabLearning
///                          │                        │
///                          └──start_reading──▶ Reading ◀──complete_vocab / start_reading
///                                                   │
///                                        finish_reading
///                                                   ▼
///                                               Workshop
/// any phase ──reset──▶ Compose
/// back: Outline → Compose, VocabLearning → Outline, Reading → Outline
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// Entering or editing the article text.
    #[default]
    Compose,
    /// AI-generated guided-reading outline.
    Outline,
    /// Word cards followed by a quiz.
    VocabLearning,
    /// Close reading with narration, selection analysis and note taking.
    Reading,
    /// Post-reading exercises and exports.
    Workshop,
}

impl Phase {
    /// Every phase except composition requires an article.
    ///
    /// ```
    /// use smartread::session::Phase;
    ///
    /// assert!(!Phase::Compose.requires_article());
    /// assert!(Phase::Outline.requires_article());
    /// assert!(Phase::Workshop.requires_article());
    /// ```
    pub fn requires_article(&self) -> bool {
        !matches!(self, Phase::Compose)
    }

    /// Whether the vocabulary/notes sidebar is meaningful in this phase.
    pub fn shows_sidebar(&self) -> bool {
        matches!(self, Phase::Reading)
    }

    /// A short human-readable label suitable for navigation.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Compose => "Compose",
            Phase::Outline => "Outline",
            Phase::VocabLearning => "Vocabulary",
            Phase::Reading => "Reading",
            Phase::Workshop => "Workshop",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// SessionSnapshot
// ---------------------------------------------------------------------------

/// Owned copy of the four session aggregates, readable at any time for
/// export and print features.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub article: Option<Article>,
    pub vocab: Vec<Vocabulary>,
    pub notes: Vec<Note>,
    pub outline: Option<VideoScript>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_phase_is_compose() {
        assert_eq!(Phase::default(), Phase::Compose);
    }

    #[test]
    fn only_reading_shows_sidebar() {
        assert!(Phase::Reading.shows_sidebar());
        assert!(!Phase::Workshop.shows_sidebar());
        assert!(!Phase::Compose.shows_sidebar());
    }

    #[test]
    fn labels() {
        assert_eq!(Phase::VocabLearning.label(), "Vocabulary");
        assert_eq!(Phase::Workshop.to_string(), "Workshop");
    }

    #[test]
    fn empty_snapshot() {
        let snap = SessionSnapshot::default();
        assert!(snap.article.is_none());
        assert!(snap.vocab.is_empty());
        assert!(snap.notes.is_empty());
        assert!(snap.outline.is_none());
    }
}
