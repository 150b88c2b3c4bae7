//! Post-reading workshop: cloze practice, flashcards, the writing coach
//! and plain-text exports, all derived from the session snapshot.
//!
//! # Flow
//!
//! ```text
//! SessionSnapshot ─┬─ workshop_exercise ─┐  (tokio::join!)
//!                  └─ enrich_vocabulary ─┴─▶ Workshop
//!                                             ├─ cloze()        per-paragraph blanks
//!                                             ├─ flashcards()   placeholder images
//!                                             ├─ coach()        WritingCoach
//!                                             └─ *_text()       exports
//! ```
//!
//! Neither fetch can block the view: a failed exercise is empty and a
//! failed enrichment leaves the vocabulary as it was.

pub mod cloze;
pub mod coach;
pub mod export;
pub mod flashcards;

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::llm::ReadingAssistant;
use crate::session::{Article, GeneratedExercise, Note, SessionSnapshot, VideoScript, Vocabulary};

pub use cloze::{cloze_article, cloze_paragraph, render_html, score_blanks, ClozeSegment};
pub use coach::{QuickAction, WritingCoach};
pub use export::{
    notes_file_name, notes_text, outline_file_name, outline_text, report_file_name, report_text,
    share_text, write_export,
};
pub use flashcards::{placeholder_image, with_placeholders, Flashcards};

/// Shown in place of the outline export when none was generated.
pub const OUTLINE_MISSING: &str = "请先在“文章导读”步骤生成导读大纲，然后返回此处导出。";

pub struct Workshop {
    article: Article,
    vocab: Vec<Vocabulary>,
    notes: Vec<Note>,
    outline: Option<VideoScript>,
    exercise: GeneratedExercise,
}

impl Workshop {
    /// Fetch the exercise and enrich the vocabulary concurrently.
    ///
    /// Returns `None` when the snapshot has no article.
    pub async fn prepare(assistant: &ReadingAssistant, snapshot: &SessionSnapshot) -> Option<Self> {
        let article = snapshot.article.clone()?;
        let (exercise, enriched) = tokio::join!(
            assistant.workshop_exercise(&article.content, &snapshot.vocab, &snapshot.notes),
            assistant.enrich_vocabulary(snapshot.vocab.clone()),
        );
        log::info!(
            "workshop ready: {} words, {} notes, exercise {}",
            enriched.len(),
            snapshot.notes.len(),
            if exercise.is_empty() { "empty" } else { "loaded" }
        );

        Some(Self {
            article,
            vocab: with_placeholders(enriched),
            notes: snapshot.notes.clone(),
            outline: snapshot.outline.clone(),
            exercise,
        })
    }

    pub fn article(&self) -> &Article {
        &self.article
    }

    /// Enriched vocabulary; every entry has an image.
    pub fn vocab(&self) -> &[Vocabulary] {
        &self.vocab
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn exercise(&self) -> &GeneratedExercise {
        &self.exercise
    }

    pub fn cloze(&self) -> Vec<Vec<ClozeSegment>> {
        cloze_article(&self.article.paragraphs, &self.vocab)
    }

    pub fn flashcards(&self) -> Flashcards {
        Flashcards::new(self.vocab.clone())
    }

    pub fn coach(&self) -> WritingCoach {
        WritingCoach::from_exercise(&self.exercise, &self.article.content)
    }

    // ----- Exports -------------------------------------------------------

    pub fn notes_text(&self, now: NaiveDateTime) -> Option<String> {
        notes_text(&self.article.title, &self.notes, now)
    }

    /// Outline export, or [`OUTLINE_MISSING`] as the error when the outline
    /// step was skipped.
    pub fn outline_text(&self, now: NaiveDateTime) -> Result<String, &'static str> {
        self.outline
            .as_ref()
            .map(|o| outline_text(&self.article.title, o, now))
            .ok_or(OUTLINE_MISSING)
    }

    pub fn report_text(&self, now: NaiveDateTime) -> String {
        report_text(&self.article.title, &self.vocab, &self.notes, now)
    }

    pub fn report_subject(&self) -> String {
        format!("《智读·精练》学习成果报告 - {}", self.article.title)
    }

    pub fn share_text(&self) -> String {
        share_text(&self.article.title, self.vocab.len(), self.notes.len())
    }

    /// Write every available export into `dir`.
    pub fn save_exports(&self, dir: &Path, now: NaiveDateTime) -> anyhow::Result<Vec<PathBuf>> {
        let title = &self.article.title;
        let mut written = Vec::new();
        if let Some(notes) = self.notes_text(now) {
            written.push(write_export(dir, &notes_file_name(title), &notes)?);
        }
        if let Ok(outline) = self.outline_text(now) {
            written.push(write_export(dir, &outline_file_name(title), &outline)?);
        }
        written.push(write_export(
            dir,
            &report_file_name(title),
            &self.report_text(now),
        )?);
        Ok(written)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
