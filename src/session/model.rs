//! Session data model: the artifacts a learning session accumulates.
//!
//! | Type | Produced by | Lifetime |
//! |------|-------------|----------|
//! | [`Article`] | compose phase | replaced wholesale on re-compose |
//! | [`Vocabulary`] | vocab flow / reader selection | append, remove, enrich |
//! | [`Note`] | reader analysis | append, edit, remove |
//! | [`VideoScript`] | outline phase | cached per article |
//! | [`QuizQuestion`] | vocab flow | discarded on phase exit |
//! | [`GeneratedExercise`] | workshop | per workshop visit |
//!
//! Field names serialise in camelCase so the same structs can be parsed
//! straight out of structured generation output.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Article
// ---------------------------------------------------------------------------

/// The text being studied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub content: String,
    /// Content split on blank-line boundaries, trimmed, empties dropped.
    pub paragraphs: Vec<String>,
}

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

/// One vocabulary entry.
///
/// Entries saved from a reader selection carry only `id`, `word`, `pinyin`
/// and `context`; the remaining fields are filled later by
/// [`Vocabulary::enrich_from`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vocabulary {
    pub id: String,
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinyin: Option<String>,
    #[serde(default)]
    pub definition: String,
    /// The sentence where the word appeared.
    #[serde(default)]
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_sentence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<String>,
    /// 1–3 stars.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_hint: Option<String>,
}

impl Vocabulary {
    /// Entry saved manually from a reader selection.
    pub fn from_selection(text: &str, pinyin: Option<String>) -> Self {
        Self {
            id: next_id(),
            word: text.to_string(),
            pinyin,
            definition: String::new(),
            context: text.to_string(),
            ..Self::default()
        }
    }

    /// Fill every absent field from `extra`.  Present fields are never
    /// overwritten; an empty `definition` counts as absent.
    pub fn enrich_from(&mut self, extra: &Vocabulary) {
        fn fill(slot: &mut Option<String>, from: &Option<String>) {
            if slot.as_deref().map_or(true, str::is_empty) {
                if let Some(v) = from.as_ref().filter(|v| !v.is_empty()) {
                    *slot = Some(v.clone());
                }
            }
        }

        fill(&mut self.pinyin, &extra.pinyin);
        fill(&mut self.image_url, &extra.image_url);
        fill(&mut self.example_sentence, &extra.example_sentence);
        fill(&mut self.part_of_speech, &extra.part_of_speech);
        fill(&mut self.context_hint, &extra.context_hint);

        if self.definition.is_empty() && !extra.definition.is_empty() {
            self.definition = extra.definition.clone();
        }
        if self.context.is_empty() && !extra.context.is_empty() {
            self.context = extra.context.clone();
        }
        if self.difficulty.is_none() {
            self.difficulty = extra.difficulty.map(clamp_difficulty);
        }
    }
}

/// Clamp a difficulty rating into the 1–3 star range.
pub fn clamp_difficulty(d: u8) -> u8 {
    d.clamp(1, 3)
}

// ---------------------------------------------------------------------------
// Note
// ---------------------------------------------------------------------------

/// A reading note created from an analysed selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub selected_text: String,
    pub ai_analysis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_comment: Option<String>,
}

impl Note {
    pub fn new(selected_text: &str, ai_analysis: &str) -> Self {
        Self {
            id: next_id(),
            selected_text: selected_text.to_string(),
            ai_analysis: ai_analysis.to_string(),
            user_comment: None,
        }
    }
}

// ---------------------------------------------------------------------------
// VideoScript
// ---------------------------------------------------------------------------

/// Six-dimension guided-reading outline.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VideoScript {
    /// Lead-in.
    pub intro: String,
    /// Overall structure of the article.
    pub framework: String,
    /// Structural highlights.
    pub highlights: String,
    /// Emotional arc.
    pub emotion: String,
    /// Core theme.
    pub theme: String,
    /// Transfer / extension.
    pub transfer: String,
}

// ---------------------------------------------------------------------------
// QuizQuestion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// Multiple choice; `correct_answer` is the text of one option.
    Choice,
    /// True/false; `correct_answer` is `"true"` or `"false"`.
    Judge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub correct_answer: String,
    pub explanation: String,
    #[serde(default)]
    pub related_word: String,
}

impl QuizQuestion {
    /// Answer choices to present: the options for `Choice`, `true`/`false`
    /// for `Judge`.
    pub fn choices(&self) -> Vec<String> {
        match self.kind {
            QuestionKind::Choice => self.options.clone().unwrap_or_default(),
            QuestionKind::Judge => vec!["true".into(), "false".into()],
        }
    }
}

// ---------------------------------------------------------------------------
// GeneratedExercise / ChatMessage
// ---------------------------------------------------------------------------

/// AI-generated post-reading exercise material.
///
/// The cloze fields are HTML with `<input … data-answer="…" />` blanks.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedExercise {
    /// Short summary with 3–5 blanks.
    #[serde(default)]
    pub cloze_text: String,
    /// The article itself with blanks at key expressions.
    #[serde(default)]
    pub original_cloze_text: String,
    #[serde(default)]
    pub writing_prompt: String,
    #[serde(default)]
    pub writing_tips: Vec<String>,
}

impl GeneratedExercise {
    pub fn is_empty(&self) -> bool {
        self.cloze_text.is_empty()
            && self.original_cloze_text.is_empty()
            && self.writing_prompt.is_empty()
            && self.writing_tips.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Ai,
}

/// One turn of the writing-coach conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Ai,
            text: text.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Millisecond timestamp, used as the id prefix for generated entities.
pub fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Unique id: millisecond timestamp plus a per-process counter, so two
/// entities created in the same millisecond never collide.
pub fn next_id() -> String {
    let n = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{n}", now_millis())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
