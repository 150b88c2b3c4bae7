//! JSON schemas for structured generation and validated parsing of the
//! responses into session types.
//!
//! Every `parse_*` function either returns a fully-typed value or an
//! [`LlmError`]; malformed output never reaches business logic.  List
//! responses drop individually invalid items (logged at `debug`) and keep
//! the rest.

use serde::Deserialize;
use serde_json::json;

use crate::llm::client::LlmError;
use crate::session::{
    clamp_difficulty, GeneratedExercise, QuestionKind, QuizQuestion, VideoScript, Vocabulary,
};

/// Placeholder for an outline field the model left blank.
pub const OUTLINE_PENDING: &str = "内容生成中，请稍后再试。";

// ---------------------------------------------------------------------------
// Schemas
// ---------------------------------------------------------------------------

pub fn outline_schema() -> serde_json::Value {
    let field = |desc: &str| json!({ "type": "string", "description": desc });
    json!({
        "type": "object",
        "properties": {
            "intro":      field("Lead-in"),
            "framework":  field("Article structure"),
            "highlights": field("Structural highlights"),
            "emotion":    field("Emotional arc"),
            "theme":      field("Core theme"),
            "transfer":   field("Transfer / extension"),
        },
        "required": ["intro", "framework", "highlights", "emotion", "theme", "transfer"],
    })
}

pub fn vocabulary_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "words": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "word":            { "type": "string" },
                        "pinyin":          { "type": "string" },
                        "definition":      { "type": "string" },
                        "partOfSpeech":    { "type": "string" },
                        "difficulty":      { "type": "number" },
                        "exampleSentence": { "type": "string" },
                        "contextHint":     { "type": "string" },
                        "context":         { "type": "string" },
                    },
                    "required": ["word"],
                },
            },
        },
        "required": ["words"],
    })
}

pub fn quiz_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "questions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "id":            { "type": "string" },
                        "type":          { "type": "string", "enum": ["choice", "judge"] },
                        "question":      { "type": "string" },
                        "options":       { "type": "array", "items": { "type": "string" } },
                        "correctAnswer": { "type": "string" },
                        "explanation":   { "type": "string" },
                        "relatedWord":   { "type": "string" },
                    },
                    "required": ["id", "type", "question", "correctAnswer", "explanation"],
                },
            },
        },
        "required": ["questions"],
    })
}

pub fn enrich_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "enriched": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "word":            { "type": "string" },
                        "pinyin":          { "type": "string" },
                        "definition":      { "type": "string" },
                        "partOfSpeech":    { "type": "string" },
                        "difficulty":      { "type": "number" },
                        "exampleSentence": { "type": "string" },
                    },
                    "required": ["word"],
                },
            },
        },
        "required": ["enriched"],
    })
}

pub fn workshop_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "clozeText":         { "type": "string" },
            "originalClozeText": { "type": "string" },
            "writingPrompt":     { "type": "string" },
            "writingTips":       { "type": "array", "items": { "type": "string" } },
        },
        "required": ["clozeText", "originalClozeText", "writingPrompt", "writingTips"],
    })
}

pub fn guidance_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "reply":        { "type": "string", "description": "Reply to the student" },
            "draftContent": { "type": "string", "description": "Text to add to the draft" },
        },
        "required": ["reply"],
    })
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawWord {
    word: Option<String>,
    pinyin: Option<String>,
    definition: Option<String>,
    part_of_speech: Option<String>,
    difficulty: Option<f64>,
    example_sentence: Option<String>,
    context_hint: Option<String>,
    context: Option<String>,
}

impl RawWord {
    /// `None` when the word itself is missing or blank.
    fn into_vocabulary(self, id: String) -> Option<Vocabulary> {
        let word = self.word.map(|w| w.trim().to_string()).filter(|w| !w.is_empty())?;
        let non_empty = |s: Option<String>| s.filter(|s| !s.trim().is_empty());

        Some(Vocabulary {
            id,
            context: non_empty(self.context).unwrap_or_else(|| word.clone()),
            word,
            pinyin: non_empty(self.pinyin),
            definition: self.definition.unwrap_or_default(),
            image_url: None,
            example_sentence: non_empty(self.example_sentence),
            part_of_speech: non_empty(self.part_of_speech),
            difficulty: self
                .difficulty
                .filter(|d| d.is_finite())
                .map(|d| clamp_difficulty(d.round().clamp(0.0, 255.0) as u8)),
            context_hint: non_empty(self.context_hint),
        })
    }
}

#[derive(Debug, Deserialize)]
struct WordList {
    #[serde(default, alias = "enriched")]
    words: Vec<RawWord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawQuestion {
    id: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    question: String,
    options: Option<Vec<String>>,
    correct_answer: String,
    explanation: String,
    related_word: String,
}

#[derive(Debug, Deserialize)]
struct QuestionList {
    #[serde(default)]
    questions: Vec<RawQuestion>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawOutline {
    intro: String,
    framework: String,
    highlights: String,
    emotion: String,
    theme: String,
    transfer: String,
}

/// Writing-coach reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidanceReply {
    pub reply: String,
    #[serde(default)]
    pub draft_content: Option<String>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Strip an optional Markdown code fence around a JSON body.
fn json_body(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn from_json<'a, T: Deserialize<'a>>(text: &'a str) -> Result<T, LlmError> {
    serde_json::from_str(json_body(text)).map_err(|e| LlmError::Parse(e.to_string()))
}

/// Parse an outline; blank fields become [`OUTLINE_PENDING`].  A response
/// with every field blank is rejected.
pub fn parse_outline(text: &str) -> Result<VideoScript, LlmError> {
    let raw: RawOutline = from_json(text)?;
    let fields = [
        &raw.intro,
        &raw.framework,
        &raw.highlights,
        &raw.emotion,
        &raw.theme,
        &raw.transfer,
    ];
    if fields.iter().all(|f| f.trim().is_empty()) {
        return Err(LlmError::Schema("outline has no content".into()));
    }

    let fill = |s: String| {
        if s.trim().is_empty() {
            OUTLINE_PENDING.to_string()
        } else {
            s
        }
    };
    Ok(VideoScript {
        intro: fill(raw.intro),
        framework: fill(raw.framework),
        highlights: fill(raw.highlights),
        emotion: fill(raw.emotion),
        theme: fill(raw.theme),
        transfer: fill(raw.transfer),
    })
}

/// Parse extracted vocabulary.  Ids are `auto-vocab-<stamp>-<index>`.
pub fn parse_vocabulary(text: &str, stamp: u128) -> Result<Vec<Vocabulary>, LlmError> {
    let list: WordList = from_json(text)?;
    Ok(list
        .words
        .into_iter()
        .enumerate()
        .filter_map(|(i, raw)| {
            let parsed = raw.into_vocabulary(format!("auto-vocab-{stamp}-{i}"));
            if parsed.is_none() {
                log::debug!("dropping vocabulary item {i} without a word");
            }
            parsed
        })
        .collect())
}

/// Parse enrichment records.  Only `word` is required; ids are left empty
/// since enrichment matches on `word`.
pub fn parse_enrichment(text: &str) -> Result<Vec<Vocabulary>, LlmError> {
    let list: WordList = from_json(text)?;
    Ok(list
        .words
        .into_iter()
        .filter_map(|raw| raw.into_vocabulary(String::new()))
        .collect())
}

/// Parse quiz questions, dropping items that fail validation.
pub fn parse_quiz(text: &str) -> Result<Vec<QuizQuestion>, LlmError> {
    let list: QuestionList = from_json(text)?;
    Ok(list
        .questions
        .into_iter()
        .enumerate()
        .filter_map(|(i, raw)| match validate_question(i, raw) {
            Ok(q) => Some(q),
            Err(reason) => {
                log::debug!("dropping quiz question {i}: {reason}");
                None
            }
        })
        .collect())
}

fn validate_question(index: usize, raw: RawQuestion) -> Result<QuizQuestion, &'static str> {
    if raw.question.trim().is_empty() {
        return Err("empty question");
    }
    let answer = raw.correct_answer.trim().to_string();
    if answer.is_empty() {
        return Err("missing correct answer");
    }

    let (kind, options, correct_answer) = match raw.kind.trim().to_ascii_lowercase().as_str() {
        "choice" => {
            let options: Vec<String> = raw
                .options
                .unwrap_or_default()
                .into_iter()
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
            if !options.contains(&answer) {
                return Err("answer is not one of the options");
            }
            (QuestionKind::Choice, Some(options), answer)
        }
        "judge" => {
            let answer = answer.to_ascii_lowercase();
            if answer != "true" && answer != "false" {
                return Err("judge answer must be true or false");
            }
            (QuestionKind::Judge, None, answer)
        }
        _ => return Err("unknown question type"),
    };

    Ok(QuizQuestion {
        id: raw
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("q{}", index + 1)),
        kind,
        question: raw.question,
        options,
        correct_answer,
        explanation: raw.explanation,
        related_word: raw.related_word,
    })
}

pub fn parse_exercise(text: &str) -> Result<GeneratedExercise, LlmError> {
    let exercise: GeneratedExercise = from_json(text)?;
    if exercise.is_empty() {
        return Err(LlmError::Schema("exercise has no content".into()));
    }
    Ok(exercise)
}

pub fn parse_guidance(text: &str) -> Result<GuidanceReply, LlmError> {
    let mut reply: GuidanceReply = from_json(text)?;
    if reply.reply.trim().is_empty() {
        return Err(LlmError::Schema("guidance reply is empty".into()));
    }
    reply.draft_content = reply.draft_content.filter(|d| !d.trim().is_empty());
    Ok(reply)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
