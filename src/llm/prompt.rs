//! Prompt builder for every reading-companion generation call.
//!
//! Each method returns a ready [`GenerationRequest`]; structured calls carry
//! the JSON schema from [`crate::llm::schema`].  Source text is truncated on
//! `char` boundaries by the caller-supplied limits so prompts stay bounded.
//!
//! Output language is Chinese throughout; the grade level only changes the
//! register of the selection analysis.

use crate::config::GradeLevel;
use crate::llm::client::GenerationRequest;
use crate::llm::schema;
use crate::session::{ChatMessage, Note, Vocabulary};

// ---------------------------------------------------------------------------
// System instructions
// ---------------------------------------------------------------------------

const SYSTEM_ANALYSIS: &str = "\
You are a Chinese literature teacher. Answer in Chinese.
Rules:
1. No introductory phrases. Start directly.
2. Structure the answer as:
   - Meaning: what the passage says (1-2 sentences).
   - Expression: technique and emotion.";

const SYSTEM_EDITOR: &str = "\
You are a professional Chinese text editor.
Rules:
1. Return ONLY the formatted text. No explanations.
2. Never rewrite or summarise the content.
3. Start each paragraph with two full-width spaces.
4. Use full-width Chinese punctuation.
5. Merge lines broken in the middle of a sentence.
6. Separate paragraphs with one blank line.";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Longest prefix of `text` holding at most `max_chars` characters.
///
/// ```
/// use smartread::llm::truncate_chars;
///
/// assert_eq!(truncate_chars("荷塘月色", 2), "荷塘");
/// assert_eq!(truncate_chars("abc", 10), "abc");
/// ```
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn join_words(vocab: &[Vocabulary]) -> String {
    vocab
        .iter()
        .map(|v| v.word.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds generation requests for the reading companion.
///
/// # Example
/// ```rust
/// use smartread::config::GradeLevel;
/// use smartread::llm::PromptBuilder;
///
/// let builder = PromptBuilder::new(GradeLevel::Primary);
/// let request = builder.analysis("月色", "荷塘月色全文");
/// assert!(request.prompt.contains("primary school"));
/// assert!(request.schema.is_none());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder {
    grade: GradeLevel,
}

impl PromptBuilder {
    pub fn new(grade: GradeLevel) -> Self {
        Self { grade }
    }

    pub fn grade(&self) -> GradeLevel {
        self.grade
    }

    // ----- Reading -------------------------------------------------------

    /// Concise literary analysis of a selection.  `context` is expected to be
    /// truncated already.
    pub fn analysis(&self, text: &str, context: &str) -> GenerationRequest {
        GenerationRequest::text(format!(
            "Analyse the selected text.\n\
             Selected text: \"{text}\"\n\
             Context: {context}...\n\
             Style: suitable for {} school students.",
            self.grade.as_str()
        ))
        .with_system(SYSTEM_ANALYSIS)
    }

    /// Rewrite an analysis as a spoken explanation.
    pub fn teacher_script(&self, analysis: &str, original: &str) -> GenerationRequest {
        GenerationRequest::text(format!(
            "Rewrite this literature analysis as a teacher speaking to the class.\n\
             Original: \"{original}\"\n\
             Analysis: \"{analysis}\"\n\
             Tone: gentle and educational. No brackets. At most 300 Chinese characters."
        ))
    }

    /// Short transliteration of a selection.
    pub fn pinyin(&self, text: &str) -> GenerationRequest {
        GenerationRequest::text(format!(
            "Provide the pinyin for this text. Return the pinyin only: \"{text}\""
        ))
    }

    // ----- Compose -------------------------------------------------------

    pub fn proofread(&self, text: &str) -> GenerationRequest {
        GenerationRequest::text(format!("Standardise the formatting of this text:\n\"{text}\""))
            .with_system(SYSTEM_EDITOR)
    }

    // ----- Outline -------------------------------------------------------

    pub fn outline(&self, content: &str) -> GenerationRequest {
        GenerationRequest::json(
            format!(
                "You are an expert designer of Chinese reading lessons. Analyse the \
                 structure of the article and produce a six-part guided-reading outline: \
                 intro (lead-in), framework (overall structure), highlights (structural \
                 highlights), emotion (emotional arc), theme (core theme), transfer \
                 (extension to the student's own life).\n\
                 Article: \"{content}...\"\n\
                 Answer with one JSON object only."
            ),
            schema::outline_schema(),
        )
    }

    /// Expand one outline section into a 3–5 sentence spoken lecture.
    pub fn outline_lecture(
        &self,
        section_title: &str,
        section_content: &str,
        article_title: &str,
    ) -> GenerationRequest {
        GenerationRequest::text(format!(
            "Role: a kind literature teacher.\n\
             Expand this point of a reading guide into a spoken lecture of 3-5 sentences.\n\
             Article: {article_title}\n\
             Section: {section_title}\n\
             Content: \"{section_content}\"\n\
             Make it engaging and explain why it matters. At most 400 characters."
        ))
    }

    /// Image prompt for a 16:9 article cover.
    pub fn cover_image(title: &str, content_hint: &str) -> String {
        format!(
            "A 16:9 cover illustration for the article \"{title}\". \
             Style: Chinese aesthetic or modern illustration. Content hint: {content_hint}"
        )
    }

    // ----- Vocabulary ----------------------------------------------------

    pub fn extract_vocabulary(&self, text: &str) -> GenerationRequest {
        GenerationRequest::json(
            format!(
                "Identify 6-8 challenging vocabulary words in: \"{text}...\" \
                 For each give the word, pinyin, definition, part of speech, difficulty \
                 (1-3), an example sentence, a hint about how the article uses it and the \
                 sentence it appears in. Output JSON."
            ),
            schema::vocabulary_schema(),
        )
    }

    pub fn quiz(&self, vocab: &[Vocabulary]) -> GenerationRequest {
        GenerationRequest::json(
            format!(
                "Create a quiz of 4-6 questions for these words: {}. Mix multiple choice \
                 (type \"choice\", correctAnswer is the option text) and true/false \
                 (type \"judge\", correctAnswer is \"true\" or \"false\") questions.",
                join_words(vocab)
            ),
            schema::quiz_schema(),
        )
    }

    pub fn enrich(&self, vocab: &[Vocabulary]) -> GenerationRequest {
        GenerationRequest::json(
            format!(
                "Provide a detailed definition, pinyin, part of speech, difficulty (1-3) \
                 and an example sentence for: {}. Return JSON.",
                join_words(vocab)
            ),
            schema::enrich_schema(),
        )
    }

    // ----- Workshop ------------------------------------------------------

    pub fn workshop(&self, content: &str, vocab: &[Vocabulary], notes: &[Note]) -> GenerationRequest {
        let note_texts = notes
            .iter()
            .map(|n| n.selected_text.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        GenerationRequest::json(
            format!(
                "Based on the article, vocabulary list and reading notes, create a \
                 language exercise.\n\
                 Article: {content}\n\
                 Vocabulary: {}\n\
                 Notes: {note_texts}\n\
                 Requirements:\n\
                 1. clozeText: a short summary with 3-5 blanks, each written as \
                 <input type=\"text\" data-answer=\"answer\" />\n\
                 2. originalClozeText: the article text with at least 5 blanks at key \
                 words or expressions, same blank format.\n\
                 3. writingPrompt: one writing prompt based on the article's theme.\n\
                 4. writingTips: 3 writing tips.\n\
                 Return JSON.",
                join_words(vocab)
            ),
            schema::workshop_schema(),
        )
    }

    /// Writing-coach turn.  `context` is expected to be truncated already.
    pub fn writing_guidance(
        &self,
        prompt: &str,
        draft: &str,
        query: &str,
        history: &[ChatMessage],
        context: &str,
    ) -> GenerationRequest {
        let history_json = serde_json::to_string(history).unwrap_or_else(|_| "[]".into());

        GenerationRequest::json(
            format!("History: {history_json}\nStudent query/content: {query}"),
            schema::guidance_schema(),
        )
        .with_system(format!(
            "You are a Chinese writing tutor helping a student with the prompt: {prompt}\n\
             Reference article (truncated): {context}\n\
             Current draft: {draft}\n\
             Goal: encourage, guide, or help refine the draft.\n\
             If you write content for the student, return it in the JSON field draftContent."
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(word: &str) -> Vocabulary {
        Vocabulary {
            word: word.into(),
            ..Vocabulary::default()
        }
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("月色如流水", 3), "月色如");
        assert_eq!(truncate_chars("", 3), "");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn analysis_uses_grade_level() {
        let middle = PromptBuilder::default().analysis("a", "b");
        assert!(middle.prompt.contains("middle school"));
        assert!(middle.system.is_some());
    }

    #[test]
    fn structured_prompts_carry_schemas() {
        let builder = PromptBuilder::default();
        let list = [vocab("荷塘"), vocab("弥望")];

        assert!(builder.outline("x").schema.is_some());
        assert!(builder.extract_vocabulary("x").schema.is_some());
        assert!(builder.enrich(&list).schema.is_some());
        assert!(builder.workshop("x", &list, &[]).schema.is_some());

        let quiz = builder.quiz(&list);
        assert!(quiz.prompt.contains("荷塘, 弥望"));
        assert!(quiz.schema.is_some());
    }

    #[test]
    fn free_text_prompts_have_no_schema() {
        let builder = PromptBuilder::default();
        assert!(builder.pinyin("x").schema.is_none());
        assert!(builder.proofread("x").schema.is_none());
        assert!(builder.teacher_script("a", "b").schema.is_none());
        assert!(builder.outline_lecture("t", "c", "a").schema.is_none());
    }

    #[test]
    fn guidance_embeds_history_and_draft() {
        let history = vec![ChatMessage::user("怎么开头？"), ChatMessage::ai("先写景。")];
        let req = PromptBuilder::default().writing_guidance("写月色", "草稿", "帮我", &history, "文章");

        assert!(req.prompt.contains("\"role\":\"ai\""));
        assert!(req.prompt.contains("帮我"));
        let system = req.system.unwrap_or_default();
        assert!(system.contains("写月色"));
        assert!(system.contains("草稿"));
    }

    #[test]
    fn cover_prompt_mentions_title() {
        assert!(PromptBuilder::cover_image("荷塘月色", "hint").contains("荷塘月色"));
    }
}
