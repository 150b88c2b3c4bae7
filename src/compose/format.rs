//! Local text normalisation for pasted or imported articles.
//!
//! [`auto_format`] applies, in order:
//!
//! | Step | Rule |
//! |------|------|
//! | line endings | `\r\n` and `\r` become `\n` |
//! | indentation | leading spaces, tabs and `U+3000` removed from every line |
//! | punctuation | `,` `.` `?` next to a CJK ideograph become `，` `。` `？` |
//! | paragraphs | one paragraph per non-empty line, indented with `　　` |
//! | separation | paragraphs joined by one blank line |

use std::sync::LazyLock;

use regex::Regex;

use crate::llm::ReadingAssistant;

const INDENT: &str = "\u{3000}\u{3000}";

static LEADING_INDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t\u{3000}]+").expect("static regex"));
static COMMA_AFTER_CJK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\p{Han}),").expect("static regex"));
static COMMA_BEFORE_CJK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\p{Han})").expect("static regex"));
static PERIOD_AFTER_CJK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\p{Han})\.").expect("static regex"));
static QUESTION_AFTER_CJK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\p{Han})\?").expect("static regex"));

/// Normalise raw article text without calling any capability.
///
/// ```rust
/// use smartread::compose::auto_format;
///
/// let raw = "  荷塘月色,很美.\r\n\r\n你去过吗?";
/// assert_eq!(auto_format(raw), "　　荷塘月色，很美。\n\n　　你去过吗？");
/// ```
pub fn auto_format(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n").replace('\r', "\n");
    let text = LEADING_INDENT.replace_all(&text, "");
    let text = COMMA_AFTER_CJK.replace_all(&text, "${1}，");
    let text = COMMA_BEFORE_CJK.replace_all(&text, "，${1}");
    let text = PERIOD_AFTER_CJK.replace_all(&text, "${1}。");
    let text = QUESTION_AFTER_CJK.replace_all(&text, "${1}？");

    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("{INDENT}{line}"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// AI proofreading followed by [`auto_format`], so every paragraph ends up
/// indented even when the proofreader ignores the layout rules.  When the
/// capability fails the local formatter still runs on the original text.
pub async fn smart_format(assistant: &ReadingAssistant, raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    let proofread = assistant.proofread(raw).await;
    auto_format(&proofread)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::{assistant, failing_assistant, MockGenerator};

    #[test]
    fn strips_existing_indentation() {
        assert_eq!(auto_format("\u{3000}\u{3000}第一段\n\t第二段"), "　　第一段\n\n　　第二段");
    }

    #[test]
    fn leaves_ascii_punctuation_between_latin_text() {
        assert_eq!(auto_format("Hello, world."), "　　Hello, world.");
    }

    #[test]
    fn converts_comma_before_cjk() {
        assert_eq!(auto_format("OK,好的"), "　　OK，好的");
    }

    #[test]
    fn collapses_blank_lines() {
        assert_eq!(auto_format("一\n\n\n\n二\n"), "　　一\n\n　　二");
        assert_eq!(auto_format(" \n \r\n"), "");
    }

    #[tokio::test]
    async fn smart_format_formats_proofread_text() {
        let a = assistant(MockGenerator::fixed("曲曲折折的荷塘上面,弥望的是田田的叶子."));
        assert_eq!(
            smart_format(&a, "原文").await,
            "　　曲曲折折的荷塘上面，弥望的是田田的叶子。"
        );
    }

    #[tokio::test]
    async fn smart_format_falls_back_to_local_formatting() {
        assert_eq!(
            smart_format(&failing_assistant(), "原文,没变").await,
            "　　原文，没变"
        );
        assert_eq!(smart_format(&failing_assistant(), "   ").await, "");
    }
}
