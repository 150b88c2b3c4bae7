//! Fill-in-the-blank rendering of the article.
//!
//! Vocabulary words are masked paragraph by paragraph, in list order, so
//! when one word contains another the earlier entry wins.  Paragraph
//! boundaries are never merged or split.

use crate::session::Vocabulary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClozeSegment {
    Text(String),
    Blank { answer: String },
}

/// Mask every occurrence of each word in `words` within one paragraph.
///
/// ```rust
/// use smartread::workshop::{cloze_paragraph, ClozeSegment};
///
/// let segments = cloze_paragraph("荷塘月色真美", &["荷塘"]);
/// assert_eq!(
///     segments,
///     vec![
///         ClozeSegment::Blank { answer: "荷塘".into() },
///         ClozeSegment::Text("月色真美".into()),
///     ]
/// );
/// ```
pub fn cloze_paragraph(paragraph: &str, words: &[&str]) -> Vec<ClozeSegment> {
    let mut segments = vec![ClozeSegment::Text(paragraph.to_string())];

    for word in words.iter().filter(|w| !w.is_empty()) {
        segments = segments
            .into_iter()
            .flat_map(|segment| match segment {
                ClozeSegment::Text(text) => split_on(&text, word),
                blank => vec![blank],
            })
            .collect();
    }
    segments
}

fn split_on(text: &str, word: &str) -> Vec<ClozeSegment> {
    let mut out = Vec::new();
    let mut pieces = text.split(word).peekable();
    while let Some(piece) = pieces.next() {
        if !piece.is_empty() {
            out.push(ClozeSegment::Text(piece.to_string()));
        }
        if pieces.peek().is_some() {
            out.push(ClozeSegment::Blank {
                answer: word.to_string(),
            });
        }
    }
    out
}

/// Cloze segments for every paragraph, masking the vocabulary words.
pub fn cloze_article(paragraphs: &[String], vocab: &[Vocabulary]) -> Vec<Vec<ClozeSegment>> {
    let words: Vec<&str> = vocab.iter().map(|v| v.word.trim()).collect();
    paragraphs
        .iter()
        .map(|p| cloze_paragraph(p, &words))
        .collect()
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// HTML for one paragraph: escaped text with `<input>` blanks carrying
/// their answer in `data-answer`.
pub fn render_html(segments: &[ClozeSegment]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            ClozeSegment::Text(text) => escape_html(text),
            ClozeSegment::Blank { answer } => format!(
                r#"<input type="text" data-answer="{}" class="cloze-blank" />"#,
                escape_html(answer)
            ),
        })
        .collect()
}

/// Number of blanks filled with their answer, in order.  Surrounding
/// whitespace in a response is ignored.
pub fn score_blanks(segments: &[ClozeSegment], responses: &[&str]) -> usize {
    segments
        .iter()
        .filter_map(|segment| match segment {
            ClozeSegment::Blank { answer } => Some(answer),
            ClozeSegment::Text(_) => None,
        })
        .zip(responses)
        .filter(|(answer, response)| response.trim() == answer.as_str())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(answer: &str) -> ClozeSegment {
        ClozeSegment::Blank {
            answer: answer.into(),
        }
    }

    fn text(t: &str) -> ClozeSegment {
        ClozeSegment::Text(t.into())
    }

    #[test]
    fn masks_every_occurrence() {
        assert_eq!(
            cloze_paragraph("田田的叶子，田田的", &["田田"]),
            vec![blank("田田"), text("的叶子，"), blank("田田"), text("的")]
        );
    }

    #[test]
    fn earlier_words_win_over_contained_ones() {
        assert_eq!(
            cloze_paragraph("荷塘月色", &["荷塘月色", "荷塘"]),
            vec![blank("荷塘月色")]
        );
        assert_eq!(
            cloze_paragraph("荷塘月色", &["荷塘", "荷塘月色"]),
            vec![blank("荷塘"), text("月色")]
        );
    }

    #[test]
    fn paragraph_boundaries_are_kept() {
        let paragraphs = vec!["荷塘月色真美".to_string(), "没有生词".to_string()];
        let vocab = vec![Vocabulary {
            word: "荷塘".into(),
            ..Vocabulary::default()
        }];
        let cloze = cloze_article(&paragraphs, &vocab);

        assert_eq!(cloze.len(), 2);
        assert_eq!(cloze[0], vec![blank("荷塘"), text("月色真美")]);
        assert_eq!(cloze[1], vec![text("没有生词")]);
    }

    #[test]
    fn html_escapes_text_and_answers() {
        let html = render_html(&cloze_paragraph("<b>荷塘</b>", &["荷塘"]));
        assert_eq!(
            html,
            r#"&lt;b&gt;<input type="text" data-answer="荷塘" class="cloze-blank" />&lt;/b&gt;"#
        );
    }

    #[test]
    fn empty_words_are_skipped() {
        assert_eq!(cloze_paragraph("荷塘", &["", "  "]).len(), 1);
    }

    #[test]
    fn scores_blanks_in_order() {
        let segments = cloze_paragraph("荷塘月色，荷塘", &["荷塘", "月色"]);
        assert_eq!(score_blanks(&segments, &["荷塘", " 月色 ", "池塘"]), 2);
    }
}
