//! Article composition: the first phase of a learning session.
//!
//! Turns a title and raw text into an [`Article`], optionally tidying the
//! text first with [`auto_format`] (local) or [`smart_format`] (AI
//! proofreading plus local formatting).

pub mod format;

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::session::Article;

pub use format::{auto_format, smart_format};

// ---------------------------------------------------------------------------
// ComposeError
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComposeError {
    #[error("the article needs a title")]
    EmptyTitle,

    #[error("the article has no content")]
    EmptyContent,
}

// ---------------------------------------------------------------------------
// compose_article
// ---------------------------------------------------------------------------

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("static regex"));

/// Split `content` on blank-line boundaries; paragraphs are trimmed and
/// empty ones dropped.
pub fn split_paragraphs(content: &str) -> Vec<String> {
    PARAGRAPH_BREAK
        .split(content)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build an [`Article`].  `content` is stored verbatim; `title` is trimmed.
///
/// ```rust
/// use smartread::compose::{compose_article, ComposeError};
///
/// let article = compose_article("背影", "第一段\n\n  \n第二段").unwrap();
/// assert_eq!(article.paragraphs, vec!["第一段", "第二段"]);
///
/// assert_eq!(compose_article(" ", "x"), Err(ComposeError::EmptyTitle));
/// ```
pub fn compose_article(title: &str, content: &str) -> Result<Article, ComposeError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ComposeError::EmptyTitle);
    }
    let paragraphs = split_paragraphs(content);
    if paragraphs.is_empty() {
        return Err(ComposeError::EmptyContent);
    }

    Ok(Article {
        title: title.to_string(),
        content: content.to_string(),
        paragraphs,
    })
}

// ---------------------------------------------------------------------------
// Sample article
// ---------------------------------------------------------------------------

const SAMPLE_TITLE: &str = "荷塘月色（节选）";

const SAMPLE_CONTENT: &str = "\
　　这几天心里颇不宁静。今晚在院子里坐着乘凉，忽然想起日日走过的荷塘，在这满月的光里，总该另有一番样子吧。月亮渐渐地升高了，墙外马路上孩子们的欢笑，已经听不见了；妻在屋里拍着闰儿，迷迷糊糊地哼着眠歌。我悄悄地披了大衫，带上门出去。

　　沿着荷塘，是一条曲折的小煤屑路。这是一条幽僻的路；白天也少人走，夜晚更加寂寞。荷塘四面，长着许多树，蓊蓊郁郁的。路的一旁，是些杨柳，和一些不知道名字的树。没有月光的晚上，这路上阴森森的，有些怕人。今晚却很好，虽然月光也还是淡淡的。

　　曲曲折折的荷塘上面，弥望的是田田的叶子。叶子出水很高，像亭亭的舞女的裙。层层的叶子中间，零星地点缀着些白花，有袅娜地开着的，有羞涩地打着朵儿的；正如一粒粒的明珠，又如碧天里的星星，又如刚出浴的美人。微风过处，送来缕缕清香，仿佛远处高楼上渺茫的歌声似的。";

/// The built-in example article offered on an empty editor.
pub fn sample_article() -> Article {
    Article {
        title: SAMPLE_TITLE.to_string(),
        content: SAMPLE_CONTENT.to_string(),
        paragraphs: split_paragraphs(SAMPLE_CONTENT),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_blank_lines_only() {
        let paragraphs = split_paragraphs("一行\n同一段\n\n第二段\n \t \n第三段");
        assert_eq!(paragraphs, vec!["一行\n同一段", "第二段", "第三段"]);
    }

    #[test]
    fn crlf_blank_lines_split() {
        assert_eq!(split_paragraphs("a\r\n\r\nb").len(), 2);
    }

    #[test]
    fn empty_content_is_rejected() {
        assert_eq!(
            compose_article("标题", "\n\n   \n"),
            Err(ComposeError::EmptyContent)
        );
    }

    #[test]
    fn content_is_kept_verbatim() {
        let article = compose_article("  标题 ", "　　正文。\n").unwrap();
        assert_eq!(article.title, "标题");
        assert_eq!(article.content, "　　正文。\n");
        assert_eq!(article.paragraphs, vec!["正文。"]);
    }

    #[test]
    fn sample_has_three_paragraphs() {
        let sample = sample_article();
        assert_eq!(sample.paragraphs.len(), 3);
        assert!(sample.paragraphs[2].contains("弥望"));
        assert_eq!(compose_article(&sample.title, &sample.content), Ok(sample.clone()));
    }
}
