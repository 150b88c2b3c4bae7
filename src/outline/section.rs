//! The six dimensions of a guided-reading outline.

use crate::session::VideoScript;

/// One dimension of a [`VideoScript`], in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutlineSection {
    Intro,
    Framework,
    Highlights,
    Emotion,
    Theme,
    Transfer,
}

impl OutlineSection {
    pub const ALL: [OutlineSection; 6] = [
        OutlineSection::Intro,
        OutlineSection::Framework,
        OutlineSection::Highlights,
        OutlineSection::Emotion,
        OutlineSection::Theme,
        OutlineSection::Transfer,
    ];

    /// Stable key, matching the outline's JSON field name.
    pub fn key(&self) -> &'static str {
        match self {
            OutlineSection::Intro => "intro",
            OutlineSection::Framework => "framework",
            OutlineSection::Highlights => "highlights",
            OutlineSection::Emotion => "emotion",
            OutlineSection::Theme => "theme",
            OutlineSection::Transfer => "transfer",
        }
    }

    /// 1-based position.
    pub fn number(&self) -> usize {
        match self {
            OutlineSection::Intro => 1,
            OutlineSection::Framework => 2,
            OutlineSection::Highlights => 3,
            OutlineSection::Emotion => 4,
            OutlineSection::Theme => 5,
            OutlineSection::Transfer => 6,
        }
    }

    /// Heading shown in the outline view, e.g. `1. 开头引导`.
    pub fn title(&self) -> String {
        format!("{}. {}", self.number(), self.name())
    }

    /// Heading without the number.
    pub fn name(&self) -> &'static str {
        match self {
            OutlineSection::Intro => "开头引导",
            OutlineSection::Framework => "文章大结构",
            OutlineSection::Highlights => "结构亮点",
            OutlineSection::Emotion => "情绪路径",
            OutlineSection::Theme => "核心主旨",
            OutlineSection::Transfer => "迁移思考",
        }
    }

    /// Heading used in the plain-text export.
    pub fn export_name(&self) -> &'static str {
        match self {
            OutlineSection::Intro => "开场导入",
            OutlineSection::Framework => "文章大框架",
            OutlineSection::Highlights => "结构亮点",
            OutlineSection::Emotion => "情感脉络",
            OutlineSection::Theme => "核心主题",
            OutlineSection::Transfer => "迁移延伸",
        }
    }

    pub fn content<'a>(&self, script: &'a VideoScript) -> &'a str {
        match self {
            OutlineSection::Intro => &script.intro,
            OutlineSection::Framework => &script.framework,
            OutlineSection::Highlights => &script.highlights,
            OutlineSection::Emotion => &script.emotion,
            OutlineSection::Theme => &script.theme,
            OutlineSection::Transfer => &script.transfer,
        }
    }
}

/// Every non-blank section joined by a blank line.
///
/// ```rust
/// use smartread::outline::full_text;
/// use smartread::session::VideoScript;
///
/// let script = VideoScript {
///     intro: "引子".into(),
///     theme: "主旨".into(),
///     ..VideoScript::default()
/// };
/// assert_eq!(full_text(&script), "引子\n\n主旨");
/// ```
pub fn full_text(script: &VideoScript) -> String {
    OutlineSection::ALL
        .iter()
        .map(|s| s.content(script).trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
