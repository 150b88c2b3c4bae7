//! Plain-text exports built from the session snapshot.
//!
//! | Export | Function | File name |
//! |--------|----------|-----------|
//! | reading notes | [`notes_text`] | `<title>_精读笔记.txt` |
//! | outline | [`outline_text`] | `<title>_导读大纲.txt` |
//! | learning report | [`report_text`] | `<title>_学习报告.txt` |
//! | share blurb | [`share_text`] | |

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use crate::outline::OutlineSection;
use crate::session::{Note, VideoScript, Vocabulary};

const APP_LABEL: &str = "智读·精练";
const NOTE_SEPARATOR: &str = "--------------------------------------------------";

/// Notes export, or `None` when there is nothing to export.
pub fn notes_text(title: &str, notes: &[Note], generated_at: NaiveDateTime) -> Option<String> {
    if notes.is_empty() {
        return None;
    }
    let mut out = format!("《{title}》阅读笔记\n");
    out.push_str(&format!("生成时间：{}\n\n", generated_at.format("%Y-%m-%d")));

    for (i, note) in notes.iter().enumerate() {
        out.push_str(&format!("【笔记 {}】\n", i + 1));
        out.push_str(&format!("原文片段：{}\n", note.selected_text));
        out.push_str(&format!("AI 解析：{}\n", note.ai_analysis));
        if let Some(comment) = note.user_comment.as_deref().filter(|c| !c.is_empty()) {
            out.push_str(&format!("我的心得：{comment}\n"));
        }
        out.push_str(NOTE_SEPARATOR);
        out.push_str("\n\n");
    }
    Some(out)
}

/// The six outline sections, numbered, under a title line.
pub fn outline_text(title: &str, outline: &VideoScript, generated_at: NaiveDateTime) -> String {
    let mut out = format!(
        "《{title}》导读大纲\n生成时间：{}\n\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    for section in OutlineSection::ALL {
        out.push_str(&format!(
            "{}）{}\n{}\n\n",
            section.number(),
            section.export_name(),
            section.content(outline)
        ));
    }
    out.push_str("提示：以上内容由 AI 生成，可在导读页重放或补充后重新导出。");
    out
}

/// Learning summary: counts, vocabulary review and note digest.
pub fn report_text(
    title: &str,
    vocab: &[Vocabulary],
    notes: &[Note],
    completed_at: NaiveDateTime,
) -> String {
    let mut out = format!("【{APP_LABEL} AI 学习成果报告】\n\n");
    out.push_str(&format!("文章标题：《{title}》\n"));
    out.push_str(&format!(
        "完成日期：{}\n\n",
        completed_at.format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str("--- 学习概况 ---\n");
    out.push_str(&format!("● 积累词汇：{} 个\n", vocab.len()));
    out.push_str(&format!("● 记录笔记：{} 条\n\n", notes.len()));

    if !vocab.is_empty() {
        out.push_str("--- 重点生词回顾 ---\n");
        for (i, v) in vocab.iter().enumerate() {
            let definition = if v.definition.is_empty() {
                "暂无释义"
            } else {
                v.definition.as_str()
            };
            out.push_str(&format!(
                "{}. {} [{}]\n   {definition}\n\n",
                i + 1,
                v.word,
                v.pinyin.as_deref().unwrap_or("")
            ));
        }
    }

    if !notes.is_empty() {
        out.push_str("--- 阅读笔记摘要 ---\n");
        for (i, n) in notes.iter().enumerate() {
            out.push_str(&format!(
                "【笔记 {}】\n原文：{}\n解析：{}\n\n",
                i + 1,
                n.selected_text,
                n.ai_analysis
            ));
        }
    }

    out.push_str(&format!("\n此报告由 {APP_LABEL} (SmartRead) AI 系统自动生成。"));
    out
}

pub fn share_text(title: &str, vocab_count: usize, note_count: usize) -> String {
    format!(
        "我在《{APP_LABEL}》完成了文章《{title}》的深度精读！\n\
         积累了 {vocab_count} 个核心生词，记录了 {note_count} 条精读笔记。\n\
         这是我的学习成果，推荐你也来试试 AI 辅助阅读！"
    )
}

pub fn notes_file_name(title: &str) -> String {
    format!("{}_精读笔记.txt", file_stem(title))
}

pub fn outline_file_name(title: &str) -> String {
    format!("{}_导读大纲.txt", file_stem(title))
}

pub fn report_file_name(title: &str) -> String {
    format!("{}_学习报告.txt", file_stem(title))
}

/// Title with path separators and other reserved characters replaced.
fn file_stem(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();
    if stem.is_empty() {
        "untitled".to_string()
    } else {
        stem
    }
}

/// Write `content` to `dir/file_name`, creating `dir` if needed.
pub fn write_export(dir: &Path, file_name: &str, content: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating export dir {}", dir.display()))?;
    let path = dir.join(file_name);
    std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
    log::info!("exported {}", path.display());
    Ok(path)
}
