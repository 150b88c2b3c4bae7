//! Transient state for one text selection in the reader.
//!
//! ```text
//! IDLE ──select──▶ SELECTED ──(pinyin in background)──▶ pinyin: Some
//!                     │
//!                     └─request_analysis──▶ Loading ──▶ Ready(text)
//!                                                  └──▶ Failed(msg) ──retry──▶ Loading
//! ```
//!
//! Each selection carries the generation it was created under; results
//! tagged with any other generation belong to an earlier selection.

use crate::reader::popover::{DragState, Point, Rect};

/// Shown when the analysis capability fails.
pub const ANALYSIS_FAILED: &str = "AI 解析失败，请稍后重试。";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AnalysisState {
    #[default]
    NotRequested,
    Loading,
    Ready(String),
    Failed(String),
}

impl AnalysisState {
    pub fn text(&self) -> Option<&str> {
        match self {
            AnalysisState::Ready(text) => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Selection {
    generation: u64,
    text: String,
    anchor: Rect,
    pinyin: Option<String>,
    analysis: AnalysisState,
    /// Spoken-form script derived from the analysis, kept once generated.
    lecture_script: Option<String>,
    lecture_loading: bool,
    read_loading: bool,
    popover: DragState,
}

impl Selection {
    pub(crate) fn new(generation: u64, text: String, anchor: Rect, placed_at: Point) -> Self {
        Self {
            generation,
            text,
            anchor,
            pinyin: None,
            analysis: AnalysisState::NotRequested,
            lecture_script: None,
            lecture_loading: false,
            read_loading: false,
            popover: DragState::at(placed_at),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn anchor(&self) -> Rect {
        self.anchor
    }

    /// Transliteration, once the background lookup has finished.
    pub fn pinyin(&self) -> Option<&str> {
        self.pinyin.as_deref()
    }

    pub fn analysis(&self) -> &AnalysisState {
        &self.analysis
    }

    pub fn lecture_script(&self) -> Option<&str> {
        self.lecture_script.as_deref()
    }

    pub fn is_lecture_loading(&self) -> bool {
        self.lecture_loading
    }

    pub fn is_read_loading(&self) -> bool {
        self.read_loading
    }

    pub fn popover_position(&self) -> Point {
        self.popover.position()
    }

    pub(crate) fn popover_mut(&mut self) -> &mut DragState {
        &mut self.popover
    }

    pub fn is_dragging(&self) -> bool {
        self.popover.is_dragging()
    }

    // ----- result application --------------------------------------------

    pub(crate) fn set_pinyin(&mut self, pinyin: String) {
        let pinyin = pinyin.trim();
        if !pinyin.is_empty() {
            self.pinyin = Some(pinyin.to_string());
        }
    }

    /// Whether a new analysis request may start.
    pub(crate) fn can_request_analysis(&self) -> bool {
        matches!(
            self.analysis,
            AnalysisState::NotRequested | AnalysisState::Failed(_)
        )
    }

    pub(crate) fn set_analysis(&mut self, state: AnalysisState) {
        self.analysis = state;
    }

    pub(crate) fn set_lecture_loading(&mut self, loading: bool) {
        self.lecture_loading = loading;
    }

    pub(crate) fn set_lecture_script(&mut self, script: String) {
        self.lecture_script = Some(script);
        self.lecture_loading = false;
    }

    pub(crate) fn set_read_loading(&mut self, loading: bool) {
        self.read_loading = loading;
    }
}
