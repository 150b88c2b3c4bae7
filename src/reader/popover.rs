//! Popover placement near a selection, plus free dragging afterwards.

use crate::config::ReaderConfig;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Bounding box of the selected text, in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

/// Top-left corner for the popover anchored at `anchor`.
///
/// Horizontally the popover starts at the anchor's left edge, clamped so it
/// fits inside the viewport.  Vertically it sits just below the anchor and
/// flips above it when there is not enough room below.
///
/// ```rust
/// use smartread::config::ReaderConfig;
/// use smartread::reader::{place_popover, Point, Rect, Viewport};
///
/// let config = ReaderConfig::default();
/// let viewport = Viewport { width: 1280.0, height: 800.0 };
///
/// let below = place_popover(Rect::new(100.0, 100.0, 200.0, 120.0), viewport, &config);
/// assert_eq!(below, Point::new(100.0, 130.0));
///
/// let flipped = place_popover(Rect::new(100.0, 700.0, 200.0, 720.0), viewport, &config);
/// assert_eq!(flipped, Point::new(100.0, 300.0));
/// ```
pub fn place_popover(anchor: Rect, viewport: Viewport, config: &ReaderConfig) -> Point {
    let margin = config.viewport_margin;
    let max_x = viewport.width - config.popover_width - 2.0 * margin;
    let x = anchor.left.min(max_x).max(margin);

    let mut y = anchor.bottom + margin;
    if y + config.popover_height > viewport.height {
        y = (anchor.top - config.popover_flip_offset).max(margin);
    }
    Point::new(x, y)
}

/// Pointer-driven offset tracking for a placed popover.
#[derive(Debug, Clone, Default)]
pub struct DragState {
    position: Point,
    /// Pointer position and popover position when the drag began.
    grab: Option<(Point, Point)>,
}

impl DragState {
    pub fn at(position: Point) -> Self {
        Self {
            position,
            grab: None,
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn is_dragging(&self) -> bool {
        self.grab.is_some()
    }

    pub fn begin(&mut self, pointer: Point) {
        self.grab = Some((pointer, self.position));
    }

    /// Follow the pointer; ignored when no drag is in progress.
    pub fn move_to(&mut self, pointer: Point) -> Point {
        if let Some((start, origin)) = self.grab {
            self.position = Point::new(
                origin.x + pointer.x - start.x,
                origin.y + pointer.y - start.y,
            );
        }
        self.position
    }

    pub fn end(&mut self) {
        self.grab = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 1000.0,
        height: 800.0,
    };

    #[test]
    fn clamps_to_right_edge() {
        let p = place_popover(Rect::new(900.0, 50.0, 950.0, 70.0), VIEWPORT, &ReaderConfig::default());
        assert_eq!(p.x, 1000.0 - 480.0 - 20.0);
    }

    #[test]
    fn clamps_to_left_margin() {
        let narrow = Viewport {
            width: 400.0,
            height: 800.0,
        };
        let p = place_popover(Rect::new(5.0, 50.0, 50.0, 70.0), narrow, &ReaderConfig::default());
        assert_eq!(p.x, 10.0);
    }

    #[test]
    fn flip_never_leaves_the_top_edge() {
        let short = Viewport {
            width: 1000.0,
            height: 350.0,
        };
        let p = place_popover(Rect::new(10.0, 100.0, 50.0, 120.0), short, &ReaderConfig::default());
        assert_eq!(p.y, 10.0);
    }

    #[test]
    fn drag_tracks_pointer_delta() {
        let mut drag = DragState::at(Point::new(100.0, 100.0));
        assert_eq!(drag.move_to(Point::new(500.0, 500.0)), Point::new(100.0, 100.0));

        drag.begin(Point::new(110.0, 105.0));
        assert!(drag.is_dragging());
        drag.move_to(Point::new(150.0, 125.0));
        drag.end();

        assert_eq!(drag.position(), Point::new(140.0, 120.0));
        assert!(!drag.is_dragging());
    }
}
