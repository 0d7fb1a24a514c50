//! Rectangular selection and interactive transform.
//!
//! State machine: `Idle` → `Selecting` (drag in progress) → `Selected`
//! (finalized, ≥1×1 px) → `Transforming` (content lifted into a scratch
//! buffer, handles live) → back to `Selected` on apply, or `Idle` on clear.
//!
//! All rectangles here are image-space.  Conversion from screen space is a
//! straight ratio transform against the zoom/pan-derived destination
//! rectangle — see [`screen_to_image`] / [`image_to_screen`].

use egui::{Pos2, Rect, Vec2};
use image::{imageops, RgbaImage};

use crate::commands::rect_bounds;
use crate::error::EditorError;
use crate::log_warn;
use crate::manager::LayerManager;

/// Transform rectangles never shrink below this edge length (image pixels).
pub const MIN_TRANSFORM_SIZE: f32 = 10.0;

/// The eight resize handles plus the body (move) region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
    Body,
}

impl Handle {
    pub fn all() -> &'static [Handle] {
        &[
            Handle::TopLeft,
            Handle::Top,
            Handle::TopRight,
            Handle::Right,
            Handle::BottomRight,
            Handle::Bottom,
            Handle::BottomLeft,
            Handle::Left,
        ]
    }

    /// Handle anchor position on a rectangle (image space).
    pub fn anchor(&self, rect: &Rect) -> Pos2 {
        match self {
            Handle::TopLeft => rect.min,
            Handle::Top => Pos2::new(rect.center().x, rect.min.y),
            Handle::TopRight => Pos2::new(rect.max.x, rect.min.y),
            Handle::Right => Pos2::new(rect.max.x, rect.center().y),
            Handle::BottomRight => rect.max,
            Handle::Bottom => Pos2::new(rect.center().x, rect.max.y),
            Handle::BottomLeft => Pos2::new(rect.min.x, rect.max.y),
            Handle::Left => Pos2::new(rect.min.x, rect.center().y),
            Handle::Body => rect.center(),
        }
    }
}

/// Live transform: the lifted content plus its before/after rectangles.
pub struct TransformSession {
    /// Where the content was lifted from.
    original: Rect,
    /// Where it currently sits (moves/resizes as handles drag).
    current: Rect,
    /// The extracted pixels, untouched until apply time.
    content: RgbaImage,
}

impl TransformSession {
    pub fn original_rect(&self) -> Rect {
        self.original
    }

    pub fn current_rect(&self) -> Rect {
        self.current
    }
}

pub enum SelectionState {
    Idle,
    Selecting { anchor: Pos2, cursor: Pos2 },
    Selected { rect: Rect },
    Transforming(TransformSession),
}

pub struct SelectionEditor {
    state: SelectionState,
}

impl Default for SelectionEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionEditor {
    pub fn new() -> Self {
        Self {
            state: SelectionState::Idle,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// A selection exists (finalized or mid-transform).
    pub fn has_selection(&self) -> bool {
        matches!(
            self.state,
            SelectionState::Selected { .. } | SelectionState::Transforming(_)
        )
    }

    pub fn is_selecting(&self) -> bool {
        matches!(self.state, SelectionState::Selecting { .. })
    }

    pub fn is_transforming(&self) -> bool {
        matches!(self.state, SelectionState::Transforming(_))
    }

    /// The effective selection rectangle, if any.  While transforming this
    /// is the live transform rectangle.
    pub fn rect(&self) -> Option<Rect> {
        match &self.state {
            SelectionState::Idle => None,
            SelectionState::Selecting { anchor, cursor } => {
                Some(Rect::from_two_pos(*anchor, *cursor))
            }
            SelectionState::Selected { rect } => Some(*rect),
            SelectionState::Transforming(session) => Some(session.current),
        }
    }

    // === Drag selection ======================================================

    /// Start a new marquee drag at an image-space position.  A pending
    /// transform is committed first; any prior selection is dropped.
    pub fn begin_drag(&mut self, pos: Pos2, mgr: &mut LayerManager) -> Result<(), EditorError> {
        if self.is_transforming() {
            self.apply_transform(mgr)?;
        }
        self.state = SelectionState::Selecting {
            anchor: pos,
            cursor: pos,
        };
        Ok(())
    }

    /// Extend the in-progress marquee.  Ignored outside `Selecting`.
    pub fn update_drag(&mut self, pos: Pos2) {
        if let SelectionState::Selecting { cursor, .. } = &mut self.state {
            *cursor = pos;
        }
    }

    /// Finalize the marquee.  The two corners are normalized into a
    /// rectangle; anything narrower than one pixel in either axis is
    /// discarded rather than stored.
    pub fn end_drag(&mut self) {
        if let SelectionState::Selecting { anchor, cursor } = &self.state {
            let rect = Rect::from_two_pos(*anchor, *cursor);
            if rect.width() < 1.0 || rect.height() < 1.0 {
                log_warn!(
                    "Discarding degenerate selection {:.1}x{:.1}",
                    rect.width(),
                    rect.height()
                );
                self.state = SelectionState::Idle;
            } else {
                self.state = SelectionState::Selected { rect };
            }
        }
    }

    /// Drop the selection.  A pending transform is committed first so lifted
    /// pixels are never lost.
    pub fn clear(&mut self, mgr: &mut LayerManager) -> Result<(), EditorError> {
        if self.is_transforming() {
            self.apply_transform(mgr)?;
        }
        self.state = SelectionState::Idle;
        Ok(())
    }

    // === Transform mode ======================================================

    /// Lift the selected pixels of the active layer into a scratch buffer and
    /// enter transform mode.  The layer itself is not modified until
    /// [`SelectionEditor::apply_transform`].
    pub fn begin_transform(&mut self, mgr: &LayerManager) -> Result<(), EditorError> {
        let SelectionState::Selected { rect } = &self.state else {
            return Err(EditorError::NoSelection);
        };
        let rect = *rect;
        let layer = mgr.active_layer();
        let (x0, y0, x1, y1) = rect_bounds(&rect, layer.width(), layer.height());
        if x1 <= x0 || y1 <= y0 {
            return Err(EditorError::NoSelection);
        }
        let content = layer.surface().extract_region(x0, y0, x1 - x0, y1 - y0);
        self.state = SelectionState::Transforming(TransformSession {
            original: rect,
            current: rect,
            content,
        });
        Ok(())
    }

    /// Resize or move the transform rectangle by a screen-space drag delta.
    /// The delta is scaled by the inverse zoom into image space; a minimum
    /// edge length keeps the rectangle from degenerating.
    pub fn drag_handle(&mut self, handle: Handle, delta: Vec2, zoom: f32) {
        let SelectionState::Transforming(session) = &mut self.state else {
            return;
        };
        let d = delta / zoom.max(f32::EPSILON);
        let r = &mut session.current;
        if handle == Handle::Body {
            *r = r.translate(d);
            return;
        }

        let moves_left = matches!(handle, Handle::TopLeft | Handle::Left | Handle::BottomLeft);
        let moves_right = matches!(handle, Handle::TopRight | Handle::Right | Handle::BottomRight);
        let moves_top = matches!(handle, Handle::TopLeft | Handle::Top | Handle::TopRight);
        let moves_bottom = matches!(
            handle,
            Handle::BottomLeft | Handle::Bottom | Handle::BottomRight
        );

        // Only the dragged edge moves; the size floor clamps that same edge
        // so the opposite one stays anchored.
        if moves_left {
            r.min.x = (r.min.x + d.x).min(r.max.x - MIN_TRANSFORM_SIZE);
        }
        if moves_right {
            r.max.x = (r.max.x + d.x).max(r.min.x + MIN_TRANSFORM_SIZE);
        }
        if moves_top {
            r.min.y = (r.min.y + d.y).min(r.max.y - MIN_TRANSFORM_SIZE);
        }
        if moves_bottom {
            r.max.y = (r.max.y + d.y).max(r.min.y + MIN_TRANSFORM_SIZE);
        }
    }

    /// Commit the pending transform: clear the original area, rescale the
    /// lifted content (nearest-neighbor) to the current rectangle and draw it
    /// back.  Ends in `Selected` at the new rectangle.
    ///
    /// Undoability is the caller's concern: bracket this with a draw command
    /// snapshot pair if the edit should land in history.
    pub fn apply_transform(&mut self, mgr: &mut LayerManager) -> Result<(), EditorError> {
        let session = match std::mem::replace(&mut self.state, SelectionState::Idle) {
            SelectionState::Transforming(session) => session,
            // Precondition failure: put the state back untouched.
            other => {
                self.state = other;
                return Err(EditorError::NoSelection);
            }
        };

        let layer = mgr.active_layer_mut();
        let (w, h) = (layer.width(), layer.height());
        let (ox0, oy0, ox1, oy1) = rect_bounds(&session.original, w, h);
        let (cx0, cy0, cx1, cy1) = rect_bounds(&session.current, w, h);
        let cw = (session.current.width().round() as u32).max(1);
        let ch = (session.current.height().round() as u32).max(1);

        let scaled = if (cw, ch) == session.content.dimensions() {
            session.content
        } else {
            imageops::resize(&session.content, cw, ch, imageops::FilterType::Nearest)
        };

        let mut scope = layer.surface_mut().begin_drawing();
        scope.clear_region(ox0, oy0, ox1, oy1);
        scope.blit_image(
            session.current.min.x.floor() as i64,
            session.current.min.y.floor() as i64,
            &scaled,
        );
        drop(scope);

        // Keep a usable selection only when some of it is still on canvas.
        if cx1 > cx0 && cy1 > cy0 {
            self.state = SelectionState::Selected {
                rect: session.current,
            };
        }
        Ok(())
    }

    /// Abandon the pending transform.  The lifted content was never removed
    /// from the layer, so reverting is just restoring the original rectangle.
    pub fn cancel_transform(&mut self) {
        match std::mem::replace(&mut self.state, SelectionState::Idle) {
            SelectionState::Transforming(session) => {
                self.state = SelectionState::Selected {
                    rect: session.original,
                };
            }
            // Not transforming: leave the state as it was.
            other => self.state = other,
        }
    }
}

// === Coordinate mapping ======================================================

/// Map a screen position into image coordinates, given the on-screen
/// destination rectangle of the canvas.
pub fn screen_to_image(pos: Pos2, dest: Rect, img_w: u32, img_h: u32) -> Pos2 {
    Pos2::new(
        (pos.x - dest.min.x) / dest.width() * img_w as f32,
        (pos.y - dest.min.y) / dest.height() * img_h as f32,
    )
}

/// Inverse of [`screen_to_image`].
pub fn image_to_screen(pos: Pos2, dest: Rect, img_w: u32, img_h: u32) -> Pos2 {
    Pos2::new(
        dest.min.x + pos.x / img_w as f32 * dest.width(),
        dest.min.y + pos.y / img_h as f32 * dest.height(),
    )
}
