//! Reversible edit commands.
//!
//! A command is a value object capturing just enough state (pixel snapshots,
//! target indices) to perform one edit and reverse it.  Commands are a closed
//! enum rather than trait objects: every kind is known to the editor, and
//! execute/undo dispatch in one place.
//!
//! Commands borrow the [`LayerManager`] only for the duration of an
//! `execute`/`undo` call; the snapshots they hold are independent deep
//! copies, never aliases into live layer memory.

use egui::Rect;
use image::{imageops, Rgba, RgbaImage};

use crate::error::EditorError;
use crate::layer::{BlendMode, Layer};
use crate::manager::LayerManager;
use crate::surface::Snapshot;

/// Axis of a selection flip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlipAxis {
    Horizontal,
    Vertical,
}

/// Everything needed to reinstate a deleted layer exactly.
#[derive(Debug)]
pub struct SavedLayer {
    name: String,
    visible: bool,
    opacity: f32,
    blend_mode: BlendMode,
    snapshot: Snapshot,
}

impl SavedLayer {
    pub fn capture(layer: &Layer) -> Self {
        Self {
            name: layer.name.clone(),
            visible: layer.visible,
            opacity: layer.opacity(),
            blend_mode: layer.blend_mode,
            snapshot: layer.surface().snapshot(),
        }
    }

    /// Rebuild a live layer from the saved state.
    pub fn rebuild(&self) -> Result<Layer, EditorError> {
        let mut layer = Layer::new(
            self.name.clone(),
            self.snapshot.width(),
            self.snapshot.height(),
        )?;
        layer.surface_mut().restore(&self.snapshot)?;
        layer.visible = self.visible;
        layer.set_opacity(self.opacity);
        layer.blend_mode = self.blend_mode;
        Ok(layer)
    }
}

// ============================================================================
// LAYER OPERATIONS — structural mutations with logical inverses
// ============================================================================

#[derive(Debug)]
pub enum LayerOperation {
    /// A layer is appended; undo deletes the created index.
    Create { name: String, index: Option<usize> },
    /// A layer is removed; undo reinstates the saved deep copy.
    Delete {
        index: usize,
        saved: Option<SavedLayer>,
    },
    /// Splice move; undo is move(to, from).
    Move { from: usize, to: usize },
    /// Visibility toggle; undo restores the recorded boolean.
    Visibility { index: usize, was_visible: bool },
    /// Opacity change; undo restores the recorded float.
    Opacity { index: usize, old: f32, new: f32 },
    /// Rename; undo restores the recorded name.
    Rename {
        index: usize,
        old: String,
        new: String,
    },
    /// Deep copy inserted after the source; undo deletes that index.
    Duplicate {
        source: usize,
        new_index: Option<usize>,
    },
}

// ============================================================================
// COMMAND — closed set of reversible edits
// ============================================================================

pub enum Command {
    /// Brackets a drawing stroke.  `before` is captured ahead of the stroke,
    /// `after` once it finishes; the first `execute` is a no-op (the stroke
    /// already painted), re-execution restores `after`.
    Draw {
        layer_index: usize,
        before: Option<Snapshot>,
        after: Option<Snapshot>,
    },
    /// Clears a whole layer to transparent.
    Clear {
        layer_index: usize,
        before: Option<Snapshot>,
    },
    /// Scissored clear of the pixels inside the selection rectangle.
    DeleteSelection {
        layer_index: usize,
        rect: Rect,
        before: Option<Snapshot>,
        after: Option<Snapshot>,
    },
    /// Flips the selection sub-rectangle in place.
    FlipSelection {
        layer_index: usize,
        rect: Rect,
        axis: FlipAxis,
        before: Option<Snapshot>,
        after: Option<Snapshot>,
    },
    LayerOp(LayerOperation),
}

impl Command {
    // --- constructors -------------------------------------------------------

    /// Draw command targeting the current active layer.  Captures the
    /// "before" snapshot immediately; call [`Command::capture_after`] once
    /// the stroke has finished.
    pub fn draw(mgr: &LayerManager) -> Self {
        let layer_index = mgr.active_index();
        let before = mgr.layer(layer_index).map(|l| l.surface().snapshot());
        Command::Draw {
            layer_index,
            before,
            after: None,
        }
    }

    /// Capture the post-stroke pixels (Draw only; no-op otherwise).
    pub fn capture_after(&mut self, mgr: &LayerManager) {
        if let Command::Draw {
            layer_index, after, ..
        } = self
        {
            *after = mgr.layer(*layer_index).map(|l| l.surface().snapshot());
        }
    }

    /// Clear command targeting the current active layer; snapshots it now.
    pub fn clear(mgr: &LayerManager) -> Self {
        let layer_index = mgr.active_index();
        let before = mgr.layer(layer_index).map(|l| l.surface().snapshot());
        Command::Clear {
            layer_index,
            before,
        }
    }

    /// Delete the pixels inside `rect` on the active layer.  The layer index
    /// and rectangle are recorded at construction time.
    pub fn delete_selection(mgr: &LayerManager, rect: Rect) -> Self {
        Command::DeleteSelection {
            layer_index: mgr.active_index(),
            rect,
            before: None,
            after: None,
        }
    }

    /// Flip the pixels inside `rect` on the active layer.
    pub fn flip_selection(mgr: &LayerManager, rect: Rect, axis: FlipAxis) -> Self {
        Command::FlipSelection {
            layer_index: mgr.active_index(),
            rect,
            axis,
            before: None,
            after: None,
        }
    }

    pub fn create_layer(name: impl Into<String>) -> Self {
        Command::LayerOp(LayerOperation::Create {
            name: name.into(),
            index: None,
        })
    }

    pub fn delete_layer(index: usize) -> Self {
        Command::LayerOp(LayerOperation::Delete { index, saved: None })
    }

    pub fn move_layer(from: usize, to: usize) -> Self {
        Command::LayerOp(LayerOperation::Move { from, to })
    }

    /// Toggle visibility; `was_visible` is the state being toggled away from.
    pub fn toggle_visibility(index: usize, was_visible: bool) -> Self {
        Command::LayerOp(LayerOperation::Visibility { index, was_visible })
    }

    pub fn set_opacity(index: usize, old: f32, new: f32) -> Self {
        Command::LayerOp(LayerOperation::Opacity { index, old, new })
    }

    pub fn rename_layer(index: usize, old: impl Into<String>, new: impl Into<String>) -> Self {
        Command::LayerOp(LayerOperation::Rename {
            index,
            old: old.into(),
            new: new.into(),
        })
    }

    pub fn duplicate_layer(source: usize) -> Self {
        Command::LayerOp(LayerOperation::Duplicate {
            source,
            new_index: None,
        })
    }

    // --- dispatch -----------------------------------------------------------

    /// Perform the edit.  On error nothing has been mutated.
    pub fn execute(&mut self, mgr: &mut LayerManager) -> Result<(), EditorError> {
        match self {
            Command::Draw {
                layer_index, after, ..
            } => {
                // First run: the stroke itself already painted the layer.
                // Re-run (redo): reinstate the post-stroke pixels.
                if let Some(after) = after {
                    restore_layer(mgr, *layer_index, after)?;
                }
                Ok(())
            }

            Command::Clear {
                layer_index,
                before,
            } => {
                let layer = get_layer_mut(mgr, *layer_index)?;
                if before.is_none() {
                    *before = Some(layer.surface().snapshot());
                }
                layer
                    .surface_mut()
                    .begin_drawing()
                    .clear(Rgba([0, 0, 0, 0]));
                Ok(())
            }

            Command::DeleteSelection {
                layer_index,
                rect,
                before,
                after,
            } => {
                if let Some(after) = after {
                    // Redo path: reinstate the post-delete pixels.
                    return restore_layer(mgr, *layer_index, after);
                }
                let layer = get_layer_mut(mgr, *layer_index)?;
                let (x0, y0, x1, y1) = rect_bounds(rect, layer.width(), layer.height());
                if x1 <= x0 || y1 <= y0 {
                    return Err(EditorError::NoSelection);
                }
                if before.is_none() {
                    *before = Some(layer.surface().snapshot());
                }
                layer
                    .surface_mut()
                    .begin_drawing()
                    .clear_region(x0, y0, x1, y1);
                *after = Some(get_layer_mut(mgr, *layer_index)?.surface().snapshot());
                Ok(())
            }

            Command::FlipSelection {
                layer_index,
                rect,
                axis,
                before,
                after,
            } => {
                if let Some(after) = after {
                    return restore_layer(mgr, *layer_index, after);
                }
                let layer = get_layer_mut(mgr, *layer_index)?;
                let (x0, y0, x1, y1) = rect_bounds(rect, layer.width(), layer.height());
                if x1 <= x0 || y1 <= y0 {
                    return Err(EditorError::NoSelection);
                }
                let region = layer.surface().extract_region(x0, y0, x1 - x0, y1 - y0);
                if region.pixels().all(|p| p[3] == 0) {
                    return Err(EditorError::EmptySelection);
                }
                if before.is_none() {
                    *before = Some(layer.surface().snapshot());
                }
                let flipped: RgbaImage = match axis {
                    FlipAxis::Horizontal => imageops::flip_horizontal(&region),
                    FlipAxis::Vertical => imageops::flip_vertical(&region),
                };
                layer
                    .surface_mut()
                    .begin_drawing()
                    .copy_image(x0 as i64, y0 as i64, &flipped);
                *after = Some(get_layer_mut(mgr, *layer_index)?.surface().snapshot());
                Ok(())
            }

            Command::LayerOp(op) => match op {
                LayerOperation::Create { name, index } => {
                    *index = Some(mgr.create_layer(name)?);
                    Ok(())
                }
                LayerOperation::Delete { index, saved } => {
                    let removed = mgr.delete_layer(*index)?;
                    *saved = Some(SavedLayer::capture(&removed));
                    Ok(())
                }
                LayerOperation::Move { from, to } => mgr.move_layer(*from, *to),
                LayerOperation::Visibility { index, was_visible } => {
                    mgr.set_layer_visibility(*index, !*was_visible)
                }
                LayerOperation::Opacity { index, new, .. } => {
                    mgr.set_layer_opacity(*index, *new)
                }
                LayerOperation::Rename { index, new, .. } => mgr.set_layer_name(*index, new),
                LayerOperation::Duplicate { source, new_index } => {
                    *new_index = Some(mgr.duplicate_layer(*source)?);
                    Ok(())
                }
            },
        }
    }

    /// Reverse the edit.  On error the target is unchanged and the command
    /// remains re-usable (the history pushes it back).
    pub fn undo(&mut self, mgr: &mut LayerManager) -> Result<(), EditorError> {
        match self {
            Command::Draw {
                layer_index,
                before,
                ..
            }
            | Command::Clear {
                layer_index,
                before,
            }
            | Command::DeleteSelection {
                layer_index,
                before,
                ..
            }
            | Command::FlipSelection {
                layer_index,
                before,
                ..
            } => {
                let before = before.as_ref().ok_or(EditorError::MissingSnapshot)?;
                restore_layer(mgr, *layer_index, before)
            }

            Command::LayerOp(op) => match op {
                LayerOperation::Create { index, .. } => {
                    let index = index.ok_or(EditorError::MissingSnapshot)?;
                    mgr.delete_layer(index).map(|_| ())
                }
                LayerOperation::Delete { index, saved } => {
                    let saved = saved.as_ref().ok_or(EditorError::MissingSnapshot)?;
                    let layer = saved.rebuild()?;
                    mgr.insert_layer(*index, layer);
                    Ok(())
                }
                LayerOperation::Move { from, to } => mgr.move_layer(*to, *from),
                LayerOperation::Visibility { index, was_visible } => {
                    mgr.set_layer_visibility(*index, *was_visible)
                }
                LayerOperation::Opacity { index, old, .. } => {
                    mgr.set_layer_opacity(*index, *old)
                }
                LayerOperation::Rename { index, old, .. } => mgr.set_layer_name(*index, old),
                LayerOperation::Duplicate { source, new_index } => {
                    let index = new_index.ok_or(EditorError::MissingSnapshot)?;
                    debug_assert_eq!(index, *source + 1);
                    mgr.delete_layer(*source + 1).map(|_| ())
                }
            },
        }
    }

    /// True when enough state was captured for `undo` to succeed.
    pub fn can_undo(&self) -> bool {
        match self {
            Command::Draw { before, .. }
            | Command::Clear { before, .. }
            | Command::DeleteSelection { before, .. }
            | Command::FlipSelection { before, .. } => before.is_some(),
            Command::LayerOp(op) => match op {
                LayerOperation::Create { index, .. } => index.is_some(),
                LayerOperation::Delete { saved, .. } => saved.is_some(),
                LayerOperation::Duplicate { new_index, .. } => new_index.is_some(),
                _ => true,
            },
        }
    }

    pub fn description(&self) -> String {
        match self {
            Command::Draw { .. } => "Draw Stroke".to_string(),
            Command::Clear { .. } => "Clear Layer".to_string(),
            Command::DeleteSelection { .. } => "Delete Selection".to_string(),
            Command::FlipSelection { axis, .. } => match axis {
                FlipAxis::Horizontal => "Flip Selection Horizontal".to_string(),
                FlipAxis::Vertical => "Flip Selection Vertical".to_string(),
            },
            Command::LayerOp(op) => match op {
                LayerOperation::Create { name, .. } => format!("Add Layer: {}", name),
                LayerOperation::Delete { index, saved } => match saved {
                    Some(s) => format!("Delete Layer: {}", s.name),
                    None => format!("Delete Layer {}", index),
                },
                LayerOperation::Move { from, to } => format!("Move Layer {} → {}", from, to),
                LayerOperation::Visibility { index, was_visible } => {
                    if *was_visible {
                        format!("Hide Layer {}", index)
                    } else {
                        format!("Show Layer {}", index)
                    }
                }
                LayerOperation::Opacity { index, new, .. } => {
                    format!("Layer {} Opacity: {:.0}%", index, new * 100.0)
                }
                LayerOperation::Rename { old, new, .. } => {
                    format!("Rename Layer: {} to {}", old, new)
                }
                LayerOperation::Duplicate { source, .. } => {
                    format!("Duplicate Layer {}", source)
                }
            },
        }
    }

    /// History-stack memory cost, for diagnostics.
    pub fn memory_size(&self) -> usize {
        let snap = |s: &Option<Snapshot>| s.as_ref().map_or(0, Snapshot::memory_bytes);
        match self {
            Command::Draw { before, after, .. } => snap(before) + snap(after),
            Command::Clear { before, .. } => snap(before),
            Command::DeleteSelection { before, after, .. } => snap(before) + snap(after),
            Command::FlipSelection { before, after, .. } => snap(before) + snap(after),
            Command::LayerOp(op) => match op {
                LayerOperation::Delete { saved, .. } => saved
                    .as_ref()
                    .map_or(0, |s| s.snapshot.memory_bytes() + s.name.len()),
                _ => std::mem::size_of::<LayerOperation>(),
            },
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn get_layer_mut<'a>(
    mgr: &'a mut LayerManager,
    index: usize,
) -> Result<&'a mut Layer, EditorError> {
    let count = mgr.layer_count();
    mgr.layer_mut(index)
        .ok_or(EditorError::LayerIndexOutOfRange { index, count })
}

fn restore_layer(
    mgr: &mut LayerManager,
    index: usize,
    snapshot: &Snapshot,
) -> Result<(), EditorError> {
    get_layer_mut(mgr, index)?.surface_mut().restore(snapshot)
}

/// Clamp an image-space rect to integer pixel bounds `[x0, x1) × [y0, y1)`.
pub fn rect_bounds(rect: &Rect, width: u32, height: u32) -> (u32, u32, u32, u32) {
    let x0 = (rect.min.x.floor().max(0.0) as u32).min(width);
    let y0 = (rect.min.y.floor().max(0.0) as u32).min(height);
    let x1 = (rect.max.x.ceil().max(0.0) as u32).min(width);
    let y1 = (rect.max.y.ceil().max(0.0) as u32).min(height);
    (x0, y0, x1, y1)
}
