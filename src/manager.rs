//! Ordered layer stack plus the active-layer index.
//!
//! Insertion order is paint order: later entries paint on top.  Every
//! mutator re-establishes the `(layers, active_index)` invariant before
//! returning — the stack is never empty and the active index always points
//! at a live layer.

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::error::EditorError;
use crate::events::{EditorEvent, EventBus};
use crate::layer::{BlendMode, Layer};

pub struct LayerManager {
    layers: Vec<Layer>,
    active: usize,
    width: u32,
    height: u32,
    events: EventBus,
}

impl LayerManager {
    /// Create a manager holding a single white "Background" layer.
    pub fn new(width: u32, height: u32) -> Result<Self, EditorError> {
        let background =
            Layer::new_filled("Background", width, height, Rgba([255, 255, 255, 255]))?;
        Ok(Self {
            layers: vec![background],
            active: 0,
            width,
            height,
            events: EventBus::new(),
        })
    }

    /// Create a manager whose background layer holds the given image.
    /// Canvas dimensions come from the image.
    pub fn from_image(image: &RgbaImage) -> Result<Self, EditorError> {
        let (width, height) = image.dimensions();
        let mut mgr = Self::new(width, height)?;
        mgr.layers[0]
            .surface_mut()
            .begin_drawing()
            .copy_image(0, 0, image);
        mgr.events.emit(EditorEvent::ImageLoaded);
        Ok(mgr)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_layer(&self) -> &Layer {
        &self.layers[self.active]
    }

    pub fn active_layer_mut(&mut self) -> &mut Layer {
        &mut self.layers[self.active]
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    fn check_index(&self, index: usize) -> Result<(), EditorError> {
        if index >= self.layers.len() {
            return Err(EditorError::LayerIndexOutOfRange {
                index,
                count: self.layers.len(),
            });
        }
        Ok(())
    }

    // === Structural mutations ===============================================

    /// Append a new transparent layer sized to the canvas.  Returns the new
    /// index (== old count).
    pub fn create_layer(&mut self, name: &str) -> Result<usize, EditorError> {
        let layer = Layer::new(name, self.width, self.height)?;
        self.layers.push(layer);
        let index = self.layers.len() - 1;
        self.events.emit(EditorEvent::LayerCreated { index });
        Ok(index)
    }

    /// Re-insert a previously removed layer (undo of delete).  `index` is
    /// clamped to the current length.  A layer whose dimensions no longer
    /// match the canvas (the canvas was resized while the layer sat in
    /// history) is rescaled on the way in, keeping every layer the same size.
    pub fn insert_layer(&mut self, index: usize, mut layer: Layer) -> usize {
        if layer.width() != self.width || layer.height() != self.height {
            // canvas dimensions are validated non-zero, so resize cannot fail
            let _ = layer
                .surface_mut()
                .resize(self.width, self.height, true);
        }
        let index = index.min(self.layers.len());
        self.layers.insert(index, layer);
        if self.active >= index && self.layers.len() > 1 {
            // keep the previously active layer active
            self.active = (self.active + 1).min(self.layers.len() - 1);
        }
        self.events.emit(EditorEvent::LayerCreated { index });
        index
    }

    /// Remove a layer.  Rejected (no mutation) when the index is invalid or
    /// only one layer remains.  Returns the removed layer so callers can
    /// retain it for undo.
    pub fn delete_layer(&mut self, index: usize) -> Result<Layer, EditorError> {
        self.check_index(index)?;
        if self.layers.len() == 1 {
            return Err(EditorError::LastLayer);
        }
        let removed = self.layers.remove(index);
        let old_active = self.active;
        if self.active >= index {
            self.active = self.active.saturating_sub(1);
        }
        if self.active >= self.layers.len() {
            self.active = self.layers.len() - 1;
        }
        self.events.emit(EditorEvent::LayerDeleted { index });
        if self.active != old_active {
            self.events
                .emit(EditorEvent::ActiveLayerChanged { index: self.active });
        }
        Ok(removed)
    }

    /// Relocate a layer in the stack (splice, not swap).  Fails on invalid
    /// or equal indices.
    pub fn move_layer(&mut self, from: usize, to: usize) -> Result<(), EditorError> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from == to {
            return Err(EditorError::InvalidMove { from, to });
        }
        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);

        // Re-derive the active index: snap when it was the moved layer,
        // shift by one when it fell inside the moved range.
        if self.active == from {
            self.active = to;
        } else if from < self.active && to >= self.active {
            self.active -= 1;
        } else if from > self.active && to <= self.active {
            self.active += 1;
        }

        self.events.emit(EditorEvent::LayersReordered { from, to });
        Ok(())
    }

    /// Insert a deep copy immediately after the source layer, name suffixed
    /// `" Copy"`.  Returns the copy's index.
    pub fn duplicate_layer(&mut self, index: usize) -> Result<usize, EditorError> {
        self.check_index(index)?;
        let copy_name = format!("{} Copy", self.layers[index].name);
        let copy = self.layers[index].duplicate(copy_name);
        let new_index = index + 1;
        self.layers.insert(new_index, copy);
        if self.active > index {
            self.active += 1;
        }
        self.events
            .emit(EditorEvent::LayerCreated { index: new_index });
        Ok(new_index)
    }

    // === In-place property mutations ========================================

    pub fn set_active_layer(&mut self, index: usize) -> Result<(), EditorError> {
        self.check_index(index)?;
        if self.active != index {
            self.active = index;
            self.events.emit(EditorEvent::ActiveLayerChanged { index });
        }
        Ok(())
    }

    pub fn set_layer_visibility(&mut self, index: usize, visible: bool) -> Result<(), EditorError> {
        self.check_index(index)?;
        self.layers[index].visible = visible;
        self.events
            .emit(EditorEvent::LayerVisibilityChanged { index, visible });
        Ok(())
    }

    pub fn set_layer_opacity(&mut self, index: usize, opacity: f32) -> Result<(), EditorError> {
        self.check_index(index)?;
        self.layers[index].set_opacity(opacity);
        Ok(())
    }

    pub fn set_layer_blend_mode(
        &mut self,
        index: usize,
        mode: BlendMode,
    ) -> Result<(), EditorError> {
        self.check_index(index)?;
        self.layers[index].blend_mode = mode;
        Ok(())
    }

    pub fn set_layer_name(&mut self, index: usize, name: &str) -> Result<(), EditorError> {
        self.check_index(index)?;
        self.layers[index].name = name.to_string();
        Ok(())
    }

    // === Compositing ========================================================

    /// Flatten the stack: clear the target, then paint every visible layer
    /// bottom-to-top with straight-alpha "over" at `pixel_alpha × opacity`.
    ///
    /// The per-layer blend-mode field is carried but does not yet change the
    /// blend function — every mode composites as alpha-over.  Documented
    /// limitation, not a bug.
    pub fn composite(&self) -> RgbaImage {
        let w = self.width;
        let h = self.height;
        let mut out = RgbaImage::new(w, h);
        // Only visible, canvas-sized layers participate; a mismatched layer
        // would read past its own bounds.
        let layers: Vec<&Layer> = self
            .layers
            .iter()
            .filter(|l| l.visible && l.width() == w && l.height() == h)
            .collect();
        let row_bytes = (w * 4) as usize;

        let samples: &mut [u8] = &mut out;
        samples
            .par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(y, row)| {
                for x in 0..w {
                    let mut base = Rgba([0u8, 0, 0, 0]);
                    for layer in &layers {
                        let top = layer.surface().pixel(x, y as u32);
                        base = blend_over(base, top, layer.opacity());
                    }
                    let i = (x * 4) as usize;
                    row[i..i + 4].copy_from_slice(&base.0);
                }
            });
        out
    }

    /// Rescale every layer's surface to new canvas dimensions.  Canvas-wide
    /// resize only; never used by ordinary edits.
    pub fn resize_all_layers(&mut self, width: u32, height: u32) -> Result<(), EditorError> {
        if width == 0 || height == 0 {
            return Err(EditorError::InvalidDimensions { width, height });
        }
        for layer in &mut self.layers {
            layer.surface_mut().resize(width, height, true)?;
        }
        self.width = width;
        self.height = height;
        Ok(())
    }
}

/// Straight-alpha "over" with the layer opacity folded into the top alpha.
fn blend_over(base: Rgba<u8>, top: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let top_a = (top[3] as f32 / 255.0) * opacity.clamp(0.0, 1.0);
    if top_a <= 0.0 {
        return base;
    }
    let base_a = base[3] as f32 / 255.0;
    if base_a <= 0.0 && top_a >= 1.0 {
        return top;
    }
    let inv = 1.0 - top_a;
    let out_a = top_a + base_a * inv;
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let blend = |t: u8, b: u8| -> u8 {
        let v = (t as f32 * top_a + b as f32 * base_a * inv) / out_a;
        v.clamp(0.0, 255.0) as u8
    };
    Rgba([
        blend(top[0], base[0]),
        blend(top[1], base[1]),
        blend(top[2], base[2]),
        (out_a * 255.0).clamp(0.0, 255.0) as u8,
    ])
}
