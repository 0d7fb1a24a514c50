use image::Rgba;

use crate::error::EditorError;
use crate::surface::PixelSurface;

/// Blend mode declared on a layer.
///
/// Recorded and round-tripped through duplicate/undo, but the compositor
/// currently paints every mode as straight-alpha "over" — see
/// [`crate::manager::LayerManager::composite`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    SoftLight,
    HardLight,
}

impl BlendMode {
    /// All modes, in display order.
    pub fn all() -> &'static [BlendMode] {
        &[
            BlendMode::Normal,
            BlendMode::Multiply,
            BlendMode::Screen,
            BlendMode::Overlay,
            BlendMode::SoftLight,
            BlendMode::HardLight,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            BlendMode::Normal => "Normal",
            BlendMode::Multiply => "Multiply",
            BlendMode::Screen => "Screen",
            BlendMode::Overlay => "Overlay",
            BlendMode::SoftLight => "Soft Light",
            BlendMode::HardLight => "Hard Light",
        }
    }
}

/// A single drawing surface in the stack.
///
/// Move-only (the surface owns its backing buffer); lifecycle is tied to the
/// owning [`crate::manager::LayerManager`].
pub struct Layer {
    pub name: String,
    pub visible: bool,
    pub blend_mode: BlendMode,
    opacity: f32,
    surface: PixelSurface,
}

impl Layer {
    /// Create a transparent layer sized to the canvas.
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Result<Self, EditorError> {
        Ok(Self {
            name: name.into(),
            visible: true,
            blend_mode: BlendMode::Normal,
            opacity: 1.0,
            surface: PixelSurface::new(width, height)?,
        })
    }

    /// Create a layer pre-filled with one color (e.g. the white background).
    pub fn new_filled(
        name: impl Into<String>,
        width: u32,
        height: u32,
        fill: Rgba<u8>,
    ) -> Result<Self, EditorError> {
        let mut layer = Self::new(name, width, height)?;
        layer.surface.begin_drawing().clear(fill);
        Ok(layer)
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Set the layer opacity, clamped to `[0, 1]`.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn surface(&self) -> &PixelSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut PixelSurface {
        &mut self.surface
    }

    /// Deep copy: pixel content plus visibility/opacity/blend mode.
    /// The caller decides the copy's name.
    pub fn duplicate(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visible: self.visible,
            blend_mode: self.blend_mode,
            opacity: self.opacity,
            surface: self.surface.duplicate(),
        }
    }
}
