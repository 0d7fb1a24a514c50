//! Owned RGBA8 drawing surface modelling a render target.
//!
//! Pixel rows are stored **bottom-left-origin** internally (render-target
//! convention).  Every public accessor takes top-left-origin coordinates and
//! performs the y-flip, and `snapshot()` / `restore()` hand out / accept
//! top-left-origin buffers — callers never see the internal row order.

use image::{imageops, Rgba, RgbaImage};

use crate::error::EditorError;

/// A full-resolution deep copy of a surface's pixels.
///
/// Always top-left-origin RGBA8, vertically un-flipped relative to the
/// surface it was taken from.
#[derive(Clone, PartialEq)]
pub struct Snapshot {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Snapshot {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw top-left-origin RGBA8 bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn memory_bytes(&self) -> usize {
        self.pixels.len()
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixels", &format!("<{} bytes>", self.pixels.len()))
            .finish()
    }
}

/// An owned, resizable RGBA8 bitmap.
///
/// Move-only: the backing buffer is released exactly once when the surface
/// is dropped.  Deep copies are explicit via [`PixelSurface::duplicate`].
pub struct PixelSurface {
    width: u32,
    height: u32,
    /// Bottom-up row order, 4 bytes per pixel.
    data: Vec<u8>,
    /// True once the first draw scope has completed.
    initialized: bool,
    /// Bumped at the end of every draw scope.
    generation: u64,
}

impl PixelSurface {
    /// Allocate a fully transparent surface.  Fails only on a zero dimension.
    pub fn new(width: u32, height: u32) -> Result<Self, EditorError> {
        if width == 0 || height == 0 {
            return Err(EditorError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize * 4],
            initialized: false,
            generation: 0,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Byte offset of a pixel given in top-left coordinates.
    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        let flipped = (self.height - 1 - y) as usize;
        (flipped * self.width as usize + x as usize) * 4
    }

    /// Read a pixel (top-left coordinates).
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        let i = self.offset(x, y);
        Rgba([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    /// Open a drawing scope.  All mutation goes through the returned guard;
    /// the scope is closed on every exit path (including unwinding) by `Drop`.
    pub fn begin_drawing(&mut self) -> DrawScope<'_> {
        DrawScope { surface: self }
    }

    /// Full-resolution copy of the current pixels, corrected to
    /// top-left-origin row order.
    pub fn snapshot(&self) -> Snapshot {
        let row = (self.width * 4) as usize;
        let mut pixels = Vec::with_capacity(self.data.len());
        for chunk in self.data.chunks_exact(row).rev() {
            pixels.extend_from_slice(chunk);
        }
        Snapshot {
            width: self.width,
            height: self.height,
            pixels,
        }
    }

    /// Overwrite the surface with a previously taken snapshot.  The snapshot
    /// dimensions must match exactly; resize-on-write is not performed.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<(), EditorError> {
        if snapshot.width != self.width || snapshot.height != self.height {
            return Err(EditorError::SnapshotMismatch {
                snap_w: snapshot.width,
                snap_h: snapshot.height,
                surf_w: self.width,
                surf_h: self.height,
            });
        }
        let row = (self.width * 4) as usize;
        for (dst, src) in self
            .data
            .chunks_exact_mut(row)
            .rev()
            .zip(snapshot.pixels.chunks_exact(row))
        {
            dst.copy_from_slice(src);
        }
        self.initialized = true;
        self.generation += 1;
        Ok(())
    }

    /// Reallocate to new dimensions.  With `rescale_content` the previous
    /// pixels are rescaled to fill the new size; otherwise the surface comes
    /// back transparent.  Used by canvas-wide resize, not by normal editing.
    pub fn resize(
        &mut self,
        width: u32,
        height: u32,
        rescale_content: bool,
    ) -> Result<(), EditorError> {
        if width == 0 || height == 0 {
            return Err(EditorError::InvalidDimensions { width, height });
        }
        if width == self.width && height == self.height {
            return Ok(());
        }
        if rescale_content {
            let flat = self.to_rgba_image();
            let scaled = imageops::resize(&flat, width, height, imageops::FilterType::Triangle);
            *self = Self::from_rgba_image(&scaled);
            self.initialized = true;
        } else {
            self.data = vec![0u8; width as usize * height as usize * 4];
            self.width = width;
            self.height = height;
        }
        self.generation += 1;
        Ok(())
    }

    /// Explicit deep copy (the surface itself is move-only).
    pub fn duplicate(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            data: self.data.clone(),
            initialized: self.initialized,
            generation: 0,
        }
    }

    /// Flatten into a top-left-origin `RgbaImage` (for compositing and I/O).
    pub fn to_rgba_image(&self) -> RgbaImage {
        let row = (self.width * 4) as usize;
        let mut out = Vec::with_capacity(self.data.len());
        for chunk in self.data.chunks_exact(row).rev() {
            out.extend_from_slice(chunk);
        }
        // Buffer length matches width*height*4 by construction.
        RgbaImage::from_raw(self.width, self.height, out)
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }

    /// Build a surface from a top-left-origin image.
    pub fn from_rgba_image(image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let row = (width * 4) as usize;
        let mut data = Vec::with_capacity(image.as_raw().len());
        for chunk in image.as_raw().chunks_exact(row).rev() {
            data.extend_from_slice(chunk);
        }
        Self {
            width,
            height,
            data,
            initialized: true,
            generation: 0,
        }
    }

    /// Copy out a sub-rectangle (top-left coordinates, clamped to bounds).
    pub fn extract_region(&self, x: u32, y: u32, w: u32, h: u32) -> RgbaImage {
        let x1 = (x + w).min(self.width);
        let y1 = (y + h).min(self.height);
        let x0 = x.min(self.width);
        let y0 = y.min(self.height);
        let rw = x1.saturating_sub(x0);
        let rh = y1.saturating_sub(y0);
        let mut out = RgbaImage::new(rw.max(1), rh.max(1));
        for ry in 0..rh {
            for rx in 0..rw {
                out.put_pixel(rx, ry, self.pixel(x0 + rx, y0 + ry));
            }
        }
        out
    }
}

/// RAII drawing scope.  Holds exclusive access to the surface pixels and
/// guarantees the scope is closed (generation bump, initialized flag) on
/// every exit path.
pub struct DrawScope<'a> {
    surface: &'a mut PixelSurface,
}

impl DrawScope<'_> {
    pub fn width(&self) -> u32 {
        self.surface.width
    }

    pub fn height(&self) -> u32 {
        self.surface.height
    }

    /// Fill the whole surface with one color.
    pub fn clear(&mut self, color: Rgba<u8>) {
        for px in self.surface.data.chunks_exact_mut(4) {
            px.copy_from_slice(&color.0);
        }
    }

    /// Write a single pixel (top-left coordinates).  Out-of-bounds writes
    /// are ignored.
    pub fn put_pixel(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        if x >= self.surface.width || y >= self.surface.height {
            return;
        }
        let i = self.surface.offset(x, y);
        self.surface.data[i..i + 4].copy_from_slice(&color.0);
    }

    /// Clear exactly the pixels inside `[x0, x1) × [y0, y1)` to transparent,
    /// leaving the rest of the surface untouched (scissored clear).
    pub fn clear_region(&mut self, x0: u32, y0: u32, x1: u32, y1: u32) {
        let x1 = x1.min(self.surface.width);
        let y1 = y1.min(self.surface.height);
        for y in y0.min(y1)..y1 {
            for x in x0.min(x1)..x1 {
                let i = self.surface.offset(x, y);
                self.surface.data[i..i + 4].copy_from_slice(&[0, 0, 0, 0]);
            }
        }
    }

    /// Overwrite a rectangle with the given image, top-left corner at
    /// `(dst_x, dst_y)`.  Writes every pixel including transparent ones;
    /// clipped to the surface bounds.
    pub fn copy_image(&mut self, dst_x: i64, dst_y: i64, src: &RgbaImage) {
        self.write_image(dst_x, dst_y, src, false);
    }

    /// Draw the given image over the surface, skipping fully transparent
    /// source pixels.  Clipped to the surface bounds.
    pub fn blit_image(&mut self, dst_x: i64, dst_y: i64, src: &RgbaImage) {
        self.write_image(dst_x, dst_y, src, true);
    }

    fn write_image(&mut self, dst_x: i64, dst_y: i64, src: &RgbaImage, skip_transparent: bool) {
        let (sw, sh) = src.dimensions();
        for sy in 0..sh {
            let cy = dst_y + sy as i64;
            if cy < 0 || cy >= self.surface.height as i64 {
                continue;
            }
            for sx in 0..sw {
                let cx = dst_x + sx as i64;
                if cx < 0 || cx >= self.surface.width as i64 {
                    continue;
                }
                let p = *src.get_pixel(sx, sy);
                if skip_transparent && p[3] == 0 {
                    continue;
                }
                let i = self.surface.offset(cx as u32, cy as u32);
                self.surface.data[i..i + 4].copy_from_slice(&p.0);
            }
        }
    }
}

impl Drop for DrawScope<'_> {
    fn drop(&mut self) {
        self.surface.initialized = true;
        self.surface.generation += 1;
    }
}
