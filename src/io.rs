//! Image import/export.
//!
//! Format handling is delegated to the `image` crate; everything is
//! normalized to RGBA8 on the way in.  Export always flattens the stack.

use std::path::Path;

use image::RgbaImage;

use crate::error::EditorError;
use crate::events::EditorEvent;
use crate::log_info;
use crate::manager::LayerManager;

/// Load an image from disk as RGBA8.
pub fn load_image(path: &Path) -> Result<RgbaImage, EditorError> {
    let image = image::open(path)?.to_rgba8();
    log_info!(
        "Loaded image {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(image)
}

/// Open an image and build a layer stack around it.
pub fn open_as_document(path: &Path) -> Result<LayerManager, EditorError> {
    let image = load_image(path)?;
    LayerManager::from_image(&image)
}

/// Flatten the stack and write it out.  The target format comes from the
/// file extension.
pub fn export_flattened(mgr: &LayerManager, path: &Path) -> Result<(), EditorError> {
    let flat = mgr.composite();
    flat.save(path)?;
    mgr.events().emit(EditorEvent::ImageSaved);
    log_info!(
        "Exported {} layer(s) to {} ({}x{})",
        mgr.layer_count(),
        path.display(),
        flat.width(),
        flat.height()
    );
    Ok(())
}
