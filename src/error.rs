use thiserror::Error;

/// Errors surfaced by the editing core.
///
/// Precondition failures (bad index, empty selection, last-layer deletion)
/// are ordinary values returned to the caller — no partial mutation has
/// happened when one of these comes back. Only constructor misuse
/// (`InvalidDimensions`) indicates a programming error at the call site.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("invalid surface dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("layer index {index} out of range ({count} layers)")]
    LayerIndexOutOfRange { index: usize, count: usize },

    #[error("cannot move layer from {from} to {to}")]
    InvalidMove { from: usize, to: usize },

    #[error("cannot delete the last remaining layer")]
    LastLayer,

    #[error("no selection is active")]
    NoSelection,

    #[error("selection contains no pixels")]
    EmptySelection,

    #[error("command has no captured snapshot to restore")]
    MissingSnapshot,

    #[error("snapshot is {snap_w}x{snap_h} but surface is {surf_w}x{surf_h}")]
    SnapshotMismatch {
        snap_w: u32,
        snap_h: u32,
        surf_w: u32,
        surf_h: u32,
    },

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
