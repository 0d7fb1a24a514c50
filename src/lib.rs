//! Strata — the editing core of a layered raster image editor.
//!
//! The crate owns the layer stack ([`manager::LayerManager`]), the pixel
//! surfaces behind each layer ([`surface::PixelSurface`]), reversible edits
//! ([`commands::Command`] + [`history::HistoryManager`]) and the rectangular
//! selection/transform workflow ([`selection::SelectionEditor`]).  A thin
//! headless front end lives in [`cli`].

pub mod cli;
pub mod commands;
pub mod error;
pub mod events;
pub mod history;
pub mod io;
pub mod layer;
pub mod logger;
pub mod manager;
pub mod selection;
pub mod surface;

pub use commands::{Command, FlipAxis, LayerOperation};
pub use error::EditorError;
pub use events::{EditorEvent, EventBus, EventKind};
pub use history::HistoryManager;
pub use layer::{BlendMode, Layer};
pub use manager::LayerManager;
pub use selection::{Handle, SelectionEditor, SelectionState};
pub use surface::{PixelSurface, Snapshot};
