//! Enum-keyed synchronous event bus.
//!
//! Core components publish; UI panels subscribe.  Publishing calls every
//! handler registered for the event's kind immediately, on the same thread,
//! in subscription order (FIFO within one kind).  No queuing, no replay.

use std::cell::RefCell;
use std::collections::HashMap;

/// Lifecycle notifications emitted by the editing core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorEvent {
    LayerCreated { index: usize },
    LayerDeleted { index: usize },
    LayersReordered { from: usize, to: usize },
    LayerVisibilityChanged { index: usize, visible: bool },
    ActiveLayerChanged { index: usize },
    ImageLoaded,
    ImageSaved,
}

/// Discriminant used to key subscriber lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    LayerCreated,
    LayerDeleted,
    LayersReordered,
    LayerVisibilityChanged,
    ActiveLayerChanged,
    ImageLoaded,
    ImageSaved,
}

impl EditorEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            EditorEvent::LayerCreated { .. } => EventKind::LayerCreated,
            EditorEvent::LayerDeleted { .. } => EventKind::LayerDeleted,
            EditorEvent::LayersReordered { .. } => EventKind::LayersReordered,
            EditorEvent::LayerVisibilityChanged { .. } => EventKind::LayerVisibilityChanged,
            EditorEvent::ActiveLayerChanged { .. } => EventKind::ActiveLayerChanged,
            EditorEvent::ImageLoaded => EventKind::ImageLoaded,
            EditorEvent::ImageSaved => EventKind::ImageSaved,
        }
    }
}

type Handler = Box<dyn FnMut(&EditorEvent)>;

/// A simple event bus broadcasting editor events to registered handlers.
pub struct EventBus {
    handlers: RefCell<HashMap<EventKind, Vec<Handler>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count: usize = self.handlers.borrow().values().map(Vec::len).sum();
        f.debug_struct("EventBus")
            .field("handlers", &format!("<{} handlers>", count))
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(HashMap::new()),
        }
    }

    /// Subscribe a handler to one event kind.  Handlers for a kind are
    /// invoked in subscription order.
    pub fn subscribe(&self, kind: EventKind, handler: impl FnMut(&EditorEvent) + 'static) {
        self.handlers
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push(Box::new(handler));
    }

    /// Emit an event to every handler registered for its kind.
    ///
    /// The handler list is detached from the bus for the duration of the
    /// call, so a handler may subscribe (or emit for another kind)
    /// re-entrantly without tripping the interior borrow.  Handlers added
    /// for this kind during delivery run from the next emit onward.
    pub fn emit(&self, event: EditorEvent) {
        let kind = event.kind();
        let Some(mut list) = self.handlers.borrow_mut().remove(&kind) else {
            return;
        };
        for handler in list.iter_mut() {
            handler(&event);
        }
        // Reattach, keeping any handlers subscribed while we were emitting
        // after the pre-existing ones.
        let mut map = self.handlers.borrow_mut();
        let added = map.entry(kind).or_default();
        list.append(added);
        *added = list;
    }
}
