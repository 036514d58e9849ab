use std::cell::{Cell, RefCell};

use log::warn;

use crate::event::{EventHandler, OverlayEvent};

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Delivers overlay events to the host's observers, in subscription order.
///
/// Observers are optional: with none subscribed, emitting is a no-op.
/// Delivery is synchronous; an event emitted while another is being
/// delivered is dropped with a warning.
pub struct EventBus {
    handlers: RefCell<Vec<(SubscriptionId, Box<dyn EventHandler>)>>,
    next_id: Cell<u64>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.handlers.try_borrow().map(|h| h.len()).unwrap_or_default();
        f.debug_struct("EventBus")
            .field("handlers", &format!("<{} handlers>", count))
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    pub fn subscribe(&self, handler: Box<dyn EventHandler>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers.borrow_mut().push((id, handler));
        id
    }

    /// Returns `false` if `id` was not subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        handlers.len() != before
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub fn emit(&self, event: OverlayEvent) {
        let Ok(mut handlers) = self.handlers.try_borrow_mut() else {
            warn!("⚠️ Dropped {:?} emitted during delivery", event);
            return;
        };
        for (_, handler) in handlers.iter_mut() {
            handler.handle_event(&event);
        }
    }
}
