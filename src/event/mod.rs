mod bus;
mod events;
mod handlers;

pub use bus::{EventBus, SubscriptionId};
pub use events::OverlayEvent;
pub use handlers::LogEventHandler;

/// Host-side observer of overlay events
pub trait EventHandler: Send {
    fn handle_event(&mut self, event: &OverlayEvent);
}
