use log::debug;

use crate::event::{EventHandler, OverlayEvent};

/// Writes every overlay event to the debug log
#[derive(Debug, Default)]
pub struct LogEventHandler;

impl EventHandler for LogEventHandler {
    fn handle_event(&mut self, event: &OverlayEvent) {
        debug!("overlay {}: {:?}", event.overlay_id(), event);
    }
}
