use egui::Pos2;

use crate::overlay::OverlayId;

/// Notifications from overlays to the host
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEvent {
    /// A manipulation started; the host typically shows the drop target
    OperationBegin { id: OverlayId },
    /// The overlay moved during a manipulation
    OperationUpdate {
        id: OverlayId,
        location: Option<Pos2>,
        over_drop_target: bool,
    },
    /// The manipulation finished; `removed` is set when the overlay was dropped on the target
    OperationEnd {
        id: OverlayId,
        location: Option<Pos2>,
        removed: bool,
    },
    /// The overlay was tapped and is now the selected one
    Tapped { id: OverlayId },
    /// A text overlay was tapped; the host should open its text editor
    TextEditRequested { id: OverlayId, text: String },
}

impl OverlayEvent {
    pub fn overlay_id(&self) -> OverlayId {
        match self {
            OverlayEvent::OperationBegin { id }
            | OverlayEvent::OperationUpdate { id, .. }
            | OverlayEvent::OperationEnd { id, .. }
            | OverlayEvent::Tapped { id }
            | OverlayEvent::TextEditRequested { id, .. } => *id,
        }
    }
}
