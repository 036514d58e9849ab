use egui::{Pos2, Rect, Vec2};
use log::{debug, info};

use super::{GestureResponse, OverlayId, OverlayKind, OverlayObject, StateRecord, TextPayload};
use crate::error::{MarkupError, MarkupResult};
use crate::event::{EventBus, OverlayEvent};
use crate::gesture::Gesture;

/// Result of routing a gesture to the stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    /// The overlay is disabled or nothing changed
    Ignored,
    Handled,
    /// The overlay was dropped on the drop target and removed
    Removed,
}

/// Container of overlays, back to front.
///
/// Only one overlay is manipulated at a time: when one begins an operation
/// every enabled sibling is disabled until it ends. Overlays the host
/// disabled stay disabled. Exactly one overlay may be selected; tapping
/// moves the selection.
#[derive(Debug)]
pub struct OverlayStage {
    overlays: Vec<OverlayObject>,
    // Siblings disabled by the running operation
    frozen: Vec<OverlayId>,
    drop_target: Option<Rect>,
    max_gesture_scale: f32,
    events: EventBus,
}

impl OverlayStage {
    pub fn new(max_gesture_scale: f32) -> Self {
        Self {
            overlays: Vec::new(),
            frozen: Vec::new(),
            drop_target: None,
            max_gesture_scale,
            events: EventBus::new(),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn max_gesture_scale(&self) -> f32 {
        self.max_gesture_scale
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    /// Overlays in drawing order, topmost last
    pub fn iter(&self) -> impl Iterator<Item = &OverlayObject> {
        self.overlays.iter()
    }

    pub fn ids(&self) -> Vec<OverlayId> {
        self.overlays.iter().map(OverlayObject::id).collect()
    }

    pub fn get(&self, id: OverlayId) -> Option<&OverlayObject> {
        self.overlays.iter().find(|o| o.id() == id)
    }

    fn index_of(&self, id: OverlayId) -> MarkupResult<usize> {
        self.overlays
            .iter()
            .position(|o| o.id() == id)
            .ok_or(MarkupError::OverlayNotFound(id))
    }

    fn get_mut(&mut self, id: OverlayId) -> MarkupResult<&mut OverlayObject> {
        let index = self.index_of(id)?;
        Ok(&mut self.overlays[index])
    }

    /// Add an overlay on top of the others
    pub fn add(&mut self, overlay: OverlayObject) -> OverlayId {
        let id = overlay.id();
        info!("🏷️ Added {:?} overlay {}", overlay.kind(), id);
        self.overlays.push(overlay);
        id
    }

    pub fn remove(&mut self, id: OverlayId) -> Option<OverlayObject> {
        let index = self.index_of(id).ok()?;
        info!("🗑️ Removed overlay {}", id);
        Some(self.overlays.remove(index))
    }

    pub fn clear(&mut self) {
        self.overlays.clear();
        self.frozen.clear();
    }

    pub fn bring_to_front(&mut self, id: OverlayId) -> MarkupResult<()> {
        let index = self.index_of(id)?;
        let overlay = self.overlays.remove(index);
        self.overlays.push(overlay);
        Ok(())
    }

    pub fn set_enabled(&mut self, id: OverlayId, enabled: bool) -> MarkupResult<()> {
        self.get_mut(id)?.set_enabled(enabled);
        // An explicit choice by the host outlives the running operation
        self.frozen.retain(|frozen| *frozen != id);
        Ok(())
    }

    /// Make `id` the only selected overlay
    pub fn select(&mut self, id: OverlayId) -> MarkupResult<()> {
        self.index_of(id)?;
        for overlay in &mut self.overlays {
            if overlay.id() == id {
                overlay.set_selected(true);
            } else {
                overlay.reset_state();
            }
        }
        Ok(())
    }

    pub fn selected(&self) -> Option<OverlayId> {
        self.overlays.iter().find(|o| o.is_selected()).map(OverlayObject::id)
    }

    pub fn clear_selection(&mut self) {
        for overlay in &mut self.overlays {
            overlay.set_selected(false);
        }
    }

    /// Scale one overlay along with a container resize
    pub fn resize(&mut self, id: OverlayId, factor: f32) -> MarkupResult<()> {
        self.get_mut(id)?.add_scale(factor);
        Ok(())
    }

    /// Scale every overlay along with a container resize
    pub fn resize_all(&mut self, factor: f32) {
        for overlay in &mut self.overlays {
            overlay.add_scale(factor);
        }
    }

    pub fn snapshot_state(&self, id: OverlayId) -> MarkupResult<StateRecord> {
        self.get(id)
            .map(OverlayObject::state)
            .ok_or(MarkupError::OverlayNotFound(id))
    }

    /// Rebuild an overlay from a snapshot and put it on top
    pub fn restore_from_state(&mut self, record: StateRecord) -> OverlayId {
        let overlay = OverlayObject::from_state(record, self.max_gesture_scale);
        self.add(overlay)
    }

    pub fn update_text(&mut self, id: OverlayId, payload: TextPayload, size: Vec2) -> MarkupResult<()> {
        let overlay = self.get_mut(id)?;
        if overlay.kind() != OverlayKind::Text {
            return Err(MarkupError::NotTextOverlay(id));
        }
        overlay.set_text(payload, size);
        Ok(())
    }

    /// Area (in host view space) where dropping an overlay deletes it
    pub fn set_drop_target(&mut self, target: Option<Rect>) {
        self.drop_target = target;
    }

    fn over_drop_target(&self, location: Option<Pos2>) -> bool {
        match (self.drop_target, location) {
            (Some(target), Some(point)) => target.contains(point),
            _ => false,
        }
    }

    /// Re-enable the siblings the running operation disabled
    fn thaw(&mut self) {
        for id in std::mem::take(&mut self.frozen) {
            if let Ok(overlay) = self.get_mut(id) {
                overlay.set_enabled(true);
            }
        }
    }

    /// Route one gesture tick to an overlay and notify the host
    pub fn handle_gesture(&mut self, id: OverlayId, gesture: &Gesture) -> MarkupResult<GestureOutcome> {
        let index = self.index_of(id)?;
        let overlay = &mut self.overlays[index];
        let response = overlay.apply(gesture);
        let location = gesture.location().or(overlay.pan_location());

        match response {
            GestureResponse::Ignored | GestureResponse::Unchanged => Ok(GestureOutcome::Ignored),
            GestureResponse::Tapped => {
                self.bring_to_front(id)?;
                if let Some(text) = self.overlays.last().and_then(OverlayObject::text) {
                    let text = text.text.clone();
                    self.events.emit(OverlayEvent::TextEditRequested { id, text });
                }
                self.select(id)?;
                self.events.emit(OverlayEvent::Tapped { id });
                Ok(GestureOutcome::Handled)
            }
            GestureResponse::Began => {
                self.bring_to_front(id)?;
                self.thaw();
                for overlay in self.overlays.iter_mut().filter(|o| o.id() != id) {
                    overlay.reset_state();
                    if overlay.is_enabled() {
                        overlay.set_enabled(false);
                        self.frozen.push(overlay.id());
                    }
                }
                debug!("overlay {} operation began", id);
                self.events.emit(OverlayEvent::OperationBegin { id });
                Ok(GestureOutcome::Handled)
            }
            GestureResponse::Updated => {
                let over_drop_target = self.over_drop_target(location);
                self.events.emit(OverlayEvent::OperationUpdate {
                    id,
                    location,
                    over_drop_target,
                });
                Ok(GestureOutcome::Handled)
            }
            GestureResponse::Ended => {
                self.thaw();
                let removed = self.over_drop_target(location);
                if removed {
                    self.remove(id);
                }
                debug!("overlay {} operation ended (removed: {})", id, removed);
                self.events.emit(OverlayEvent::OperationEnd {
                    id,
                    location,
                    removed,
                });
                Ok(if removed {
                    GestureOutcome::Removed
                } else {
                    GestureOutcome::Handled
                })
            }
        }
    }
}
