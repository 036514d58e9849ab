use std::collections::HashSet;
use std::fmt;

use ab_glyph::FontArc;
use egui::{Pos2, Rect, Vec2};
use ::image::RgbaImage;
use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::gesture::{Gesture, GesturePhase, RecognizerKind};
use crate::transform::{Placement, TransformState};

pub mod image;
pub mod stage;
pub mod text;

pub use self::image::ImagePayload;
pub use self::text::TextPayload;
pub use stage::{GestureOutcome, OverlayStage};

/// Inset between an overlay's frame and its border, and again between border and content
pub const EDGE_INSET: f32 = 10.0;

/// Unique identifier for an overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OverlayId(Uuid);

impl OverlayId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OverlayId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    Text,
    Image,
}

/// What an overlay shows
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayPayload {
    Text(TextPayload),
    /// Bitmap stickers, including emoji rendered to an image by the host
    Image(ImagePayload),
}

impl OverlayPayload {
    pub fn kind(&self) -> OverlayKind {
        match self {
            OverlayPayload::Text(_) => OverlayKind::Text,
            OverlayPayload::Image(_) => OverlayKind::Image,
        }
    }
}

/// Everything needed to rebuild an overlay
#[derive(Debug, Clone, PartialEq)]
pub struct StateRecord {
    pub payload: OverlayPayload,
    pub origin_scale: f32,
    pub origin_angle_deg: f32,
    pub origin_frame: Rect,
    pub gesture_scale: f32,
    pub gesture_rotation_rad: f32,
    pub cumulative_translation: Vec2,
}

impl StateRecord {
    pub fn kind(&self) -> OverlayKind {
        self.payload.kind()
    }
}

/// What a gesture tick did to an overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureResponse {
    /// The overlay is disabled
    Ignored,
    /// Nothing visible changed
    Unchanged,
    Tapped,
    /// The first recognizer began; the overlay is now being manipulated
    Began,
    Updated,
    /// The last active recognizer finished
    Ended,
}

/// A movable, rotatable, scalable sticker
#[derive(Debug, Clone)]
pub struct OverlayObject {
    id: OverlayId,
    payload: OverlayPayload,
    transform: TransformState,
    enabled: bool,
    selected: bool,
    active: HashSet<RecognizerKind>,
    // Last pan location in the current operation
    pan_location: Option<Pos2>,
}

impl OverlayObject {
    pub fn new(payload: OverlayPayload, placement: Placement, max_gesture_scale: f32) -> Self {
        Self {
            id: OverlayId::new(),
            payload,
            transform: TransformState::new(placement, max_gesture_scale),
            enabled: true,
            selected: false,
            active: HashSet::new(),
            pan_location: None,
        }
    }

    /// Rebuild an overlay from a snapshot. It starts unselected.
    pub fn from_state(record: StateRecord, max_gesture_scale: f32) -> Self {
        let placement = Placement::new(
            record.origin_scale,
            record.origin_angle_deg,
            record.origin_frame,
        );
        Self {
            id: OverlayId::new(),
            payload: record.payload,
            transform: TransformState::restore(
                placement,
                record.gesture_scale,
                record.gesture_rotation_rad,
                record.cumulative_translation,
                max_gesture_scale,
            ),
            enabled: true,
            selected: false,
            active: HashSet::new(),
            pan_location: None,
        }
    }

    pub fn state(&self) -> StateRecord {
        let placement = self.transform.placement();
        StateRecord {
            payload: self.payload.clone(),
            origin_scale: placement.scale,
            origin_angle_deg: placement.angle_deg,
            origin_frame: placement.frame,
            gesture_scale: self.transform.gesture_scale(),
            gesture_rotation_rad: self.transform.gesture_rotation(),
            cumulative_translation: self.transform.cumulative_translation(),
        }
    }

    pub fn id(&self) -> OverlayId {
        self.id
    }

    pub fn kind(&self) -> OverlayKind {
        self.payload.kind()
    }

    pub fn payload(&self) -> &OverlayPayload {
        &self.payload
    }

    pub fn text(&self) -> Option<&TextPayload> {
        match &self.payload {
            OverlayPayload::Text(text) => Some(text),
            OverlayPayload::Image(_) => None,
        }
    }

    pub fn transform(&self) -> &TransformState {
        &self.transform
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub fn is_manipulating(&self) -> bool {
        !self.active.is_empty()
    }

    /// Where the pan recognizer last reported the touch during the current
    /// operation. Pinch and rotate ticks carry no location of their own.
    pub fn pan_location(&self) -> Option<Pos2> {
        self.pan_location
    }

    /// Drop the selection affordance and any stale operation
    pub fn reset_state(&mut self) {
        self.selected = false;
        self.active.clear();
        self.pan_location = None;
    }

    /// Track a container resize by `factor`
    pub fn add_scale(&mut self, factor: f32) {
        self.transform.add_scale(factor);
    }

    /// Replace the text of a text overlay, resizing its frame about the center
    pub fn set_text(&mut self, payload: TextPayload, size: Vec2) {
        self.payload = OverlayPayload::Text(payload);
        self.transform.change_size(size);
    }

    /// Feed one gesture tick to this overlay
    pub fn apply(&mut self, gesture: &Gesture) -> GestureResponse {
        if !self.enabled {
            return GestureResponse::Ignored;
        }

        match *gesture {
            Gesture::Tap => GestureResponse::Tapped,
            Gesture::Pan {
                phase,
                translation,
                location,
            } => {
                self.transform.set_in_flight(translation);
                if phase.is_finished() {
                    self.transform.commit();
                }
                let response = self.advance(RecognizerKind::Pan, phase, true);
                self.pan_location = Some(location);
                response
            }
            Gesture::Pinch { phase, factor } => {
                let changed = self.transform.pinch(factor);
                self.advance(RecognizerKind::Pinch, phase, changed)
            }
            Gesture::Rotate { phase, delta } => {
                self.transform.rotate(delta);
                self.advance(RecognizerKind::Rotate, phase, delta != 0.0)
            }
        }
    }

    fn advance(&mut self, kind: RecognizerKind, phase: GesturePhase, changed: bool) -> GestureResponse {
        debug!("overlay {} {:?} {:?}", self.id, kind, phase);
        match phase {
            GesturePhase::Began => {
                let first = self.active.is_empty();
                self.active.insert(kind);
                if first {
                    self.pan_location = None;
                    GestureResponse::Began
                } else if changed {
                    GestureResponse::Updated
                } else {
                    GestureResponse::Unchanged
                }
            }
            GesturePhase::Changed => {
                if changed {
                    GestureResponse::Updated
                } else {
                    GestureResponse::Unchanged
                }
            }
            GesturePhase::Ended | GesturePhase::Cancelled => {
                let was_active = self.active.remove(&kind);
                if was_active && self.active.is_empty() {
                    GestureResponse::Ended
                } else if changed {
                    GestureResponse::Updated
                } else {
                    GestureResponse::Unchanged
                }
            }
        }
    }

    /// Rasterize the untransformed content at `scale` pixels per edit-space unit
    pub fn render_tile(&self, scale: f32, font: Option<&FontArc>) -> Option<RgbaImage> {
        let size = self.transform.placement().frame.size();
        match &self.payload {
            OverlayPayload::Text(text) => text::render_tile(text, size, scale, font),
            OverlayPayload::Image(image) => image::render_tile(image, size, scale),
        }
    }
}
