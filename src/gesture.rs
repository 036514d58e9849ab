use egui::{Pos2, Vec2};

/// Lifecycle of a continuous gesture recognizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Began,
    Changed,
    Ended,
    Cancelled,
}

impl GesturePhase {
    pub fn is_finished(self) -> bool {
        matches!(self, GesturePhase::Ended | GesturePhase::Cancelled)
    }
}

/// Which recognizer produced a gesture tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecognizerKind {
    Pan,
    Pinch,
    Rotate,
}

/// A gesture tick delivered by the host to one overlay
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// Single tap on the overlay
    Tap,
    /// Drag. `translation` is the total movement since the pan began, in
    /// container space; `location` is the pointer in host view space.
    Pan {
        phase: GesturePhase,
        translation: Vec2,
        location: Pos2,
    },
    /// Pinch. `factor` is the scale change since the previous tick.
    Pinch { phase: GesturePhase, factor: f32 },
    /// Two-finger rotation. `delta` is radians since the previous tick.
    Rotate { phase: GesturePhase, delta: f32 },
}

impl Gesture {
    pub fn phase(&self) -> Option<GesturePhase> {
        match self {
            Gesture::Tap => None,
            Gesture::Pan { phase, .. }
            | Gesture::Pinch { phase, .. }
            | Gesture::Rotate { phase, .. } => Some(*phase),
        }
    }

    pub fn recognizer(&self) -> Option<RecognizerKind> {
        match self {
            Gesture::Tap => None,
            Gesture::Pan { .. } => Some(RecognizerKind::Pan),
            Gesture::Pinch { .. } => Some(RecognizerKind::Pinch),
            Gesture::Rotate { .. } => Some(RecognizerKind::Rotate),
        }
    }

    pub fn location(&self) -> Option<Pos2> {
        match self {
            Gesture::Pan { location, .. } => Some(*location),
            _ => None,
        }
    }
}
