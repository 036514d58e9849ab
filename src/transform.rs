//! Transform composition for overlay objects.
//!
//! An overlay's on-screen transform is built from two parts:
//!
//! - the *base* transform: origin rotation, the cumulative committed
//!   translation and the origin scale. It only changes when a gesture ends
//!   or the container is resized.
//! - the *gesture* part: the in-flight pan delta, followed by the running
//!   gesture scale and rotation.
//!
//! Transforms are applied about the center of the overlay's frame, the way a
//! view's transform is. Composition appends on the right, so later factors act
//! in the local space produced by earlier ones.

use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};
use tiny_skia::Transform;

/// Smallest scale a pinch can shrink an overlay to
pub const MIN_GESTURE_SCALE: f32 = 0.05;

/// Translation axis correction for an overlay placed at a cardinal angle.
///
/// Only exact multiples of 90° get a dedicated rule; every other angle falls
/// back to `Up`, which leaves the translation untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Right,
    Bottom,
    Left,
}

impl Direction {
    /// Bucket an origin angle in degrees
    pub fn for_angle(angle_deg: f32) -> Self {
        let angle = (((angle_deg as i32) % 360) + 360) % 360;
        match angle {
            90 => Direction::Right,
            180 => Direction::Bottom,
            270 => Direction::Left,
            _ => Direction::Up,
        }
    }

    /// Map a container-space translation onto the overlay's local axes
    pub fn correct(self, delta: Vec2) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(delta.x, delta.y),
            Direction::Right => Vec2::new(delta.y, -delta.x),
            Direction::Bottom => Vec2::new(-delta.x, -delta.y),
            Direction::Left => Vec2::new(-delta.y, delta.x),
        }
    }
}

/// Placement fixed at creation time. Gestures never change it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Usually the inverse of the zoom level at creation
    pub scale: f32,
    /// Rotation in degrees
    pub angle_deg: f32,
    /// Untransformed bounds in edit space
    pub frame: Rect,
}

impl Placement {
    pub fn new(scale: f32, angle_deg: f32, frame: Rect) -> Self {
        Self {
            scale,
            angle_deg,
            frame,
        }
    }

    pub fn direction(&self) -> Direction {
        Direction::for_angle(self.angle_deg)
    }
}

/// Rotation, cumulative translation and origin scale.
///
/// This is the pivot every gesture starts from.
pub fn compose_base(placement: &Placement, cumulative: Vec2) -> Transform {
    let mut transform = Transform::from_rotate(placement.angle_deg);
    if cumulative != Vec2::ZERO {
        let t = placement.direction().correct(cumulative);
        transform = transform.pre_translate(t.x, t.y);
    }
    transform.pre_scale(placement.scale, placement.scale)
}

/// The visible transform: base, then the in-flight pan, gesture scale and rotation.
///
/// `in_flight` is in container space, like the cumulative translation; it is
/// divided by the origin scale because it is applied after it.
pub fn compose_visible(
    base: Transform,
    placement: &Placement,
    in_flight: Vec2,
    gesture_scale: f32,
    gesture_rotation: f32,
) -> Transform {
    let mut transform = base;
    if in_flight != Vec2::ZERO {
        let t = placement.direction().correct(in_flight / placement.scale);
        transform = transform.pre_translate(t.x, t.y);
    }
    transform
        .pre_scale(gesture_scale, gesture_scale)
        .pre_concat(Transform::from_rotate(gesture_rotation.to_degrees()))
}

/// Mutable transform state of one overlay
#[derive(Debug, Clone, PartialEq)]
pub struct TransformState {
    placement: Placement,
    base: Transform,
    cumulative_translation: Vec2,
    in_flight: Vec2,
    gesture_scale: f32,
    gesture_rotation: f32,
    max_gesture_scale: f32,
}

impl TransformState {
    /// Fresh state for a newly placed overlay
    pub fn new(placement: Placement, max_gesture_scale: f32) -> Self {
        Self::restore(placement, 1.0, 0.0, Vec2::ZERO, max_gesture_scale)
    }

    /// State rebuilt from recorded running totals
    pub fn restore(
        placement: Placement,
        gesture_scale: f32,
        gesture_rotation: f32,
        cumulative_translation: Vec2,
        max_gesture_scale: f32,
    ) -> Self {
        Self {
            base: compose_base(&placement, cumulative_translation),
            placement,
            cumulative_translation,
            in_flight: Vec2::ZERO,
            gesture_scale,
            gesture_rotation,
            max_gesture_scale: max_gesture_scale.max(gesture_scale),
        }
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn base(&self) -> Transform {
        self.base
    }

    pub fn cumulative_translation(&self) -> Vec2 {
        self.cumulative_translation
    }

    pub fn in_flight(&self) -> Vec2 {
        self.in_flight
    }

    pub fn gesture_scale(&self) -> f32 {
        self.gesture_scale
    }

    pub fn gesture_rotation(&self) -> f32 {
        self.gesture_rotation
    }

    pub fn max_gesture_scale(&self) -> f32 {
        self.max_gesture_scale
    }

    /// Transform to apply about the frame center for the current frame
    pub fn visible(&self) -> Transform {
        compose_visible(
            self.base,
            &self.placement,
            self.in_flight,
            self.gesture_scale,
            self.gesture_rotation,
        )
    }

    /// Maps the untransformed frame into container space
    pub fn frame_to_container(&self) -> Transform {
        let frame = self.placement.frame;
        let center = frame.center();
        Transform::from_translate(center.x, center.y)
            .pre_concat(self.visible())
            .pre_translate(-frame.width() / 2.0, -frame.height() / 2.0)
    }

    /// Axis-aligned bounds of the transformed frame in container space
    pub fn visual_frame(&self) -> Rect {
        let size = self.placement.frame.size();
        transformed_bounds(self.frame_to_container(), size)
    }

    /// Replace the in-flight pan delta (total pan since the gesture began)
    pub fn set_in_flight(&mut self, translation: Vec2) {
        self.in_flight = translation;
    }

    /// Apply an incremental pinch factor, clamped to the current ceiling.
    ///
    /// Returns `false` when the clamped scale is unchanged.
    pub fn pinch(&mut self, factor: f32) -> bool {
        if !factor.is_finite() {
            return false;
        }
        let scale = (self.gesture_scale * factor)
            .min(self.max_gesture_scale)
            .max(MIN_GESTURE_SCALE);
        if scale == self.gesture_scale {
            return false;
        }
        self.gesture_scale = scale;
        true
    }

    /// Apply an incremental rotation in radians
    pub fn rotate(&mut self, delta: f32) {
        self.gesture_rotation += delta;
    }

    /// Fold the in-flight pan into the cumulative translation and re-derive the base.
    ///
    /// Gesture scale and rotation are running totals and stay as they are.
    pub fn commit(&mut self) {
        if self.in_flight == Vec2::ZERO {
            return;
        }
        self.cumulative_translation += self.in_flight;
        self.in_flight = Vec2::ZERO;
        self.base = compose_base(&self.placement, self.cumulative_translation);
    }

    /// Track a resize of the whole container by `factor`.
    ///
    /// The overlay's center moves to `factor` times its position and its
    /// size grows by `factor`; the pinch ceiling grows with it.
    pub fn add_scale(&mut self, factor: f32) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        // Scales and rotations compose on the right, so they leave the translation alone
        let visible = self.visible();
        let center = self.placement.frame.center() + Vec2::new(visible.tx, visible.ty);
        let diff = center.to_vec2() * (factor - 1.0);

        self.cumulative_translation += diff;
        self.base = compose_base(&self.placement, self.cumulative_translation);
        self.gesture_scale *= factor;
        self.max_gesture_scale *= factor;
    }

    /// Resize the untransformed frame about its center
    pub fn change_size(&mut self, size: Vec2) {
        let center = self.placement.frame.center();
        self.placement.frame = Rect::from_center_size(center, size);
    }
}

/// Bounds of a `size`-sized rectangle at the origin after `transform`
pub fn transformed_bounds(transform: Transform, size: Vec2) -> Rect {
    let mut points = [
        tiny_skia::Point::from_xy(0.0, 0.0),
        tiny_skia::Point::from_xy(size.x, 0.0),
        tiny_skia::Point::from_xy(size.x, size.y),
        tiny_skia::Point::from_xy(0.0, size.y),
    ];
    transform.map_points(&mut points);

    let mut rect = Rect::NOTHING;
    for point in points {
        rect.extend_with(Pos2::new(point.x, point.y));
    }
    rect
}
