use egui::{Color32, Pos2};
use std::sync::Arc;

/// What a recorded path is used for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrokeKind {
    Ink(Color32),
    Mosaic,
}

// Immutable path in ratio-normalized space
#[derive(Debug, Clone, PartialEq)]
pub struct StrokePath {
    width: f32,
    points: Vec<Pos2>,
}

impl StrokePath {
    pub fn new(width: f32, points: Vec<Pos2>) -> Self {
        Self { width, points }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    /// A path needs two points to cover any area
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 2 || self.width <= 0.0
    }
}

/// Permanent freehand stroke
#[derive(Debug, Clone, PartialEq)]
pub struct InkStroke {
    color: Color32,
    path: StrokePath,
}

// Shared handle to a committed ink stroke
pub type InkStrokeRef = Arc<InkStroke>;

impl InkStroke {
    pub fn new(color: Color32, path: StrokePath) -> Self {
        Self { color, path }
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn path(&self) -> &StrokePath {
        &self.path
    }
}

/// Region painted with the mosaic brush
#[derive(Debug, Clone, PartialEq)]
pub struct MosaicStroke {
    path: StrokePath,
}

impl MosaicStroke {
    pub fn new(path: StrokePath) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &StrokePath {
        &self.path
    }
}

/// Records a path while the pointer is down.
///
/// Coordinates arrive in container space and are divided by `ratio`, the
/// zoom-to-source factor at the time the stroke began, so the stored path is
/// independent of how the image is displayed. The width is divided once, at
/// `begin`; zooming mid-stroke does not change it.
#[derive(Debug, Clone)]
pub struct StrokeRecorder {
    ratio: f32,
    width: f32,
    points: Vec<Pos2>,
}

impl StrokeRecorder {
    pub fn begin(width: f32, ratio: f32, start: Pos2) -> Self {
        let ratio = if ratio.is_finite() && ratio > 0.0 { ratio } else { 1.0 };
        Self {
            ratio,
            width: width / ratio,
            points: vec![Self::normalize(start, ratio)],
        }
    }

    fn normalize(point: Pos2, ratio: f32) -> Pos2 {
        Pos2::new(point.x / ratio, point.y / ratio)
    }

    pub fn add_line(&mut self, point: Pos2) {
        self.points.push(Self::normalize(point, self.ratio));
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    // Points recorded so far, for live preview
    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn to_path(&self) -> StrokePath {
        StrokePath::new(self.width, self.points.clone())
    }

    pub fn finish(self) -> StrokePath {
        StrokePath::new(self.width, self.points)
    }
}
