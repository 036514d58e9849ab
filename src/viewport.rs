use egui::{Pos2, Rect, Vec2};

/// Snapshot of the host's zoomable image view.
///
/// The host owns scrolling and zooming; the core only needs these numbers to
/// translate between on-screen points and edit space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Size of the scroll view on screen
    pub view_size: Vec2,
    /// Current zoom factor of the scroll view (1.0 = fitted)
    pub zoom_scale: f32,
    /// Scroll offset of the zoomed content
    pub content_offset: Vec2,
    /// Top-left of the image container inside the zoomed content
    pub container_min: Pos2,
}

impl Viewport {
    /// A fitted, unzoomed viewport of the given size
    pub fn new(view_size: Vec2) -> Self {
        Self {
            view_size,
            zoom_scale: 1.0,
            content_offset: Vec2::ZERO,
            container_min: Pos2::ZERO,
        }
    }

    /// Ratio between fitted on-screen size and source pixels.
    ///
    /// Dividing container coordinates by this ratio yields source pixel
    /// coordinates, which is the normalized space strokes are stored in.
    pub fn fit_ratio(&self, source_size: Vec2) -> f32 {
        if source_size.x <= 0.0 || source_size.y <= 0.0 {
            return 1.0;
        }
        (self.view_size.x / source_size.x).min(self.view_size.y / source_size.y)
    }

    /// Container-space width for a brush that should look `base_width` wide on screen
    pub fn stroke_width(&self, base_width: f32) -> f32 {
        base_width / self.zoom_scale
    }

    /// Origin scale for an overlay created at the current zoom level
    pub fn sticker_origin_scale(&self) -> f32 {
        1.0 / self.zoom_scale
    }

    /// The part of the container currently visible on screen, in container space
    pub fn visible_rect(&self) -> Rect {
        let scale = self.zoom_scale;
        let min = Pos2::new(
            (self.content_offset.x - self.container_min.x) / scale,
            (self.content_offset.y - self.container_min.y) / scale,
        );
        Rect::from_min_size(min, self.view_size / scale)
    }
}

/// Frame for a new sticker of `size`, centered in the visible part of the container
pub fn sticker_origin_frame(viewport: &Viewport, size: Vec2) -> Rect {
    Rect::from_center_size(viewport.visible_rect().center(), size)
}
