use std::sync::Arc;

use egui::Vec2;
use image::RgbaImage;
use image::imageops::{self, FilterType};

use super::EDGE_INSET;

const MIN_SIDE: f32 = 100.0;

/// Bitmap sticker
#[derive(Clone, PartialEq)]
pub struct ImagePayload {
    image: Arc<RgbaImage>,
}

// Pixel data is too large to print
impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePayload")
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .finish()
    }
}

impl ImagePayload {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.image.width() as f32, self.image.height() as f32)
    }
}

/// Frame size for an image sticker shown in a view `view_width` wide.
///
/// The longer side is clamped to `[100, view_width / 2]` and the aspect ratio kept.
pub fn calculate_size(image_size: Vec2, view_width: f32) -> Vec2 {
    if image_size.x <= 0.0 || image_size.y <= 0.0 {
        return Vec2::splat(EDGE_INSET * 2.0);
    }
    let max_side = view_width / 2.0;
    let aspect = image_size.x / image_size.y;
    let size = if aspect >= 1.0 {
        let w = image_size.x.max(MIN_SIDE).min(max_side);
        Vec2::new(w, w / aspect)
    } else {
        let h = image_size.y.max(MIN_SIDE).min(max_side);
        Vec2::new(h * aspect, h)
    };
    size + Vec2::splat(EDGE_INSET * 2.0)
}

pub(crate) fn render_tile(payload: &ImagePayload, frame_size: Vec2, scale: f32) -> Option<RgbaImage> {
    let width = (frame_size.x * scale).ceil() as u32;
    let height = (frame_size.y * scale).ceil() as u32;
    if width == 0 || height == 0 {
        return None;
    }
    let mut tile = RgbaImage::new(width, height);

    let inset = (EDGE_INSET * scale).round() as u32;
    if width <= inset * 2 || height <= inset * 2 || payload.image.width() == 0 || payload.image.height() == 0 {
        return Some(tile);
    }
    let content = imageops::resize(
        payload.image.as_ref(),
        width - inset * 2,
        height - inset * 2,
        FilterType::Triangle,
    );
    imageops::overlay(&mut tile, &content, inset as i64, inset as i64);
    Some(tile)
}
