//! Mosaic brush compositing.
//!
//! The pixelated version of the source is produced once per session. Every
//! recomposite starts again from the untouched original and the full stroke
//! list, so repeated passes never blur already pixelated regions further.

use std::time::Instant;

use egui::Color32;
use image::{Rgba, RgbaImage};
use log::debug;
use tiny_skia::{BlendMode, Pixmap};

use crate::config::EditorConfig;
use crate::error::{MarkupError, MarkupResult};
use crate::render;
use crate::stroke::MosaicStroke;

/// Side of a pixelation block for a source `source_width` pixels wide
pub fn pixelation_block_size(source_width: u32, config: &EditorConfig) -> u32 {
    if config.reference_display_width <= 0.0 {
        return config.pixelate_factor.round().max(1.0) as u32;
    }
    let size = config.pixelate_factor * source_width as f32 / config.reference_display_width;
    size.round().max(1.0) as u32
}

/// Replace every `block` x `block` cell with its average color
pub fn pixelate(image: &RgbaImage, block: u32) -> RgbaImage {
    let block = block.max(1);
    let (width, height) = image.dimensions();
    let mut output = RgbaImage::new(width, height);

    for by in (0..height).step_by(block as usize) {
        for bx in (0..width).step_by(block as usize) {
            let x_end = (bx + block).min(width);
            let y_end = (by + block).min(height);

            let mut total = [0u64; 4];
            let mut pixel_count: u64 = 0;
            for py in by..y_end {
                for px in bx..x_end {
                    let pixel = image.get_pixel(px, py);
                    for (sum, channel) in total.iter_mut().zip(pixel.0) {
                        *sum += channel as u64;
                    }
                    pixel_count += 1;
                }
            }
            if pixel_count == 0 {
                continue;
            }

            let avg = Rgba(total.map(|sum| (sum / pixel_count) as u8));
            for py in by..y_end {
                for px in bx..x_end {
                    output.put_pixel(px, py, avg);
                }
            }
        }
    }
    output
}

/// Produces the mosaic baseline from the original image and the mosaic strokes
#[derive(Clone)]
pub struct MosaicCompositor {
    original: RgbaImage,
    original_pixmap: Pixmap,
    pixelated_pixmap: Pixmap,
    block_size: u32,
}

impl std::fmt::Debug for MosaicCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MosaicCompositor")
            .field("width", &self.original.width())
            .field("height", &self.original.height())
            .field("block_size", &self.block_size)
            .finish()
    }
}

impl MosaicCompositor {
    pub fn new(original: RgbaImage, config: &EditorConfig) -> MarkupResult<Self> {
        if original.width() == 0 || original.height() == 0 {
            return Err(MarkupError::EmptySourceImage);
        }
        let block_size = pixelation_block_size(original.width(), config);
        let pixelated = pixelate(&original, block_size);
        debug!(
            "pixelated {}x{} source with {}px blocks",
            original.width(),
            original.height(),
            block_size
        );
        Ok(Self {
            original_pixmap: render::pixmap_from_image(&original)?,
            pixelated_pixmap: render::pixmap_from_image(&pixelated)?,
            original,
            block_size,
        })
    }

    pub fn original(&self) -> &RgbaImage {
        &self.original
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn pixelated(&self) -> MarkupResult<RgbaImage> {
        render::image_from_pixmap(&self.pixelated_pixmap)
    }

    /// Baseline image for the given strokes.
    ///
    /// The strokes are first erased out of a copy of the original. The holed
    /// copy is then drawn over the pixelated image, which is drawn over the
    /// original, so only the erased regions show pixelation.
    pub fn recomposite(&self, strokes: &[MosaicStroke]) -> MarkupResult<RgbaImage> {
        if strokes.is_empty() {
            return Ok(self.original.clone());
        }
        let started = Instant::now();

        let mut holed = self.original_pixmap.clone();
        for stroke in strokes {
            render::draw_path(&mut holed, stroke.path(), Color32::BLACK, BlendMode::Clear);
        }

        let mut canvas = render::new_pixmap(self.original.width(), self.original.height())?;
        render::draw_layer(&mut canvas, &self.original_pixmap);
        render::draw_layer(&mut canvas, &self.pixelated_pixmap);
        render::draw_layer(&mut canvas, &holed);

        debug!(
            "recomposited {} mosaic strokes in {:?}",
            strokes.len(),
            started.elapsed()
        );
        render::image_from_pixmap(&canvas)
    }
}
