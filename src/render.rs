//! Raster helpers shared by the mosaic compositor and the flattener.
//!
//! Bitmaps cross the public API as straight-alpha `RgbaImage`s; drawing
//! happens on premultiplied tiny-skia pixmaps.

use ab_glyph::FontArc;
use egui::Color32;
use image::RgbaImage;
use log::debug;
use tiny_skia::{
    BlendMode, ColorU8, FilterQuality, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint,
    Stroke, Transform,
};

use crate::error::{MarkupError, MarkupResult};
use crate::overlay::OverlayObject;
use crate::stroke::{InkStroke, StrokePath};

// Tiles are never rasterized below this scale
const MIN_TILE_SCALE: f32 = 0.01;

pub fn new_pixmap(width: u32, height: u32) -> MarkupResult<Pixmap> {
    Pixmap::new(width, height).ok_or(MarkupError::PixmapAllocation { width, height })
}

pub fn pixmap_from_image(image: &RgbaImage) -> MarkupResult<Pixmap> {
    let mut pixmap = new_pixmap(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

pub fn image_from_pixmap(pixmap: &Pixmap) -> MarkupResult<RgbaImage> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        data.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data).ok_or(MarkupError::PixmapAllocation {
        width: pixmap.width(),
        height: pixmap.height(),
    })
}

/// Line geometry through the path's points. `None` for a single point.
pub fn stroke_geometry(path: &StrokePath) -> Option<tiny_skia::Path> {
    if path.is_degenerate() {
        return None;
    }
    let mut points = path.points().iter();
    let first = points.next()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for point in points {
        pb.line_to(point.x, point.y);
    }
    pb.finish()
}

pub fn stroke_style(width: f32) -> Stroke {
    Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    }
}

fn paint_for(color: Color32, blend_mode: BlendMode) -> Paint<'static> {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint.blend_mode = blend_mode;
    paint
}

/// Stroke `path` onto `pixmap`; degenerate paths draw nothing
pub fn draw_path(pixmap: &mut Pixmap, path: &StrokePath, color: Color32, blend_mode: BlendMode) {
    let Some(geometry) = stroke_geometry(path) else {
        return;
    };
    let paint = paint_for(color, blend_mode);
    pixmap.stroke_path(
        &geometry,
        &paint,
        &stroke_style(path.width()),
        Transform::identity(),
        None,
    );
}

/// Render every ink stroke, in order, onto a transparent layer of the given size
pub fn render_ink_layer<'a>(
    width: u32,
    height: u32,
    strokes: impl IntoIterator<Item = &'a InkStroke>,
) -> MarkupResult<RgbaImage> {
    let mut pixmap = new_pixmap(width, height)?;
    let mut count = 0;
    for stroke in strokes {
        draw_path(&mut pixmap, stroke.path(), stroke.color(), BlendMode::SourceOver);
        count += 1;
    }
    debug!("rendered {} ink strokes", count);
    image_from_pixmap(&pixmap)
}

/// Length of a unit vector after the linear part of `transform`
fn scale_factor(transform: &Transform) -> f32 {
    (transform.sx * transform.sx + transform.ky * transform.ky).sqrt()
}

/// Output transform of `overlay` and the scale its tile is rasterized at.
///
/// The tile scale follows the overlay's on-canvas scale but is capped so the
/// tile's diagonal never exceeds the canvas diagonal. Past that point the
/// canvas clips whatever extra detail the tile would carry.
fn overlay_raster(overlay: &OverlayObject, output_scale: f32, canvas: (u32, u32)) -> (Transform, f32) {
    let transform = Transform::from_scale(output_scale, output_scale)
        .pre_concat(overlay.transform().frame_to_container());
    let frame = overlay.transform().placement().frame.size();
    let (width, height) = (canvas.0 as f32, canvas.1 as f32);
    let max_scale = (width * width + height * height).sqrt() / frame.length();
    let mut tile_scale = scale_factor(&transform);
    if max_scale.is_finite() {
        tile_scale = tile_scale.min(max_scale);
    }
    (transform, tile_scale.max(MIN_TILE_SCALE))
}

/// Draw an overlay with its current transform, scaled by `output_scale`.
///
/// The overlay is rasterized as a tile at its effective on-canvas scale and
/// then mapped through the transform, so text and bitmaps stay sharp.
pub fn draw_overlay(
    pixmap: &mut Pixmap,
    overlay: &OverlayObject,
    output_scale: f32,
    font: Option<&FontArc>,
) -> MarkupResult<()> {
    let (transform, tile_scale) = overlay_raster(overlay, output_scale, (pixmap.width(), pixmap.height()));
    if tile_scale < scale_factor(&transform) {
        debug!("overlay {} tile capped at scale {:.2}", overlay.id(), tile_scale);
    }

    let Some(tile) = overlay.render_tile(tile_scale, font) else {
        return Ok(());
    };
    let tile = pixmap_from_image(&tile)?;
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(
        0,
        0,
        tile.as_ref(),
        &paint,
        transform.pre_scale(1.0 / tile_scale, 1.0 / tile_scale),
        None,
    );
    Ok(())
}

/// Draw `source` over `pixmap` at the origin
pub fn draw_layer(pixmap: &mut Pixmap, source: &Pixmap) {
    pixmap.draw_pixmap(
        0,
        0,
        source.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::{Gesture, GesturePhase};
    use crate::overlay::{OverlayPayload, TextPayload};
    use crate::transform::Placement;
    use egui::{Rect, pos2, vec2};
    use image::Rgba;

    #[test]
    fn test_opaque_round_trip_is_exact() {
        let image = RgbaImage::from_fn(3, 2, |x, y| Rgba([x as u8 * 80, y as u8 * 100, 7, 255]));
        let pixmap = pixmap_from_image(&image).unwrap();
        assert_eq!(image_from_pixmap(&pixmap).unwrap(), image);
    }

    #[test]
    fn test_zero_sized_pixmap_is_an_error() {
        assert!(matches!(
            new_pixmap(0, 10),
            Err(MarkupError::PixmapAllocation { width: 0, height: 10 })
        ));
    }

    #[test]
    fn test_single_point_stroke_draws_nothing() {
        let stroke = InkStroke::new(Color32::RED, StrokePath::new(4.0, vec![pos2(5.0, 5.0)]));
        let layer = render_ink_layer(10, 10, [&stroke]).unwrap();
        assert!(layer.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_ink_stroke_covers_its_line() {
        let stroke = InkStroke::new(
            Color32::RED,
            StrokePath::new(4.0, vec![pos2(0.0, 5.0), pos2(10.0, 5.0)]),
        );
        let layer = render_ink_layer(10, 10, [&stroke]).unwrap();
        assert_eq!(layer.get_pixel(5, 5).0, [255, 0, 0, 255]);
        assert_eq!(layer.get_pixel(5, 0).0[3], 0);
    }

    #[test]
    fn test_pinched_overlay_tile_stays_within_canvas() {
        let payload = TextPayload::new("big", Color32::WHITE, Color32::BLUE, 30.0);
        let frame = Rect::from_min_size(pos2(100.0, 100.0), vec2(200.0, 100.0));
        let mut overlay = OverlayObject::new(OverlayPayload::Text(payload), Placement::new(1.0, 0.0, frame), 15.0);
        overlay.apply(&Gesture::Pinch {
            phase: GesturePhase::Began,
            factor: 20.0,
        });
        overlay.apply(&Gesture::Pinch {
            phase: GesturePhase::Ended,
            factor: 1.0,
        });
        assert_eq!(overlay.transform().gesture_scale(), 15.0);

        let (width, height) = (400, 300);
        let (transform, tile_scale) = overlay_raster(&overlay, 400.0 / 390.0, (width, height));
        assert!(scale_factor(&transform) > 15.0);
        let tile = overlay.render_tile(tile_scale, None).unwrap();
        assert!(tile.width() * tile.height() <= width * height);
        assert!((tile.width() as f32).hypot(tile.height() as f32) <= 502.0);

        let mut canvas = new_pixmap(width, height).unwrap();
        draw_overlay(&mut canvas, &overlay, 400.0 / 390.0, None).unwrap();
        let output = image_from_pixmap(&canvas).unwrap();
        // The label now covers the whole canvas
        let [r, g, b, a] = output.get_pixel(200, 150).0;
        assert!(r < 4 && g < 4 && b > 250 && a == 255);
    }
}
