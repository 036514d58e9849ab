use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use egui::{Color32, Vec2};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect as PixelRect;

use super::EDGE_INSET;

// Metrics used when no font is configured
const FALLBACK_ADVANCE: f32 = 0.5;
const FALLBACK_LINE_HEIGHT: f32 = 1.25;

/// Text label sticker
#[derive(Debug, Clone, PartialEq)]
pub struct TextPayload {
    pub text: String,
    pub text_color: Color32,
    pub background: Color32,
    pub font_size: f32,
}

impl TextPayload {
    pub fn new(text: impl Into<String>, text_color: Color32, background: Color32, font_size: f32) -> Self {
        Self {
            text: text.into(),
            text_color,
            background,
            font_size,
        }
    }
}

struct Metrics<'a> {
    font: Option<&'a FontArc>,
    scale: PxScale,
}

impl Metrics<'_> {
    fn advance(&self, c: char) -> f32 {
        match self.font {
            Some(font) => font.as_scaled(self.scale).h_advance(font.glyph_id(c)),
            None => self.scale.x * FALLBACK_ADVANCE,
        }
    }

    fn line_height(&self) -> f32 {
        match self.font {
            Some(font) => {
                let scaled = font.as_scaled(self.scale);
                scaled.height() + scaled.line_gap()
            }
            None => self.scale.y * FALLBACK_LINE_HEIGHT,
        }
    }
}

/// Break `text` into lines no wider than `max_width`, wrapping at any character
fn wrap_lines(text: &str, metrics: &Metrics<'_>, max_width: f32) -> Vec<(String, f32)> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut width = 0.0;
        for c in paragraph.chars() {
            let advance = metrics.advance(c);
            if !line.is_empty() && width + advance > max_width {
                lines.push((std::mem::take(&mut line), width));
                width = 0.0;
            }
            line.push(c);
            width += advance;
        }
        lines.push((line, width));
    }
    lines
}

fn measure(text: &str, metrics: &Metrics<'_>, max_width: f32) -> Vec2 {
    let lines = wrap_lines(text, metrics, max_width);
    let width = lines.iter().map(|(_, w)| *w).fold(0.0, f32::max);
    let height = lines.len() as f32 * metrics.line_height();
    Vec2::new(width.ceil(), height.ceil())
}

/// Frame size for a text sticker whose label may be at most `max_width` wide
pub fn calculate_size(text: &str, font: Option<&FontArc>, font_size: f32, max_width: f32) -> Vec2 {
    let diff = EDGE_INSET * 2.0;
    let metrics = Metrics {
        font,
        scale: PxScale::from(font_size),
    };
    let size = measure(text, &metrics, max_width - diff);
    size + Vec2::splat(diff * 2.0)
}

pub(crate) fn render_tile(
    payload: &TextPayload,
    frame_size: Vec2,
    scale: f32,
    font: Option<&FontArc>,
) -> Option<RgbaImage> {
    let width = (frame_size.x * scale).ceil() as u32;
    let height = (frame_size.y * scale).ceil() as u32;
    if width == 0 || height == 0 {
        return None;
    }
    let mut tile = RgbaImage::new(width, height);

    // The label sits inside the border, which sits inside the frame
    let inset = (EDGE_INSET * 2.0 * scale).round() as u32;
    if width <= inset * 2 || height <= inset * 2 {
        return Some(tile);
    }
    let label_width = width - inset * 2;
    let label_height = height - inset * 2;
    draw_filled_rect_mut(
        &mut tile,
        PixelRect::at(inset as i32, inset as i32).of_size(label_width, label_height),
        Rgba(payload.background.to_srgba_unmultiplied()),
    );

    if let Some(font) = font {
        let metrics = Metrics {
            font: Some(font),
            scale: PxScale::from(payload.font_size * scale),
        };
        let line_height = metrics.line_height();
        let color = Rgba(payload.text_color.to_srgba_unmultiplied());
        for (i, (line, _)) in wrap_lines(&payload.text, &metrics, label_width as f32)
            .iter()
            .enumerate()
        {
            draw_text_mut(
                &mut tile,
                color,
                inset as i32,
                inset as i32 + (i as f32 * line_height) as i32,
                metrics.scale,
                font,
                line,
            );
        }
    }

    Some(tile)
}
