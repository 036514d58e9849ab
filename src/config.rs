use std::sync::OnceLock;

use ab_glyph::FontArc;
use egui::Color32;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::MarkupResult;

/// Palette used whenever a configured color list is empty
pub const DEFAULT_COLORS: [Color32; 7] = [
    Color32::WHITE,
    Color32::BLACK,
    Color32::from_rgb(241, 79, 79),
    Color32::from_rgb(243, 170, 78),
    Color32::from_rgb(80, 169, 56),
    Color32::from_rgb(30, 183, 243),
    Color32::from_rgb(139, 105, 234),
];

// Common locations of a sans-serif face, bold first; first match wins
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    "C:\\Windows\\Fonts\\arialbd.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static SYSTEM_FONT: OnceLock<Option<FontArc>> = OnceLock::new();

/// Load a sans-serif font installed on this machine.
///
/// The lookup runs once per process; later calls share the same font.
pub fn load_system_font() -> Option<FontArc> {
    SYSTEM_FONT
        .get_or_init(|| {
            for &path in SYSTEM_FONT_CANDIDATES {
                let Ok(bytes) = std::fs::read(path) else {
                    continue;
                };
                match FontArc::try_from_vec(bytes) {
                    Ok(font) => {
                        debug!("loaded system font {}", path);
                        return Some(font);
                    }
                    Err(err) => debug!("skipping font {}: {}", path, err),
                }
            }
            warn!("⚠️ No system font found, text overlays flatten without glyphs");
            None
        })
        .clone()
}

/// The three pen thicknesses offered to the user, in on-screen points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InkWidths {
    pub thin: f32,
    pub medium: f32,
    pub thick: f32,
}

impl Default for InkWidths {
    fn default() -> Self {
        Self {
            thin: 4.0,
            medium: 7.0,
            thick: 11.0,
        }
    }
}

/// Editor configuration, handed to the session at construction time
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    draw_colors: Vec<Color32>,
    text_colors: Vec<Color32>,
    pub ink_widths: InkWidths,
    /// Mosaic brush width in on-screen points
    pub mosaic_width: f32,
    /// Initial ceiling for the pinch gesture scale
    pub max_gesture_scale: f32,
    /// Pixelation block size at the reference display width
    pub pixelate_factor: f32,
    /// Display width the pixelation factor was tuned for
    pub reference_display_width: f32,
    pub text_font_size: f32,
    /// Face used to measure and flatten text. Defaults to a system font.
    #[serde(skip)]
    pub font: Option<FontArc>,
}

// FontArc is opaque, so only report whether one is configured
impl std::fmt::Debug for EditorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorConfig")
            .field("draw_colors", &self.draw_colors)
            .field("text_colors", &self.text_colors)
            .field("ink_widths", &self.ink_widths)
            .field("mosaic_width", &self.mosaic_width)
            .field("max_gesture_scale", &self.max_gesture_scale)
            .field("pixelate_factor", &self.pixelate_factor)
            .field("reference_display_width", &self.reference_display_width)
            .field("text_font_size", &self.text_font_size)
            .field("font", &self.font.as_ref().map(|_| "<font>"))
            .finish()
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            draw_colors: DEFAULT_COLORS.to_vec(),
            text_colors: DEFAULT_COLORS.to_vec(),
            ink_widths: InkWidths::default(),
            mosaic_width: 25.0,
            max_gesture_scale: 15.0,
            pixelate_factor: 8.0,
            reference_display_width: 390.0,
            text_font_size: 30.0,
            font: load_system_font(),
        }
    }
}

impl EditorConfig {
    /// Parse a configuration document, filling missing fields with defaults
    pub fn from_json(json: &str) -> MarkupResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Colors offered for ink strokes
    pub fn draw_colors(&self) -> &[Color32] {
        if self.draw_colors.is_empty() {
            &DEFAULT_COLORS
        } else {
            &self.draw_colors
        }
    }

    pub fn set_draw_colors(&mut self, colors: Vec<Color32>) {
        self.draw_colors = colors;
    }

    /// Colors offered for text overlays
    pub fn text_colors(&self) -> &[Color32] {
        if self.text_colors.is_empty() {
            &DEFAULT_COLORS
        } else {
            &self.text_colors
        }
    }

    pub fn set_text_colors(&mut self, colors: Vec<Color32>) {
        self.text_colors = colors;
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }
}
