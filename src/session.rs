use egui::{Color32, Pos2, Rect, Vec2};
use image::RgbaImage;
use log::{debug, info, warn};
use std::sync::Arc;

use crate::config::EditorConfig;
use crate::error::{MarkupError, MarkupResult};
use crate::event::EventBus;
use crate::gesture::Gesture;
use crate::mosaic::MosaicCompositor;
use crate::overlay::{
    self, GestureOutcome, ImagePayload, OverlayId, OverlayObject, OverlayPayload, OverlayStage,
    StateRecord, TextPayload,
};
use crate::render;
use crate::stroke::{InkStroke, InkStrokeRef, MosaicStroke, StrokeKind, StrokeRecorder};
use crate::transform::Placement;
use crate::viewport::{self, Viewport};

/// One entry of the session's action log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawableAction {
    Stroke,
    MosaicStroke,
    Overlay(OverlayId),
}

#[derive(Debug)]
struct ActiveStroke {
    kind: StrokeKind,
    recorder: StrokeRecorder,
}

/// Editing state for one photo.
///
/// Owns the stroke lists, the overlays and the ordered action log used for
/// undo. All methods run synchronously on the caller's thread.
pub struct EditSession {
    config: EditorConfig,
    compositor: MosaicCompositor,
    ink_strokes: Vec<InkStrokeRef>,
    mosaic_strokes: Vec<MosaicStroke>,
    stage: OverlayStage,
    actions: Vec<DrawableAction>,
    mosaic_baseline: RgbaImage,
    ink_layer: RgbaImage,
    active_stroke: Option<ActiveStroke>,
    container_size: Vec2,
}

// Bitmaps are too large to print
impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("compositor", &self.compositor)
            .field("ink_strokes", &self.ink_strokes.len())
            .field("mosaic_strokes", &self.mosaic_strokes.len())
            .field("overlays", &self.stage.len())
            .field("actions", &self.actions)
            .field("container_size", &self.container_size)
            .finish()
    }
}

impl EditSession {
    pub fn new(source: RgbaImage, config: EditorConfig) -> MarkupResult<Self> {
        let (width, height) = source.dimensions();
        let compositor = MosaicCompositor::new(source, &config)?;
        let ink_layer = RgbaImage::new(width, height);
        info!("📷 Edit session created for {}x{} image", width, height);

        Ok(Self {
            stage: OverlayStage::new(config.max_gesture_scale),
            mosaic_baseline: compositor.original().clone(),
            compositor,
            config,
            ink_strokes: Vec::new(),
            mosaic_strokes: Vec::new(),
            actions: Vec::new(),
            ink_layer,
            active_stroke: None,
            container_size: Vec2::new(width as f32, height as f32),
        })
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn source_size(&self) -> Vec2 {
        let source = self.compositor.original();
        Vec2::new(source.width() as f32, source.height() as f32)
    }

    pub fn original_image(&self) -> &RgbaImage {
        self.compositor.original()
    }

    /// Current source image with every mosaic stroke applied
    pub fn mosaic_baseline(&self) -> &RgbaImage {
        &self.mosaic_baseline
    }

    /// Transparent layer holding every committed ink stroke, at source size
    pub fn ink_layer(&self) -> &RgbaImage {
        &self.ink_layer
    }

    pub fn ink_strokes(&self) -> &[InkStrokeRef] {
        &self.ink_strokes
    }

    pub fn mosaic_strokes(&self) -> &[MosaicStroke] {
        &self.mosaic_strokes
    }

    /// The action log, oldest first
    pub fn drawable_objects(&self) -> &[DrawableAction] {
        &self.actions
    }

    pub fn has_edits(&self) -> bool {
        !(self.ink_strokes.is_empty() && self.mosaic_strokes.is_empty() && self.stage.is_empty())
    }

    pub fn stage(&self) -> &OverlayStage {
        &self.stage
    }

    /// Direct access for enabling, selecting and resizing overlays.
    /// Add and remove overlays through the session so the action log stays in step.
    pub fn stage_mut(&mut self) -> &mut OverlayStage {
        &mut self.stage
    }

    pub fn events(&self) -> &EventBus {
        self.stage.events()
    }

    /// Size of the view the overlays are laid out in
    pub fn overlay_container_size(&self) -> Vec2 {
        self.container_size
    }

    pub fn set_overlay_container_size(&mut self, size: Vec2) {
        self.container_size = size;
    }

    /// Resize the overlay container, scaling every overlay along with it
    pub fn resize_overlay_container(&mut self, size: Vec2) {
        if self.container_size.x > 0.0 && size.x > 0.0 {
            let factor = size.x / self.container_size.x;
            debug!("overlay container resized by {}", factor);
            self.stage.resize_all(factor);
        }
        self.container_size = size;
    }

    fn record(&mut self, action: DrawableAction) {
        self.actions.push(action);
    }

    fn forget_overlay(&mut self, id: OverlayId) {
        self.actions.retain(|action| *action != DrawableAction::Overlay(id));
    }

    // ---- Strokes ----

    /// Start recording a stroke. `width` and `start` are in container space;
    /// `ratio` is the zoom-to-source factor (see [`Viewport::fit_ratio`]).
    pub fn begin_stroke(&mut self, kind: StrokeKind, width: f32, ratio: f32, start: Pos2) {
        if self.active_stroke.is_some() {
            debug!("discarding unfinished stroke");
        }
        self.active_stroke = Some(ActiveStroke {
            kind,
            recorder: StrokeRecorder::begin(width, ratio, start),
        });
    }

    pub fn extend_stroke(&mut self, point: Pos2) -> MarkupResult<()> {
        let active = self.active_stroke.as_mut().ok_or(MarkupError::NoActiveStroke)?;
        active.recorder.add_line(point);
        Ok(())
    }

    /// The stroke being recorded, for live preview
    pub fn active_stroke(&self) -> Option<&StrokeRecorder> {
        self.active_stroke.as_ref().map(|active| &active.recorder)
    }

    pub fn cancel_stroke(&mut self) {
        self.active_stroke = None;
    }

    /// Commit the stroke being recorded and refresh the affected layer.
    ///
    /// A stroke that draws nothing (a single point, or no width) is
    /// discarded and `None` is returned, so undo never pops an invisible action.
    pub fn end_stroke(&mut self) -> MarkupResult<Option<DrawableAction>> {
        let active = self.active_stroke.take().ok_or(MarkupError::NoActiveStroke)?;
        let path = active.recorder.finish();
        let points = path.points().len();
        if path.is_degenerate() {
            debug!("discarded stroke with {} points", points);
            return Ok(None);
        }

        let action = match active.kind {
            StrokeKind::Ink(color) => {
                self.ink_strokes.push(Arc::new(InkStroke::new(color, path)));
                self.refresh_ink_layer();
                DrawableAction::Stroke
            }
            StrokeKind::Mosaic => {
                self.mosaic_strokes.push(MosaicStroke::new(path));
                self.refresh_mosaic();
                DrawableAction::MosaicStroke
            }
        };
        self.record(action);
        info!("🖌️ Committed {:?} with {} points", action, points);
        Ok(Some(action))
    }

    fn refresh_ink_layer(&mut self) {
        let (width, height) = self.compositor.original().dimensions();
        match render::render_ink_layer(width, height, self.ink_strokes.iter().map(Arc::as_ref)) {
            Ok(layer) => self.ink_layer = layer,
            Err(err) => warn!("⚠️ Ink layer not updated: {}", err),
        }
    }

    fn refresh_mosaic(&mut self) {
        match self.compositor.recomposite(&self.mosaic_strokes) {
            Ok(baseline) => self.mosaic_baseline = baseline,
            Err(err) => warn!("⚠️ Mosaic baseline not updated: {}", err),
        }
    }

    // ---- Overlays ----

    fn place(&mut self, payload: OverlayPayload, size: Vec2, viewport: &Viewport) -> OverlayId {
        let placement = Placement::new(
            viewport.sticker_origin_scale(),
            0.0,
            viewport::sticker_origin_frame(viewport, size),
        );
        self.add_overlay(payload, placement)
    }

    /// Add an overlay at an explicit placement
    pub fn add_overlay(&mut self, payload: OverlayPayload, placement: Placement) -> OverlayId {
        let overlay = OverlayObject::new(payload, placement, self.stage.max_gesture_scale());
        let id = self.stage.add(overlay);
        self.record(DrawableAction::Overlay(id));
        id
    }

    /// Add a text sticker centered in the visible area. Empty text adds nothing.
    pub fn add_text_overlay(
        &mut self,
        text: &str,
        text_color: Color32,
        background: Color32,
        viewport: &Viewport,
    ) -> Option<OverlayId> {
        if text.is_empty() {
            return None;
        }
        let font_size = self.config.text_font_size;
        let size = overlay::text::calculate_size(text, self.config.font.as_ref(), font_size, viewport.view_size.x);
        let payload = TextPayload::new(text, text_color, background, font_size);
        Some(self.place(OverlayPayload::Text(payload), size, viewport))
    }

    /// Add an image or emoji sticker centered in the visible area
    pub fn add_image_overlay(&mut self, image: RgbaImage, viewport: &Viewport) -> OverlayId {
        let payload = ImagePayload::new(image);
        let size = overlay::image::calculate_size(payload.size(), viewport.view_size.x);
        self.place(OverlayPayload::Image(payload), size, viewport)
    }

    /// Replace a text sticker's text; empty text removes the sticker
    pub fn update_text(
        &mut self,
        id: OverlayId,
        text: &str,
        text_color: Color32,
        background: Color32,
        viewport: &Viewport,
    ) -> MarkupResult<()> {
        if text.is_empty() {
            return self.remove_overlay(id);
        }
        let font_size = self.config.text_font_size;
        let size = overlay::text::calculate_size(text, self.config.font.as_ref(), font_size, viewport.view_size.x);
        let payload = TextPayload::new(text, text_color, background, font_size);
        self.stage.update_text(id, payload, size)
    }

    pub fn remove_overlay(&mut self, id: OverlayId) -> MarkupResult<()> {
        self.stage.remove(id).ok_or(MarkupError::OverlayNotFound(id))?;
        self.forget_overlay(id);
        Ok(())
    }

    pub fn restore_overlay(&mut self, record: StateRecord) -> OverlayId {
        let id = self.stage.restore_from_state(record);
        self.record(DrawableAction::Overlay(id));
        id
    }

    pub fn set_drop_target(&mut self, target: Option<Rect>) {
        self.stage.set_drop_target(target);
    }

    /// Route a gesture tick to an overlay. Overlays dropped on the drop
    /// target leave the action log as well.
    pub fn handle_overlay_gesture(&mut self, id: OverlayId, gesture: &Gesture) -> MarkupResult<GestureOutcome> {
        let outcome = self.stage.handle_gesture(id, gesture)?;
        if outcome == GestureOutcome::Removed {
            self.forget_overlay(id);
        }
        Ok(outcome)
    }

    // ---- Undo ----

    /// Revert the most recent action. Returns it, or `None` when the log is empty.
    pub fn undo_last(&mut self) -> Option<DrawableAction> {
        let action = self.actions.pop()?;
        match action {
            DrawableAction::Stroke => {
                self.ink_strokes.pop();
                self.refresh_ink_layer();
            }
            DrawableAction::MosaicStroke => {
                self.mosaic_strokes.pop();
                self.refresh_mosaic();
            }
            DrawableAction::Overlay(id) => {
                self.stage.remove(id);
            }
        }
        info!("↩️ Undid {:?}, {} actions left", action, self.actions.len());
        Some(action)
    }

    /// Remove every stroke, mosaic region and overlay
    pub fn clear_all(&mut self) {
        self.active_stroke = None;
        self.mosaic_strokes.clear();
        self.refresh_mosaic();
        self.stage.clear();
        self.ink_strokes.clear();
        self.refresh_ink_layer();
        self.actions.clear();
        info!("🧹 Cleared all edits");
    }

    // ---- Output ----

    /// Flatten the mosaic baseline, the ink layer and every overlay into one
    /// image at source resolution. Overlays lose their selection state.
    pub fn build_output_image(&mut self) -> MarkupResult<RgbaImage> {
        if !self.has_edits() {
            return Ok(self.compositor.original().clone());
        }

        let mut canvas = render::pixmap_from_image(&self.mosaic_baseline)?;
        let ink = render::pixmap_from_image(&self.ink_layer)?;
        render::draw_layer(&mut canvas, &ink);

        if !self.stage.is_empty() {
            let scale = if self.container_size.x > 0.0 {
                self.source_size().x / self.container_size.x
            } else {
                1.0
            };
            self.stage.clear_selection();
            for overlay in self.stage.iter() {
                render::draw_overlay(&mut canvas, overlay, scale, self.config.font.as_ref())?;
            }
        }

        info!(
            "✅ Flattened {} ink strokes, {} mosaic strokes, {} overlays",
            self.ink_strokes.len(),
            self.mosaic_strokes.len(),
            self.stage.len()
        );
        render::image_from_pixmap(&canvas)
    }
}
