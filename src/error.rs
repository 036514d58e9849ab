use thiserror::Error;

use crate::overlay::OverlayId;

/// Errors produced by the markup core
#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("Failed to allocate a {width}x{height} raster surface")]
    PixmapAllocation { width: u32, height: u32 },

    #[error("Source image has no pixels")]
    EmptySourceImage,

    #[error("Overlay {0} does not exist")]
    OverlayNotFound(OverlayId),

    #[error("Overlay {0} is not a text overlay")]
    NotTextOverlay(OverlayId),

    #[error("No stroke is being recorded")]
    NoActiveStroke,

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type for markup operations
pub type MarkupResult<T> = Result<T, MarkupError>;
