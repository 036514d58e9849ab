#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod event;
pub mod gesture;
pub mod mosaic;
pub mod overlay;
pub mod render;
pub mod session;
pub mod stroke;
pub mod transform;
pub mod viewport;

pub use config::EditorConfig;
pub use error::{MarkupError, MarkupResult};
pub use event::{EventBus, EventHandler, LogEventHandler, OverlayEvent, SubscriptionId};
pub use gesture::{Gesture, GesturePhase};
pub use mosaic::MosaicCompositor;
pub use overlay::{GestureOutcome, OverlayId, OverlayObject, OverlayPayload, OverlayStage, StateRecord};
pub use session::{DrawableAction, EditSession};
pub use stroke::{InkStroke, MosaicStroke, StrokeKind, StrokePath, StrokeRecorder};
pub use transform::{Direction, Placement, TransformState};
pub use viewport::Viewport;
