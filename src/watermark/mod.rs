// Watermark module - renders text or image overlays and composites them
// onto photographs.
mod compositor;
mod error;
mod types;

pub use compositor::composite;
pub use error::WatermarkError;
pub use types::{
    Bounds, CompositeResult, ResizeSpec, ShadowSpec, StrokeSpec, StyleSpec, WatermarkKind,
    WatermarkSource,
};
