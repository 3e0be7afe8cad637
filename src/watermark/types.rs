use crate::position::Position;
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What the watermark is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatermarkKind {
    #[default]
    Text,
    Image,
}

/// Outline drawn around the watermark text by repeating the glyphs at every
/// offset in the `[-width, +width]` square neighborhood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokeSpec {
    pub width: u32,
    pub color: String,
}

impl Default for StrokeSpec {
    fn default() -> Self {
        Self {
            width: 2,
            color: "#000000".to_string(),
        }
    }
}

/// Drop shadow drawn once at the given offset beneath the main text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowSpec {
    pub dx: i32,
    pub dy: i32,
    pub color: String,
}

impl Default for ShadowSpec {
    fn default() -> Self {
        Self {
            dx: 2,
            dy: 2,
            color: "#000000".to_string(),
        }
    }
}

/// The full set of user-chosen watermark appearance parameters. Mutable UI
/// state in spirit: re-read on every composite, never cached between calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleSpec {
    pub kind: WatermarkKind,
    /// Watermark text; empty means "derive from the image's date".
    pub text: String,
    pub font_size: u32,
    /// Font file path or discovered font name; `None` uses the ranked
    /// preference list.
    pub font_family: Option<String>,
    pub color: String,
    pub opacity: f32,
    pub position: Position,
    /// Degrees, interpreted mod 360. Positive rotates counter-clockwise.
    pub rotation: i32,
    /// Draw a semi-transparent background box behind the text.
    pub boxed: bool,
    pub box_padding: u32,
    pub stroke: Option<StrokeSpec>,
    pub shadow: Option<ShadowSpec>,
    /// Image-watermark inputs, unused in text mode.
    pub image_path: Option<PathBuf>,
    /// Percent of the overlay image's original size.
    pub image_scale: u32,
    pub image_opacity: f32,
}

impl Default for StyleSpec {
    fn default() -> Self {
        Self {
            kind: WatermarkKind::Text,
            text: String::new(),
            font_size: 32,
            font_family: None,
            color: "#ffffff".to_string(),
            opacity: 0.7,
            position: Position::default(),
            rotation: 0,
            boxed: true,
            box_padding: 6,
            stroke: None,
            shadow: None,
            image_path: None,
            image_scale: 100,
            image_opacity: 0.8,
        }
    }
}

/// Optional resize applied to the base image before compositing, at export
/// time. Aspect ratio is always preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "lowercase")]
pub enum ResizeSpec {
    #[default]
    None,
    Width(u32),
    Height(u32),
    Percent(u32),
}

/// Maximum accepted value for `ResizeSpec::Percent`.
pub const MAX_RESIZE_PERCENT: u32 = 500;

/// The base image handed to the compositor: either a file to decode or an
/// already-loaded bitmap (the preview path).
pub enum WatermarkSource {
    Path(PathBuf),
    Bitmap(DynamicImage),
}

/// Absolute bounding box of the placed watermark, clipped to image bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A composited frame plus the watermark's placed bounding box. Ephemeral:
/// recomputed per preview tick or per exported file.
pub struct CompositeResult {
    pub image: RgbaImage,
    pub bounds: Bounds,
}
