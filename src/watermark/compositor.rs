use ab_glyph::PxScale;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use tracing::debug;

use crate::color;
use crate::fonts::FontResolver;
use crate::position::{self, DEFAULT_MARGIN};

use super::error::WatermarkError;
use super::types::{
    Bounds, CompositeResult, MAX_RESIZE_PERCENT, ResizeSpec, StyleSpec, WatermarkKind,
    WatermarkSource,
};

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Alpha of the background box before the style opacity is applied.
const BOX_BASE_ALPHA: f32 = 150.0;

/// Composite a watermark onto the base image and return the result together
/// with the watermark's placed bounding box.
///
/// Any decode, font, or resize failure returns an error without producing a
/// partially composited image; batch callers treat that as a per-item skip.
pub fn composite(
    source: WatermarkSource,
    style: &StyleSpec,
    resize: &ResizeSpec,
    resolver: &mut FontResolver,
) -> Result<CompositeResult, WatermarkError> {
    let base = match source {
        WatermarkSource::Path(path) => image::open(&path)?,
        WatermarkSource::Bitmap(img) => img,
    };
    let base = apply_resize(base, resize);
    let mut base = base.to_rgba8();

    let layer = match style.kind {
        WatermarkKind::Text => render_text_layer(style, resolver)?,
        WatermarkKind::Image => render_image_layer(style)?,
    };
    let layer = rotate_expanded(layer, style.rotation);

    // Placement uses the rotated size: rotation changes the overlay extent,
    // so anchors and the custom span must be resolved against it.
    let (x, y) = position::resolve(
        base.dimensions(),
        layer.dimensions(),
        &style.position,
        DEFAULT_MARGIN,
    );

    // Two-stage compositing: the rotated layer lands on a transparent
    // base-sized sheet first, so the transparent padding introduced by
    // expand-on-rotate contributes no opacity of its own.
    let mut sheet = RgbaImage::from_pixel(base.width(), base.height(), TRANSPARENT);
    imageops::overlay(&mut sheet, &layer, x as i64, y as i64);
    imageops::overlay(&mut base, &sheet, 0, 0);

    let bounds = Bounds {
        x,
        y,
        width: layer.width().min(base.width() - x),
        height: layer.height().min(base.height() - y),
    };

    Ok(CompositeResult { image: base, bounds })
}

/// Resize the base image per the spec, preserving aspect ratio with
/// high-quality resampling. Out-of-range values leave the image unchanged.
fn apply_resize(img: DynamicImage, resize: &ResizeSpec) -> DynamicImage {
    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 {
        return img;
    }

    let target = match *resize {
        ResizeSpec::None => None,
        ResizeSpec::Width(value) if value > 0 => {
            Some((value, (h as f64 * (value as f64 / w as f64)) as u32))
        }
        ResizeSpec::Height(value) if value > 0 => {
            Some(((w as f64 * (value as f64 / h as f64)) as u32, value))
        }
        ResizeSpec::Percent(value) if value > 0 && value <= MAX_RESIZE_PERCENT => Some((
            (w as f64 * value as f64 / 100.0) as u32,
            (h as f64 * value as f64 / 100.0) as u32,
        )),
        _ => None,
    };

    match target {
        Some((new_w, new_h)) if (new_w, new_h) != (w, h) => {
            img.resize_exact(new_w.max(1), new_h.max(1), FilterType::Lanczos3)
        }
        _ => img,
    }
}

/// Rasterize the text watermark onto its own layer: optional background box,
/// optional shadow, optional stroke, then the main text.
fn render_text_layer(
    style: &StyleSpec,
    resolver: &mut FontResolver,
) -> Result<RgbaImage, WatermarkError> {
    if style.text.is_empty() {
        return Err(WatermarkError::EmptyText);
    }
    let font = resolver
        .resolve(style.font_family.as_deref())
        .ok_or(WatermarkError::FontUnavailable)?;

    let scale = PxScale::from(style.font_size.max(1) as f32);
    let (text_w, text_h) = text_size(scale, &font, &style.text);

    let opacity = style.opacity.clamp(0.0, 1.0);
    let fill = color::parse(&style.color);
    let final_color = Rgba([
        fill[0],
        fill[1],
        fill[2],
        (fill[3] as f32 * opacity) as u8,
    ]);

    let pad = if style.boxed { style.box_padding } else { 0 };
    let layer_w = (text_w + 2 * pad).max(1);
    let layer_h = (text_h + 2 * pad).max(1);

    let background = if style.boxed {
        Rgba([0, 0, 0, (BOX_BASE_ALPHA * opacity) as u8])
    } else {
        TRANSPARENT
    };
    let mut layer = RgbaImage::from_pixel(layer_w, layer_h, background);

    let origin = pad as i32;

    if let Some(shadow) = &style.shadow {
        let shadow_color = color::parse(&shadow.color);
        draw_text_mut(
            &mut layer,
            shadow_color,
            origin + shadow.dx,
            origin + shadow.dy,
            scale,
            &font,
            &style.text,
        );
    }

    if let Some(stroke) = &style.stroke {
        // Outline approximation: the glyphs are re-drawn at every offset in
        // the square neighborhood, O(width^2) text draws.
        let width = stroke.width.max(1) as i32;
        if width > 4 {
            debug!("stroke width {} means {} extra text draws", width, (2 * width + 1).pow(2) - 1);
        }
        let stroke_color = color::parse(&stroke.color);
        for dx in -width..=width {
            for dy in -width..=width {
                if dx == 0 && dy == 0 {
                    continue;
                }
                draw_text_mut(
                    &mut layer,
                    stroke_color,
                    origin + dx,
                    origin + dy,
                    scale,
                    &font,
                    &style.text,
                );
            }
        }
    }

    draw_text_mut(&mut layer, final_color, origin, origin, scale, &font, &style.text);

    Ok(layer)
}

/// Load and prepare the image watermark: scale by percent (at least 1px per
/// dimension), then multiply the existing alpha channel by the overlay
/// opacity.
fn render_image_layer(style: &StyleSpec) -> Result<RgbaImage, WatermarkError> {
    let path = style
        .image_path
        .as_ref()
        .ok_or(WatermarkError::MissingWatermarkImage)?;
    let mut overlay = image::open(path)?.to_rgba8();

    if style.image_scale != 100 {
        let scale = style.image_scale as f32 / 100.0;
        let new_w = ((overlay.width() as f32 * scale) as u32).max(1);
        let new_h = ((overlay.height() as f32 * scale) as u32).max(1);
        overlay = imageops::resize(&overlay, new_w, new_h, FilterType::Lanczos3);
    }

    let opacity = style.image_opacity.clamp(0.0, 1.0);
    if opacity < 1.0 {
        for pixel in overlay.pixels_mut() {
            pixel[3] = (pixel[3] as f32 * opacity) as u8;
        }
    }

    Ok(overlay)
}

/// Rotate a watermark layer about its own center, expanding the canvas so no
/// corner is cropped. Positive degrees rotate counter-clockwise; a rotation
/// that is 0 mod 360 returns the layer untouched.
pub(crate) fn rotate_expanded(layer: RgbaImage, degrees: i32) -> RgbaImage {
    let rotation = degrees.rem_euclid(360);
    if rotation == 0 {
        return layer;
    }

    let theta = (rotation as f32).to_radians();
    let (w, h) = (layer.width() as f32, layer.height() as f32);
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());

    // The rotated bounding box can be narrower than the layer itself (wide
    // strips at shallow angles), so rotate inside a square canvas that holds
    // the layer at any angle, then crop the centered bounding box out.
    let side = (w * w + h * h).sqrt().ceil() as u32;
    let mut canvas = RgbaImage::from_pixel(side.max(1), side.max(1), TRANSPARENT);
    let offset_x = ((side - layer.width()) / 2) as i64;
    let offset_y = ((side - layer.height()) / 2) as i64;
    imageops::overlay(&mut canvas, &layer, offset_x, offset_y);

    let rotated = rotate_about_center(&canvas, -theta, Interpolation::Bicubic, TRANSPARENT);

    let bound_w = ((w * cos + h * sin).ceil() as u32).clamp(1, side);
    let bound_h = ((w * sin + h * cos).ceil() as u32).clamp(1, side);
    let crop_x = (side - bound_w) / 2;
    let crop_y = (side - bound_h) / 2;
    imageops::crop_imm(&rotated, crop_x, crop_y, bound_w, bound_h).to_image()
}
