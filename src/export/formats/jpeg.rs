use image::{DynamicImage, ImageEncoder, codecs::jpeg::JpegEncoder};
use std::path::Path;
use tracing::debug;

use crate::export::ExportError;

/// Save an image as JPEG at the requested quality. JPEG has no alpha
/// channel, so the image is flattened to RGB first.
pub fn save(image: &DynamicImage, path: &Path, quality: u8) -> Result<(), ExportError> {
    let rgb_image = image.to_rgb8();
    let output = std::fs::File::create(path)?;

    let encoder = JpegEncoder::new_with_quality(output, quality.clamp(1, 100));
    encoder.write_image(
        &rgb_image,
        rgb_image.width(),
        rgb_image.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    debug!("JPEG written to {:?} at quality {}", path, quality);

    Ok(())
}
