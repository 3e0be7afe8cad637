use image::{DynamicImage, codecs::png::PngEncoder};
use std::path::Path;

use crate::export::ExportError;

/// Save an image as PNG (lossless, alpha preserved).
pub fn save(image: &DynamicImage, path: &Path) -> Result<(), ExportError> {
    let output = std::fs::File::create(path)?;
    let encoder = PngEncoder::new(output);
    image.write_with_encoder(encoder)?;
    Ok(())
}
