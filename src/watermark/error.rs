use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatermarkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("no usable font found for text watermark")]
    FontUnavailable,

    #[error("text watermark has no content")]
    EmptyText,

    #[error("image watermark path is not set")]
    MissingWatermarkImage,
}
