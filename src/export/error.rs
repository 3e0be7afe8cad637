use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error(
        "output directory {0} is the parent of a source file; exporting would overwrite originals"
    )]
    OutputIntoSourceDirectory(PathBuf),
}
