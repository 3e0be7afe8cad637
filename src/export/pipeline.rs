use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::exif;
use crate::fonts::FontResolver;
use crate::watermark::{ResizeSpec, StyleSpec, WatermarkKind, WatermarkSource, composite};

use super::error::ExportError;
use super::formats;
use super::types::{BatchReport, ExportSpec, ItemOutcome, NamingRule, OutputFormat};

/// Run the watermark compositor across a batch of source files, in order.
///
/// The whole operation is refused upfront when the output directory is the
/// parent of any source file (nothing is written in that case). After that,
/// a single file's failure never aborts the batch: decode, date, and encode
/// problems are recorded per item and processing continues.
pub fn run_batch(
    sources: &[PathBuf],
    style: &StyleSpec,
    resize: &ResizeSpec,
    export: &ExportSpec,
    resolver: &mut FontResolver,
) -> Result<BatchReport, ExportError> {
    let output_dir = normalized(&export.output_dir);
    for source in sources {
        if let Some(parent) = source.parent()
            && normalized(parent) == output_dir
        {
            return Err(ExportError::OutputIntoSourceDirectory(
                parent.to_path_buf(),
            ));
        }
    }

    let total = sources.len();
    let mut outcomes = Vec::with_capacity(total);
    let mut succeeded = 0;

    for (index, source) in sources.iter().enumerate() {
        info!(
            "[{}/{}] processing {}",
            index + 1,
            total,
            source.display()
        );

        let outcome = export_one(source, style, resize, export, resolver);
        match &outcome {
            ItemOutcome::Saved(dst) => {
                succeeded += 1;
                info!("saved {}", dst.display());
            }
            ItemOutcome::NoDate => {
                warn!("skipped {} (no date)", source.display());
            }
            ItemOutcome::Failed(reason) => {
                warn!("failed {}: {}", source.display(), reason);
            }
        }
        outcomes.push((source.clone(), outcome));
    }

    info!(
        "done: {}/{} saved to {}",
        succeeded,
        total,
        export.output_dir.display()
    );

    Ok(BatchReport {
        total,
        succeeded,
        outcomes,
    })
}

fn export_one(
    source: &Path,
    style: &StyleSpec,
    resize: &ResizeSpec,
    export: &ExportSpec,
    resolver: &mut FontResolver,
) -> ItemOutcome {
    let mut style = style.clone();

    // Empty text in text mode means "use this image's date". Explicit text
    // never triggers the date fallback.
    if style.kind == WatermarkKind::Text && style.text.trim().is_empty() {
        match exif::derive_date_text(source) {
            Some(date) => style.text = date,
            None => return ItemOutcome::NoDate,
        }
    }

    if let Err(e) = std::fs::create_dir_all(&export.output_dir) {
        return ItemOutcome::Failed(e.to_string());
    }
    let destination = destination_path(source, export);

    // Custom placement is stored as a fraction of the available span; the
    // compositor resolves it against this image's actual dimensions, so
    // placement stays consistent across per-image resolution differences.
    let result = match composite(
        WatermarkSource::Path(source.to_path_buf()),
        &style,
        resize,
        resolver,
    ) {
        Ok(result) => result,
        Err(e) => return ItemOutcome::Failed(e.to_string()),
    };

    let image = DynamicImage::ImageRgba8(result.image);
    let saved = match export.format {
        OutputFormat::Jpeg => formats::jpeg::save(&image, &destination, export.jpeg_quality),
        OutputFormat::Png => formats::png::save(&image, &destination),
    };
    match saved {
        Ok(()) => ItemOutcome::Saved(destination),
        Err(e) => ItemOutcome::Failed(e.to_string()),
    }
}

/// Destination path for a source file: naming rule applied to the stem, the
/// extension forced to match the output format.
pub fn destination_path(source: &Path, export: &ExportSpec) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = match &export.naming {
        NamingRule::Keep => stem,
        NamingRule::Prefix(prefix) => format!("{prefix}{stem}"),
        NamingRule::Suffix(suffix) => format!("{stem}{suffix}"),
    };
    export
        .output_dir
        .join(format!("{}.{}", name, export.format.extension()))
}

/// Directory comparison for the overwrite guard. Canonicalization resolves
/// symlinks when the directory exists; otherwise fall back to an absolute
/// lexical form so a not-yet-created output directory still compares.
fn normalized(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| {
        std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
    })
}
