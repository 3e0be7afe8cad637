use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions accepted for import. Anything else is silently excluded from
/// folder scans.
const ALLOWED_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "tif", "tiff", "bmp", "webp"];

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| ALLOWED_EXTENSIONS.iter().any(|a| e.eq_ignore_ascii_case(a)))
        .unwrap_or(false)
}

/// Collect importable images from a path: a matching file yields itself, a
/// directory is walked recursively. Unreadable entries are skipped.
pub fn find_images(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return if is_supported_image(path) {
            vec![path.to_path_buf()]
        } else {
            Vec::new()
        };
    }

    let mut images: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_supported_image(e.path()))
        .map(|e| e.path().to_path_buf())
        .collect();
    images.sort();
    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extension_allow_list() {
        assert!(is_supported_image(Path::new("a.jpg")));
        assert!(is_supported_image(Path::new("a.JPEG")));
        assert!(is_supported_image(Path::new("a.Tiff")));
        assert!(is_supported_image(Path::new("a.webp")));
        assert!(!is_supported_image(Path::new("a.gif")));
        assert!(!is_supported_image(Path::new("a.txt")));
        assert!(!is_supported_image(Path::new("noextension")));
    }

    #[test]
    fn test_find_images_recurses_and_filters() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("b.txt"), b"x").unwrap();
        std::fs::write(dir.path().join("nested/c.png"), b"x").unwrap();
        std::fs::write(dir.path().join("nested/d.mov"), b"x").unwrap();

        let images = find_images(dir.path());
        assert_eq!(images.len(), 2);
        assert!(images.iter().any(|p| p.ends_with("a.jpg")));
        assert!(images.iter().any(|p| p.ends_with("nested/c.png")));
    }

    #[test]
    fn test_find_images_on_single_file() {
        let dir = TempDir::new().unwrap();
        let img = dir.path().join("only.bmp");
        std::fs::write(&img, b"x").unwrap();
        let other = dir.path().join("skip.doc");
        std::fs::write(&other, b"x").unwrap();

        assert_eq!(find_images(&img), vec![img]);
        assert!(find_images(&other).is_empty());
    }
}
