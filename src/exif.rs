use chrono::{DateTime, Local};
use std::path::Path;
use tracing::trace;

/// EXIF date tags in priority order: capture date first, then the file
/// modification stamp, then the digitization stamp.
const DATE_TAGS: [rexif::ExifTag; 3] = [
    rexif::ExifTag::DateTimeOriginal,
    rexif::ExifTag::DateTime,
    rexif::ExifTag::DateTimeDigitized,
];

/// Derive the default watermark text for an image: the EXIF date when one is
/// present and parseable, otherwise the file's modification date. Returns
/// `None` only when neither source yields a date.
pub fn derive_date_text(path: &Path) -> Option<String> {
    if let Some(date) = exif_date(path) {
        return Some(date);
    }
    mtime_date(path)
}

fn exif_date(path: &Path) -> Option<String> {
    let exif = match rexif::parse_file(path) {
        Ok(data) => data,
        Err(e) => {
            trace!("no EXIF data for {}: {}", path.display(), e);
            return None;
        }
    };

    for tag in DATE_TAGS {
        if let Some(entry) = exif.entries.iter().find(|e| e.tag == tag)
            && let Some(date) = format_exif_date(&entry.value_more_readable)
        {
            trace!("found date in {:?}: {}", tag, date);
            return Some(date);
        }
    }

    None
}

/// Reformat an EXIF datetime ("YYYY:MM:DD HH:MM:SS") as "YYYY-MM-DD".
/// Returns `None` for strings that do not carry a colon-separated date.
pub(crate) fn format_exif_date(raw: &str) -> Option<String> {
    let date_part = raw.split_whitespace().next()?;
    let parts: Vec<&str> = date_part.split(':').collect();
    if parts.len() >= 3
        && parts[..3]
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
    {
        Some(format!("{}-{}-{}", parts[0], parts[1], parts[2]))
    } else {
        None
    }
}

fn mtime_date(path: &Path) -> Option<String> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    let local: DateTime<Local> = modified.into();
    Some(local.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_exif_date() {
        assert_eq!(
            format_exif_date("2021:05:06 10:00:00"),
            Some("2021-05-06".to_string())
        );
        assert_eq!(format_exif_date("2005:07:30"), Some("2005-07-30".to_string()));
        assert_eq!(format_exif_date(""), None);
        assert_eq!(format_exif_date("not a date"), None);
        assert_eq!(format_exif_date("2021-05-06 10:00:00"), None);
        assert_eq!(format_exif_date("::"), None);
    }

    #[test]
    fn test_mtime_fallback() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("plain.txt");
        std::fs::write(&path, b"no exif here").unwrap();

        // Noon local time avoids any date ambiguity across timezones.
        let stamp = Local.with_ymd_and_hms(2020, 1, 2, 12, 0, 0).unwrap();
        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(stamp.into()).unwrap();
        drop(file);

        assert_eq!(derive_date_text(&path), Some("2020-01-02".to_string()));
    }

    #[test]
    fn test_missing_file_yields_none() {
        assert_eq!(derive_date_text(Path::new("/no/such/file.jpg")), None);
    }
}
