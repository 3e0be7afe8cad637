use ab_glyph::FontVec;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Ranked list of font file names to try when no override is given. CJK-aware
/// names first (the watermark text may contain non-Latin characters), then
/// the Latin faces commonly present on Windows and Unix hosts.
const PREFERRED_FONTS: [&str; 7] = [
    "msyh.ttc",
    "msyh.ttf",
    "simhei.ttf",
    "dengxian.ttf",
    "arial.ttf",
    "DejaVuSans.ttf",
    "LiberationSans-Regular.ttf",
];

const FONT_EXTENSIONS: [&str; 3] = ["ttf", "otf", "ttc"];

fn system_font_directories() -> Vec<PathBuf> {
    if cfg!(target_os = "windows") {
        vec![PathBuf::from("C:/Windows/Fonts")]
    } else if cfg!(target_os = "macos") {
        vec![
            PathBuf::from("/System/Library/Fonts"),
            PathBuf::from("/Library/Fonts"),
        ]
    } else {
        vec![
            PathBuf::from("/usr/share/fonts"),
            PathBuf::from("/usr/local/share/fonts"),
        ]
    }
}

/// Locates usable font files on the host, memoizing every filesystem search
/// for the lifetime of the resolver. Lookup failures degrade silently to the
/// next option; only a host with no fonts at all yields `None`.
pub struct FontResolver {
    directories: Vec<PathBuf>,
    by_name: HashMap<String, Option<PathBuf>>,
    any_font: Option<Option<PathBuf>>,
    listing: Option<Vec<(String, PathBuf)>>,
}

impl Default for FontResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl FontResolver {
    pub fn new() -> Self {
        Self::with_directories(system_font_directories())
    }

    /// Resolver over an explicit directory set (used by tests).
    pub fn with_directories(directories: Vec<PathBuf>) -> Self {
        Self {
            directories,
            by_name: HashMap::new(),
            any_font: None,
            listing: None,
        }
    }

    /// Resolve a loadable font. `override_spec` may be a path to a font file
    /// or the name of a discovered system font; when it is absent or
    /// unusable, the ranked preference list is tried, then any font file at
    /// all.
    pub fn resolve(&mut self, override_spec: Option<&str>) -> Option<FontVec> {
        if let Some(spec) = override_spec
            && let Some(path) = self.resolve_override(spec)
            && let Some(font) = load_font(&path)
        {
            return Some(font);
        }

        for name in PREFERRED_FONTS {
            if let Some(path) = self.find_by_name(name)
                && let Some(font) = load_font(&path)
            {
                return Some(font);
            }
        }

        if let Some(path) = self.find_any()
            && let Some(font) = load_font(&path)
        {
            return Some(font);
        }

        debug!("no usable font found in {:?}", self.directories);
        None
    }

    /// Map an override to a font file path: an existing file wins, otherwise
    /// the discovered system fonts are searched by stem name.
    fn resolve_override(&mut self, spec: &str) -> Option<PathBuf> {
        let as_path = Path::new(spec);
        if as_path.is_file() {
            return Some(as_path.to_path_buf());
        }
        self.list_system_fonts(usize::MAX)
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(spec))
            .map(|(_, path)| path.clone())
    }

    /// Find a font file by exact (case-insensitive) filename. Each distinct
    /// name is searched on the filesystem at most once.
    fn find_by_name(&mut self, name: &str) -> Option<PathBuf> {
        if let Some(cached) = self.by_name.get(name) {
            return cached.clone();
        }

        let mut found = None;
        'walk: for dir in &self.directories {
            for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
                if entry.file_type().is_file()
                    && entry
                        .file_name()
                        .to_string_lossy()
                        .eq_ignore_ascii_case(name)
                {
                    found = Some(entry.path().to_path_buf());
                    break 'walk;
                }
            }
        }

        trace!("font lookup {:?} -> {:?}", name, found);
        self.by_name.insert(name.to_string(), found.clone());
        found
    }

    /// Last-resort lookup: the first font file of any name.
    fn find_any(&mut self) -> Option<PathBuf> {
        if let Some(cached) = &self.any_font {
            return cached.clone();
        }

        let found = self
            .directories
            .iter()
            .flat_map(|dir| WalkDir::new(dir).into_iter().filter_map(|e| e.ok()))
            .find(|entry| entry.file_type().is_file() && has_font_extension(entry.path()))
            .map(|entry| entry.path().to_path_buf());

        self.any_font = Some(found.clone());
        found
    }

    /// Enumerate system font files as deduplicated `(stem, path)` pairs, up
    /// to `limit` entries. The enumeration itself runs once, capped at
    /// `MAX_LISTED_FONTS`, and is cached for the resolver's lifetime.
    pub fn list_system_fonts(&mut self, limit: usize) -> &[(String, PathBuf)] {
        const MAX_LISTED_FONTS: usize = 512;

        if self.listing.is_none() {
            let mut seen = std::collections::HashSet::new();
            let mut results = Vec::new();
            'walk: for dir in &self.directories {
                for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
                    if !entry.file_type().is_file() || !has_font_extension(entry.path()) {
                        continue;
                    }
                    let stem = entry
                        .path()
                        .file_stem()
                        .map(|s| s.to_string_lossy().to_string())
                        .unwrap_or_default();
                    if !stem.is_empty() && seen.insert(stem.clone()) {
                        results.push((stem, entry.path().to_path_buf()));
                        if results.len() >= MAX_LISTED_FONTS {
                            break 'walk;
                        }
                    }
                }
            }
            self.listing = Some(results);
        }

        match &self.listing {
            Some(listing) => &listing[..listing.len().min(limit)],
            None => &[],
        }
    }
}

fn has_font_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| FONT_EXTENSIONS.iter().any(|f| e.eq_ignore_ascii_case(f)))
        .unwrap_or(false)
}

fn load_font(path: &Path) -> Option<FontVec> {
    let data = std::fs::read(path).ok()?;
    match FontVec::try_from_vec(data) {
        Ok(font) => Some(font),
        Err(_) => {
            debug!("failed to parse font file {:?}", path);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_font_degrades_to_none() {
        let empty = TempDir::new().unwrap();
        let mut resolver = FontResolver::with_directories(vec![empty.path().to_path_buf()]);
        assert!(resolver.resolve(None).is_none());
        assert!(resolver.resolve(Some("nonexistent.ttf")).is_none());
    }

    #[test]
    fn test_name_search_is_memoized() {
        let dir = TempDir::new().unwrap();
        let mut resolver = FontResolver::with_directories(vec![dir.path().to_path_buf()]);

        assert!(resolver.find_by_name("arial.ttf").is_none());
        // Creating the file after the first search must not change the
        // cached answer: at most one walk per distinct name.
        std::fs::write(dir.path().join("arial.ttf"), b"not a real font").unwrap();
        assert!(resolver.find_by_name("arial.ttf").is_none());
    }

    #[test]
    fn test_find_by_name_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("SimHei.ttf"), b"stub").unwrap();
        let mut resolver = FontResolver::with_directories(vec![dir.path().to_path_buf()]);

        let found = resolver.find_by_name("simhei.ttf");
        assert_eq!(found, Some(dir.path().join("SimHei.ttf")));
    }

    #[test]
    fn test_unparseable_font_file_degrades_silently() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("arial.ttf"), b"definitely not a font").unwrap();
        let mut resolver = FontResolver::with_directories(vec![dir.path().to_path_buf()]);

        // The stub matches by name but fails to parse; resolution must not
        // panic and must fall through to None on this fontless host.
        assert!(resolver.resolve(None).is_none());
    }

    #[test]
    fn test_list_system_fonts_dedupes_and_limits() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("alpha.ttf"), b"a").unwrap();
        std::fs::write(dir.path().join("sub/alpha.otf"), b"a2").unwrap();
        std::fs::write(dir.path().join("beta.otf"), b"b").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"c").unwrap();

        let mut resolver = FontResolver::with_directories(vec![dir.path().to_path_buf()]);
        let fonts: Vec<String> = resolver
            .list_system_fonts(10)
            .iter()
            .map(|(name, _)| name.clone())
            .collect();

        assert_eq!(fonts.len(), 2, "stems deduplicated, non-fonts excluded");
        assert!(fonts.contains(&"alpha".to_string()));
        assert!(fonts.contains(&"beta".to_string()));

        assert_eq!(resolver.list_system_fonts(1).len(), 1);
    }

    #[test]
    fn test_resolver_system_fonts_if_present() {
        // On hosts with real fonts installed the default resolver should
        // produce a parseable font; on bare hosts this is a no-op.
        let mut resolver = FontResolver::new();
        let _ = resolver.resolve(None);
    }
}
