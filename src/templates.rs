use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::export::ExportSpec;
use crate::position::Position;
use crate::watermark::{ResizeSpec, StyleSpec};

/// File stem of the implicit "last used" template.
const LAST_TEMPLATE: &str = "last";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("template {0:?} not found")]
    NotFound(String),
}

/// A saved snapshot of every user-chosen setting. Unknown keys in older
/// files are ignored and missing keys fall back to the defaults; there is no
/// versioning or migration beyond the custom-position conversion below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Template {
    pub style: StyleSpec,
    pub resize: ResizeSpec,
    pub export: ExportSpec,
    /// True when the custom position fractions are normalized against the
    /// available span. Templates from older releases stored fractions of the
    /// full image size and lack this key entirely, so the missing-key default
    /// must stay `false` even though new templates are written with `true`.
    #[serde(default)]
    pub custom_pos_span: bool,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            style: StyleSpec::default(),
            resize: ResizeSpec::default(),
            export: ExportSpec::default(),
            custom_pos_span: true,
        }
    }
}

impl Template {
    /// Convert a legacy image-relative custom position to the span-normalized
    /// form, given a reference image and the watermark's placed size on it.
    /// A no-op for span-form templates and anchored positions.
    pub fn normalize_custom_position(
        &mut self,
        image_size: (u32, u32),
        overlay_size: (u32, u32),
    ) {
        if self.custom_pos_span {
            return;
        }
        if let Position::Custom { fx, fy } = self.style.position {
            let old_x = fx * image_size.0 as f64;
            let old_y = fy * image_size.1 as f64;
            let span_x = (image_size.0.saturating_sub(overlay_size.0)).max(1) as f64;
            let span_y = (image_size.1.saturating_sub(overlay_size.1)).max(1) as f64;
            self.style.position = Position::Custom {
                fx: (old_x / span_x).clamp(0.0, 1.0),
                fy: (old_y / span_y).clamp(0.0, 1.0),
            };
        }
        self.custom_pos_span = true;
    }
}

/// On-disk store of named templates plus the "last used" snapshot, one JSON
/// file per template in a per-user directory.
pub struct TemplateStore {
    directory: PathBuf,
}

impl TemplateStore {
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }

    /// Platform data directory, falling back to a dot directory in `$HOME`
    /// when detection fails.
    pub fn default_directory() -> PathBuf {
        directories::ProjectDirs::from("dev", "sukashi", "sukashi")
            .map(|dirs| dirs.data_dir().join("templates"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".sukashi").join("templates")
            })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, name: &str) -> PathBuf {
        let safe = name.replace(['/', '\\'], "_");
        self.directory.join(format!("{safe}.json"))
    }

    pub fn save(&self, name: &str, template: &Template) -> Result<(), TemplateError> {
        std::fs::create_dir_all(&self.directory)?;
        let json = serde_json::to_string_pretty(template)?;
        std::fs::write(self.path_for(name), json)?;
        debug!("saved template {:?}", name);
        Ok(())
    }

    pub fn load(&self, name: &str) -> Result<Template, TemplateError> {
        let path = self.path_for(name);
        if !path.exists() {
            return Err(TemplateError::NotFound(name.to_string()));
        }
        let json = std::fs::read_to_string(&path)?;
        let template = serde_json::from_str(&json)?;
        Ok(template)
    }

    pub fn delete(&self, name: &str) -> Result<(), TemplateError> {
        let path = self.path_for(name);
        if !path.exists() {
            return Err(TemplateError::NotFound(name.to_string()));
        }
        std::fs::remove_file(path)?;
        Ok(())
    }

    /// Names of all saved templates, sorted, excluding the "last used" file.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = match std::fs::read_dir(&self.directory) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .filter_map(|e| {
                    let path = e.path();
                    if path.extension().and_then(|x| x.to_str()) != Some("json") {
                        return None;
                    }
                    path.file_stem()
                        .map(|s| s.to_string_lossy().to_string())
                        .filter(|stem| stem != LAST_TEMPLATE)
                })
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    /// Persist the current settings as the startup snapshot. Failures are
    /// logged and swallowed; losing the snapshot must never fail a run.
    pub fn save_last(&self, template: &Template) {
        if let Err(e) = self.save(LAST_TEMPLATE, template) {
            warn!("failed to save last-used settings: {}", e);
        }
    }

    /// Load the startup snapshot, silently falling back to defaults when it
    /// is missing or unreadable.
    pub fn load_last(&self) -> Template {
        self.load(LAST_TEMPLATE).unwrap_or_default()
    }
}
