use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod color;
pub mod exif;
pub mod export;
pub mod fonts;
pub mod position;
pub mod scanner;
pub mod templates;
pub mod watermark;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub app: AppConfig,
    pub fonts: FontConfig,
    pub templates: TemplateConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "sukashi".to_string(),
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FontConfig {
    /// Font file path or discovered font name used when a style carries no
    /// override of its own.
    pub default_family: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Template directory; the per-user data directory when unset.
    pub directory: Option<PathBuf>,
}

impl Config {
    /// Template directory honoring the config override.
    pub fn template_directory(&self) -> PathBuf {
        self.templates
            .directory
            .clone()
            .unwrap_or_else(templates::TemplateStore::default_directory)
    }
}
