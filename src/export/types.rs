use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
}

impl OutputFormat {
    /// Extension forced onto every exported file, regardless of the source
    /// extension.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }
}

/// How the destination filename is derived from the source stem.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "rule", content = "value", rename_all = "lowercase")]
pub enum NamingRule {
    #[default]
    Keep,
    Prefix(String),
    Suffix(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSpec {
    pub output_dir: PathBuf,
    pub naming: NamingRule,
    pub format: OutputFormat,
    pub jpeg_quality: u8,
}

impl Default for ExportSpec {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::new(),
            naming: NamingRule::Keep,
            format: OutputFormat::Jpeg,
            jpeg_quality: 95,
        }
    }
}

/// What happened to a single source file during a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Saved(PathBuf),
    /// Text derivation found neither an EXIF date nor a usable mtime.
    NoDate,
    Failed(String),
}

/// Terminal summary of a batch run. A failed item never aborts the batch,
/// so `outcomes` always covers every requested source.
#[derive(Debug)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub outcomes: Vec<(PathBuf, ItemOutcome)>,
}

impl BatchReport {
    pub fn summary(&self) -> String {
        format!("{}/{} succeeded", self.succeeded, self.total)
    }
}
