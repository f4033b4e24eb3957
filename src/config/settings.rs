use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::segment::SegmentConfig;

/// Contents of `settings.yaml`.
///
/// Segmentation tunables sit at the top level of the file next to the
/// library and worker options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(flatten)]
    pub segment: SegmentConfig,
    pub library_dir: PathBuf,
    pub parallel_workers: usize,
    pub prefetch_next: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            segment: SegmentConfig::default(),
            library_dir: PathBuf::from("mangas"),
            parallel_workers: 0,
            prefetch_next: true,
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        serde_yml::from_str(yaml).map_err(|e| {
            crate::error::MangaPagesError::config(format!("Failed to parse settings YAML: {e}"))
        })
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}
