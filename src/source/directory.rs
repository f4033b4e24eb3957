// Local directory source: <root>/<chapter>/<strip images>

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use natord::compare;

use super::ChapterSource;
use crate::error::MangaPagesError;

const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "gif"];

/// Chapters stored as sub-directories of one root, each holding the
/// chapter's strips as image files.
///
/// Chapters and strips are ordered naturally, so `2` sorts before `10` and
/// `strip_9.png` before `strip_10.png`.
pub struct DirectorySource {
    title: String,
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(title: impl Into<String>, root: impl AsRef<Path>) -> Self {
        Self {
            title: title.into(),
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn chapter_dir(&self, chapter: &str) -> crate::error::Result<PathBuf> {
        let dir = self.root.join(chapter);
        if !dir.is_dir() {
            return Err(MangaPagesError::chapter_source(format!(
                "chapter directory not found: {}",
                dir.display()
            )));
        }
        Ok(dir)
    }
}

fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_IMAGE_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

fn natural_order(a: &str, b: &str) -> Ordering {
    compare(a, b)
}

impl ChapterSource for DirectorySource {
    fn title(&self) -> &str {
        &self.title
    }

    fn chapter_list(&self) -> crate::error::Result<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            MangaPagesError::chapter_source(format!(
                "failed to read source directory {}: {e}",
                self.root.display()
            ))
        })?;

        let mut chapters = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir()
                && let Some(name) = entry.file_name().to_str()
            {
                chapters.push(name.to_string());
            }
        }
        chapters.sort_by(|a, b| natural_order(a, b));
        Ok(chapters)
    }

    fn image_locations(&self, chapter: &str) -> crate::error::Result<Vec<String>> {
        let dir = self.chapter_dir(chapter)?;

        let mut files: Vec<(PathBuf, String)> = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if !path.is_file() || !is_supported_image(&path) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                let name = name.to_string();
                files.push((path, name));
            }
        }
        files.sort_by(|a, b| natural_order(&a.1, &b.1));

        Ok(files
            .into_iter()
            .map(|(path, _)| path.to_string_lossy().into_owned())
            .collect())
    }

    fn fetch_strip(&self, location: &str) -> crate::error::Result<DynamicImage> {
        image::open(location).map_err(|e| {
            MangaPagesError::chapter_source(format!("failed to decode strip {location}: {e}"))
        })
    }
}
