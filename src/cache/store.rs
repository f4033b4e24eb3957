// ファイルシステムストア: チャプター単位のページ画像
//
// Layout: <library_dir>/<title>/chapter_<chapter>/
//   combined.png    stitched chapter raster
//   page_<n>.png    segmented pages, n = 0, 1, ...
//   metadata.json   cache key, page count, page source rows

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use image::RgbImage;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use tracing::warn;

use crate::error::MangaPagesError;
use crate::segment::Page;

const COMBINED_FILE: &str = "combined.png";
const METADATA_FILE: &str = "metadata.json";
const PAGE_PREFIX: &str = "page_";
const PAGE_SUFFIX: &str = ".png";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// ファイルシステムベースのチャプターストア。
///
/// A chapter directory only appears once all of its files are written, so
/// its existence means the chapter is complete.
#[derive(Debug, Clone)]
pub struct ChapterStore {
    library_dir: PathBuf,
}

/// metadata.json に保存するチャプターのメタデータ。
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct ChapterMetadata {
    cache_key: String,
    width: u32,
    height: u32,
    page_count: usize,
    page_tops: Vec<u32>,
}

/// Reject names that would escape the library directory.
fn validate_component(kind: &str, name: &str) -> crate::error::Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(MangaPagesError::cache(format!(
            "invalid {kind} name for store path: '{name}'"
        )));
    }
    Ok(())
}

/// Page number encoded in a file name like `page_12.png`.
fn page_number(file_name: &str) -> Option<usize> {
    file_name
        .strip_prefix(PAGE_PREFIX)?
        .strip_suffix(PAGE_SUFFIX)?
        .parse()
        .ok()
}

fn write_png(image: &RgbImage, path: &Path) -> crate::error::Result<()> {
    let file = File::create(path).map_err(|e| MangaPagesError::cache(e.to_string()))?;
    let encoder = PngEncoder::new_with_quality(
        BufWriter::new(file),
        CompressionType::Fast,
        FilterType::Adaptive,
    );
    image.write_with_encoder(encoder)?;
    Ok(())
}

fn write_entry(
    dir: &Path,
    cache_key: &str,
    combined: &RgbImage,
    pages: &[Page],
) -> crate::error::Result<()> {
    write_png(combined, &dir.join(COMBINED_FILE))?;
    for (i, page) in pages.iter().enumerate() {
        write_png(&page.image, &dir.join(format!("{PAGE_PREFIX}{i}{PAGE_SUFFIX}")))?;
    }

    let metadata = ChapterMetadata {
        cache_key: cache_key.to_string(),
        width: combined.width(),
        height: combined.height(),
        page_count: pages.len(),
        page_tops: pages.iter().map(|p| p.top).collect(),
    };
    let metadata_json = serde_json::to_string(&metadata)?;
    fs::write(dir.join(METADATA_FILE), metadata_json.as_bytes())
        .map_err(|e| MangaPagesError::cache(e.to_string()))?;
    Ok(())
}

impl ChapterStore {
    /// 指定されたディレクトリをライブラリルートとして新しい ChapterStore を作成する。
    pub fn new(library_dir: impl AsRef<Path>) -> Self {
        Self {
            library_dir: library_dir.as_ref().to_path_buf(),
        }
    }

    pub fn library_dir(&self) -> &Path {
        &self.library_dir
    }

    /// タイトルとチャプターからディレクトリパスを計算する。
    pub fn chapter_dir(&self, title: &str, chapter: &str) -> crate::error::Result<PathBuf> {
        validate_component("title", title)?;
        validate_component("chapter", chapter)?;
        Ok(self
            .library_dir
            .join(title)
            .join(format!("chapter_{chapter}")))
    }

    /// True if a finished entry exists for the chapter, whatever its settings.
    pub fn contains(&self, title: &str, chapter: &str) -> bool {
        match self.chapter_dir(title, chapter) {
            Ok(dir) => dir.join(METADATA_FILE).exists(),
            Err(_) => false,
        }
    }

    /// True if the chapter is stored under `cache_key`.
    pub fn is_current(&self, title: &str, chapter: &str, cache_key: &str) -> bool {
        let Ok(dir) = self.chapter_dir(title, chapter) else {
            return false;
        };
        fs::read_to_string(dir.join(METADATA_FILE))
            .ok()
            .and_then(|s| serde_json::from_str::<ChapterMetadata>(&s).ok())
            .is_some_and(|m| m.cache_key == cache_key)
    }

    /// Persist a segmented chapter.
    ///
    /// 書き込みはアトミック: 一時ディレクトリにファイルを書き込み、
    /// 最後にrenameで最終パスに移動する。
    pub fn store(
        &self,
        title: &str,
        chapter: &str,
        cache_key: &str,
        combined: &RgbImage,
        pages: &[Page],
    ) -> crate::error::Result<PathBuf> {
        let dir = self.chapter_dir(title, chapter)?;
        let parent = dir
            .parent()
            .ok_or_else(|| MangaPagesError::cache("chapter directory has no parent"))?;
        fs::create_dir_all(parent).map_err(|e| MangaPagesError::cache(e.to_string()))?;

        let tmp_dir = parent.join(format!(
            ".chapter_{chapter}.{}.{}.tmp",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        if tmp_dir.exists() {
            let _ = fs::remove_dir_all(&tmp_dir);
        }
        fs::create_dir_all(&tmp_dir).map_err(|e| MangaPagesError::cache(e.to_string()))?;

        let written = write_entry(&tmp_dir, cache_key, combined, pages);
        if let Err(e) = written {
            let _ = fs::remove_dir_all(&tmp_dir);
            return Err(e);
        }

        if dir.exists() {
            let _ = fs::remove_dir_all(&dir);
        }
        if let Err(e) = fs::rename(&tmp_dir, &dir) {
            let _ = fs::remove_dir_all(&tmp_dir);
            return Err(MangaPagesError::cache(format!(
                "failed to move chapter entry into {}: {e}",
                dir.display()
            )));
        }

        Ok(dir)
    }

    /// Load a stored chapter's pages. Returns `None` when the chapter has not
    /// been stored, or was stored under a different `cache_key`.
    pub fn retrieve(
        &self,
        title: &str,
        chapter: &str,
        cache_key: &str,
    ) -> crate::error::Result<Option<Vec<Page>>> {
        let dir = self.chapter_dir(title, chapter)?;
        if !dir.exists() {
            return Ok(None);
        }

        let metadata_str = fs::read_to_string(dir.join(METADATA_FILE)).map_err(|e| {
            MangaPagesError::cache(format!(
                "incomplete chapter entry {}: {e}",
                dir.display()
            ))
        })?;
        let metadata: ChapterMetadata = serde_json::from_str(&metadata_str)?;

        if metadata.cache_key != cache_key {
            warn!(
                title = %title,
                chapter = %chapter,
                stored = %metadata.cache_key,
                "stored pages were produced with different settings"
            );
            return Ok(None);
        }

        let paths = page_files(&dir)?;
        if paths.len() != metadata.page_count || metadata.page_tops.len() != metadata.page_count {
            return Err(MangaPagesError::cache(format!(
                "chapter entry {} lists {} pages but holds {}",
                dir.display(),
                metadata.page_count,
                paths.len()
            )));
        }

        paths
            .into_iter()
            .zip(metadata.page_tops)
            .enumerate()
            .map(|(index, (path, top))| -> crate::error::Result<Page> {
                let image = image::open(&path)?.to_rgb8();
                Ok(Page { index, top, image })
            })
            .collect::<crate::error::Result<Vec<Page>>>()
            .map(Some)
    }

    /// The stitched raster stored alongside a chapter's pages.
    pub fn load_combined(&self, title: &str, chapter: &str) -> crate::error::Result<RgbImage> {
        let path = self.chapter_dir(title, chapter)?.join(COMBINED_FILE);
        Ok(image::open(path)?.to_rgb8())
    }
}

/// Page files of a chapter directory in ascending page number.
///
/// Numbers must run 0, 1, 2, ... without gaps.
fn page_files(dir: &Path) -> crate::error::Result<Vec<PathBuf>> {
    let mut numbered: Vec<(usize, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| MangaPagesError::cache(e.to_string()))? {
        let path = entry?.path();
        if let Some(n) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(page_number)
        {
            numbered.push((n, path));
        }
    }
    numbered.sort_by_key(|(n, _)| *n);

    for (expected, (n, path)) in numbered.iter().enumerate() {
        if *n != expected {
            return Err(MangaPagesError::cache(format!(
                "unexpected page file {} (expected page {expected})",
                path.display()
            )));
        }
    }
    Ok(numbered.into_iter().map(|(_, path)| path).collect())
}
