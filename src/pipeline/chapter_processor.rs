// チャプター単位処理: ストア確認 → 取得・結合 → 分割 → ストア保存

use tracing::info;

use crate::cache::hash::compute_cache_key;
use crate::cache::store::ChapterStore;
use crate::segment::{Page, SegmentConfig, split_image_into_pages};
use crate::source::ChapterSource;
use crate::stitch::stitch_strips;

/// Single chapter processing result.
#[derive(Debug)]
pub struct ProcessedChapter {
    pub chapter: String,
    pub pages: Vec<Page>,
    /// True when the pages were loaded from the store instead of segmented.
    pub from_store: bool,
}

/// Process a chapter: check store -> fetch strips -> stitch -> split -> store.
///
/// If the store already holds the chapter under the same settings, its pages
/// are loaded and segmentation is skipped. The stitched raster is persisted
/// after splitting, so it includes any slope healing.
pub fn process_chapter<S>(
    source: &S,
    chapter: &str,
    store: &ChapterStore,
    config: &SegmentConfig,
) -> crate::error::Result<ProcessedChapter>
where
    S: ChapterSource + ?Sized,
{
    let title = source.title();
    let cache_key = compute_cache_key(config);

    if let Some(pages) = store.retrieve(title, chapter, &cache_key)? {
        info!(title = %title, chapter = %chapter, pages = pages.len(), "found stored pages");
        return Ok(ProcessedChapter {
            chapter: chapter.to_string(),
            pages,
            from_store: true,
        });
    }

    config.validate()?;

    info!(title = %title, chapter = %chapter, "fetching strips");
    let strips = source.fetch_all_strips(chapter)?;
    info!(title = %title, chapter = %chapter, strips = strips.len(), "fetched strips");

    let mut combined = stitch_strips(&strips)?;
    drop(strips);
    info!(
        title = %title,
        chapter = %chapter,
        height = combined.height(),
        "stitched strips"
    );

    let pages = split_image_into_pages(&mut combined, config)?;
    info!(title = %title, chapter = %chapter, pages = pages.len(), "split into pages");

    let dir = store.store(title, chapter, &cache_key, &combined, &pages)?;
    info!(
        title = %title,
        chapter = %chapter,
        pages = pages.len(),
        dir = %dir.display(),
        "saved pages"
    );

    Ok(ProcessedChapter {
        chapter: chapter.to_string(),
        pages,
        from_store: false,
    })
}
