// Background processing of the chapter a reader is likely to open next

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use crate::cache::hash::compute_cache_key;
use crate::cache::store::ChapterStore;
use crate::pipeline::chapter_processor::{ProcessedChapter, process_chapter};
use crate::segment::SegmentConfig;
use crate::source::ChapterSource;

/// What a prefetch run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefetchOutcome {
    /// The store already held the chapter under the current settings.
    AlreadyStored,
    /// The chapter was segmented and stored with this many pages.
    Processed { pages: usize },
}

/// A chapter opened for reading, plus the handle of its neighbour's prefetch.
pub struct OpenedChapter {
    pub processed: ProcessedChapter,
    /// `None` when the chapter is the last one or prefetching is disabled.
    pub prefetch: Option<JoinHandle<crate::error::Result<PrefetchOutcome>>>,
}

/// Process `chapter` on a background thread.
///
/// The result only reaches the rest of the program through the store.
/// Dropping the handle detaches the thread; it is not cancellable.
pub fn spawn_prefetch(
    source: Arc<dyn ChapterSource>,
    store: ChapterStore,
    config: SegmentConfig,
    chapter: String,
) -> crate::error::Result<JoinHandle<crate::error::Result<PrefetchOutcome>>> {
    let handle = thread::Builder::new()
        .name(format!("prefetch-{chapter}"))
        .spawn(move || {
            let title = source.title();
            if store.is_current(title, &chapter, &compute_cache_key(&config)) {
                return Ok(PrefetchOutcome::AlreadyStored);
            }

            info!(title = %title, chapter = %chapter, "prefetching chapter");
            match process_chapter(source.as_ref(), &chapter, &store, &config) {
                Ok(processed) => Ok(PrefetchOutcome::Processed {
                    pages: processed.pages.len(),
                }),
                Err(e) => {
                    warn!(title = %title, chapter = %chapter, "prefetch failed: {e}");
                    Err(e)
                }
            }
        })?;
    Ok(handle)
}

/// Open `chapter` for reading.
///
/// The chapter is processed on the calling thread; afterwards the next
/// chapter is prefetched in the background when `prefetch_next` is set.
pub fn open_chapter(
    source: Arc<dyn ChapterSource>,
    chapter: &str,
    store: &ChapterStore,
    config: &SegmentConfig,
    prefetch_next: bool,
) -> crate::error::Result<OpenedChapter> {
    let processed = process_chapter(source.as_ref(), chapter, store, config)?;

    let mut prefetch = None;
    if prefetch_next {
        let next = source.next_chapter(chapter)?;
        if next != chapter {
            prefetch = Some(spawn_prefetch(
                Arc::clone(&source),
                store.clone(),
                config.clone(),
                next,
            )?);
        }
    }

    Ok(OpenedChapter {
        processed,
        prefetch,
    })
}
