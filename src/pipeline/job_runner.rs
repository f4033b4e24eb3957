// ジョブ単位: チャプター一覧 -> 並列チャプター処理 -> 集計

use std::path::PathBuf;

use rayon::prelude::*;
use tracing::error;

use crate::cache::store::ChapterStore;
use crate::error::MangaPagesError;
use crate::pipeline::chapter_processor::{ProcessedChapter, process_chapter};
use crate::segment::SegmentConfig;
use crate::source::ChapterSource;
use crate::source::directory::DirectorySource;

/// Configuration for a single job.
pub struct JobConfig {
    pub title: String,
    pub source_dir: PathBuf,
    /// Chapters to process; all chapters of the source when `None`.
    pub chapters: Option<Vec<String>>,
    pub library_dir: PathBuf,
    pub segment: SegmentConfig,
    /// Worker threads for chapter processing; 0 uses rayon's default.
    pub parallel_workers: usize,
}

/// Result of processing a single job.
#[derive(Debug)]
pub struct JobResult {
    pub title: String,
    pub chapters_processed: usize,
    pub chapters_from_store: usize,
    pub pages: usize,
}

/// Resolve the job's chapter selection against the source's chapter list.
fn select_chapters(
    source: &DirectorySource,
    selection: Option<&[String]>,
) -> crate::error::Result<Vec<String>> {
    let available = source.chapter_list()?;
    let Some(selection) = selection else {
        return Ok(available);
    };

    for chapter in selection {
        if !available.contains(chapter) {
            return Err(MangaPagesError::chapter_source(format!(
                "chapter '{chapter}' not found in {}",
                source.root().display()
            )));
        }
    }
    Ok(selection.to_vec())
}

/// Run a single job: every selected chapter is processed in parallel.
///
/// All chapters run even if some fail; the first failure is then returned.
pub fn run_job(config: &JobConfig) -> crate::error::Result<JobResult> {
    config.segment.validate()?;

    let source = DirectorySource::new(&config.title, &config.source_dir);
    let store = ChapterStore::new(&config.library_dir);
    let chapters = select_chapters(&source, config.chapters.as_deref())?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.parallel_workers)
        .build()
        .map_err(|e| MangaPagesError::config(format!("failed to build worker pool: {e}")))?;

    let results: Vec<crate::error::Result<ProcessedChapter>> = pool.install(|| {
        chapters
            .par_iter()
            .map(|chapter| process_chapter(&source, chapter, &store, &config.segment))
            .collect()
    });

    let mut processed = Vec::with_capacity(results.len());
    let mut first_error = None;
    for (chapter, result) in chapters.iter().zip(results) {
        match result {
            Ok(p) => processed.push(p),
            Err(e) => {
                error!(title = %config.title, chapter = %chapter, "chapter failed: {e}");
                first_error.get_or_insert(e);
            }
        }
    }
    if let Some(e) = first_error {
        return Err(e);
    }

    Ok(JobResult {
        title: config.title.clone(),
        chapters_processed: processed.len(),
        chapters_from_store: processed.iter().filter(|p| p.from_store).count(),
        pages: processed.iter().map(|p| p.pages.len()).sum(),
    })
}
