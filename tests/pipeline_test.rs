// Pipeline integration tests: directory source -> stitch -> split -> store

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{Rgb, RgbImage};
use manga_pages::cache::hash::compute_cache_key;
use manga_pages::cache::store::ChapterStore;
use manga_pages::error::MangaPagesError;
use manga_pages::pipeline::chapter_processor::process_chapter;
use manga_pages::pipeline::job_runner::{JobConfig, run_job};
use manga_pages::pipeline::orchestrator::run_all_jobs;
use manga_pages::pipeline::prefetch::{PrefetchOutcome, open_chapter, spawn_prefetch};
use manga_pages::segment::SegmentConfig;
use manga_pages::source::ChapterSource;
use manga_pages::source::directory::DirectorySource;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

fn content(x: u32, y: u32) -> Rgb<u8> {
    Rgb([(x * 37 % 200) as u8 + 30, (y % 200) as u8 + 30, 90])
}

/// Strip of `height` content rows with white rows over `gutter`.
fn strip(height: u32, gutter: std::ops::Range<u32>) -> RgbImage {
    RgbImage::from_fn(120, height, |x, y| {
        if gutter.contains(&y) {
            WHITE
        } else {
            content(x, y)
        }
    })
}

/// Write a chapter as two strips whose seam falls inside a gutter.
///
/// Stitched, the chapter is 1400 rows tall with white rows 690..710, so it
/// splits into two pages.
fn write_chapter(root: &Path, chapter: &str) -> PathBuf {
    let dir = root.join(chapter);
    std::fs::create_dir_all(&dir).expect("create chapter dir");
    strip(700, 690..700)
        .save(dir.join("strip_1.png"))
        .expect("write strip 1");
    strip(700, 0..10)
        .save(dir.join("strip_2.png"))
        .expect("write strip 2");
    dir
}

fn library(root: &Path, chapters: &[&str]) -> DirectorySource {
    let source_dir = root.join("source");
    for chapter in chapters {
        write_chapter(&source_dir, chapter);
    }
    DirectorySource::new("demo", source_dir)
}

// ============================================================
// 1. DirectorySource
// ============================================================

#[test]
fn test_directory_source_chapters_in_natural_order() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let source = library(dir.path(), &["10", "2", "1"]);

    let chapters = source.chapter_list().expect("list chapters");
    assert_eq!(chapters, vec!["1", "2", "10"]);
}

#[test]
fn test_directory_source_navigation() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let source = library(dir.path(), &["1", "2", "3"]);

    assert_eq!(source.next_chapter("1").expect("next"), "2");
    assert_eq!(source.next_chapter("3").expect("next"), "3");
    assert_eq!(source.previous_chapter("2").expect("previous"), "1");
    assert_eq!(source.previous_chapter("1").expect("previous"), "1");

    let err = source.next_chapter("7").unwrap_err();
    assert!(matches!(err, MangaPagesError::SourceError(_)));
}

#[test]
fn test_directory_source_fetches_strips_in_order() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let source = library(dir.path(), &["1"]);

    let locations = source.image_locations("1").expect("locations");
    assert_eq!(locations.len(), 2);
    assert!(locations[0].ends_with("strip_1.png"));
    assert!(locations[1].ends_with("strip_2.png"));

    let strips = source.fetch_all_strips("1").expect("fetch");
    assert_eq!(strips.len(), 2);
    assert_eq!(strips[0].height(), 700);
}

// ============================================================
// 2. Chapter processing
// ============================================================

#[test]
fn test_process_chapter_then_reuse_store() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let source = library(dir.path(), &["1"]);
    let store = ChapterStore::new(dir.path().join("library"));
    let config = SegmentConfig::default();

    let first = process_chapter(&source, "1", &store, &config).expect("first run");
    assert!(!first.from_store);
    assert_eq!(first.chapter, "1");
    assert_eq!(first.pages.len(), 2);
    assert_eq!(first.pages[0].top, 0);
    assert_eq!(first.pages[0].height(), 690);
    assert!(store.contains("demo", "1"));
    assert!(store.is_current("demo", "1", &compute_cache_key(&config)));

    let second = process_chapter(&source, "1", &store, &config).expect("second run");
    assert!(second.from_store);
    assert_eq!(second.pages.len(), first.pages.len());
    for (a, b) in first.pages.iter().zip(&second.pages) {
        assert_eq!(a.index, b.index);
        assert_eq!(a.top, b.top);
        assert_eq!(a.image, b.image);
    }

    let combined = store.load_combined("demo", "1").expect("combined");
    assert_eq!(combined.dimensions(), (120, 1400));
}

#[test]
fn test_process_chapter_recomputes_after_settings_change() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let source = library(dir.path(), &["1"]);
    let store = ChapterStore::new(dir.path().join("library"));

    let config = SegmentConfig::default();
    process_chapter(&source, "1", &store, &config).expect("first run");

    // A minimum page height past the gutter leaves a single page.
    let taller = SegmentConfig {
        min_page_height: 800,
        ..SegmentConfig::default()
    };
    let rerun = process_chapter(&source, "1", &store, &taller).expect("rerun");
    assert!(!rerun.from_store);
    assert_eq!(rerun.pages.len(), 1);
    assert!(store.is_current("demo", "1", &compute_cache_key(&taller)));
    assert!(!store.is_current("demo", "1", &compute_cache_key(&config)));
}

#[test]
fn test_process_empty_chapter_fails() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let source = library(dir.path(), &[]);
    std::fs::create_dir_all(source.root().join("empty")).expect("create empty chapter");
    let store = ChapterStore::new(dir.path().join("library"));

    let err = process_chapter(&source, "empty", &store, &SegmentConfig::default()).unwrap_err();
    assert!(matches!(err, MangaPagesError::StitchError(_)));
    assert!(!store.contains("demo", "empty"));
}

#[test]
fn test_process_missing_chapter_fails() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let source = library(dir.path(), &["1"]);
    let store = ChapterStore::new(dir.path().join("library"));

    let err = process_chapter(&source, "99", &store, &SegmentConfig::default()).unwrap_err();
    assert!(matches!(err, MangaPagesError::SourceError(_)));
}

// ============================================================
// 3. Jobs
// ============================================================

fn job_config(root: &Path, chapters: Option<Vec<String>>) -> JobConfig {
    JobConfig {
        title: "demo".into(),
        source_dir: root.join("source"),
        chapters,
        library_dir: root.join("library"),
        segment: SegmentConfig::default(),
        parallel_workers: 2,
    }
}

#[test]
fn test_run_job_processes_all_chapters() {
    let dir = tempfile::tempdir().expect("create temp dir");
    library(dir.path(), &["1", "2", "3"]);

    let result = run_job(&job_config(dir.path(), None)).expect("run job");
    assert_eq!(result.title, "demo");
    assert_eq!(result.chapters_processed, 3);
    assert_eq!(result.chapters_from_store, 0);
    assert_eq!(result.pages, 6);

    let again = run_job(&job_config(dir.path(), None)).expect("rerun job");
    assert_eq!(again.chapters_from_store, 3);
    assert_eq!(again.pages, 6);
}

#[test]
fn test_run_job_with_chapter_selection() {
    let dir = tempfile::tempdir().expect("create temp dir");
    library(dir.path(), &["1", "2", "3"]);

    let result = run_job(&job_config(dir.path(), Some(vec!["2".into()]))).expect("run job");
    assert_eq!(result.chapters_processed, 1);

    let store = ChapterStore::new(dir.path().join("library"));
    assert!(store.contains("demo", "2"));
    assert!(!store.contains("demo", "1"));
}

#[test]
fn test_run_job_unknown_chapter_fails() {
    let dir = tempfile::tempdir().expect("create temp dir");
    library(dir.path(), &["1"]);

    let err = run_job(&job_config(dir.path(), Some(vec!["5".into()]))).unwrap_err();
    assert!(matches!(err, MangaPagesError::SourceError(_)));
}

#[test]
fn test_run_all_jobs_isolates_failures() {
    let dir = tempfile::tempdir().expect("create temp dir");
    library(dir.path(), &["1"]);

    let good = job_config(dir.path(), None);
    let bad = JobConfig {
        source_dir: dir.path().join("missing"),
        ..job_config(dir.path(), None)
    };

    let results = run_all_jobs(&[bad, good]);
    assert_eq!(results.len(), 2);
    assert!(results[0].is_err());
    assert_eq!(results[1].as_ref().expect("good job").pages, 2);
}

// ============================================================
// 4. Open with prefetch
// ============================================================

#[test]
fn test_open_chapter_prefetches_next() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let source: Arc<dyn ChapterSource> = Arc::new(library(dir.path(), &["1", "2"]));
    let store = ChapterStore::new(dir.path().join("library"));
    let config = SegmentConfig::default();

    let opened = open_chapter(Arc::clone(&source), "1", &store, &config, true).expect("open");
    assert_eq!(opened.processed.pages.len(), 2);

    let handle = opened.prefetch.expect("next chapter should be prefetched");
    let outcome = handle.join().expect("prefetch thread").expect("prefetch");
    assert_eq!(outcome, PrefetchOutcome::Processed { pages: 2 });
    assert!(store.is_current("demo", "2", &compute_cache_key(&config)));

    // Opening the prefetched chapter reads it back from the store.
    let next = open_chapter(source, "2", &store, &config, true).expect("open next");
    assert!(next.processed.from_store);
    assert!(next.prefetch.is_none(), "last chapter has nothing to prefetch");
}

#[test]
fn test_open_chapter_without_prefetch() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let source: Arc<dyn ChapterSource> = Arc::new(library(dir.path(), &["1", "2"]));
    let store = ChapterStore::new(dir.path().join("library"));

    let opened =
        open_chapter(source, "1", &store, &SegmentConfig::default(), false).expect("open");
    assert!(opened.prefetch.is_none());
    assert!(!store.contains("demo", "2"));
}

#[test]
fn test_prefetch_skips_stored_chapter() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let source = Arc::new(library(dir.path(), &["1"]));
    let store = ChapterStore::new(dir.path().join("library"));
    let config = SegmentConfig::default();
    process_chapter(&*source, "1", &store, &config).expect("process");

    let handle = spawn_prefetch(source, store, config, "1".into()).expect("spawn");
    let outcome = handle.join().expect("prefetch thread").expect("prefetch");
    assert_eq!(outcome, PrefetchOutcome::AlreadyStored);
}
