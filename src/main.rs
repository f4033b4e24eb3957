use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use manga_pages::cache::store::ChapterStore;
use manga_pages::config;
use manga_pages::config::job::JobFile;
use manga_pages::config::merged::MergedConfig;
use manga_pages::pipeline::job_runner::JobConfig;
use manga_pages::pipeline::orchestrator::run_all_jobs;
use manga_pages::pipeline::prefetch::{PrefetchOutcome, open_chapter};
use manga_pages::source::directory::DirectorySource;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: manga_pages [--open <chapter>] <jobs.yaml>...");
        eprintln!("  Split stitched manga chapters into pages as described by job files.");
        eprintln!("  --open <chapter>  process one chapter and prefetch the next one");
        return if args.is_empty() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        eprintln!("manga_pages {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let open = match args.iter().position(|a| a == "--open") {
        Some(i) if i + 1 < args.len() => {
            let chapter = args.remove(i + 1);
            args.remove(i);
            Some(chapter)
        }
        Some(_) => {
            eprintln!("ERROR: --open requires a chapter");
            return ExitCode::FAILURE;
        }
        None => None,
    };
    if args.is_empty() {
        eprintln!("ERROR: no job files given");
        return ExitCode::FAILURE;
    }

    // Collect job configs and their prefetch flags from all job files.
    let mut job_configs: Vec<JobConfig> = Vec::new();
    let mut prefetch_flags: Vec<bool> = Vec::new();

    for job_file_arg in &args {
        let job_file_path = Path::new(job_file_arg);

        // Load settings from the same directory as the job file.
        let settings = match config::load_settings_for_job(job_file_path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("ERROR: Failed to load settings for {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        let yaml_content = match std::fs::read_to_string(job_file_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("ERROR: Failed to read job file {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        let job_file: JobFile = match serde_yml::from_str(&yaml_content) {
            Ok(jf) => jf,
            Err(e) => {
                eprintln!("ERROR: Failed to parse job file {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        // Resolve job file directory for relative paths.
        let job_dir = job_file_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        for job in &job_file.jobs {
            let merged = MergedConfig::new(&settings, job);
            prefetch_flags.push(merged.prefetch_next);

            job_configs.push(JobConfig {
                title: job.title.clone(),
                source_dir: resolve_path(&job_dir, Path::new(&job.source)),
                chapters: job.chapters.clone(),
                library_dir: resolve_path(&job_dir, &merged.library_dir),
                segment: merged.segment,
                parallel_workers: merged.parallel_workers,
            });
        }
    }

    if let Some(chapter) = open {
        return open_in_jobs(&job_configs, &prefetch_flags, &chapter);
    }

    let results = run_all_jobs(&job_configs);

    let mut has_error = false;
    for (i, result) in results.iter().enumerate() {
        match result {
            Ok(job_result) => {
                eprintln!(
                    "OK: {} ({} chapters, {} from store, {} pages)",
                    job_result.title,
                    job_result.chapters_processed,
                    job_result.chapters_from_store,
                    job_result.pages
                );
            }
            Err(e) => {
                eprintln!("ERROR: {}: {e}", job_configs[i].title);
                has_error = true;
            }
        }
    }

    if has_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Open `chapter` of every job, then wait for the next chapters' prefetch.
fn open_in_jobs(job_configs: &[JobConfig], prefetch_flags: &[bool], chapter: &str) -> ExitCode {
    let mut has_error = false;

    for (job, &prefetch_next) in job_configs.iter().zip(prefetch_flags) {
        let source = Arc::new(DirectorySource::new(&job.title, &job.source_dir));
        let store = ChapterStore::new(&job.library_dir);

        let opened = match open_chapter(source, chapter, &store, &job.segment, prefetch_next) {
            Ok(o) => o,
            Err(e) => {
                eprintln!("ERROR: {} chapter {chapter}: {e}", job.title);
                has_error = true;
                continue;
            }
        };
        eprintln!(
            "OK: {} chapter {chapter} ({} pages{})",
            job.title,
            opened.processed.pages.len(),
            if opened.processed.from_store {
                ", from store"
            } else {
                ""
            }
        );

        if let Some(handle) = opened.prefetch {
            match handle.join() {
                Ok(Ok(PrefetchOutcome::AlreadyStored)) => {}
                Ok(Ok(PrefetchOutcome::Processed { pages })) => {
                    eprintln!("OK: {} next chapter prefetched ({pages} pages)", job.title);
                }
                Ok(Err(e)) => {
                    eprintln!("ERROR: {} prefetch: {e}", job.title);
                    has_error = true;
                }
                Err(_) => {
                    eprintln!("ERROR: {} prefetch thread panicked", job.title);
                    has_error = true;
                }
            }
        }
    }

    if has_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Resolve a potentially relative path against a base directory.
/// If the path is already absolute, return it as-is.
fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
