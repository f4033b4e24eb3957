use std::path::PathBuf;

use super::job::Job;
use super::settings::Settings;
use crate::segment::SegmentConfig;

#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub segment: SegmentConfig,
    pub library_dir: PathBuf,
    pub parallel_workers: usize,
    pub prefetch_next: bool,
}

impl MergedConfig {
    /// JobのOption値がSomeならJobの値を、NoneならSettingsの値を使用する。
    pub fn new(settings: &Settings, job: &Job) -> Self {
        let mut segment = settings.segment.clone();
        segment.min_page_height = job.min_page_height.unwrap_or(segment.min_page_height);
        segment.slope_offset = job.slope_offset.unwrap_or(segment.slope_offset);
        segment.heal_slopes = job.heal_slopes.unwrap_or(segment.heal_slopes);

        MergedConfig {
            segment,
            library_dir: job
                .library_dir
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or_else(|| settings.library_dir.clone()),
            parallel_workers: settings.parallel_workers,
            prefetch_next: settings.prefetch_next,
        }
    }
}
