// Chapter sources: where a title's chapter list and strip images come from

pub mod directory;

use image::DynamicImage;

use crate::error::MangaPagesError;

/// A title whose chapters can be listed and whose strips can be fetched.
///
/// Implementations only locate and decode strips; segmentation and storage
/// happen in the pipeline.
pub trait ChapterSource: Send + Sync {
    /// Display title, also used as the title's directory name in the store.
    fn title(&self) -> &str;

    /// All chapters in reading order.
    fn chapter_list(&self) -> crate::error::Result<Vec<String>>;

    /// Locations of a chapter's strips, top to bottom.
    fn image_locations(&self, chapter: &str) -> crate::error::Result<Vec<String>>;

    /// Fetch and decode one strip.
    fn fetch_strip(&self, location: &str) -> crate::error::Result<DynamicImage>;

    fn fetch_all_strips(&self, chapter: &str) -> crate::error::Result<Vec<DynamicImage>> {
        self.image_locations(chapter)?
            .iter()
            .map(|location| self.fetch_strip(location))
            .collect()
    }

    /// Chapter after `chapter`; the last chapter maps to itself.
    fn next_chapter(&self, chapter: &str) -> crate::error::Result<String> {
        let chapters = self.chapter_list()?;
        let index = chapter_position(&chapters, chapter)?;
        Ok(chapters
            .get(index + 1)
            .cloned()
            .unwrap_or_else(|| chapter.to_string()))
    }

    /// Chapter before `chapter`; the first chapter maps to itself.
    fn previous_chapter(&self, chapter: &str) -> crate::error::Result<String> {
        let chapters = self.chapter_list()?;
        let index = chapter_position(&chapters, chapter)?;
        Ok(index
            .checked_sub(1)
            .map(|i| chapters[i].clone())
            .unwrap_or_else(|| chapter.to_string()))
    }
}

fn chapter_position(chapters: &[String], chapter: &str) -> crate::error::Result<usize> {
    chapters
        .iter()
        .position(|c| c == chapter)
        .ok_or_else(|| MangaPagesError::chapter_source(format!("unknown chapter '{chapter}'")))
}
