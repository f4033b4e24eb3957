// Segmenter: drive cut finding and trimming over a whole stitched chapter

use image::{RgbImage, imageops};
use tracing::debug;

use super::cut::find_cut;
use super::trim::{remove_leading_whitespace, remove_trailing_whitespace};
use super::{Page, SegmentConfig};

/// Band `[top, bottom)` of the stitched image between two consecutive cuts.
#[derive(Debug, Clone)]
pub struct Slab {
    pub top: u32,
    pub bottom: u32,
    /// Source row of the first kept row and the trimmed pixels, or `None`
    /// when trimming left fewer than `min_output_height` rows.
    pub content: Option<(u32, RgbImage)>,
}

/// Iterator over the slabs of a stitched image, top to bottom.
///
/// Slope healing paints into the borrowed image as cuts are found, so the
/// iterator holds it mutably until it is exhausted.
pub struct Slabs<'a> {
    image: &'a mut RgbImage,
    config: &'a SegmentConfig,
    cursor: u32,
}

/// Start slicing `image` into slabs.
pub fn slabs<'a>(
    image: &'a mut RgbImage,
    config: &'a SegmentConfig,
) -> crate::error::Result<Slabs<'a>> {
    config.validate()?;
    Ok(Slabs {
        image,
        config,
        cursor: 0,
    })
}

impl Iterator for Slabs<'_> {
    type Item = Slab;

    fn next(&mut self) -> Option<Slab> {
        let (width, height) = self.image.dimensions();
        if self.cursor >= height {
            return None;
        }

        let top = self.cursor;
        let bottom = find_cut(self.image, top, self.config);
        self.cursor = bottom;

        let slab = imageops::crop_imm(&*self.image, 0, top, width, bottom - top).to_image();
        let leading = remove_leading_whitespace(&slab, self.config);
        let source_top = top + (slab.height() - leading.height());
        let trimmed = remove_trailing_whitespace(&leading, self.config);

        let content = if trimmed.height() >= self.config.min_output_height {
            Some((source_top, trimmed))
        } else {
            debug!(top, bottom, "discarding sliver");
            None
        };

        Some(Slab {
            top,
            bottom,
            content,
        })
    }
}

/// Split a stitched chapter into its ordered pages.
///
/// Pages are numbered in the order their cuts were found, which is also
/// the order of their source rows.
pub fn split_image_into_pages(
    image: &mut RgbImage,
    config: &SegmentConfig,
) -> crate::error::Result<Vec<Page>> {
    let pages = slabs(image, config)?
        .filter_map(|slab| slab.content)
        .enumerate()
        .map(|(index, (top, image))| Page { index, top, image })
        .collect();
    Ok(pages)
}
