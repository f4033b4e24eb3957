// Page segmentation: stitched chapter raster -> ordered, trimmed pages

pub mod cut;
pub mod pixel;
pub mod probe;
pub mod splitter;
pub mod trim;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::MangaPagesError;

/// Tunable parameters of the segmentation engine.
///
/// Defaults match the values the engine was tuned with on long-strip
/// manhwa scans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Rows skipped past the previous cut before a new cut may be placed.
    pub min_page_height: u32,
    /// Per-channel difference below which two pixels count as the same color.
    pub similarity_threshold: u8,
    /// Per-channel distance from pure black/white still treated as background.
    pub black_white_threshold: u8,
    /// Dissimilar pixels tolerated on a probed line before it is non-uniform.
    pub max_dissimilar_pixels: u32,
    /// Consecutive horizontal lines that must agree before cutting.
    pub line_samples: usize,
    /// Consecutive slope lines that must agree before healing a diagonal gap.
    pub slope_samples: usize,
    /// Vertical offset of either end of a slope probe from its center row.
    pub slope_offset: u32,
    /// Pages shorter than this after trimming are discarded.
    pub min_output_height: u32,
    /// Fraction of a window that must agree for a cut.
    pub cut_agreement: f64,
    /// Fraction of a window that must agree for an edge row to be trimmed.
    pub trim_agreement: f64,
    /// Paint detected diagonal gaps with their background color.
    pub heal_slopes: bool,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        SegmentConfig {
            min_page_height: 400,
            similarity_threshold: 5,
            black_white_threshold: 20,
            max_dissimilar_pixels: 5,
            line_samples: 5,
            slope_samples: 20,
            slope_offset: 50,
            min_output_height: 10,
            cut_agreement: 1.0,
            trim_agreement: 0.5,
            heal_slopes: true,
        }
    }
}

impl SegmentConfig {
    /// Reject parameter sets the scanner cannot run with.
    ///
    /// `min_page_height` must be positive so every cut advances the cursor,
    /// and `min_output_height` positive so no empty page is ever emitted.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.min_page_height == 0 {
            return Err(MangaPagesError::segmentation(
                "min_page_height must be at least 1",
            ));
        }
        if self.min_output_height == 0 {
            return Err(MangaPagesError::segmentation(
                "min_output_height must be at least 1",
            ));
        }
        if self.line_samples == 0 || self.slope_samples == 0 {
            return Err(MangaPagesError::segmentation(format!(
                "sample windows must be non-empty (line_samples={}, slope_samples={})",
                self.line_samples, self.slope_samples
            )));
        }
        for (name, value) in [
            ("cut_agreement", self.cut_agreement),
            ("trim_agreement", self.trim_agreement),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(MangaPagesError::segmentation(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// One segmented page.
#[derive(Debug, Clone)]
pub struct Page {
    /// Position of the page within its chapter.
    pub index: usize,
    /// Row of the stitched image the page's first row came from.
    pub top: u32,
    pub image: RgbImage,
}

impl Page {
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

pub use splitter::split_image_into_pages;
