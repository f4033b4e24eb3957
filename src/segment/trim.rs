// Page trimmer: strip background padding from the top and bottom of a page

use image::{GenericImageView, Rgb, RgbImage, imageops};

use super::SegmentConfig;
use super::probe::{SampleWindow, line_color};

/// Direction a trim scan walks in.
#[derive(Debug, Clone, Copy)]
enum Edge {
    Top,
    Bottom,
}

/// Number of background rows at one edge of `page`.
///
/// A window of `line_samples` rows slides inward from the edge; each step in
/// which at least `trim_agreement` of the window is shared background marks
/// the edge row as removable. The window only covers rows inside the page,
/// so a page made entirely of background trims down to nothing.
fn edge_rows<I>(page: &I, edge: Edge, config: &SegmentConfig) -> u32
where
    I: GenericImageView<Pixel = Rgb<u8>>,
{
    let height = page.height();
    let row_at = |depth: u32| -> i64 {
        match edge {
            Edge::Top => i64::from(depth),
            Edge::Bottom => i64::from(height) - 1 - i64::from(depth),
        }
    };

    let mut window = SampleWindow::with_capacity(config.line_samples);
    let initial = (config.line_samples as u32).min(height);
    for depth in 0..initial {
        window.push(line_color(page, row_at(depth), config));
    }

    let mut removed = 0;
    while removed < height {
        if window.uniform_color(config.trim_agreement, config).is_none() {
            break;
        }
        removed += 1;
        window.pop_front();
        let next = removed + config.line_samples as u32 - 1;
        if next < height {
            window.push(line_color(page, row_at(next), config));
        }
    }
    removed
}

/// Number of leading background rows of `page`.
pub fn leading_whitespace_rows<I>(page: &I, config: &SegmentConfig) -> u32
where
    I: GenericImageView<Pixel = Rgb<u8>>,
{
    edge_rows(page, Edge::Top, config)
}

/// Number of trailing background rows of `page`.
pub fn trailing_whitespace_rows<I>(page: &I, config: &SegmentConfig) -> u32
where
    I: GenericImageView<Pixel = Rgb<u8>>,
{
    edge_rows(page, Edge::Bottom, config)
}

pub fn remove_leading_whitespace(page: &RgbImage, config: &SegmentConfig) -> RgbImage {
    let rows = leading_whitespace_rows(page, config);
    imageops::crop_imm(page, 0, rows, page.width(), page.height() - rows).to_image()
}

pub fn remove_trailing_whitespace(page: &RgbImage, config: &SegmentConfig) -> RgbImage {
    let rows = trailing_whitespace_rows(page, config);
    imageops::crop_imm(page, 0, 0, page.width(), page.height() - rows).to_image()
}
