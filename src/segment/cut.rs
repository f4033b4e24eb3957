// Cut finder: locate the next page boundary below a running offset

use image::{Rgb, RgbImage};
use tracing::debug;

use super::SegmentConfig;
use super::probe::{Sample, SampleWindow, line_color, slope_color};

/// Which half of the image a slope heal paints over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HealSide {
    Left,
    Right,
}

/// The three rolling windows scanned in lockstep by [`find_cut`].
struct Probes<'a> {
    image: &'a RgbImage,
    config: &'a SegmentConfig,
    lines: SampleWindow,
    /// Slopes rising toward the left edge (`-offset` left, `+offset` right).
    falling: SampleWindow,
    /// Slopes rising toward the right edge (`+offset` left, `-offset` right).
    rising: SampleWindow,
}

impl<'a> Probes<'a> {
    fn new(image: &'a RgbImage, config: &'a SegmentConfig, y: i64) -> Self {
        let mut probes = Probes {
            image,
            config,
            lines: SampleWindow::with_capacity(config.line_samples),
            falling: SampleWindow::with_capacity(config.slope_samples),
            rising: SampleWindow::with_capacity(config.slope_samples),
        };
        for i in 0..config.line_samples as i64 {
            let sample = probes.line(y + i);
            probes.lines.push(sample);
        }
        for i in 0..config.slope_samples as i64 {
            let (falling, rising) = probes.slopes(y + i);
            probes.falling.push(falling);
            probes.rising.push(rising);
        }
        probes
    }

    fn line(&self, y: i64) -> Sample {
        line_color(self.image, y, self.config)
    }

    fn slopes(&self, y: i64) -> (Sample, Sample) {
        let offset = i64::from(self.config.slope_offset);
        (
            slope_color(self.image, y, -offset, offset, self.config),
            slope_color(self.image, y, offset, -offset, self.config),
        )
    }

    /// Slide every window down so it starts at row `y`.
    fn advance_to(&mut self, y: i64) {
        let sample = self.line(y + self.config.line_samples as i64 - 1);
        self.lines.push(sample);
        let (falling, rising) = self.slopes(y + self.config.slope_samples as i64 - 1);
        self.falling.push(falling);
        self.rising.push(rising);
    }
}

/// Find the next cut boundary at or below `y + min_page_height`.
///
/// Horizontal uniformity wins over either slope direction at the same row.
/// When only a slope run qualifies and `heal_slopes` is set, the half of the
/// image on the low side of the slope is painted with the gap color for
/// `slope_offset` rows starting at the cut. Returns the image height when no
/// boundary exists.
pub fn find_cut(image: &mut RgbImage, y: u32, config: &SegmentConfig) -> u32 {
    let height = image.height();
    let mut y = y.saturating_add(config.min_page_height).min(height);

    let heal = {
        let mut probes = Probes::new(image, config, i64::from(y));
        loop {
            if y >= height {
                break None;
            }
            if probes.lines.uniform_color(config.cut_agreement, config).is_some() {
                debug!(row = y, "horizontal cut");
                break None;
            }
            if let Some(color) = probes.falling.uniform_color(config.cut_agreement, config) {
                debug!(row = y, "slope cut, healing right half");
                break Some((HealSide::Right, color));
            }
            if let Some(color) = probes.rising.uniform_color(config.cut_agreement, config) {
                debug!(row = y, "slope cut, healing left half");
                break Some((HealSide::Left, color));
            }
            y += 1;
            probes.advance_to(i64::from(y));
        }
    };

    if config.heal_slopes
        && let Some((side, color)) = heal
    {
        heal_band(image, y, side, color, config.slope_offset);
    }

    y
}

/// Paint `rows` rows from `top` on one half of the image with `color`.
fn heal_band(image: &mut RgbImage, top: u32, side: HealSide, color: Rgb<u8>, rows: u32) {
    let (width, height) = image.dimensions();
    let columns = match side {
        HealSide::Left => 0..width / 2,
        HealSide::Right => width / 2..width,
    };
    let bottom = top.saturating_add(rows).min(height);
    for y in top..bottom {
        for x in columns.clone() {
            image.put_pixel(x, y, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::pixel::{BLACK, WHITE};
    use crate::segment::probe::slope_row;

    fn striped(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                (x * 37 % 200) as u8 + 30,
                ((x + y) * 11 % 200) as u8 + 30,
                90,
            ])
        })
    }

    fn paint_rows(img: &mut RgbImage, rows: std::ops::Range<u32>, color: Rgb<u8>) {
        for y in rows {
            for x in 0..img.width() {
                img.put_pixel(x, y, color);
            }
        }
    }

    /// Paint a diagonal band made of the slopes centered on rows `rows`.
    fn paint_slopes(
        img: &mut RgbImage,
        rows: std::ops::Range<u32>,
        offset_left: i64,
        offset_right: i64,
        color: Rgb<u8>,
    ) {
        let width = img.width();
        for y in rows {
            for x in 0..width {
                let row = slope_row(i64::from(y), offset_left, offset_right, x, width);
                if row >= 0 && row < i64::from(img.height()) {
                    img.put_pixel(x, row as u32, color);
                }
            }
        }
    }

    #[test]
    fn test_find_cut_horizontal_gap() {
        let mut img = striped(200, 1500);
        paint_rows(&mut img, 1000..1011, WHITE);
        let config = SegmentConfig::default();

        assert_eq!(find_cut(&mut img, 0, &config), 1000);
    }

    #[test]
    fn test_find_cut_ignores_gap_before_minimum_height() {
        let mut img = striped(200, 1500);
        paint_rows(&mut img, 300..320, WHITE);
        paint_rows(&mut img, 900..910, BLACK);
        let config = SegmentConfig::default();

        assert_eq!(find_cut(&mut img, 0, &config), 900);
    }

    #[test]
    fn test_find_cut_without_gap_returns_height() {
        let mut img = striped(200, 1200);
        let config = SegmentConfig::default();

        assert_eq!(find_cut(&mut img, 0, &config), 1200);
        assert_eq!(find_cut(&mut img, 1000, &config), 1200);
    }

    #[test]
    fn test_find_cut_rejects_colored_gap() {
        let mut img = striped(200, 1200);
        paint_rows(&mut img, 600..640, Rgb([200, 30, 30]));
        let config = SegmentConfig::default();

        assert_eq!(find_cut(&mut img, 0, &config), 1200);
    }

    #[test]
    fn test_find_cut_requires_full_line_window() {
        // Four white rows are one short of the confirmation window.
        let mut img = striped(200, 1200);
        paint_rows(&mut img, 600..604, WHITE);
        let config = SegmentConfig::default();

        assert_eq!(find_cut(&mut img, 0, &config), 1200);
    }

    #[test]
    fn test_find_cut_heals_falling_slope() {
        let mut img = striped(200, 1200);
        paint_slopes(&mut img, 600..630, -50, 50, WHITE);
        // A later horizontal gap must not win over the earlier diagonal one.
        paint_rows(&mut img, 900..910, WHITE);
        let config = SegmentConfig::default();

        let cut = find_cut(&mut img, 0, &config);
        assert_eq!(cut, 600);

        for y in 600..650 {
            for x in 100..200 {
                assert_eq!(*img.get_pixel(x, y), WHITE, "pixel ({x}, {y}) not healed");
            }
        }
        // The left half keeps its content.
        assert_ne!(*img.get_pixel(10, 645), WHITE);
    }

    #[test]
    fn test_find_cut_heals_rising_slope() {
        let mut img = striped(200, 1200);
        paint_slopes(&mut img, 700..730, 50, -50, BLACK);
        let config = SegmentConfig::default();

        let cut = find_cut(&mut img, 0, &config);
        assert_eq!(cut, 700);

        for y in 700..750 {
            for x in 0..100 {
                assert_eq!(*img.get_pixel(x, y), BLACK, "pixel ({x}, {y}) not healed");
            }
        }
        assert_ne!(*img.get_pixel(150, 745), BLACK);
    }

    #[test]
    fn test_find_cut_without_healing_leaves_pixels() {
        let mut img = striped(200, 1200);
        paint_slopes(&mut img, 600..630, -50, 50, WHITE);
        let before = img.clone();
        let config = SegmentConfig {
            heal_slopes: false,
            ..SegmentConfig::default()
        };

        assert_eq!(find_cut(&mut img, 0, &config), 600);
        assert_eq!(img, before);
    }

    #[test]
    fn test_find_cut_heal_clamped_at_bottom() {
        let mut img = striped(200, 640);
        paint_slopes(&mut img, 600..640, -50, 50, WHITE);
        let config = SegmentConfig::default();

        assert_eq!(find_cut(&mut img, 0, &config), 600);
        assert_eq!(*img.get_pixel(199, 639), WHITE);
    }
}
