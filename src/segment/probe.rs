// Line probes: classify a horizontal or sloped row as uniform background

use image::{GenericImageView, Rgb};

use super::SegmentConfig;
use super::pixel::{color_at, is_black_or_white, similar};

/// Outcome of probing one line: its color if uniform, `None` otherwise.
pub type Sample = Option<Rgb<u8>>;

/// Representative color of row `y`, or `None` if the row is not uniform.
///
/// The pixel at the horizontal midpoint is the reference; the row stays
/// uniform while at most `max_dissimilar_pixels` pixels differ from it.
pub fn line_color<I>(image: &I, y: i64, config: &SegmentConfig) -> Sample
where
    I: GenericImageView<Pixel = Rgb<u8>>,
{
    let (width, height) = image.dimensions();
    if y < 0 || y >= i64::from(height) {
        return None;
    }

    let reference = color_at(image, i64::from(width / 2), y)?;
    let row = y as u32;

    let mut dissimilar = 0;
    for x in 0..width {
        if !similar(
            Some(image.get_pixel(x, row)),
            Some(reference),
            config.similarity_threshold,
        ) {
            dissimilar += 1;
            if dissimilar > config.max_dissimilar_pixels {
                return None;
            }
        }
    }

    Some(reference)
}

/// Row visited at column `x` by a slope running from `y + offset_left` on the
/// left edge to `y + offset_right` on the right edge.
pub(crate) fn slope_row(y: i64, offset_left: i64, offset_right: i64, x: u32, width: u32) -> i64 {
    let start = (y + offset_left) as f64;
    let end = (y + offset_right) as f64;
    let t = f64::from(x) / f64::from(width);
    ((1.0 - t) * start + t * end) as i64
}

/// Like [`line_color`] but along a diagonal centered on row `y`.
///
/// Pixels of the diagonal that fall outside the image are skipped. The
/// reference pixel is the diagonal's midpoint; if that lies outside the
/// image the slope is non-uniform.
pub fn slope_color<I>(
    image: &I,
    y: i64,
    offset_left: i64,
    offset_right: i64,
    config: &SegmentConfig,
) -> Sample
where
    I: GenericImageView<Pixel = Rgb<u8>>,
{
    let (width, height) = image.dimensions();
    if y < 0 || y >= i64::from(height) {
        return None;
    }

    let mid = (2 * y + offset_left + offset_right).div_euclid(2);
    let reference = color_at(image, i64::from(width / 2), mid)?;

    let mut dissimilar = 0;
    for x in 0..width {
        let row = slope_row(y, offset_left, offset_right, x, width);
        if row < 0 || row >= i64::from(height) {
            continue;
        }
        if !similar(
            Some(image.get_pixel(x, row as u32)),
            Some(reference),
            config.similarity_threshold,
        ) {
            dissimilar += 1;
            if dissimilar > config.max_dissimilar_pixels {
                return None;
            }
        }
    }

    Some(reference)
}

/// Background color shared by at least `agreement` of `samples`.
///
/// Every member of the group must itself be black or white, so a run of
/// uniformly colored but meaningful artwork never qualifies, even next to a
/// background row it is similar to.
fn dominant_background<S>(
    samples: S,
    len: usize,
    agreement: f64,
    config: &SegmentConfig,
) -> Option<Rgb<u8>>
where
    S: Iterator<Item = Sample> + Clone,
{
    if len == 0 {
        return None;
    }

    let mut best: Option<(Rgb<u8>, usize)> = None;
    for candidate in samples.clone().flatten() {
        if !is_black_or_white(Some(candidate), config.black_white_threshold) {
            continue;
        }
        let count = samples
            .clone()
            .filter(|s| {
                is_black_or_white(*s, config.black_white_threshold)
                    && similar(*s, Some(candidate), config.similarity_threshold)
            })
            .count();
        if best.is_none_or(|(_, n)| count > n) {
            best = Some((candidate, count));
        }
    }

    let (color, count) = best?;
    (count as f64 >= agreement * len as f64).then_some(color)
}

/// True when at least `agreement` of `lines` are mutually similar background.
pub fn are_lines_uniform(lines: &[Sample], agreement: f64, config: &SegmentConfig) -> bool {
    dominant_background(lines.iter().copied(), lines.len(), agreement, config).is_some()
}

/// Fixed-capacity ring of recent line samples.
///
/// Sliding the window by one row overwrites the oldest slot in place.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    slots: Box<[Sample]>,
    start: usize,
    len: usize,
}

impl SampleWindow {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(1)].into_boxed_slice(),
            start: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append a sample, dropping the oldest one when the window is full.
    pub fn push(&mut self, sample: Sample) {
        let capacity = self.capacity();
        if self.len == capacity {
            self.slots[self.start] = sample;
            self.start = (self.start + 1) % capacity;
        } else {
            self.slots[(self.start + self.len) % capacity] = sample;
            self.len += 1;
        }
    }

    pub fn pop_front(&mut self) -> Option<Sample> {
        if self.len == 0 {
            return None;
        }
        let sample = self.slots[self.start];
        self.start = (self.start + 1) % self.capacity();
        self.len -= 1;
        Some(sample)
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = Sample> + Clone + '_ {
        let capacity = self.capacity();
        (0..self.len).map(move |i| self.slots[(self.start + i) % capacity])
    }

    /// Background color shared by at least `agreement` of the window.
    pub fn uniform_color(&self, agreement: f64, config: &SegmentConfig) -> Option<Rgb<u8>> {
        dominant_background(self.iter(), self.len, agreement, config)
    }
}
