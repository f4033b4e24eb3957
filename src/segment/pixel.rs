// Pixel sampling and color classification

use image::{GenericImageView, Rgb};

pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Color at `(x, y)`, or `None` outside the image.
///
/// Coordinates are signed because slope probes routinely step above the
/// first row or past the last one.
pub fn color_at<I>(image: &I, x: i64, y: i64) -> Option<Rgb<u8>>
where
    I: GenericImageView<Pixel = Rgb<u8>>,
{
    let (width, height) = image.dimensions();
    if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
        return None;
    }
    Some(image.get_pixel(x as u32, y as u32))
}

/// True when both colors exist and every channel differs by less than `threshold`.
pub fn similar(a: Option<Rgb<u8>>, b: Option<Rgb<u8>>, threshold: u8) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a
            .0
            .iter()
            .zip(b.0.iter())
            .all(|(&p, &q)| p.abs_diff(q) < threshold),
        _ => false,
    }
}

pub fn is_black_or_white(color: Option<Rgb<u8>>, threshold: u8) -> bool {
    similar(color, Some(BLACK), threshold) || similar(color, Some(WHITE), threshold)
}
