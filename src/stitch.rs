// Strip stitching: a chapter's strip images -> one tall RGB raster

use image::{DynamicImage, RgbImage, imageops};

use crate::error::MangaPagesError;

/// Concatenate `strips` top to bottom into a single RGB image.
///
/// The canvas takes the width of the first strip; wider strips are clipped
/// on the right and narrower ones leave black columns.
pub fn stitch_strips(strips: &[DynamicImage]) -> crate::error::Result<RgbImage> {
    let first = strips
        .first()
        .ok_or_else(|| MangaPagesError::stitch("no strips to stitch"))?;
    let width = first.width();

    let total_height = strips
        .iter()
        .try_fold(0u32, |acc, strip| acc.checked_add(strip.height()))
        .ok_or_else(|| {
            MangaPagesError::stitch(format!(
                "stitched height of {} strips overflows",
                strips.len()
            ))
        })?;

    let mut canvas = RgbImage::new(width, total_height);
    let mut y = 0i64;
    for strip in strips {
        imageops::replace(&mut canvas, &strip.to_rgb8(), 0, y);
        y += i64::from(strip.height());
    }

    Ok(canvas)
}
