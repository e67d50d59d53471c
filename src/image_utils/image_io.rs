use image::{ImageResult, RgbImage};
use std::path::Path;

pub fn read_image_as_rgb8(filepath: &Path) -> ImageResult<RgbImage> {
    Ok(image::open(filepath)?.into_rgb8())
}
