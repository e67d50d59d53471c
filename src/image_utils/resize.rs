use image::RgbImage;
use image::imageops::{self, FilterType};

/// Output `(width, height)` when scaling the shorter edge to `short_edge` while
/// keeping the longer edge at most `max_size`. Sizes are rounded half up.
pub fn shortest_edge_output_size(
    width: u32,
    height: u32,
    short_edge: u32,
    max_size: u32,
) -> (u32, u32) {
    let (w, h) = (f64::from(width), f64::from(height));
    let size = f64::from(short_edge);
    let scale = size / w.min(h);
    let (mut new_w, mut new_h) = if h < w { (scale * w, size) } else { (size, scale * h) };
    let longest = new_w.max(new_h);
    if max_size > 0 && longest > f64::from(max_size) {
        let scale = f64::from(max_size) / longest;
        new_w *= scale;
        new_h *= scale;
    }
    ((new_w + 0.5) as u32, (new_h + 0.5) as u32)
}

/// Resizes an rgb8 image the way the detector's test-time augmentation does.
///
/// `short_edge == 0` disables resizing and returns a copy of the input.
pub fn resize_shortest_edge(image: &RgbImage, short_edge: u32, max_size: u32) -> RgbImage {
    if short_edge == 0 || image.width() == 0 || image.height() == 0 {
        return image.clone();
    }
    let (new_w, new_h) =
        shortest_edge_output_size(image.width(), image.height(), short_edge, max_size);
    if (new_w, new_h) == image.dimensions() {
        return image.clone();
    }
    imageops::resize(image, new_w.max(1), new_h.max(1), FilterType::Triangle)
}
