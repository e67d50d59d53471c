use image::RgbImage;
use ndarray::Array4;
use serde::Deserialize;

/// Channel order the network expects its input planes in.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
pub enum ChannelOrder {
    #[default]
    #[serde(rename = "BGR")]
    Bgr,
    #[serde(rename = "RGB")]
    Rgb,
}

/// Lays an rgb8 image out as a `(1, 3, height, width)` array.
///
/// Pixel values stay in `0..=255`; mean/std normalization is part of the exported
/// network, not of this conversion.
pub fn convert_rgb_image_to_owned_array(rgb_image: &RgbImage, order: ChannelOrder) -> Array4<f32> {
    let height = rgb_image.height() as usize;
    let width = rgb_image.width() as usize;
    let mut image_array = Array4::zeros((1, 3, height, width));
    for (x, y, pixel) in rgb_image.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        let [r, g, b] = pixel.0;
        let planes = match order {
            ChannelOrder::Rgb => [r, g, b],
            ChannelOrder::Bgr => [b, g, r],
        };
        for (channel, value) in planes.into_iter().enumerate() {
            image_array[[0, channel, y, x]] = f32::from(value);
        }
    }
    image_array
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn two_by_one() -> RgbImage {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([255, 10, 0]));
        img.put_pixel(1, 0, Rgb([1, 2, 3]));
        img
    }

    #[test]
    fn shape_is_batch_channel_row_column() {
        let arr = convert_rgb_image_to_owned_array(&RgbImage::new(5, 3), ChannelOrder::Rgb);
        assert_eq!(arr.shape(), &[1, 3, 3, 5]);
    }

    #[test]
    fn rgb_order_keeps_planes() {
        let arr = convert_rgb_image_to_owned_array(&two_by_one(), ChannelOrder::Rgb);
        assert_eq!(
            (arr[[0, 0, 0, 0]], arr[[0, 1, 0, 0]], arr[[0, 2, 0, 0]]),
            (255.0, 10.0, 0.0)
        );
        assert_eq!(
            (arr[[0, 0, 0, 1]], arr[[0, 1, 0, 1]], arr[[0, 2, 0, 1]]),
            (1.0, 2.0, 3.0)
        );
    }

    #[test]
    fn bgr_order_puts_blue_first() {
        let arr = convert_rgb_image_to_owned_array(&two_by_one(), ChannelOrder::Bgr);
        assert_eq!(
            (arr[[0, 0, 0, 0]], arr[[0, 1, 0, 0]], arr[[0, 2, 0, 0]]),
            (0.0, 10.0, 255.0)
        );
        assert_eq!(
            (arr[[0, 0, 0, 1]], arr[[0, 1, 0, 1]], arr[[0, 2, 0, 1]]),
            (3.0, 2.0, 1.0)
        );
    }
}
