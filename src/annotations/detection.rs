use crate::annotations::bounding_box::BoundingBoxGeometry;

/// A detection is what is produced as output from an object detection model.
///
/// A detection is any annotation combined with a confidence score: a probability value that
/// encodes the model's belief that the detection is true.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection<T: BoundingBoxGeometry> {
    pub annotation: T,
    pub confidence: f64,
}

/// Rounds a model score to three decimal places, ties to even.
///
/// An `f32` times 1000 is exact in `f64`, so a tie here is a true decimal tie.
pub fn round_confidence(score: f32) -> f64 {
    (f64::from(score) * 1000.0).round_ties_even() / 1000.0
}
