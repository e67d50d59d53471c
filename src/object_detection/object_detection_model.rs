use crate::error::InferenceError;
use crate::object_detection::device::Device;
use image::RgbImage;

/// Final instances emitted by a detection network, in the network's own order.
///
/// The three vectors are parallel: index `i` in each describes the same object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawInstances {
    /// `[x1, y1, x2, y2]` in pixels of the image passed to the model.
    pub boxes: Vec<[f32; 4]>,
    pub scores: Vec<f32>,
    pub class_ids: Vec<i64>,
}

impl RawInstances {
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Defines a trait that all object detection models must follow.
///
/// Implementations own whatever pre- and post-processing their network needs and
/// apply their own score cutoff; callers only see final instances.
pub trait ObjectDetectionModel {
    /// Where the model runs. Fixed for the lifetime of the handle.
    fn device(&self) -> Device;

    /// Runs exactly one forward pass over `image`.
    fn run_inference(&mut self, image: &RgbImage) -> Result<RawInstances, InferenceError>;
}
