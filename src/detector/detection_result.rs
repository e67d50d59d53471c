use crate::annotations::bounding_box::{BoundingBox, BoundingBoxGeometry};
use crate::annotations::detection::Detection;
use itertools::{Itertools, izip};
use serde::Serialize;
use std::collections::HashSet;

/// Boxes, labels and confidences of one image, as three parallel sequences.
///
/// Element `i` of each sequence describes the same object. Ordering matches the raw
/// model output; it is not sorted by confidence or position.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DetectionResult {
    boxes: Vec<[f64; 4]>,
    classes: Vec<String>,
    confidences: Vec<f64>,
}

impl DetectionResult {
    pub fn from_detections(detections: Vec<Detection<BoundingBox>>) -> Self {
        let (boxes, classes, confidences) = detections
            .into_iter()
            .map(|det| {
                (
                    det.annotation.as_xywh(),
                    det.annotation.into_category(),
                    det.confidence,
                )
            })
            .multiunzip();
        Self {
            boxes,
            classes,
            confidences,
        }
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// `(x, y, width, height)` per detection.
    pub fn boxes(&self) -> &[[f64; 4]] {
        &self.boxes
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn confidences(&self) -> &[f64] {
        &self.confidences
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[f64; 4], &str, f64)> {
        izip!(&self.boxes, &self.classes, &self.confidences)
            .map(|(bbox, class, &confidence)| (bbox, class.as_str(), confidence))
    }

    /// Keeps only detections whose class is in `keep`, preserving order.
    pub fn retain_classes(self, keep: &HashSet<String>) -> Self {
        let (boxes, classes, confidences) = izip!(self.boxes, self.classes, self.confidences)
            .filter(|(_, class, _)| keep.contains(class))
            .multiunzip();
        Self {
            boxes,
            classes,
            confidences,
        }
    }

    pub fn into_parts(self) -> (Vec<[f64; 4]>, Vec<String>, Vec<f64>) {
        (self.boxes, self.classes, self.confidences)
    }
}
