//! Object detection behind a small, typed adaptation layer.
//!
//! [`DetectionConfig`] is read from the environment once, [`Detector`] wraps the
//! pretrained model, and every call to [`Detector::detect`] returns boxes, labels and
//! confidences as three parallel sequences.

pub mod annotations;
pub mod config;
pub mod detector;
pub mod error;
pub mod image_utils;
pub mod object_detection;

pub use config::DetectionConfig;
pub use detector::{DetectionResult, Detector};
pub use error::{ConfigurationError, DetectError, InferenceError, ModelError};
pub use object_detection::device::Device;
pub use object_detection::object_detection_model::{ObjectDetectionModel, RawInstances};
