use crate::annotations::bounding_box::InvalidBoxError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Raised while reading the detector configuration at startup.
///
/// Every variant is fatal: the process must not go on to serve detections with a
/// partially parsed configuration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("environment variable {name} is not set")]
    MissingVariable { name: &'static str },
    #[error("environment variable {name} is not valid unicode")]
    NotUnicode { name: &'static str },
    #[error("{name} must be the literal `True` or `False`, got {value:?}")]
    InvalidBool { name: &'static str, value: String },
    #[error("{name} must be a number, got {value:?}")]
    InvalidFloat { name: &'static str, value: String },
    #[error("{name} must be a non-negative integer, got {value:?}")]
    InvalidInteger { name: &'static str, value: String },
    #[error("{name} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },
    #[error("failed to read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Raised while building the model handle.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model config {}: {source}", .path.display())]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid model config {}: {source}", .path.display())]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("weights file not found: {}", .0.display())]
    MissingWeights(PathBuf),
    #[error("failed to build inference session: {0}")]
    Session(String),
}

/// Raised when a single forward pass fails. The model handle stays usable.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference failed: {0}")]
    Runtime(String),
    #[error("model produced no output named {0:?}")]
    MissingOutput(String),
    #[error("output {name:?} has unexpected shape {shape:?}")]
    UnexpectedShape { name: String, shape: Vec<usize> },
    #[error("output lengths disagree: {boxes} boxes, {scores} scores, {classes} classes")]
    LengthMismatch {
        boxes: usize,
        scores: usize,
        classes: usize,
    },
}

/// Errors returned by a single `detect` call.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("class id {class_id} is outside the {num_labels} known labels")]
    UnknownClassId { class_id: i64, num_labels: usize },
    #[error(transparent)]
    InvalidBox(#[from] InvalidBoxError),
}
