use crate::config::DetectionConfig;
use crate::error::{InferenceError, ModelError};
use crate::image_utils::image_conversion::convert_rgb_image_to_owned_array;
use crate::image_utils::resize::resize_shortest_edge;
use crate::object_detection::device::Device;
use crate::object_detection::model_config::ModelConfig;
use crate::object_detection::object_detection_model::{ObjectDetectionModel, RawInstances};
use crate::object_detection::ort_inference_session::OrtInferenceSession;
use image::RgbImage;
use ort::inputs;
use ort::session::SessionOutputs;
use ort::value::{DynValue, TensorRef};
use std::path::Path;
use tracing::{debug, info, warn};

/// Runs an exported two-stage detector end to end on a single image.
///
/// The exported graph performs region proposal, box regression and NMS itself and
/// returns final instances. This wrapper does what the training framework's default
/// predictor does around it: shortest-edge resize, channel reordering, the test-time
/// score cutoff, and mapping boxes back onto the caller's image.
pub struct OnnxPredictor {
    ort_session: OrtInferenceSession,
    model_config: ModelConfig,
    score_threshold: f32,
    num_classes: usize,
}

impl OnnxPredictor {
    /// Loads the model config and weights named by `config` onto `device`.
    pub fn from_config(config: &DetectionConfig, device: Device) -> Result<Self, ModelError> {
        let model_config = ModelConfig::from_file(config.model_config_path())?;
        Self::new(
            model_config,
            config.model_weights_path(),
            config.confidence_threshold(),
            config.num_classes(),
            device,
        )
    }

    pub fn new(
        model_config: ModelConfig,
        weights_path: &Path,
        score_threshold: f32,
        num_classes: usize,
        device: Device,
    ) -> Result<Self, ModelError> {
        let ort_session = OrtInferenceSession::new(weights_path, device)?;
        info!(
            weights = %weights_path.display(),
            %device,
            score_threshold,
            num_classes,
            "loaded detection model"
        );
        Ok(Self {
            ort_session,
            model_config,
            score_threshold,
            num_classes,
        })
    }
}

impl ObjectDetectionModel for OnnxPredictor {
    fn device(&self) -> Device {
        self.ort_session.device()
    }

    fn run_inference(&mut self, image: &RgbImage) -> Result<RawInstances, InferenceError> {
        let config = &self.model_config;
        let resized = resize_shortest_edge(image, config.min_size_test, config.max_size_test);
        let input_array = convert_rgb_image_to_owned_array(&resized, config.input_format);
        let input = TensorRef::from_array_view(&input_array)
            .map_err(|e| InferenceError::Runtime(format!("failed to build input tensor: {e}")))?;
        let outputs = self
            .ort_session
            .session
            .run(inputs![config.input_name.as_str() => input])
            .map_err(|e| InferenceError::Runtime(e.to_string()))?;

        let boxes = box_rows(
            output(&outputs, &config.boxes_output)?,
            &config.boxes_output,
        )?;
        let scores = score_values(
            output(&outputs, &config.scores_output)?,
            &config.scores_output,
        )?;
        let class_ids = class_values(
            output(&outputs, &config.classes_output)?,
            &config.classes_output,
        )?;

        let scale = (
            image.width() as f32 / resized.width().max(1) as f32,
            image.height() as f32 / resized.height().max(1) as f32,
        );
        let instances = postprocess(
            boxes,
            scores,
            class_ids,
            self.score_threshold,
            scale,
            image.dimensions(),
        )?;
        if let Some(id) = instances
            .class_ids
            .iter()
            .find(|&&id| id < 0 || id as usize >= self.num_classes)
        {
            warn!(
                class_id = id,
                num_classes = self.num_classes,
                "model emitted a class id outside its head"
            );
        }
        debug!(instances = instances.len(), "forward pass complete");
        Ok(instances)
    }
}

fn output<'a>(outputs: &'a SessionOutputs, name: &str) -> Result<&'a DynValue, InferenceError> {
    outputs
        .get(name)
        .ok_or_else(|| InferenceError::MissingOutput(name.to_string()))
}

fn extraction_error(name: &str, err: ort::Error) -> InferenceError {
    InferenceError::Runtime(format!("failed to read output {name:?}: {err}"))
}

/// Accepts `(N, 4)` or a batched `(1, N, 4)` tensor.
fn box_rows(value: &DynValue, name: &str) -> Result<Vec<[f32; 4]>, InferenceError> {
    let array = value
        .try_extract_array::<f32>()
        .map_err(|e| extraction_error(name, e))?;
    match array.shape() {
        [_, 4] | [1, _, 4] => {}
        shape => {
            return Err(InferenceError::UnexpectedShape {
                name: name.to_string(),
                shape: shape.to_vec(),
            });
        }
    }
    let flat: Vec<f32> = array.iter().copied().collect();
    Ok(flat
        .chunks_exact(4)
        .map(|c| [c[0], c[1], c[2], c[3]])
        .collect())
}

/// Accepts `(N)` or a batched `(1, N)` tensor.
fn check_vector_shape(shape: &[usize], name: &str) -> Result<(), InferenceError> {
    match shape {
        [_] | [1, _] => Ok(()),
        _ => Err(InferenceError::UnexpectedShape {
            name: name.to_string(),
            shape: shape.to_vec(),
        }),
    }
}

fn score_values(value: &DynValue, name: &str) -> Result<Vec<f32>, InferenceError> {
    let array = value
        .try_extract_array::<f32>()
        .map_err(|e| extraction_error(name, e))?;
    check_vector_shape(array.shape(), name)?;
    Ok(array.iter().copied().collect())
}

/// Class ids come out as int64 from most exporters, but some graphs cast them to float.
fn class_values(value: &DynValue, name: &str) -> Result<Vec<i64>, InferenceError> {
    if let Ok(array) = value.try_extract_array::<i64>() {
        check_vector_shape(array.shape(), name)?;
        return Ok(array.iter().copied().collect());
    }
    if let Ok(array) = value.try_extract_array::<i32>() {
        check_vector_shape(array.shape(), name)?;
        return Ok(array.iter().map(|&id| i64::from(id)).collect());
    }
    let array = value
        .try_extract_array::<f32>()
        .map_err(|e| extraction_error(name, e))?;
    check_vector_shape(array.shape(), name)?;
    Ok(array.iter().map(|&id| id.round() as i64).collect())
}

/// Applies the test-time score cutoff and maps boxes from the resized frame back onto
/// an image of `image_size`, clipping to its bounds. NaN scores never pass the cutoff
/// and boxes with no area after clipping are dropped. Order is preserved.
pub fn postprocess(
    boxes: Vec<[f32; 4]>,
    scores: Vec<f32>,
    class_ids: Vec<i64>,
    score_threshold: f32,
    (scale_x, scale_y): (f32, f32),
    (image_width, image_height): (u32, u32),
) -> Result<RawInstances, InferenceError> {
    if boxes.len() != scores.len() || scores.len() != class_ids.len() {
        return Err(InferenceError::LengthMismatch {
            boxes: boxes.len(),
            scores: scores.len(),
            classes: class_ids.len(),
        });
    }
    let (max_x, max_y) = (image_width as f32, image_height as f32);
    let mut instances = RawInstances::default();
    for ((bbox, score), class_id) in boxes.into_iter().zip(scores).zip(class_ids) {
        if score.is_nan() || score <= score_threshold {
            continue;
        }
        let [x1, y1, x2, y2] = bbox;
        let clipped = [
            (x1 * scale_x).clamp(0.0, max_x),
            (y1 * scale_y).clamp(0.0, max_y),
            (x2 * scale_x).clamp(0.0, max_x),
            (y2 * scale_y).clamp(0.0, max_y),
        ];
        // Boxes left without area after clipping are dropped, NaN coordinates included.
        let nonempty = clipped[2] - clipped[0] > 0.0 && clipped[3] - clipped[1] > 0.0;
        if !nonempty {
            continue;
        }
        instances.boxes.push(clipped);
        instances.scores.push(score);
        instances.class_ids.push(class_id);
    }
    Ok(instances)
}
