//! The detector: one forward pass per image, reshaped into parallel sequences.

pub mod detection_result;

use crate::annotations::bounding_box::BoundingBox;
use crate::annotations::detection::{Detection, round_confidence};
use crate::config::DetectionConfig;
use crate::error::{DetectError, InferenceError, ModelError};
use crate::object_detection::device::{Device, cuda_available, select_device};
use crate::object_detection::object_detection_model::{ObjectDetectionModel, RawInstances};
use crate::object_detection::predictor::OnnxPredictor;
pub use detection_result::DetectionResult;
use image::RgbImage;
use itertools::izip;
use std::collections::HashSet;
use tracing::{debug, error};

/// Wraps a pretrained model and turns its output into boxes, labels and confidences.
///
/// `detect` takes `&mut self`: a detector runs one forward pass at a time. Callers that
/// need parallelism build one detector per worker or serialize access themselves.
pub struct Detector<M: ObjectDetectionModel = OnnxPredictor> {
    model: M,
    class_all: Vec<String>,
    classes_of_interest: HashSet<String>,
}

impl Detector<OnnxPredictor> {
    /// Selects the device, loads the model config and weights, and builds the session.
    pub fn new(config: DetectionConfig) -> Result<Self, ModelError> {
        Self::build_with(config, cuda_available, OnnxPredictor::from_config)
    }
}

impl<M: ObjectDetectionModel> Detector<M> {
    /// Selects the device once, then hands it to `build` to construct the model.
    pub(crate) fn build_with<P, B>(
        config: DetectionConfig,
        gpu_available: P,
        build: B,
    ) -> Result<Self, ModelError>
    where
        P: FnOnce() -> bool,
        B: FnOnce(&DetectionConfig, Device) -> Result<M, ModelError>,
    {
        let device = select_device(config.use_gpu(), gpu_available);
        let model = build(&config, device)?;
        Ok(Self::with_model(config, model))
    }

    /// Builds a detector around an already constructed model handle.
    pub fn with_model(config: DetectionConfig, model: M) -> Self {
        Self {
            model,
            class_all: config.class_all().to_vec(),
            classes_of_interest: config.classes_of_interest().clone(),
        }
    }

    /// Device the model was placed on at construction.
    pub fn device(&self) -> Device {
        self.model.device()
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn class_all(&self) -> &[String] {
        &self.class_all
    }

    pub fn classes_of_interest(&self) -> &HashSet<String> {
        &self.classes_of_interest
    }

    /// Runs the model once over `image`.
    ///
    /// Boxes are `(x, y, width, height)`, confidences are rounded to three decimals and
    /// the order is whatever the model produced. Nothing is filtered beyond the model's
    /// own score cutoff.
    pub fn detect(&mut self, image: &RgbImage) -> Result<DetectionResult, DetectError> {
        let instances = self.model.run_inference(image).map_err(|err| {
            error!(error = %err, "inference failed");
            err
        })?;
        let result = shape_instances(instances, &self.class_all)?;
        debug!(detections = result.len(), "detect complete");
        Ok(result)
    }

    /// `detect` split into its three parallel sequences.
    pub fn get_bounding_boxes(
        &mut self,
        image: &RgbImage,
    ) -> Result<(Vec<[f64; 4]>, Vec<String>, Vec<f64>), DetectError> {
        Ok(self.detect(image)?.into_parts())
    }

    /// `detect` followed by keeping only the configured classes of interest.
    pub fn detect_of_interest(&mut self, image: &RgbImage) -> Result<DetectionResult, DetectError> {
        let result = self.detect(image)?;
        Ok(result.retain_classes(&self.classes_of_interest))
    }
}

/// Maps class ids to labels, rounds scores and converts corner boxes to corner-size.
pub fn shape_instances(
    instances: RawInstances,
    class_all: &[String],
) -> Result<DetectionResult, DetectError> {
    let RawInstances {
        boxes,
        scores,
        class_ids,
    } = instances;
    if boxes.len() != scores.len() || scores.len() != class_ids.len() {
        return Err(InferenceError::LengthMismatch {
            boxes: boxes.len(),
            scores: scores.len(),
            classes: class_ids.len(),
        }
        .into());
    }

    let detections = izip!(boxes, scores, class_ids)
        .map(|(xyxy, score, class_id)| -> Result<Detection<BoundingBox>, DetectError> {
            let label = usize::try_from(class_id)
                .ok()
                .and_then(|index| class_all.get(index))
                .ok_or(DetectError::UnknownClassId {
                    class_id,
                    num_labels: class_all.len(),
                })?;
            Ok(Detection {
                annotation: BoundingBox::from_xyxy(xyxy, label.clone())?,
                confidence: round_confidence(score),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DetectionResult::from_detections(detections))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ENABLE_GPU_VAR;
    use crate::config::tests::TestEnv;
    use std::collections::VecDeque;

    const LABELS: &str = "person\nbicycle\ncar\nmotorcycle\nbus\ntruck\n";

    struct MockModel {
        device: Device,
        responses: VecDeque<Result<RawInstances, InferenceError>>,
        calls: usize,
    }

    impl MockModel {
        fn new(device: Device, responses: Vec<Result<RawInstances, InferenceError>>) -> Self {
            Self {
                device,
                responses: responses.into(),
                calls: 0,
            }
        }
    }

    impl ObjectDetectionModel for MockModel {
        fn device(&self) -> Device {
            self.device
        }

        fn run_inference(&mut self, _image: &RgbImage) -> Result<RawInstances, InferenceError> {
            self.calls += 1;
            self.responses
                .pop_front()
                .unwrap_or_else(|| Ok(RawInstances::default()))
        }
    }

    fn detector(responses: Vec<Result<RawInstances, InferenceError>>) -> Detector<MockModel> {
        let env = TestEnv::new(LABELS, "car\ntruck\nbus\n");
        Detector::with_model(env.load().unwrap(), MockModel::new(Device::Cpu, responses))
    }

    fn three_instances() -> RawInstances {
        RawInstances {
            boxes: vec![
                [10.0, 20.0, 110.0, 170.0],
                [0.0, 0.0, 4.0, 8.0],
                [5.5, 6.5, 7.5, 9.5],
            ],
            scores: vec![0.91234, 0.5, 0.777],
            class_ids: vec![2, 0, 5],
        }
    }

    #[test]
    fn shapes_model_output() {
        let mut detector = detector(vec![Ok(three_instances())]);
        let result = detector.detect(&RgbImage::new(4, 4)).unwrap();
        assert_eq!(result.confidences(), &[0.912, 0.5, 0.777]);
        assert_eq!(result.classes(), &["car", "person", "truck"]);
        for (class, id) in result.classes().iter().zip([2usize, 0, 5]) {
            assert_eq!(class, &detector.class_all()[id]);
        }
        assert_eq!(
            result.boxes(),
            &[
                [10.0, 20.0, 100.0, 150.0],
                [0.0, 0.0, 4.0, 8.0],
                [5.5, 6.5, 2.0, 3.0]
            ]
        );
        assert_eq!(detector.model().calls, 1);
    }

    #[test]
    fn get_bounding_boxes_returns_parallel_sequences() {
        let mut detector = detector(vec![Ok(three_instances()), Ok(RawInstances::default())]);
        let (boxes, classes, confidences) =
            detector.get_bounding_boxes(&RgbImage::new(4, 4)).unwrap();
        assert_eq!(boxes.len(), 3);
        assert_eq!(classes.len(), 3);
        assert_eq!(confidences.len(), 3);

        let (boxes, classes, confidences) =
            detector.get_bounding_boxes(&RgbImage::new(4, 4)).unwrap();
        assert!(boxes.is_empty() && classes.is_empty() && confidences.is_empty());
    }

    #[test]
    fn inference_failure_propagates_and_detector_stays_usable() {
        let mut detector = detector(vec![
            Err(InferenceError::Runtime("device lost".to_string())),
            Ok(three_instances()),
        ]);
        let image = RgbImage::new(4, 4);
        assert!(matches!(
            detector.detect(&image),
            Err(DetectError::Inference(InferenceError::Runtime(_)))
        ));
        assert_eq!(detector.detect(&image).unwrap().len(), 3);
        assert_eq!(detector.model().calls, 2);
    }

    #[test]
    fn unknown_class_id_is_a_lookup_error() {
        let mut detector = detector(vec![Ok(RawInstances {
            boxes: vec![[0.0, 0.0, 1.0, 1.0]],
            scores: vec![0.9],
            class_ids: vec![6],
        })]);
        assert!(matches!(
            detector.detect(&RgbImage::new(4, 4)),
            Err(DetectError::UnknownClassId {
                class_id: 6,
                num_labels: 6
            })
        ));
    }

    #[test]
    fn negative_class_id_is_a_lookup_error() {
        let result = shape_instances(
            RawInstances {
                boxes: vec![[0.0, 0.0, 1.0, 1.0]],
                scores: vec![0.9],
                class_ids: vec![-1],
            },
            &["car".to_string()],
        );
        assert!(matches!(
            result,
            Err(DetectError::UnknownClassId { class_id: -1, .. })
        ));
    }

    #[test]
    fn inverted_box_is_rejected() {
        let mut detector = detector(vec![Ok(RawInstances {
            boxes: vec![[110.0, 20.0, 10.0, 170.0]],
            scores: vec![0.9],
            class_ids: vec![2],
        })]);
        assert!(matches!(
            detector.detect(&RgbImage::new(4, 4)),
            Err(DetectError::InvalidBox(_))
        ));
    }

    #[test]
    fn mismatched_instances_are_rejected() {
        let result = shape_instances(
            RawInstances {
                boxes: vec![[0.0, 0.0, 1.0, 1.0]],
                scores: vec![],
                class_ids: vec![0],
            },
            &["car".to_string()],
        );
        assert!(matches!(
            result,
            Err(DetectError::Inference(InferenceError::LengthMismatch { .. }))
        ));
    }

    #[test]
    fn detect_of_interest_filters_after_detection() {
        let mut detector = detector(vec![Ok(three_instances())]);
        let result = detector.detect_of_interest(&RgbImage::new(4, 4)).unwrap();
        assert_eq!(result.classes(), &["car", "truck"]);
        assert_eq!(result.confidences(), &[0.912, 0.777]);
    }

    #[test]
    fn device_is_reported_from_model() {
        let env = TestEnv::new(LABELS, "car\n");
        let detector = Detector::with_model(
            env.load().unwrap(),
            MockModel::new(Device::Gpu, vec![]),
        );
        assert_eq!(detector.device(), Device::Gpu);
    }

    fn build_mock(config: &DetectionConfig, device: Device) -> Result<MockModel, ModelError> {
        assert!(config.use_gpu());
        Ok(MockModel::new(device, vec![]))
    }

    #[test]
    fn gpu_requested_but_unavailable_reports_cpu() {
        let mut env = TestEnv::new(LABELS, "car\n");
        env.vars.insert(ENABLE_GPU_VAR, "True".to_string());
        let config = env.load().unwrap();
        let detector = Detector::build_with(config, || false, build_mock).unwrap();
        assert_eq!(detector.device(), Device::Cpu);
    }

    #[test]
    fn gpu_requested_and_available_reports_gpu() {
        let mut env = TestEnv::new(LABELS, "car\n");
        env.vars.insert(ENABLE_GPU_VAR, "True".to_string());
        let config = env.load().unwrap();
        let detector = Detector::build_with(config, || true, build_mock).unwrap();
        assert_eq!(detector.device(), Device::Gpu);
    }

    #[test]
    fn model_build_failure_fails_construction() {
        let env = TestEnv::new(LABELS, "car\n");
        let result = Detector::<MockModel>::build_with(
            env.load().unwrap(),
            || panic!("GPU availability checked although it was not requested"),
            |_, _| Err(ModelError::Session("no provider".to_string())),
        );
        assert!(matches!(result, Err(ModelError::Session(_))));
    }

    #[test]
    fn missing_model_config_fails_construction() {
        let env = TestEnv::new(LABELS, "car\n");
        assert!(matches!(
            Detector::new(env.load().unwrap()),
            Err(ModelError::ReadConfig { .. })
        ));
    }

    #[test]
    fn missing_weights_fail_construction() {
        let env = TestEnv::new(LABELS, "car\n");
        std::fs::write(env.dir.path().join("model.json"), "{}").unwrap();
        assert!(matches!(
            Detector::new(env.load().unwrap()),
            Err(ModelError::MissingWeights(_))
        ));
    }
}
