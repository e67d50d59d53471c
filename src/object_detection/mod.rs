pub mod device;
pub mod model_config;
pub mod object_detection_model;
pub mod ort_inference_session;
pub mod predictor;
