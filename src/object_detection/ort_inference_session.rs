use crate::error::ModelError;
use crate::object_detection::device::Device;
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use std::path::Path;
use tracing::debug;

/// An onnxruntime inference session.
///
/// The predictor in this crate is a wrapper around an ONNX inference session that
/// handles running the model on hardware. Placement is decided before the session is
/// built and never changes afterwards.
pub struct OrtInferenceSession {
    pub session: Session,
    device: Device,
}

impl OrtInferenceSession {
    pub fn new(model_path: &Path, device: Device) -> Result<Self, ModelError> {
        if !model_path.is_file() {
            return Err(ModelError::MissingWeights(model_path.to_path_buf()));
        }
        let mut builder = Session::builder()
            .map_err(|e| ModelError::Session(format!("failed to create session builder: {e}")))?;
        if device == Device::Gpu {
            // Registration failure must not fall back to CPU.
            let cuda = CUDAExecutionProvider::default().build().error_on_failure();
            builder = builder.with_execution_providers([cuda]).map_err(|e| {
                ModelError::Session(format!("failed to register CUDA provider: {e}"))
            })?;
        }
        let session = builder
            .commit_from_file(model_path)
            .map_err(|e| {
                ModelError::Session(format!("failed to load {}: {e}", model_path.display()))
            })?;
        debug!(
            model = %model_path.display(),
            %device,
            inputs = session.inputs.len(),
            outputs = session.outputs.len(),
            "inference session ready"
        );
        Ok(Self { session, device })
    }

    pub fn device(&self) -> Device {
        self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_weights_are_reported_before_loading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        match OrtInferenceSession::new(&path, Device::Cpu) {
            Err(ModelError::MissingWeights(p)) => assert_eq!(p, path),
            Err(other) => panic!("expected MissingWeights, got {other}"),
            Ok(_) => panic!("expected MissingWeights, got a session"),
        }
    }
}
