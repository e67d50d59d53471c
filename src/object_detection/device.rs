use ort::execution_providers::{CUDAExecutionProvider, ExecutionProvider};
use std::fmt;
use tracing::{info, warn};

/// Hardware the inference session is placed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Gpu,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Gpu => write!(f, "gpu"),
        }
    }
}

/// Picks the device once: GPU only when it is both requested and available.
///
/// `gpu_available` is only consulted when the GPU was requested.
pub fn select_device<F: FnOnce() -> bool>(use_gpu: bool, gpu_available: F) -> Device {
    if !use_gpu {
        info!(device = %Device::Cpu, "GPU acceleration disabled, using CPU");
        return Device::Cpu;
    }
    if gpu_available() {
        info!(device = %Device::Gpu, "GPU available, using GPU");
        Device::Gpu
    } else {
        warn!(device = %Device::Cpu, "GPU requested but not available, using CPU");
        Device::Cpu
    }
}

/// Asks ONNX Runtime whether the CUDA execution provider can be used.
pub fn cuda_available() -> bool {
    match CUDAExecutionProvider::default().is_available() {
        Ok(available) => available,
        Err(err) => {
            warn!(error = %err, "failed to query CUDA availability");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn requested_and_available_selects_gpu() {
        assert_eq!(select_device(true, || true), Device::Gpu);
    }

    #[test]
    fn requested_but_unavailable_falls_back_to_cpu() {
        assert_eq!(select_device(true, || false), Device::Cpu);
    }

    #[test]
    fn not_requested_never_checks_availability() {
        let checked = Cell::new(false);
        let device = select_device(false, || {
            checked.set(true);
            true
        });
        assert_eq!(device, Device::Cpu);
        assert!(!checked.get());
    }

    #[test]
    fn display_names() {
        assert_eq!(Device::Cpu.to_string(), "cpu");
        assert_eq!(Device::Gpu.to_string(), "gpu");
    }
}
