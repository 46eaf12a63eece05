//! Backend selection
//!
//! The numeric backend is chosen at compile time: CUDA when the `cuda`
//! feature is enabled, NdArray on the CPU otherwise. Neither is wrapped in
//! `Autodiff`, so every model built on `InferenceBackend` runs in evaluation
//! mode (batch norm uses running statistics, dropout is the identity).

use burn::tensor::backend::Backend;

#[cfg(feature = "cuda")]
pub type InferenceBackend = burn_cuda::Cuda;

#[cfg(not(feature = "cuda"))]
pub type InferenceBackend = burn_ndarray::NdArray;

/// Device type of the compiled-in backend
pub type InferenceDevice = <InferenceBackend as Backend>::Device;

/// Resolve the device an engine will run on
///
/// Called once when a service is built; the result is carried by every
/// engine so all tensors of a request live on the same device.
pub fn default_device() -> InferenceDevice {
    InferenceDevice::default()
}

/// Human-readable name of the compiled-in backend
pub fn backend_name() -> &'static str {
    #[cfg(feature = "cuda")]
    {
        "CUDA (GPU)"
    }

    #[cfg(not(feature = "cuda"))]
    {
        "NdArray (CPU)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_available() {
        let _device = default_device();
        assert!(!backend_name().is_empty());
    }
}
