//! Compile-time tensor backend for the evaluator.
//!
//! `ndarray` (CPU) unless the `wgpu` feature is enabled. Label mapping and
//! confusion counting run on this backend; surface distances run on the host.

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(feature = "wgpu")] {
        /// Backend used for volume tensors.
        pub type EvalBackend = burn::backend::Wgpu;
        /// Device of [`EvalBackend`].
        pub type EvalDevice = burn::backend::wgpu::WgpuDevice;

        pub const BACKEND_NAME: &str = "WGPU (GPU)";
    } else {
        /// Backend used for volume tensors.
        pub type EvalBackend = burn::backend::NdArray;
        /// Device of [`EvalBackend`].
        pub type EvalDevice = burn::backend::ndarray::NdArrayDevice;

        pub const BACKEND_NAME: &str = "NdArray (CPU)";
    }
}

/// Default device of the selected backend.
pub fn default_device() -> EvalDevice {
    EvalDevice::default()
}
