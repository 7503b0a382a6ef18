// ============================================================
// Layer 5 — Backend Selection
// ============================================================
// Training runs on Autodiff<Inner>; evaluation, export and
// detection run on the inner backend (model.valid()).
//
//   default build       → NdArray (CPU)
//   --features wgpu     → Wgpu (GPU)
//
// The device is created once, on first use, and shared for the
// rest of the process. Nothing needs tearing down.

use burn::{backend::Autodiff, prelude::*};
use std::sync::OnceLock;

#[cfg(not(feature = "wgpu"))]
pub type InnerBackend = burn::backend::NdArray<f32>;
#[cfg(feature = "wgpu")]
pub type InnerBackend = burn::backend::Wgpu;

pub type TrainBackend = Autodiff<InnerBackend>;

pub type BackendDevice = <InnerBackend as Backend>::Device;

static DEVICE: OnceLock<BackendDevice> = OnceLock::new();

/// Return the process-wide device, initialising the backend runtime
/// the first time it is called.
pub fn init_device() -> BackendDevice {
    DEVICE
        .get_or_init(|| {
            let device = BackendDevice::default();
            setup_runtime(&device);
            tracing::info!("Using {} device: {:?}", backend_name(), device);
            device
        })
        .clone()
}

pub fn backend_name() -> &'static str {
    if cfg!(feature = "wgpu") { "wgpu" } else { "ndarray" }
}

#[cfg(feature = "wgpu")]
fn setup_runtime(device: &BackendDevice) {
    use burn::backend::wgpu::{graphics::AutoGraphicsApi, init_setup, RuntimeOptions};
    let _ = init_setup::<AutoGraphicsApi>(device, RuntimeOptions::default());
}

#[cfg(not(feature = "wgpu"))]
fn setup_runtime(_: &BackendDevice) {}
