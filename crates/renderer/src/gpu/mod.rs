//! GPU side of the glass renderer.
//!
//! - `context` owns the wgpu instance, device and surface and rebuilds the
//!   swapchain when the window resizes.
//! - `pipeline` compiles the GLSL program and uploads the background into
//!   `PipelineResources`, which live for the whole session.
//! - `uniforms` mirrors the shader's uniform block.
//! - `state` glues them together behind the `GpuState` API used by `window`.

mod context;
mod pipeline;
mod state;
mod uniforms;

pub(crate) use state::GpuState;
