//! Liquid glass renderer.
//!
//! A rounded region refracts and blurs the background behind it while it
//! follows the pointer (or an automatic path). The flow per frame is:
//!
//! ```text
//!   CLI / liquidglass
//!          │ RendererConfig + Arc<ConfigStore>
//!          ▼
//!   Renderer::run ──▶ FrameScheduler tick ──▶ InteractionTracker anchor
//!          │                                          │
//!          │              ConfigStore snapshot ───────┤
//!          ▼                                          ▼
//!   window (wgpu fragment program)  or  frame (CPU reference) ──▶ pixels
//! ```
//!
//! [`shading`] is the reference implementation of the per-pixel math; the
//! GLSL program in `compile` mirrors it for the interactive window, and
//! [`frame`] uses it directly for headless export.

pub mod background;
mod compile;
pub mod frame;
mod gpu;
pub mod runtime;
pub mod shading;
pub mod texture;
pub mod types;
mod window;

use std::sync::Arc;

use anyhow::Result;
use glassconfig::ConfigStore;

pub use background::{load_background, paint_reference};
pub use frame::{render_frame, run_headless};
pub use runtime::{frame_count, sequence_path, ExportFormat, RenderPolicy};
pub use shading::{shade, shade_pixel, ShadingParams};
pub use texture::{RasterTexture, SceneTexture};
pub use types::{BackgroundSource, RenderMode, RendererConfig, ViewportState};

/// High-level entry point that owns the chosen configuration.
///
/// The live [`RenderConfig`](glassconfig::RenderConfig) is not part of it:
/// every frame reads a fresh snapshot from the shared [`ConfigStore`], so
/// edits made while running take effect on the next tick.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Runs the window until it closes, or renders the export and returns.
    pub fn run(&self, store: Arc<ConfigStore>) -> Result<()> {
        match self.config.mode {
            RenderMode::Windowed => window::run_window(self.config.clone(), store),
            RenderMode::Headless => frame::run_headless(&self.config, &store).map(|_| ()),
        }
    }
}
