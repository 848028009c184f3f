use std::path::PathBuf;

use scheduler::{Anchor, COMPACT_WIDTH};

use crate::runtime::RenderPolicy;

/// Largest region a compact surface shows, in device-independent pixels.
pub const COMPACT_REGION_LIMIT: (f32, f32) = (280.0, 180.0);

/// Output surface geometry, recomputed on every frame from the real
/// surface size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    /// Surface size in physical pixels.
    pub resolution_px: (u32, u32),
    pub device_pixel_ratio: f32,
}

impl ViewportState {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f32) -> Self {
        let device_pixel_ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        Self {
            resolution_px: (width.max(1), height.max(1)),
            device_pixel_ratio,
        }
    }

    /// Surface size in device-independent pixels.
    pub fn logical_size(&self) -> (f32, f32) {
        (
            self.resolution_px.0 as f32 / self.device_pixel_ratio,
            self.resolution_px.1 as f32 / self.device_pixel_ratio,
        )
    }

    /// Narrow surfaces (phones, split panes) get a smaller glass region.
    pub fn is_compact(&self) -> bool {
        self.logical_size().0 < COMPACT_WIDTH
    }
}

/// How the renderer should present frames.
///
/// * `Windowed` opens an interactive `winit` window rendered on the GPU.
/// * `Headless` evaluates frames on the CPU and writes them to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Windowed,
    Headless,
}

/// Where the scene behind the glass comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BackgroundSource {
    /// The built-in 800x600 test card.
    #[default]
    Painted,
    /// Any raster the `image` crate can decode.
    Image(PathBuf),
}

/// Immutable configuration passed to the renderer at start-up.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Window or export size in physical pixels.
    pub surface_size: (u32, u32),
    /// Device pixel ratio for headless rendering; windows report their own.
    pub device_pixel_ratio: f32,
    pub mode: RenderMode,
    pub background: BackgroundSource,
    /// Starting pointer position; the tracker's default when unset.
    pub anchor: Option<Anchor>,
    /// Config file to re-read when the user asks for a reload.
    pub config_path: Option<PathBuf>,
    /// Preset chosen on the command line; wins over the file's own on reload.
    pub preset: Option<String>,
    pub policy: RenderPolicy,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (800, 600),
            device_pixel_ratio: 1.0,
            mode: RenderMode::Windowed,
            background: BackgroundSource::default(),
            anchor: None,
            config_path: None,
            preset: None,
            policy: RenderPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_size_divides_by_ratio() {
        let viewport = ViewportState::new(2560, 1600, 2.0);
        assert_eq!(viewport.logical_size(), (1280.0, 800.0));
        assert!(!viewport.is_compact());
    }

    #[test]
    fn compact_below_tablet_width() {
        assert!(ViewportState::new(1170, 2532, 3.0).is_compact());
    }

    #[test]
    fn bogus_ratio_falls_back_to_one() {
        let viewport = ViewportState::new(0, 0, 0.0);
        assert_eq!(viewport.device_pixel_ratio, 1.0);
        assert_eq!(viewport.resolution_px, (1, 1));
    }
}
