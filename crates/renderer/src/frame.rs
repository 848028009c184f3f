//! Whole-surface evaluation on the CPU and the headless export loop.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use glam::Vec4;
use glassconfig::ConfigStore;
use image::{Rgba, RgbaImage};
use scheduler::{
    run_loop, Anchor, FrameScheduler, InteractionTracker, PlaybackState, SimulatedTicks,
    TrackingMode,
};

use crate::background::load_background;
use crate::runtime::{frame_count, sequence_path, ExportFormat, RenderPolicy};
use crate::shading::{shade_pixel, ShadingParams};
use crate::texture::SceneTexture;
use crate::types::{RendererConfig, ViewportState};

/// Evaluates every output pixel once.
pub fn render_frame<T: SceneTexture + ?Sized>(params: &ShadingParams, texture: &T) -> RgbaImage {
    let width = params.resolution.x as u32;
    let height = params.resolution.y as u32;
    RgbaImage::from_fn(width, height, |x, y| {
        quantize(shade_pixel(params, texture, x, y))
    })
}

pub fn quantize(color: Vec4) -> Rgba<u8> {
    let bytes = (color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round();
    Rgba([bytes.x as u8, bytes.y as u8, bytes.z as u8, bytes.w as u8])
}

pub fn save_frame(image: &RgbaImage, path: &Path, format: ExportFormat) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let image_format = match format {
        ExportFormat::Png => image::ImageFormat::Png,
    };
    image
        .save_with_format(path, image_format)
        .with_context(|| format!("failed to write frame to {}", path.display()))
}

/// Picks the tracking mode for a fresh surface. Compact surfaces, or an
/// explicit request, follow the automatic path.
pub(crate) fn tracker_for(
    viewport: &ViewportState,
    auto_path: bool,
    anchor: Option<Anchor>,
) -> InteractionTracker {
    let (width, height) = viewport.logical_size();
    let mut tracker = InteractionTracker::for_surface(width, height);
    if auto_path {
        tracker.set_mode(TrackingMode::AutoPath);
    }
    if let Some(anchor) = anchor {
        tracker.pointer_moved(anchor.x, anchor.y);
    }
    tracker
}

/// Renders the export policy without a window and returns the files written.
///
/// A still is a single on-demand tick of a paused scheduler. A sequence
/// plays the scheduler at `fps` against simulated refreshes so the
/// animation clock, and with it the automatic path, advances exactly one
/// frame interval per file.
pub fn run_headless(config: &RendererConfig, store: &ConfigStore) -> Result<Vec<PathBuf>> {
    let RenderPolicy::Export {
        path,
        format,
        duration,
        fps,
        auto_path,
    } = &config.policy
    else {
        bail!("headless rendering needs an export policy");
    };

    let viewport = ViewportState::new(
        config.surface_size.0,
        config.surface_size.1,
        config.device_pixel_ratio,
    );
    let texture = load_background(&config.background);
    let tracker = tracker_for(&viewport, *auto_path, config.anchor);
    let start = Instant::now();

    let (mut scheduler, mut ticks) = match duration {
        None => (
            FrameScheduler::new(PlaybackState::Paused, None, start)?,
            SimulatedTicks::new(start, Duration::ZERO, 1),
        ),
        Some(duration) => {
            if !(fps.is_finite() && *fps > 0.0) {
                bail!("sequence export needs a positive fps, got {fps}");
            }
            let frames = frame_count(*duration, *fps);
            let step = Duration::from_secs_f64(1.0 / f64::from(*fps));
            tracing::info!(
                frames,
                fps = *fps,
                size = ?viewport.resolution_px,
                "exporting frame sequence"
            );
            (
                FrameScheduler::new(PlaybackState::Playing, Some(*fps), start)?,
                SimulatedTicks::new(start, step, frames),
            )
        }
    };

    let mut written = Vec::new();
    let exit = run_loop(&mut scheduler, &mut ticks, |tick, _| -> Result<()> {
        let snapshot = store.snapshot();
        let anchor = tracker.anchor_at(tick.seconds);
        let params = ShadingParams::new(&snapshot, &viewport, anchor);
        let image = render_frame(&params, &texture);
        let target = match duration {
            None => path.clone(),
            Some(_) => sequence_path(path, *format, written.len()),
        };
        save_frame(&image, &target, *format)?;
        tracing::debug!(
            seq = tick.seq,
            seconds = tick.seconds,
            anchor_x = anchor.x,
            anchor_y = anchor.y,
            path = %target.display(),
            "frame written"
        );
        written.push(target);
        Ok(())
    })?;

    tracing::info!(frames = written.len(), ?exit, "headless export finished");
    Ok(written)
}
