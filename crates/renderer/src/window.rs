use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use glassconfig::{ConfigStore, GlassConfigFile, PRESETS};
use scheduler::{FrameScheduler, PlaybackState};
use tracing::{debug, error, info, warn};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, TouchPhase, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::background::load_background;
use crate::frame::tracker_for;
use crate::gpu::GpuState;
use crate::runtime::RenderPolicy;
use crate::shading::ShadingParams;
use crate::types::{RendererConfig, ViewportState};

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyAction {
    TogglePlayback,
    ToggleTracking,
    ApplyPreset(usize),
    Reload,
    Quit,
}

pub(crate) fn key_action(key: &Key) -> Option<KeyAction> {
    match key {
        Key::Named(NamedKey::Space) => Some(KeyAction::TogglePlayback),
        Key::Named(NamedKey::Escape) => Some(KeyAction::Quit),
        Key::Character(value) => match value.to_ascii_lowercase().as_str() {
            " " => Some(KeyAction::TogglePlayback),
            "a" => Some(KeyAction::ToggleTracking),
            "r" => Some(KeyAction::Reload),
            "q" => Some(KeyAction::Quit),
            digit => digit
                .parse::<usize>()
                .ok()
                .filter(|index| (1..=PRESETS.len()).contains(index))
                .map(|index| KeyAction::ApplyPreset(index - 1)),
        },
        _ => None,
    }
}

/// Window plus the GPU renderer bound to it. `gpu` is `None` once torn
/// down; frames are skipped from then on.
pub(crate) struct WindowState {
    // Dropped before the window its surface points into.
    gpu: Option<GpuState>,
    window: Arc<Window>,
}

impl WindowState {
    pub(crate) fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let background = load_background(&config.background);
        let gpu = GpuState::new(window.as_ref(), window.inner_size(), &background)?;
        Ok(Self {
            gpu: Some(gpu),
            window,
        })
    }

    pub(crate) fn window(&self) -> &Window {
        self.window.as_ref()
    }

    pub(crate) fn is_ready(&self) -> bool {
        self.gpu.is_some()
    }

    /// Rebuilt from the real surface on every call.
    pub(crate) fn viewport(&self) -> ViewportState {
        let size = self
            .gpu
            .as_ref()
            .map(GpuState::size)
            .unwrap_or_else(|| self.window.inner_size());
        ViewportState::new(size.width, size.height, self.window.scale_factor() as f32)
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.resize(new_size);
        }
    }

    /// Returns `false` when the frame could not be drawn and the session
    /// should end.
    pub(crate) fn render(&mut self, params: &ShadingParams) -> bool {
        let Some(gpu) = self.gpu.as_mut() else {
            return true;
        };
        match gpu.render(params) {
            Ok(()) => true,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.reconfigure();
                true
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("surface out of memory; closing window");
                false
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("surface timeout; retrying next frame");
                true
            }
            Err(other) => {
                warn!(error = ?other, "surface error; retrying next frame");
                true
            }
        }
    }

    /// Releases the GPU resources. Safe to call more than once.
    pub(crate) fn teardown(&mut self) {
        if let Some(gpu) = self.gpu.take() {
            drop(gpu);
            info!("renderer shut down");
        }
    }
}

fn logical_size(window: &Window) -> (f32, f32) {
    let logical = window.inner_size().to_logical::<f32>(window.scale_factor());
    (logical.width, logical.height)
}

fn logical_position(window: &Window, position: PhysicalPosition<f64>) -> (f32, f32) {
    let logical = position.to_logical::<f32>(window.scale_factor());
    (logical.x, logical.y)
}

/// Re-reads the config file and installs the result as one replacement.
/// How to answer a `RedrawRequested` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RedrawDecision {
    /// A tick is queued; draw it.
    Draw,
    /// The compositor asked on its own; queue a tick and draw.
    Expose,
    Skip,
}

/// `redraw_issued` is whether the request came from our own
/// `request_redraw`. When that tick was withdrawn in the meantime (pause
/// between the request and the event) nothing is drawn.
pub(crate) fn redraw_decision(scheduler: &FrameScheduler, redraw_issued: bool) -> RedrawDecision {
    if scheduler.is_cancelled() {
        RedrawDecision::Skip
    } else if scheduler.has_pending() {
        RedrawDecision::Draw
    } else if redraw_issued {
        RedrawDecision::Skip
    } else {
        RedrawDecision::Expose
    }
}

fn reload_config(path: &Path, preset: Option<&str>, store: &ConfigStore) -> Result<u64> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file = GlassConfigFile::from_toml_str(&text)?;
    let config = file.resolve_with_preset(preset)?;
    Ok(store.replace(config)?)
}

/// Opens the interactive window and runs until it is closed.
pub(crate) fn run_window(config: RendererConfig, store: Arc<ConfigStore>) -> Result<()> {
    let RenderPolicy::Animate {
        target_fps,
        paused,
        auto_path,
    } = config.policy.clone()
    else {
        bail!("the window only runs the animate policy");
    };

    let event_loop =
        EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let window = WindowBuilder::new()
        .with_title("Liquid Glass")
        .with_inner_size(PhysicalSize::new(config.surface_size.0, config.surface_size.1))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window, &config)?;
    let initial = if paused {
        PlaybackState::Paused
    } else {
        PlaybackState::Playing
    };
    let mut scheduler = FrameScheduler::new(initial, target_fps, Instant::now())?;
    let mut tracker = tracker_for(&state.viewport(), auto_path, config.anchor);
    let mut seen_revision = store.revision();
    let mut redraw_issued = false;
    info!(
        state = ?scheduler.state(),
        tracking = ?tracker.mode(),
        fps_cap = ?target_fps,
        "window ready"
    );

    let run_result = event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
            let now = Instant::now();
            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    scheduler.cancel();
                    state.teardown();
                    elwt.exit();
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.state != ElementState::Pressed || event.repeat {
                        return;
                    }
                    let Some(action) = key_action(&event.logical_key) else {
                        return;
                    };
                    debug!(?action, "key action");
                    match action {
                        KeyAction::TogglePlayback => {
                            let playback = scheduler.toggle(now);
                            info!(state = ?playback, "playback toggled");
                        }
                        KeyAction::ToggleTracking => {
                            let mode = tracker.toggle_mode();
                            info!(?mode, "tracking mode toggled");
                            scheduler.invalidate(now);
                        }
                        KeyAction::ApplyPreset(index) => {
                            let preset = &PRESETS[index];
                            match store.replace(preset.config) {
                                Ok(revision) => {
                                    info!(preset = preset.name, revision, "preset applied")
                                }
                                Err(err) => {
                                    warn!(preset = preset.name, error = %err, "preset rejected")
                                }
                            }
                        }
                        KeyAction::Reload => {
                            let Some(path) = config.config_path.as_deref() else {
                                warn!("no configuration file to reload");
                                return;
                            };
                            match reload_config(path, config.preset.as_deref(), &store) {
                                Ok(revision) => {
                                    info!(path = %path.display(), revision, "configuration reloaded")
                                }
                                Err(err) => warn!(
                                    path = %path.display(),
                                    error = %format!("{err:#}"),
                                    "reload failed; keeping current configuration"
                                ),
                            }
                        }
                        KeyAction::Quit => {
                            scheduler.cancel();
                            state.teardown();
                            elwt.exit();
                        }
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    let (x, y) = logical_position(state.window(), position);
                    tracker.pointer_moved(x, y);
                    if tracker.follows_pointer() {
                        scheduler.invalidate(now);
                    }
                }
                WindowEvent::Touch(touch) => {
                    if matches!(touch.phase, TouchPhase::Started | TouchPhase::Moved) {
                        let (x, y) = logical_position(state.window(), touch.location);
                        tracker.touch_moved(x, y);
                        if tracker.follows_pointer() {
                            scheduler.invalidate(now);
                        }
                    }
                }
                WindowEvent::Resized(new_size) => {
                    state.resize(new_size);
                    let (width, height) = logical_size(state.window());
                    tracker.set_surface(width, height);
                    scheduler.invalidate(now);
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let (width, height) = logical_size(state.window());
                    tracker.set_surface(width, height);
                    scheduler.invalidate(now);
                }
                WindowEvent::RedrawRequested => {
                    let issued = std::mem::take(&mut redraw_issued);
                    if !state.is_ready() {
                        return;
                    }
                    match redraw_decision(&scheduler, issued) {
                        RedrawDecision::Skip => {
                            debug!("redraw skipped; no tick queued");
                            return;
                        }
                        RedrawDecision::Expose => scheduler.invalidate(now),
                        RedrawDecision::Draw => {}
                    }
                    let tick = scheduler.fire(now);
                    let viewport = state.viewport();
                    let snapshot = store.snapshot();
                    let anchor = tracker.anchor_at(tick.seconds);
                    let params = ShadingParams::new(&snapshot, &viewport, anchor);
                    if !state.render(&params) {
                        scheduler.cancel();
                        state.teardown();
                        elwt.exit();
                        return;
                    }
                    scheduler.complete(now);
                }
                _ => {}
            }
        }
        Event::AboutToWait => {
            let now = Instant::now();
            let revision = store.revision();
            if revision != seen_revision {
                seen_revision = revision;
                scheduler.invalidate(now);
            }

            if scheduler.is_due(now) {
                tracing::trace!("scheduler: issuing redraw now");
                state.window().request_redraw();
                redraw_issued = true;
                elwt.set_control_flow(ControlFlow::Wait);
            } else if let Some(deadline) = scheduler.next_deadline() {
                let ms = deadline.saturating_duration_since(now).as_millis();
                tracing::trace!(deadline_ms = ms, "scheduler: waiting until next frame");
                elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
            } else {
                tracing::trace!("scheduler: idle (no redraw requested)");
                elwt.set_control_flow(ControlFlow::Wait);
            }
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glassconfig::RenderConfig;
    use tempfile::TempDir;

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(
            key_action(&Key::Named(NamedKey::Space)),
            Some(KeyAction::TogglePlayback)
        );
        assert_eq!(key_action(&Key::Character("A".into())), Some(KeyAction::ToggleTracking));
        assert_eq!(key_action(&Key::Character("2".into())), Some(KeyAction::ApplyPreset(1)));
        assert_eq!(key_action(&Key::Character("r".into())), Some(KeyAction::Reload));
        assert_eq!(key_action(&Key::Character("0".into())), None);
        assert_eq!(key_action(&Key::Character("4".into())), None);
        assert_eq!(key_action(&Key::Named(NamedKey::Escape)), Some(KeyAction::Quit));
    }

    #[test]
    fn queued_tick_is_drawn() {
        let scheduler = FrameScheduler::new(PlaybackState::Playing, None, Instant::now()).unwrap();
        assert_eq!(redraw_decision(&scheduler, true), RedrawDecision::Draw);
        assert_eq!(redraw_decision(&scheduler, false), RedrawDecision::Draw);
    }

    #[test]
    fn pause_after_redraw_request_skips_the_frame() {
        let t0 = Instant::now();
        let mut scheduler = FrameScheduler::new(PlaybackState::Playing, None, t0).unwrap();
        assert!(scheduler.is_due(t0));
        // Space arrives between request_redraw and RedrawRequested.
        scheduler.pause(t0);
        assert_eq!(redraw_decision(&scheduler, true), RedrawDecision::Skip);
    }

    #[test]
    fn unrequested_redraw_while_paused_is_an_expose() {
        let t0 = Instant::now();
        let mut scheduler = FrameScheduler::new(PlaybackState::Paused, None, t0).unwrap();
        scheduler.fire(t0);
        scheduler.complete(t0);
        assert!(!scheduler.has_pending());
        assert_eq!(redraw_decision(&scheduler, false), RedrawDecision::Expose);
    }

    #[test]
    fn cancelled_scheduler_never_draws() {
        let mut scheduler =
            FrameScheduler::new(PlaybackState::Playing, None, Instant::now()).unwrap();
        scheduler.cancel();
        assert_eq!(redraw_decision(&scheduler, false), RedrawDecision::Skip);
        assert_eq!(redraw_decision(&scheduler, true), RedrawDecision::Skip);
    }

    #[test]
    fn reload_replaces_the_whole_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("glass.toml");
        std::fs::write(&path, "version = 1\npreset = \"liquid crystal\"\n").unwrap();
        let store = ConfigStore::new(RenderConfig::default()).unwrap();

        let revision = reload_config(&path, None, &store).unwrap();
        assert_eq!(revision, store.revision());
        assert_eq!(*store.snapshot(), PRESETS[2].config);

        reload_config(&path, Some("dense-glass"), &store).unwrap();
        assert_eq!(*store.snapshot(), PRESETS[1].config);
    }

    #[test]
    fn broken_reload_keeps_previous_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("glass.toml");
        std::fs::write(&path, "version = 1\n[glass]\nrefractive_index = 9.0\n").unwrap();
        let store = ConfigStore::new(RenderConfig::default()).unwrap();

        assert!(reload_config(&path, None, &store).is_err());
        assert_eq!(*store.snapshot(), RenderConfig::default());
        assert_eq!(store.revision(), 0);
    }
}
