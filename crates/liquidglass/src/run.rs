use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use glassconfig::{
    default_preset, find_preset, ConfigError, ConfigStore, GlassConfigFile, RenderConfig,
};
use renderer::{BackgroundSource, ExportFormat, RenderMode, RenderPolicy, Renderer, RendererConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::paths::AppPaths;

const DEFAULT_EXPORT_FPS: f32 = 30.0;
const DEFAULT_SURFACE: (u32, u32) = (800, 600);

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn run(args: RunArgs) -> Result<()> {
    let loaded = load_config_file(args.config.as_deref())?;
    let file = loaded.as_ref().map(|(_, file)| file);
    let config = resolve_config(file, args.preset.as_deref())?;
    let store = Arc::new(ConfigStore::new(config).context("resolved glass config is invalid")?);

    let renderer_config = build_renderer_config(&args, loaded.as_ref())?;
    tracing::info!(
        mode = ?renderer_config.mode,
        width = renderer_config.surface_size.0,
        height = renderer_config.surface_size.1,
        preset = ?renderer_config.preset,
        "starting liquidglass"
    );
    Renderer::new(renderer_config).run(store)
}

/// Reads the explicit `--config` file, or the discovered one when it exists.
pub fn load_config_file(explicit: Option<&Path>) -> Result<Option<(PathBuf, GlassConfigFile)>> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let discovered = AppPaths::discover()?.config_file();
            if !discovered.exists() {
                tracing::debug!(path = %discovered.display(), "no glass config file; using presets");
                return Ok(None);
            }
            discovered
        }
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read glass config {}", path.display()))?;
    let file = GlassConfigFile::from_toml_str(&raw)
        .with_context(|| format!("failed to load glass config {}", path.display()))?;
    tracing::debug!(path = %path.display(), preset = ?file.preset, "loaded glass config");
    Ok(Some((path, file)))
}

/// `preset` wins over the file's own preset; file overrides still apply.
pub fn resolve_config(
    file: Option<&GlassConfigFile>,
    preset: Option<&str>,
) -> Result<RenderConfig, ConfigError> {
    match (file, preset) {
        (Some(file), preset) => file.resolve_with_preset(preset),
        (None, Some(name)) => find_preset(name)
            .map(|preset| preset.config)
            .ok_or_else(|| ConfigError::UnknownPreset(name.to_string())),
        (None, None) => Ok(default_preset().config),
    }
}

fn build_renderer_config(
    args: &RunArgs,
    loaded: Option<&(PathBuf, GlassConfigFile)>,
) -> Result<RendererConfig> {
    let file = loaded.map(|(_, file)| file);
    let playback = file.map(|file| &file.playback);

    if let Some(fps) = args.fps {
        if !(fps >= 0.0) {
            bail!("--fps must be >= 0");
        }
    }
    let fps_cap = args
        .fps
        .filter(|fps| *fps > 0.0)
        .or_else(|| file.and_then(GlassConfigFile::fps_cap));
    let paused = args.paused || playback.is_some_and(|playback| playback.paused);
    let auto_path = args.auto_path || playback.is_some_and(|playback| playback.auto_path);

    let (mode, policy) = match &args.export {
        Some(path) => {
            let format = ExportFormat::from_path(path)?;
            let duration = args
                .duration
                .or_else(|| playback.and_then(|playback| playback.export_duration));
            let policy = RenderPolicy::Export {
                path: path.clone(),
                format,
                duration,
                fps: fps_cap.unwrap_or(DEFAULT_EXPORT_FPS),
                auto_path,
            };
            (RenderMode::Headless, policy)
        }
        None => {
            let policy = RenderPolicy::Animate {
                target_fps: fps_cap,
                paused,
                auto_path,
            };
            (RenderMode::Windowed, policy)
        }
    };

    Ok(RendererConfig {
        surface_size: args.size.unwrap_or(DEFAULT_SURFACE),
        device_pixel_ratio: args.dpr.unwrap_or(1.0),
        mode,
        background: args
            .background
            .clone()
            .map(BackgroundSource::Image)
            .unwrap_or_default(),
        anchor: args.anchor,
        config_path: loaded.map(|(path, _)| path.clone()),
        preset: args.preset.clone(),
        policy,
    })
}
