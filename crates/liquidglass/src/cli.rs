use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use scheduler::Anchor;

#[derive(Parser, Debug)]
#[command(
    name = "liquidglass",
    author,
    version,
    about = "Liquid glass refraction renderer",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Glass config file; defaults to `glass.toml` in the config directory.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Preset to start from (`pure-water`, `dense-glass`, `liquid-crystal`).
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Start with playback paused; frames are drawn only on input.
    #[arg(long)]
    pub paused: bool,

    /// Move the glass along the automatic path instead of following the pointer.
    #[arg(long)]
    pub auto_path: bool,

    /// Frame cap while playing (0=uncapped).
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Window or export resolution in physical pixels (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Device pixel ratio used for headless export.
    #[arg(long, value_name = "RATIO", value_parser = parse_dpr)]
    pub dpr: Option<f32>,

    /// Image to refract instead of the painted test card.
    #[arg(long, value_name = "IMAGE")]
    pub background: Option<PathBuf>,

    /// Initial glass position in logical pixels (e.g. `400,300`).
    #[arg(long, value_name = "X,Y", value_parser = parse_anchor)]
    pub anchor: Option<Anchor>,

    /// Render to the given PNG path without opening a window, then exit.
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Export a numbered frame sequence covering this much animation (e.g. `2s`).
    #[arg(long, value_name = "DURATION", value_parser = parse_duration, requires = "export")]
    pub duration: Option<Duration>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the built-in glass presets.
    Presets {
        /// Print the presets with their full parameters as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print a CSS approximation of the glass effect (backdrop filter, overlay and keyframes).
    Stylesheet {
        /// Glass config file to resolve; defaults to the discovered one.
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Preset to start from.
        #[arg(long, value_name = "NAME")]
        preset: Option<String>,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width '{}'", w.trim()))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height '{}'", h.trim()))?;
    if width == 0 || height == 0 {
        return Err("size must be greater than zero".into());
    }
    Ok((width, height))
}

pub fn parse_anchor(value: &str) -> Result<Anchor, String> {
    let (x, y) = value
        .trim()
        .split_once(',')
        .ok_or_else(|| "expected X,Y".to_string())?;
    let x = x
        .trim()
        .parse::<f32>()
        .map_err(|_| format!("invalid x coordinate '{}'", x.trim()))?;
    let y = y
        .trim()
        .parse::<f32>()
        .map_err(|_| format!("invalid y coordinate '{}'", y.trim()))?;
    if !x.is_finite() || !y.is_finite() {
        return Err("anchor coordinates must be finite".into());
    }
    Ok(Anchor::new(x, y))
}

pub fn parse_dpr(value: &str) -> Result<f32, String> {
    let ratio = value
        .trim()
        .parse::<f32>()
        .map_err(|_| format!("invalid pixel ratio '{}'", value.trim()))?;
    if !(ratio.is_finite() && ratio > 0.0) {
        return Err("pixel ratio must be positive".into());
    }
    Ok(ratio)
}

pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("duration must not be empty".into());
    }
    let duration = match trimmed.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => Duration::from_secs_f64(seconds),
        Ok(_) => return Err("duration must be non-negative".into()),
        Err(_) => humantime::parse_duration(trimmed)
            .map_err(|err| format!("invalid duration '{trimmed}': {err}"))?,
    };
    if duration.is_zero() {
        return Err("duration must be greater than zero".into());
    }
    Ok(duration)
}
