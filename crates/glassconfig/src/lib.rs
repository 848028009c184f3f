use std::fmt;
use std::ops::RangeInclusive;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

mod presets;
mod store;
mod stylesheet;

pub use presets::{default_preset, find_preset, Preset, PRESETS};
pub use store::ConfigStore;
pub use stylesheet::stylesheet;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
    #[error("invalid color '{0}'; expected #rrggbb")]
    Color(String),
}

/// Accepted domains for each tunable. Values outside these ranges are
/// rejected before they can reach the renderer.
pub mod limits {
    use std::ops::RangeInclusive;

    pub const REFRACTIVE_INDEX: RangeInclusive<f32> = 1.0..=2.4;
    pub const BLUR_RADIUS: RangeInclusive<f32> = 0.0..=10.0;
    pub const DISTORTION_STRENGTH: RangeInclusive<f32> = 0.0..=0.1;
    pub const CURVATURE: RangeInclusive<f32> = 0.0..=2.0;
    pub const EDGE_SHARPNESS: RangeInclusive<f32> = 0.0..=1.0;
    pub const GLOW_INTENSITY: RangeInclusive<f32> = 0.0..=1.0;
    pub const SHADOW_STRENGTH: RangeInclusive<f32> = 0.0..=0.5;
    pub const WIDTH: RangeInclusive<f32> = 200.0..=500.0;
    pub const HEIGHT: RangeInclusive<f32> = 150.0..=400.0;
    pub const BORDER_RADIUS: RangeInclusive<f32> = 0.0..=60.0;
}

/// Width and height of the glass region in device-independent pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 2]", into = "[f32; 2]")]
pub struct RegionSize {
    pub width: f32,
    pub height: f32,
}

impl RegionSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn min_side(&self) -> f32 {
        self.width.min(self.height)
    }
}

impl From<[f32; 2]> for RegionSize {
    fn from([width, height]: [f32; 2]) -> Self {
        Self { width, height }
    }
}

impl From<RegionSize> for [f32; 2] {
    fn from(size: RegionSize) -> Self {
        [size.width, size.height]
    }
}

/// Display color carried alongside the optical parameters. The shading math
/// never reads it; the stylesheet export does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn parse_hex(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if digits.len() != 6 || !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(ConfigError::Color(raw.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| ConfigError::Color(raw.to_string()))
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Comma separated channels, ready for `rgba(...)`.
    pub fn components(&self) -> String {
        format!("{}, {}, {}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::parse_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}

/// Immutable parameter set consumed by the shading pipeline. A running
/// session swaps the whole value at once through [`ConfigStore`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub refractive_index: f32,
    pub blur_radius: f32,
    pub distortion_strength: f32,
    pub curvature: f32,
    pub edge_sharpness: f32,
    pub glow_intensity: f32,
    pub shadow_strength: f32,
    pub size: RegionSize,
    pub border_radius: f32,
    pub background_color: Rgb,
    pub accent_color: Rgb,
}

impl Default for RenderConfig {
    fn default() -> Self {
        default_preset().config
    }
}

impl RenderConfig {
    /// Ratio of refractive indices used by `refract`, `1 / n`.
    pub fn eta(&self) -> f32 {
        1.0 / self.refractive_index
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range(
            "refractive_index",
            self.refractive_index,
            limits::REFRACTIVE_INDEX,
        )?;
        check_range("blur_radius", self.blur_radius, limits::BLUR_RADIUS)?;
        check_range(
            "distortion_strength",
            self.distortion_strength,
            limits::DISTORTION_STRENGTH,
        )?;
        check_range("curvature", self.curvature, limits::CURVATURE)?;
        check_range("edge_sharpness", self.edge_sharpness, limits::EDGE_SHARPNESS)?;
        check_range("glow_intensity", self.glow_intensity, limits::GLOW_INTENSITY)?;
        check_range(
            "shadow_strength",
            self.shadow_strength,
            limits::SHADOW_STRENGTH,
        )?;
        check_range("size.width", self.size.width, limits::WIDTH)?;
        check_range("size.height", self.size.height, limits::HEIGHT)?;
        check_range("border_radius", self.border_radius, limits::BORDER_RADIUS)?;

        let max_radius = self.size.min_side() / 2.0;
        if self.border_radius > max_radius {
            return Err(ConfigError::Invalid(format!(
                "border_radius {} exceeds half the smaller region side ({max_radius})",
                self.border_radius
            )));
        }

        Ok(())
    }
}

fn check_range(name: &str, value: f32, range: RangeInclusive<f32>) -> Result<(), ConfigError> {
    if range.contains(&value) {
        return Ok(());
    }
    Err(ConfigError::Invalid(format!(
        "{name} = {value} is outside {}..={}",
        range.start(),
        range.end()
    )))
}

/// On-disk configuration, `glass.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct GlassConfigFile {
    pub version: u32,
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    pub glass: GlassOverrides,
    #[serde(default)]
    pub playback: Playback,
}

impl Default for GlassConfigFile {
    fn default() -> Self {
        Self {
            version: 1,
            preset: None,
            glass: GlassOverrides::default(),
            playback: Playback::default(),
        }
    }
}

/// Per-field overrides applied on top of the selected preset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlassOverrides {
    pub refractive_index: Option<f32>,
    pub blur_radius: Option<f32>,
    pub distortion_strength: Option<f32>,
    pub curvature: Option<f32>,
    pub edge_sharpness: Option<f32>,
    pub glow_intensity: Option<f32>,
    pub shadow_strength: Option<f32>,
    pub size: Option<RegionSize>,
    pub border_radius: Option<f32>,
    pub background_color: Option<Rgb>,
    pub accent_color: Option<Rgb>,
}

impl GlassOverrides {
    pub fn apply(&self, base: RenderConfig) -> RenderConfig {
        RenderConfig {
            refractive_index: self.refractive_index.unwrap_or(base.refractive_index),
            blur_radius: self.blur_radius.unwrap_or(base.blur_radius),
            distortion_strength: self
                .distortion_strength
                .unwrap_or(base.distortion_strength),
            curvature: self.curvature.unwrap_or(base.curvature),
            edge_sharpness: self.edge_sharpness.unwrap_or(base.edge_sharpness),
            glow_intensity: self.glow_intensity.unwrap_or(base.glow_intensity),
            shadow_strength: self.shadow_strength.unwrap_or(base.shadow_strength),
            size: self.size.unwrap_or(base.size),
            border_radius: self.border_radius.unwrap_or(base.border_radius),
            background_color: self.background_color.unwrap_or(base.background_color),
            accent_color: self.accent_color.unwrap_or(base.accent_color),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Playback {
    /// Frame cap while playing; `0` or absent means one frame per refresh.
    #[serde(default)]
    pub fps: Option<f32>,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub auto_path: bool,
    #[serde(default, deserialize_with = "deserialize_duration_opt")]
    pub export_duration: Option<Duration>,
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs_f64(v)))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl GlassConfigFile {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: GlassConfigFile = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if let Some(fps) = self.playback.fps {
            if !(fps >= 0.0) {
                return Err(ConfigError::Invalid("playback.fps must be >= 0".into()));
            }
        }

        if let Some(duration) = self.playback.export_duration {
            if duration.is_zero() {
                return Err(ConfigError::Invalid(
                    "playback.export_duration must be greater than zero".into(),
                ));
            }
        }

        self.resolve().map(|_| ())
    }

    /// Builds the effective [`RenderConfig`]: `[glass]` overrides on top of
    /// the named preset, or the default preset when none is named.
    pub fn resolve(&self) -> Result<RenderConfig, ConfigError> {
        self.resolve_with_preset(None)
    }

    /// Like [`resolve`](Self::resolve) but `preset` replaces the file's own
    /// preset selection when given.
    pub fn resolve_with_preset(&self, preset: Option<&str>) -> Result<RenderConfig, ConfigError> {
        let base = match preset.or(self.preset.as_deref()) {
            Some(name) => {
                find_preset(name)
                    .ok_or_else(|| ConfigError::UnknownPreset(name.to_string()))?
                    .config
            }
            None => default_preset().config,
        };
        let config = self.glass.apply(base);
        config.validate()?;
        Ok(config)
    }

    /// `None` when no cap is configured.
    pub fn fps_cap(&self) -> Option<f32> {
        self.playback.fps.filter(|fps| *fps > 0.0)
    }
}
