use crate::{RegionSize, RenderConfig, Rgb};

/// Named parameter bundle. Applying one is an ordinary wholesale config
/// replacement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub config: RenderConfig,
}

impl Preset {
    /// Lowercase, dash separated form of the name (`pure-water`).
    pub fn slug(&self) -> String {
        self.name.to_ascii_lowercase().replace(' ', "-")
    }
}

pub const PRESETS: [Preset; 3] = [
    Preset {
        name: "Pure Water",
        config: RenderConfig {
            refractive_index: 1.33,
            blur_radius: 3.0,
            distortion_strength: 0.03,
            curvature: 1.0,
            edge_sharpness: 0.4,
            glow_intensity: 0.5,
            shadow_strength: 0.1,
            size: RegionSize::new(300.0, 200.0),
            border_radius: 20.0,
            background_color: Rgb::new(0xff, 0xff, 0xff),
            accent_color: Rgb::new(0x3b, 0x82, 0xf6),
        },
    },
    Preset {
        name: "Dense Glass",
        config: RenderConfig {
            refractive_index: 1.8,
            blur_radius: 4.0,
            distortion_strength: 0.05,
            curvature: 1.2,
            edge_sharpness: 0.6,
            glow_intensity: 0.7,
            shadow_strength: 0.15,
            size: RegionSize::new(320.0, 220.0),
            border_radius: 16.0,
            background_color: Rgb::new(0xf8, 0xfa, 0xfc),
            accent_color: Rgb::new(0x63, 0x66, 0xf1),
        },
    },
    Preset {
        name: "Liquid Crystal",
        config: RenderConfig {
            refractive_index: 1.5,
            blur_radius: 5.0,
            distortion_strength: 0.04,
            curvature: 0.8,
            edge_sharpness: 0.3,
            glow_intensity: 0.4,
            shadow_strength: 0.08,
            size: RegionSize::new(280.0, 180.0),
            border_radius: 32.0,
            background_color: Rgb::new(0xf0, 0xf9, 0xff),
            accent_color: Rgb::new(0x0e, 0xa5, 0xe9),
        },
    },
];

pub fn default_preset() -> &'static Preset {
    &PRESETS[0]
}

/// Looks a preset up by display name or slug, ignoring case. `_` and `-`
/// are accepted in place of spaces.
pub fn find_preset(name: &str) -> Option<&'static Preset> {
    let wanted = name.trim().to_ascii_lowercase().replace(['_', ' '], "-");
    PRESETS.iter().find(|preset| preset.slug() == wanted)
}
