use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::shading::ShadingParams;

/// `GlassParams` uniform block. std140 packs the four `vec2`s first, then
/// the eight floats, with no padding: 64 bytes total.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct GlassUniforms {
    pub resolution: [f32; 2],
    pub anchor: [f32; 2],
    pub half_size: [f32; 2],
    pub texel: [f32; 2],
    pub radius: f32,
    pub eta: f32,
    pub blur_radius: f32,
    pub distortion: f32,
    pub curvature: f32,
    pub edge_sharpness: f32,
    pub glow: f32,
    pub shadow: f32,
}

impl GlassUniforms {
    /// `texel` is the background texel size in UV units.
    pub fn new(params: &ShadingParams, texel: Vec2) -> Self {
        Self {
            resolution: params.resolution.to_array(),
            anchor: params.anchor.to_array(),
            half_size: params.half_size.to_array(),
            texel: texel.to_array(),
            radius: params.border_radius,
            eta: params.eta,
            blur_radius: params.blur_radius,
            distortion: params.distortion_strength,
            curvature: params.curvature,
            edge_sharpness: params.edge_sharpness,
            glow: params.glow_intensity,
            shadow: params.shadow_strength,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ViewportState;
    use glassconfig::RenderConfig;
    use scheduler::Anchor;

    #[test]
    fn block_is_64_bytes() {
        assert_eq!(std::mem::size_of::<GlassUniforms>(), 64);
    }

    #[test]
    fn fields_scale_with_device_pixel_ratio() {
        let viewport = ViewportState::new(1600, 1200, 2.0);
        let params = ShadingParams::new(&RenderConfig::default(), &viewport, Anchor::new(400.0, 300.0));
        let uniforms = GlassUniforms::new(&params, Vec2::new(1.0 / 800.0, 1.0 / 600.0));

        assert_eq!(uniforms.resolution, [1600.0, 1200.0]);
        assert_eq!(uniforms.anchor, [800.0, 600.0]);
        assert_eq!(uniforms.half_size, [300.0, 200.0]);
        assert_eq!(uniforms.radius, 40.0);
        assert!((uniforms.eta - 1.0 / 1.33).abs() < 1e-6);
    }
}
