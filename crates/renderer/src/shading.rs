//! CPU reference implementation of the glass shader.
//!
//! Every frame evaluates the same pure function per output pixel:
//!
//! ```text
//!   pixel ──▶ rounded-box SDF ──┬─ dist > 1 ─────────────────────────▶ background
//!                               └─ dome refraction ┐
//!                                  contour refraction ┴▶ blend UV ─▶ sharp + 7x7 blur
//!                                                                    ─▶ shadow ─▶ glow
//! ```
//!
//! All geometry is handled in device pixels. The fragment shader in
//! `compile.rs` mirrors this file line for line; keep them in sync.

use glam::{Vec2, Vec3, Vec4};
use glassconfig::RenderConfig;
use scheduler::Anchor;

use crate::texture::SceneTexture;
use crate::types::{ViewportState, COMPACT_REGION_LIMIT};

/// Alpha written inside the glass region.
pub const GLASS_ALPHA: f32 = 0.75;
/// Pixels further than this outside the region are passed through untouched.
pub const PASS_THROUGH_DISTANCE: f32 = 1.0;
/// Finite-difference step for the contour normal, in device pixels.
pub const NORMAL_EPSILON: f32 = 2.0;
/// Blur taps run from `-BLUR_EXTENT` to `BLUR_EXTENT` on both axes.
pub const BLUR_EXTENT: i32 = 3;
/// Background texels between neighbouring blur taps.
pub const BLUR_TAP_SPACING: f32 = 2.0;
const CONTOUR_STRENGTH: f32 = 0.35;
const GLOW_COLOR: Vec3 = Vec3::splat(0.7);

/// Per-frame constants derived from a config snapshot, the viewport and the
/// anchor. Everything positional is in device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadingParams {
    pub resolution: Vec2,
    pub anchor: Vec2,
    pub half_size: Vec2,
    pub border_radius: f32,
    pub eta: f32,
    pub blur_radius: f32,
    pub distortion_strength: f32,
    pub curvature: f32,
    pub edge_sharpness: f32,
    pub glow_intensity: f32,
    pub shadow_strength: f32,
}

impl ShadingParams {
    pub fn new(config: &RenderConfig, viewport: &ViewportState, anchor: Anchor) -> Self {
        let dpr = viewport.device_pixel_ratio;
        let (width, height) = viewport.resolution_px;
        let mut size = Vec2::new(config.size.width, config.size.height);
        if viewport.is_compact() {
            size = size.min(Vec2::new(COMPACT_REGION_LIMIT.0, COMPACT_REGION_LIMIT.1));
        }
        Self {
            resolution: Vec2::new(width as f32, height as f32),
            anchor: Vec2::new(anchor.x, anchor.y) * dpr,
            half_size: size * 0.5 * dpr,
            border_radius: config.border_radius * dpr,
            eta: config.eta(),
            blur_radius: config.blur_radius,
            distortion_strength: config.distortion_strength,
            curvature: config.curvature,
            edge_sharpness: config.edge_sharpness,
            glow_intensity: config.glow_intensity,
            shadow_strength: config.shadow_strength,
        }
    }

    /// Signed distance of a device-pixel position to the region outline.
    pub fn distance(&self, p: Vec2) -> f32 {
        rounded_box_sdf(p, self.anchor, self.half_size, self.border_radius)
    }
}

/// GLSL `smoothstep`. Reversed edges (`edge0 > edge1`) produce the mirrored
/// curve rather than being reordered.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// GLSL `refract`. `normal` is used as given, without normalizing. Total
/// internal reflection yields the zero vector.
pub fn refract(incident: Vec2, normal: Vec2, eta: f32) -> Vec2 {
    let d = normal.dot(incident);
    let k = 1.0 - eta * eta * (1.0 - d * d);
    if k < 0.0 {
        Vec2::ZERO
    } else {
        eta * incident - (eta * d + k.sqrt()) * normal
    }
}

/// Rounded-box distance: `|max(|p - c| - h + r, 0)| - r`. Interior points
/// clamp to `-r` rather than going more negative.
pub fn rounded_box_sdf(p: Vec2, center: Vec2, half_size: Vec2, radius: f32) -> f32 {
    let q = (p - center).abs() - half_size + Vec2::splat(radius);
    q.max(Vec2::ZERO).length() - radius
}

/// Unit vector, or zero for a zero input (where `normalize` would be NaN).
pub fn safe_normalize(v: Vec2) -> Vec2 {
    v.normalize_or_zero()
}

/// Outward outline normal from central differences, with a quarter of the
/// diagonal difference mixed in to round off the corners.
pub fn contour_normal(params: &ShadingParams, p: Vec2) -> Vec2 {
    let ex = Vec2::new(NORMAL_EPSILON, 0.0);
    let ey = Vec2::new(0.0, NORMAL_EPSILON);
    let exy = Vec2::splat(NORMAL_EPSILON);

    let gradient = Vec2::new(
        (params.distance(p + ex) - params.distance(p - ex)) * 0.5,
        (params.distance(p + ey) - params.distance(p - ey)) * 0.5,
    );
    let diagonal = Vec2::splat(params.distance(p + exy) - params.distance(p - exy));
    let gradient = gradient.lerp(diagonal, 0.25);

    if gradient.length() < 1e-3 {
        Vec2::ZERO
    } else {
        gradient.normalize()
    }
}

/// Normalized 7x7 weighted average around `uv`, taps two background
/// texels apart. A zero radius collapses to the centre tap.
pub fn blur<T: SceneTexture + ?Sized>(texture: &T, uv: Vec2, blur_radius: f32) -> Vec3 {
    if blur_radius <= 0.0 {
        return texture.sample(uv).truncate();
    }
    let step = texture.texel_size() * BLUR_TAP_SPACING;
    let mut sum = Vec3::ZERO;
    let mut total = 0.0;
    for x in -BLUR_EXTENT..=BLUR_EXTENT {
        for y in -BLUR_EXTENT..=BLUR_EXTENT {
            let weight = (-((x * x + y * y) as f32) / (2.0 * blur_radius)).exp();
            let offset = Vec2::new(x as f32, y as f32) * step;
            sum += texture.sample(uv + offset).truncate() * weight;
            total += weight;
        }
    }
    sum / total
}

/// Shades the surface position `uv` (top-left origin, `[0, 1]`).
pub fn shade<T: SceneTexture + ?Sized>(params: &ShadingParams, texture: &T, uv: Vec2) -> Vec4 {
    let p = uv * params.resolution;
    let dist = params.distance(p);
    if dist > PASS_THROUGH_DISTANCE {
        return texture.sample(uv);
    }

    let mut local = (p - params.anchor) / params.half_size;
    local.y *= params.resolution.x / params.resolution.y;

    // Radial dome: strongest bend near the rim.
    // pow(0, 0) is undefined on the GPU, so the centre is flat.
    let r = local.length().clamp(0.0, 1.0);
    let dome_normal = if r > 0.0 {
        safe_normalize(local) * r.powf(params.curvature)
    } else {
        Vec2::ZERO
    };
    let refract_vec = refract(-dome_normal, dome_normal, params.eta);
    let curved_uv = uv + refract_vec * params.distortion_strength;

    // Edge contour: a thin lens hugging the outline.
    let falloff = (-dist.abs() * params.edge_sharpness).exp();
    let contour = contour_normal(params, p) * falloff.powf(1.5);
    let refract_contour = refract(Vec2::ZERO, contour, params.eta);
    let contour_uv = uv + refract_contour * CONTOUR_STRENGTH * falloff;

    let edge_weight = smoothstep(0.0, 1.0, dist.abs());
    let radial_weight = smoothstep(0.5, 1.0, r);
    let weight = (edge_weight - radial_weight * 0.5).clamp(0.0, 1.0);
    let final_uv = curved_uv.lerp(contour_uv, weight);

    let sharp = texture.sample(final_uv).truncate();
    let blurred = blur(texture, final_uv, params.blur_radius);
    let mut color = sharp.lerp(blurred, 0.5);

    let edge_falloff = smoothstep(0.01, 0.0, dist);
    let vertical_band = 1.0 - smoothstep(-1.5, -0.2, local.y);
    color = color.lerp(Vec3::ZERO, edge_falloff * vertical_band * params.shadow_strength);

    let edge = 1.0 - smoothstep(0.0, 0.03, -2.0 * dist);
    color = color.lerp(GLOW_COLOR, edge * params.glow_intensity);

    color.extend(GLASS_ALPHA)
}

/// Shades the centre of output pixel `(x, y)`.
pub fn shade_pixel<T: SceneTexture + ?Sized>(
    params: &ShadingParams,
    texture: &T,
    x: u32,
    y: u32,
) -> Vec4 {
    let uv = (Vec2::new(x as f32, y as f32) + Vec2::splat(0.5)) / params.resolution;
    shade(params, texture, uv)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothstep_matches_glsl() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert_eq!(smoothstep(0.0, 1.0, 0.5), 0.5);
        assert!((smoothstep(0.5, 1.0, 0.75) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn reversed_smoothstep_is_mirrored() {
        assert_eq!(smoothstep(0.01, 0.0, -5.0), 1.0);
        assert_eq!(smoothstep(0.01, 0.0, 0.5), 0.0);
        let mid = smoothstep(0.01, 0.0, 0.005);
        assert!((mid - 0.5).abs() < 1e-4);
    }

    #[test]
    fn refract_follows_glsl_formula() {
        let incident = Vec2::new(0.6, -0.8);
        let normal = Vec2::new(0.0, 1.0);
        let eta = 1.0 / 1.5;
        let d = normal.dot(incident);
        let k = 1.0 - eta * eta * (1.0 - d * d);
        let expected = eta * incident - (eta * d + k.sqrt()) * normal;
        assert!((refract(incident, normal, eta) - expected).length() < 1e-6);
    }

    #[test]
    fn refract_total_internal_reflection_is_zero() {
        let incident = Vec2::new(0.99, -0.1).normalize();
        let normal = Vec2::new(0.0, 1.0);
        assert_eq!(refract(incident, normal, 2.0), Vec2::ZERO);
    }

    #[test]
    fn refract_with_zero_incident() {
        let normal = Vec2::new(0.3, 0.4);
        let eta = 0.75_f32;
        let expected = -(1.0 - eta * eta).sqrt() * normal;
        assert!((refract(Vec2::ZERO, normal, eta) - expected).length() < 1e-6);
    }

    #[test]
    fn sdf_is_flat_inside_and_linear_outside() {
        let center = Vec2::new(100.0, 100.0);
        let half = Vec2::new(50.0, 30.0);
        assert_eq!(rounded_box_sdf(center, center, half, 10.0), -10.0);
        let right = rounded_box_sdf(Vec2::new(155.0, 100.0), center, half, 10.0);
        assert!((right - 5.0).abs() < 1e-5);
        let corner = rounded_box_sdf(Vec2::new(150.0, 130.0), center, half, 10.0);
        assert!((corner - (200.0_f32.sqrt() - 10.0)).abs() < 1e-4);
    }

    #[test]
    fn safe_normalize_handles_zero() {
        assert_eq!(safe_normalize(Vec2::ZERO), Vec2::ZERO);
        assert!((safe_normalize(Vec2::new(3.0, 4.0)) - Vec2::new(0.6, 0.8)).length() < 1e-6);
    }
}
