use std::borrow::Cow;

use anyhow::{bail, Result};
use wgpu::naga::ShaderStage;

/// Compiles the static full-screen triangle vertex shader.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> Result<wgpu::ShaderModule> {
    compile_glsl(
        device,
        "fullscreen triangle vertex",
        VERTEX_SHADER_GLSL,
        ShaderStage::Vertex,
    )
}

/// Compiles the glass fragment program.
pub(crate) fn compile_fragment_shader(device: &wgpu::Device) -> Result<wgpu::ShaderModule> {
    compile_glsl(
        device,
        "liquid glass fragment",
        GLASS_FRAGMENT_GLSL,
        ShaderStage::Fragment,
    )
}

/// Shader creation reports problems through the device error callback; the
/// validation scope turns them into an error the caller can act on.
fn compile_glsl(
    device: &wgpu::Device,
    label: &str,
    source: &'static str,
    stage: ShaderStage,
) -> Result<wgpu::ShaderModule> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(source),
            stage,
            defines: &[],
        },
    });
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        bail!("failed to compile {label}: {err}");
    }
    tracing::debug!(label, "compiled shader module");
    Ok(module)
}

/// Minimal full-screen triangle vertex shader.
const VERTEX_SHADER_GLSL: &str = r"#version 450
const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    gl_Position = vec4(positions[uint(gl_VertexIndex)], 0.0, 1.0);
}
";

/// Glass fragment program. Mirrors `shading::shade`; the uniform block
/// layout must match `GlassUniforms` in `gpu/uniforms.rs`.
///
/// `gl_FragCoord` already has a top-left origin and half-pixel centres, so
/// `uv` is the same value the CPU path derives for each output pixel.
const GLASS_FRAGMENT_GLSL: &str = r"#version 450
layout(location = 0) out vec4 out_color;

layout(std140, set = 0, binding = 0) uniform GlassParams {
    vec2 resolution;
    vec2 anchor;
    vec2 half_size;
    vec2 texel;
    float radius;
    float eta;
    float blur_radius;
    float distortion;
    float curvature;
    float edge_sharpness;
    float glow;
    float shadow;
} ubo;

layout(set = 0, binding = 1) uniform texture2D scene_texture;
layout(set = 0, binding = 2) uniform sampler scene_sampler;

// Explicit LOD: the background has a single mip and most samples sit behind
// the non-uniform `dist` branch.
vec4 scene(vec2 uv) {
    return textureLod(sampler2D(scene_texture, scene_sampler), uv, 0.0);
}

// The built-in smoothstep is undefined for edge0 >= edge1; the shadow term
// relies on the reversed form.
float glass_smoothstep(float edge0, float edge1, float x) {
    float t = clamp((x - edge0) / (edge1 - edge0), 0.0, 1.0);
    return t * t * (3.0 - 2.0 * t);
}

float region_sdf(vec2 p) {
    vec2 q = abs(p - ubo.anchor) - ubo.half_size + vec2(ubo.radius);
    return length(max(q, vec2(0.0))) - ubo.radius;
}

vec2 safe_normalize(vec2 v) {
    float len = length(v);
    return len > 0.0 ? v / len : vec2(0.0);
}

vec2 contour_normal(vec2 p) {
    float eps = 2.0;
    vec2 ex = vec2(eps, 0.0);
    vec2 ey = vec2(0.0, eps);
    vec2 exy = vec2(eps, eps);
    vec2 gradient = vec2(
        (region_sdf(p + ex) - region_sdf(p - ex)) * 0.5,
        (region_sdf(p + ey) - region_sdf(p - ey)) * 0.5
    );
    vec2 diagonal = vec2(region_sdf(p + exy) - region_sdf(p - exy));
    gradient = mix(gradient, diagonal, 0.25);
    return length(gradient) < 1e-3 ? vec2(0.0) : normalize(gradient);
}

vec3 blur(vec2 uv) {
    if (ubo.blur_radius <= 0.0) {
        return scene(uv).rgb;
    }
    vec2 spacing = ubo.texel * 2.0;
    vec3 sum = vec3(0.0);
    float total = 0.0;
    for (int x = -3; x <= 3; x++) {
        for (int y = -3; y <= 3; y++) {
            float weight = exp(-float(x * x + y * y) / (2.0 * ubo.blur_radius));
            sum += scene(uv + vec2(float(x), float(y)) * spacing).rgb * weight;
            total += weight;
        }
    }
    return sum / total;
}

void main() {
    vec2 uv = gl_FragCoord.xy / ubo.resolution;
    vec2 p = uv * ubo.resolution;
    float dist = region_sdf(p);
    if (dist > 1.0) {
        out_color = scene(uv);
        return;
    }

    vec2 local = (p - ubo.anchor) / ubo.half_size;
    local.y *= ubo.resolution.x / ubo.resolution.y;

    float r = clamp(length(local), 0.0, 1.0);
    vec2 dome_normal = r > 0.0 ? safe_normalize(local) * pow(r, ubo.curvature) : vec2(0.0);
    vec2 refract_vec = refract(-dome_normal, dome_normal, ubo.eta);
    vec2 curved_uv = uv + refract_vec * ubo.distortion;

    float falloff = exp(-abs(dist) * ubo.edge_sharpness);
    vec2 contour = contour_normal(p) * pow(falloff, 1.5);
    vec2 refract_contour = refract(vec2(0.0), contour, ubo.eta);
    vec2 contour_uv = uv + refract_contour * 0.35 * falloff;

    float edge_weight = glass_smoothstep(0.0, 1.0, abs(dist));
    float radial_weight = glass_smoothstep(0.5, 1.0, r);
    float w = clamp(edge_weight - radial_weight * 0.5, 0.0, 1.0);
    vec2 final_uv = mix(curved_uv, contour_uv, w);

    vec3 color = mix(scene(final_uv).rgb, blur(final_uv), 0.5);

    float edge_falloff = glass_smoothstep(0.01, 0.0, dist);
    float band = 1.0 - glass_smoothstep(-1.5, -0.2, local.y);
    color = mix(color, vec3(0.0), edge_falloff * band * ubo.shadow);

    float edge = 1.0 - glass_smoothstep(0.0, 0.03, -2.0 * dist);
    color = mix(color, vec3(0.7), edge * ubo.glow);

    out_color = vec4(color, 0.75);
}
";

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::naga::front::glsl::{Frontend, Options};
    use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};

    fn parse_and_validate(source: &str, stage: ShaderStage) {
        let module = Frontend::default()
            .parse(&Options::from(stage), source)
            .unwrap_or_else(|err| panic!("{stage:?} shader failed to parse: {err:?}"));
        Validator::new(ValidationFlags::all(), Capabilities::all())
            .validate(&module)
            .unwrap_or_else(|err| panic!("{stage:?} shader failed validation: {err:?}"));
    }

    #[test]
    fn vertex_shader_is_valid_glsl() {
        parse_and_validate(VERTEX_SHADER_GLSL, ShaderStage::Vertex);
    }

    #[test]
    fn fragment_shader_is_valid_glsl() {
        parse_and_validate(GLASS_FRAGMENT_GLSL, ShaderStage::Fragment);
    }

    #[test]
    fn dome_normal_skips_pow_at_the_centre() {
        assert!(GLASS_FRAGMENT_GLSL
            .contains("r > 0.0 ? safe_normalize(local) * pow(r, ubo.curvature) : vec2(0.0)"));
        assert!(!GLASS_FRAGMENT_GLSL.contains("float curv = pow("));
    }
}
