use crate::RenderConfig;

/// Renders a CSS approximation of the glass effect for `config`.
///
/// Browsers cannot refract, so the optical parameters are mapped onto
/// backdrop filters, an overlay gradient and a slow keyframe wobble. The
/// trailing comment keeps the real parameters alongside.
pub fn stylesheet(config: &RenderConfig) -> String {
    let blur = css_number(config.blur_radius);
    let saturate = css_number(1.0 + (config.refractive_index - 1.0) * 0.5);
    let contrast = css_number(1.0 + config.edge_sharpness * 0.3);
    let ellipse = css_number(100.0 + config.curvature * 50.0);
    let filters = format!("blur({blur}px) \n    saturate({saturate}) \n    contrast({contrast})");

    format!(
        "/* Liquid Glass CSS - shader approximation */
.liquid-glass {{
  position: relative;
  background: rgba({background}, 0.1);
  backdrop-filter:
    {filters};
  -webkit-backdrop-filter:
    {filters};
  border-radius: {radius}px;
  border: 1px solid rgba(255, 255, 255, 0.1);
  box-shadow:
    0 8px 32px rgba(0, 0, 0, {shadow}),
    inset 0 1px 0 rgba(255, 255, 255, {highlight});
  overflow: hidden;
}}

/* Refraction distortion layer */
.liquid-glass::before {{
  content: '';
  position: absolute;
  inset: -20%;
  background: radial-gradient(
    ellipse {ellipse}% {ellipse}% at 50% 50%,
    rgba({accent}, {overlay}) 0%,
    transparent 70%
  );
  filter: blur({overlay_blur}px);
  animation: liquidRefract 8s ease-in-out infinite;
}}

@keyframes liquidRefract {{
  0%, 100% {{ transform: rotate(0deg) scale(1); }}
  50% {{ transform: rotate({rotate}deg) scale({scale}); }}
}}

/* Shader parameters:
 * Refractive Index: {index} (eta: {eta:.3})
 * Distortion Strength: {distortion}
 * Curvature: {curvature}
 * Edge Sharpness: {sharpness}
 */",
        background = config.background_color.components(),
        radius = css_number(config.border_radius),
        shadow = css_number(config.shadow_strength),
        highlight = css_number(config.glow_intensity * 0.6),
        accent = config.accent_color.components(),
        overlay = css_number(config.distortion_strength * 10.0),
        overlay_blur = css_number(config.distortion_strength * 200.0),
        rotate = css_number(config.curvature * 180.0),
        scale = css_number(1.0 + config.distortion_strength * 5.0),
        index = css_number(config.refractive_index),
        eta = config.eta(),
        distortion = css_number(config.distortion_strength),
        curvature = css_number(config.curvature),
        sharpness = css_number(config.edge_sharpness),
    )
}

/// Formats with at most four decimals and no trailing zeros, so `f32`
/// noise like `1.1650000214` prints as `1.165`.
fn css_number(value: f32) -> String {
    let rounded = format!("{value:.4}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}
