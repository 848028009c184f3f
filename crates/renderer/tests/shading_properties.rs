use glam::{Vec2, Vec3, Vec4};
use glassconfig::{RegionSize, RenderConfig, PRESETS};
use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use renderer::shading::{blur, refract, shade, ShadingParams};
use renderer::texture::{RasterTexture, SceneTexture};
use renderer::ViewportState;
use scheduler::Anchor;

fn gradient_texture(width: u32, height: u32) -> RasterTexture {
    RasterTexture::new(RgbaImage::from_fn(width, height, |x, y| {
        let r = (x as f32 / (width - 1) as f32 * 255.0).round() as u8;
        let g = (y as f32 / (height - 1) as f32 * 255.0).round() as u8;
        Rgba([r, g, 96, 255])
    }))
}

fn noise_texture(width: u32, height: u32, seed: u64) -> RasterTexture {
    let mut rng = StdRng::seed_from_u64(seed);
    RasterTexture::new(RgbaImage::from_fn(width, height, |_, _| {
        Rgba([rng.gen(), rng.gen(), rng.gen(), 255])
    }))
}

/// Noise that is symmetric under a half-turn about the image centre.
fn point_symmetric_texture(size: u32, seed: u64) -> RasterTexture {
    let noise = noise_texture(size, size, seed);
    let source = noise.image();
    RasterTexture::new(RgbaImage::from_fn(size, size, |x, y| {
        let a = source.get_pixel(x, y);
        let b = source.get_pixel(size - 1 - x, size - 1 - y);
        Rgba([
            ((a[0] as u16 + b[0] as u16) / 2) as u8,
            ((a[1] as u16 + b[1] as u16) / 2) as u8,
            ((a[2] as u16 + b[2] as u16) / 2) as u8,
            255,
        ])
    }))
}

fn pure_water() -> RenderConfig {
    PRESETS[0].config
}

fn uv_at(params: &ShadingParams, p: Vec2) -> Vec2 {
    p / params.resolution
}

#[test]
fn far_outside_pixels_pass_through() {
    let texture = noise_texture(800, 600, 7);
    let viewport = ViewportState::new(800, 600, 1.0);
    let mut rng = StdRng::seed_from_u64(11);

    for preset in &PRESETS {
        let params = ShadingParams::new(&preset.config, &viewport, Anchor::new(400.0, 300.0));
        let mut checked = 0;
        while checked < 200 {
            let uv = Vec2::new(rng.gen(), rng.gen());
            if params.distance(uv * params.resolution) <= 1.0 {
                continue;
            }
            assert_eq!(shade(&params, &texture, uv), texture.sample(uv));
            checked += 1;
        }
    }
}

#[test]
fn flat_curvature_leaves_the_anchor_unbent() {
    let texture = noise_texture(800, 600, 5);
    let viewport = ViewportState::new(800, 600, 1.0);
    let mut config = pure_water();
    config.curvature = 0.0;
    let params = ShadingParams::new(&config, &viewport, Anchor::new(400.0, 300.0));
    let uv = uv_at(&params, params.anchor);

    let color = shade(&params, &texture, uv);
    assert!(color.is_finite());
    let expected = texture
        .sample(uv)
        .truncate()
        .lerp(blur(&texture, uv, params.blur_radius), 0.5);
    assert!((color.truncate() - expected).length() < 1e-5);
    assert_eq!(color.w, 0.75);
}

#[test]
fn colour_changes_gradually_across_the_edge() {
    let texture = gradient_texture(800, 600);
    let viewport = ViewportState::new(800, 600, 1.0);
    let mut config = pure_water();
    config.glow_intensity = 0.0;
    config.shadow_strength = 0.0;
    let params = ShadingParams::new(&config, &viewport, Anchor::new(400.0, 300.0));

    let outside = [0.9_f32, 0.95, 0.99, 1.0, 1.01];
    let samples: Vec<Vec3> = outside
        .iter()
        .map(|d| {
            let p = params.anchor + Vec2::new(params.half_size.x + d, 0.0);
            let dist = params.distance(p);
            assert!((dist - d).abs() < 1e-3, "expected dist {d}, got {dist}");
            shade(&params, &texture, uv_at(&params, p)).truncate()
        })
        .collect();

    for pair in samples.windows(2) {
        let jump = (pair[1] - pair[0]).abs().max_element();
        assert!(jump < 0.1, "colour jumped by {jump} between {:?} and {:?}", pair[0], pair[1]);
    }
}

#[test]
fn square_region_is_point_symmetric() {
    let texture = point_symmetric_texture(800, 3);
    let viewport = ViewportState::new(800, 800, 1.0);
    let mut config = pure_water();
    config.size = RegionSize::new(300.0, 300.0);
    config.border_radius = 40.0;
    config.shadow_strength = 0.0;
    let params = ShadingParams::new(&config, &viewport, Anchor::new(400.0, 400.0));
    let mut rng = StdRng::seed_from_u64(5);

    for _ in 0..100 {
        let delta = Vec2::new(rng.gen_range(-160.0..160.0), rng.gen_range(-160.0..160.0));
        let a = shade(&params, &texture, uv_at(&params, params.anchor + delta));
        let b = shade(&params, &texture, uv_at(&params, params.anchor - delta));
        let diff = (a - b).abs().max_element();
        assert!(diff < 2e-3, "asymmetry {diff} at offset {delta:?}");
    }
}

#[test]
fn shading_is_deterministic() {
    let texture = noise_texture(320, 240, 21);
    let viewport = ViewportState::new(1280, 720, 1.0);
    let mut rng = StdRng::seed_from_u64(8);

    for preset in &PRESETS {
        let params = ShadingParams::new(&preset.config, &viewport, Anchor::new(640.0, 360.0));
        for _ in 0..50 {
            let uv = Vec2::new(rng.gen(), rng.gen());
            assert_eq!(shade(&params, &texture, uv), shade(&params, &texture, uv));
        }
    }
}

#[test]
fn unit_refractive_index_does_not_bend_the_dome_ray() {
    let mut rng = StdRng::seed_from_u64(13);
    for _ in 0..100 {
        let n = Vec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)).normalize_or_zero()
            * rng.gen_range(0.0..1.0);
        let refracted = refract(-n, n, 1.0);
        assert!((refracted - (-n)).length() < 1e-5, "{refracted:?} vs {:?}", -n);
    }
}

#[test]
fn anchor_pixel_is_the_plain_sharp_blur_mix() {
    let texture = noise_texture(800, 600, 1);
    let viewport = ViewportState::new(800, 600, 1.0);
    let params = ShadingParams::new(&pure_water(), &viewport, Anchor::new(400.0, 300.0));

    let uv = uv_at(&params, params.anchor);
    let sharp = texture.sample(uv).truncate();
    let blurred = blur(&texture, uv, params.blur_radius);
    let expected = sharp.lerp(blurred, 0.5).extend(0.75);

    let actual = shade(&params, &texture, uv);
    assert!((actual - expected).abs().max_element() < 1e-5, "{actual:?} vs {expected:?}");
}

#[test]
fn zero_blur_radius_uses_the_sharp_sample() {
    let texture = noise_texture(64, 64, 2);
    let uv = Vec2::new(0.37, 0.61);
    assert_eq!(blur(&texture, uv, 0.0), texture.sample(uv).truncate());
}

#[test]
fn interior_alpha_is_constant() {
    let texture = noise_texture(200, 150, 4);
    let viewport = ViewportState::new(800, 600, 1.0);
    let params = ShadingParams::new(&pure_water(), &viewport, Anchor::new(400.0, 300.0));
    for p in [Vec2::new(400.0, 300.0), Vec2::new(300.0, 250.0), Vec2::new(540.0, 390.0)] {
        let color = shade(&params, &texture, uv_at(&params, p));
        assert_eq!(color.w, 0.75);
        assert!(color.cmpge(Vec4::ZERO).all() && color.cmple(Vec4::ONE).all());
    }
}

#[test]
fn compact_surfaces_clamp_the_region() {
    let viewport = ViewportState::new(390, 844, 1.0);
    let mut config = pure_water();
    config.size = RegionSize::new(500.0, 400.0);
    let params = ShadingParams::new(&config, &viewport, Anchor::new(195.0, 422.0));
    assert_eq!(params.half_size, Vec2::new(140.0, 90.0));
}
