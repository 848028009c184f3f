//! Reference background the glass refracts.
//!
//! The painted card is busy: a diagonal gradient, a fine grid,
//! rows of label blocks and saturated shapes make every bend of the glass
//! visible. `load_background` swaps it for any image the `image` crate can
//! decode.

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};

use crate::texture::RasterTexture;
use crate::types::BackgroundSource;

pub const BACKGROUND_WIDTH: u32 = 800;
pub const BACKGROUND_HEIGHT: u32 = 600;

const GRID_SPACING: u32 = 40;
const GRID_ALPHA: f32 = 0.1;
const LABEL_ALPHA: f32 = 0.3;
const INSET_ALPHA: f32 = 0.2;
const INSET: f32 = 5.0;
/// Monospace advance as a fraction of the font size.
const GLYPH_ADVANCE: f32 = 0.6;
const GLYPH_HEIGHT: f32 = 0.7;

const GRADIENT_STOPS: [(f32, [u8; 3]); 4] = [
    (0.0, [0x1e, 0x3a, 0x8a]),
    (0.3, [0x37, 0x30, 0xa3]),
    (0.6, [0x7c, 0x2d, 0x12]),
    (1.0, [0xbe, 0x12, 0x3c]),
];

/// `(x, baseline, font size, text)`
const LABELS: [(f32, f32, f32, &str); 6] = [
    (50.0, 100.0, 24.0, "LIQUID GLASS DISTORTION TEST"),
    (50.0, 140.0, 24.0, "REFRACTIVE INDEX: 1.33 - 2.4"),
    (50.0, 180.0, 24.0, "OPTICAL PHYSICS SIMULATION"),
    (50.0, 220.0, 16.0, "Background elements for distortion testing"),
    (50.0, 250.0, 16.0, "Watch how text bends through liquid glass"),
    (50.0, 280.0, 16.0, "Mathematical refraction in real-time"),
];

/// `(x, y, width, height, color)`
const SHAPES: [(f32, f32, f32, f32, [u8; 3]); 5] = [
    (600.0, 100.0, 80.0, 80.0, [0xef, 0x44, 0x44]),
    (650.0, 200.0, 60.0, 60.0, [0x22, 0xc5, 0x5e]),
    (580.0, 300.0, 100.0, 40.0, [0x3b, 0x82, 0xf6]),
    (620.0, 400.0, 70.0, 70.0, [0xa8, 0x55, 0xf7]),
    (550.0, 500.0, 90.0, 50.0, [0xf5, 0x9e, 0x0b]),
];

/// `(cx, cy, radius, color)`
const DISCS: [(f32, f32, f32, [u8; 3]); 3] = [
    (150.0, 350.0, 40.0, [0x06, 0xb6, 0xd4]),
    (250.0, 450.0, 30.0, [0xec, 0x48, 0x99]),
    (350.0, 380.0, 50.0, [0x84, 0xcc, 0x16]),
];

const WHITE: [u8; 3] = [0xff, 0xff, 0xff];

/// Resolves the configured background into a texture. A missing or
/// undecodable image falls back to the painted card.
pub fn load_background(source: &BackgroundSource) -> RasterTexture {
    match source {
        BackgroundSource::Painted => RasterTexture::new(paint_reference()),
        BackgroundSource::Image(path) => match open_image(path) {
            Ok(image) => {
                tracing::debug!(
                    path = %path.display(),
                    width = image.width(),
                    height = image.height(),
                    "loaded background image"
                );
                RasterTexture::new(image)
            }
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %format!("{err:#}"),
                    "background image unavailable; using the painted background"
                );
                RasterTexture::new(paint_reference())
            }
        },
    }
}

fn open_image(path: &std::path::Path) -> Result<RgbaImage> {
    let image = image::open(path)
        .with_context(|| format!("failed to decode {}", path.display()))?
        .to_rgba8();
    if image.width() == 0 || image.height() == 0 {
        anyhow::bail!("{} has no pixels", path.display());
    }
    Ok(image)
}

/// Paints the 800x600 test card.
pub fn paint_reference() -> RgbaImage {
    let mut canvas = RgbaImage::from_fn(BACKGROUND_WIDTH, BACKGROUND_HEIGHT, |x, y| {
        let [r, g, b] = gradient_at(x as f32 + 0.5, y as f32 + 0.5);
        Rgba([r, g, b, 255])
    });

    for x in (0..BACKGROUND_WIDTH).step_by(GRID_SPACING as usize) {
        for y in 0..BACKGROUND_HEIGHT {
            blend(&mut canvas, x, y, WHITE, GRID_ALPHA);
        }
    }
    for y in (0..BACKGROUND_HEIGHT).step_by(GRID_SPACING as usize) {
        for x in 0..BACKGROUND_WIDTH {
            blend(&mut canvas, x, y, WHITE, GRID_ALPHA);
        }
    }

    for (x, baseline, size, text) in LABELS {
        paint_label(&mut canvas, x, baseline, size, text);
    }

    for (x, y, width, height, color) in SHAPES {
        fill_rect(&mut canvas, x, y, width, height, color, 1.0);
        fill_rect(
            &mut canvas,
            x + INSET,
            y + INSET,
            width - 2.0 * INSET,
            height - 2.0 * INSET,
            WHITE,
            INSET_ALPHA,
        );
    }

    for (cx, cy, radius, color) in DISCS {
        paint_disc(&mut canvas, cx, cy, radius, color);
    }

    canvas
}

/// Gradient along the canvas diagonal from the top-left to the bottom-right.
fn gradient_at(x: f32, y: f32) -> [u8; 3] {
    let dx = BACKGROUND_WIDTH as f32;
    let dy = BACKGROUND_HEIGHT as f32;
    let t = ((x * dx + y * dy) / (dx * dx + dy * dy)).clamp(0.0, 1.0);

    let mut lower = GRADIENT_STOPS[0];
    for upper in GRADIENT_STOPS.iter().skip(1) {
        if t <= upper.0 {
            let span = upper.0 - lower.0;
            let f = if span > 0.0 { (t - lower.0) / span } else { 0.0 };
            return mix_rgb(lower.1, upper.1, f);
        }
        lower = *upper;
    }
    lower.1
}

fn mix_rgb(a: [u8; 3], b: [u8; 3], t: f32) -> [u8; 3] {
    std::array::from_fn(|i| (a[i] as f32 + (b[i] as f32 - a[i] as f32) * t).round() as u8)
}

/// Source-over blend of an opaque color at `alpha` into an opaque canvas.
fn blend(canvas: &mut RgbaImage, x: u32, y: u32, color: [u8; 3], alpha: f32) {
    if x >= canvas.width() || y >= canvas.height() || alpha <= 0.0 {
        return;
    }
    let pixel = canvas.get_pixel_mut(x, y);
    let [r, g, b] = mix_rgb([pixel[0], pixel[1], pixel[2]], color, alpha.min(1.0));
    *pixel = Rgba([r, g, b, 255]);
}

fn fill_rect(
    canvas: &mut RgbaImage,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    color: [u8; 3],
    alpha: f32,
) {
    if width <= 0.0 || height <= 0.0 {
        return;
    }
    let x0 = x.max(0.0).round() as u32;
    let y0 = y.max(0.0).round() as u32;
    let x1 = (x + width).max(0.0).round() as u32;
    let y1 = (y + height).max(0.0).round() as u32;
    for py in y0..y1 {
        for px in x0..x1 {
            blend(canvas, px, py, color, alpha);
        }
    }
}

/// Each visible character becomes a solid block sitting on the baseline, so
/// the rows keep their rhythm without a font rasterizer.
fn paint_label(canvas: &mut RgbaImage, x: f32, baseline: f32, size: f32, text: &str) {
    let advance = size * GLYPH_ADVANCE;
    let glyph_width = (advance - size * 0.1).max(1.0);
    let glyph_height = size * GLYPH_HEIGHT;
    for (index, ch) in text.chars().enumerate() {
        if ch.is_whitespace() {
            continue;
        }
        let left = x + index as f32 * advance;
        fill_rect(
            canvas,
            left,
            baseline - glyph_height,
            glyph_width,
            glyph_height,
            WHITE,
            LABEL_ALPHA,
        );
    }
}

/// Radial gradient from `color` at the centre to fully transparent at
/// `radius`.
fn paint_disc(canvas: &mut RgbaImage, cx: f32, cy: f32, radius: f32, color: [u8; 3]) {
    let x0 = (cx - radius).floor().max(0.0) as u32;
    let y0 = (cy - radius).floor().max(0.0) as u32;
    let x1 = (cx + radius).ceil().max(0.0) as u32;
    let y1 = (cy + radius).ceil().max(0.0) as u32;
    for py in y0..=y1 {
        for px in x0..=x1 {
            let dx = px as f32 + 0.5 - cx;
            let dy = py as f32 + 0.5 - cy;
            let d = (dx * dx + dy * dy).sqrt();
            if d < radius {
                blend(canvas, px, py, color, 1.0 - d / radius);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn gradient_hits_its_stops() {
        assert_eq!(gradient_at(0.0, 0.0), [0x1e, 0x3a, 0x8a]);
        assert_eq!(gradient_at(800.0, 600.0), [0xbe, 0x12, 0x3c]);
        // t = 0.3 on the diagonal
        assert_eq!(gradient_at(240.0, 180.0), [0x37, 0x30, 0xa3]);
    }

    #[test]
    fn painted_card_is_opaque_and_sized() {
        let card = paint_reference();
        assert_eq!(card.dimensions(), (BACKGROUND_WIDTH, BACKGROUND_HEIGHT));
        assert!(card.pixels().all(|pixel| pixel[3] == 255));
    }

    #[test]
    fn shapes_are_painted_with_inset() {
        let card = paint_reference();
        // Red square border vs. its lighter inset.
        let border = card.get_pixel(601, 101);
        let inset = card.get_pixel(640, 140);
        assert_eq!(border.0, [0xef, 0x44, 0x44, 255]);
        assert!(inset[1] > border[1] && inset[2] > border[2]);
    }

    #[test]
    fn disc_centre_takes_full_color() {
        let card = paint_reference();
        let centre = card.get_pixel(150, 350);
        let expected = [0x06, 0xb6, 0xd4];
        for i in 0..3 {
            assert!((centre[i] as i32 - expected[i] as i32).abs() <= 8);
        }
    }

    #[test]
    fn missing_image_falls_back_to_painting() {
        let dir = TempDir::new().unwrap();
        let texture = load_background(&BackgroundSource::Image(dir.path().join("nope.png")));
        assert_eq!(texture.image(), &paint_reference());
    }

    #[test]
    fn loads_image_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("solid.png");
        RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();
        let texture = load_background(&BackgroundSource::Image(path));
        assert_eq!(texture.image().dimensions(), (4, 3));
        assert_eq!(texture.image().get_pixel(2, 1).0, [10, 20, 30, 255]);
    }
}
