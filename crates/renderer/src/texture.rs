use glam::{Vec2, Vec4};
use image::RgbaImage;

/// Sampleable background raster.
///
/// `uv` has its origin at the top-left; `(1, 1)` is the bottom-right corner.
/// Coordinates outside `[0, 1]` clamp to the edge texels.
pub trait SceneTexture {
    /// Size in texels.
    fn size(&self) -> (u32, u32);

    /// Filtered RGBA in `[0, 1]`.
    fn sample(&self, uv: Vec2) -> Vec4;

    /// Size of one texel in UV units.
    fn texel_size(&self) -> Vec2 {
        let (width, height) = self.size();
        Vec2::new(1.0 / width.max(1) as f32, 1.0 / height.max(1) as f32)
    }
}

/// RGBA8 raster with bilinear, clamp-to-edge filtering, matching the GPU
/// sampler the window uses.
#[derive(Debug, Clone)]
pub struct RasterTexture {
    image: RgbaImage,
}

impl RasterTexture {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    fn texel(&self, x: i64, y: i64) -> Vec4 {
        let (width, height) = self.image.dimensions();
        let x = x.clamp(0, i64::from(width) - 1) as u32;
        let y = y.clamp(0, i64::from(height) - 1) as u32;
        let [r, g, b, a] = self.image.get_pixel(x, y).0;
        Vec4::new(r as f32, g as f32, b as f32, a as f32) / 255.0
    }
}

impl From<RgbaImage> for RasterTexture {
    fn from(image: RgbaImage) -> Self {
        Self::new(image)
    }
}

impl SceneTexture for RasterTexture {
    fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn sample(&self, uv: Vec2) -> Vec4 {
        let (width, height) = self.image.dimensions();
        if width == 0 || height == 0 {
            return Vec4::ZERO;
        }
        // Texel centres sit at half-integer coordinates.
        let x = uv.x * width as f32 - 0.5;
        let y = uv.y * height as f32 - 0.5;
        if !x.is_finite() || !y.is_finite() {
            return self.texel(0, 0);
        }
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (ix, iy) = (x0 as i64, y0 as i64);

        let top = self.texel(ix, iy).lerp(self.texel(ix + 1, iy), fx);
        let bottom = self.texel(ix, iy + 1).lerp(self.texel(ix + 1, iy + 1), fx);
        top.lerp(bottom, fy)
    }
}
