use std::path::Path;

use glam::Vec2;
use image::DynamicImage;

use crate::color::Color;

/// An RGB pixel store with repeat wrapping, bilinear filtering and the
/// finite-difference slopes used for bump mapping.
pub struct Texture {
    width: usize,
    height: usize,
    data: Vec<Color>,
}

fn repeat(v: f32) -> f32 {
    v - v.floor()
}

impl Texture {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, data: vec![Color::BLACK; width * height] }
    }

    pub fn from_image(img: &DynamicImage) -> Self {
        let rgb = img.to_rgb8();
        let (width, height) = (rgb.width() as usize, rgb.height() as usize);
        let data = rgb
            .pixels()
            .map(|p| Color::new(p[0] as f32 / 255.0, p[1] as f32 / 255.0, p[2] as f32 / 255.0))
            .collect();
        Self { width, height, data }
    }

    pub fn from_path(path: &Path) -> Result<Self, image::ImageError> {
        Ok(Self::from_image(&image::open(path)?))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, c: Color) {
        self.data[y * self.width + x] = c;
    }

    /// Integer fetch with repeat wrapping.
    pub fn pixel(&self, x: i64, y: i64) -> Color {
        let x = x.rem_euclid(self.width as i64) as usize;
        let y = y.rem_euclid(self.height as i64) as usize;
        self.data[y * self.width + x]
    }

    /// Bilinear fetch at normalized coordinates with repeat wrapping.
    pub fn sample(&self, uv: Vec2) -> Color {
        let x = repeat(uv.x) * self.width as f32 - 0.5;
        let y = repeat(uv.y) * self.height as f32 - 0.5;
        let ix0 = x.floor() as i64;
        let iy0 = y.floor() as i64;
        let fx = x - x.floor();
        let fy = y - y.floor();

        let ix1 = if ix0 != self.width as i64 - 1 { ix0 + 1 } else { ix0 };
        let iy1 = if iy0 != self.height as i64 - 1 { iy0 + 1 } else { iy0 };
        let ix0 = ix0.max(0);
        let iy0 = iy0.max(0);

        let c00 = self.pixel(ix0, iy0);
        let c01 = self.pixel(ix1, iy0);
        let c10 = self.pixel(ix0, iy1);
        let c11 = self.pixel(ix1, iy1);

        let c0 = c00 * (1.0 - fx) + c01 * fx;
        let c1 = c10 * (1.0 - fx) + c11 * fx;
        c0 * (1.0 - fy) + c1 * fy
    }

    fn texel_coords(&self, uv: Vec2) -> (i64, i64) {
        let x = (repeat(uv.x) * self.width as f32 - 0.5).floor() as i64;
        let y = (repeat(uv.y) * self.height as f32 - 0.5).floor() as i64;
        (x.max(0), y.max(0))
    }

    fn brightness(c: Color) -> f32 {
        (c.r + c.g + c.b) / 3.0
    }

    /// Brightness difference towards the next texel to the right.
    pub fn slope_right(&self, uv: Vec2) -> f32 {
        let (x, y) = self.texel_coords(uv);
        let x2 = if x != self.width as i64 - 1 { x + 1 } else { x };
        Self::brightness(self.pixel(x, y)) - Self::brightness(self.pixel(x2, y))
    }

    /// Brightness difference towards the next texel below.
    pub fn slope_bottom(&self, uv: Vec2) -> f32 {
        let (x, y) = self.texel_coords(uv);
        let y2 = if y != self.height as i64 - 1 { y + 1 } else { y };
        Self::brightness(self.pixel(x, y)) - Self::brightness(self.pixel(x, y2))
    }

    /// Alternating stripe pattern, handy for synthetic scenes.
    pub fn fill_stripes(&mut self, size: usize, a: Color, b: Color) {
        for y in 0..self.height {
            for x in 0..self.width {
                let c = if (x / size + y / size) % 2 == 0 { a } else { b };
                self.set_pixel(x, y, c);
            }
        }
    }
}
