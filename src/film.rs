use std::path::Path;

use parking_lot::Mutex;

use crate::color::Radiance;

struct FilmData {
    radiance: Vec<Radiance>,
    counts: Vec<u32>,
}

/// Shared per-pixel accumulator: radiance sums plus sample counts behind a
/// single mutex. Light-path splats from any worker may land on any pixel,
/// in any order; only the per-pixel sums matter.
pub struct Film {
    width: u32,
    height: u32,
    data: Mutex<FilmData>,
}

impl Film {
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width * height) as usize;
        Self {
            width,
            height,
            data: Mutex::new(FilmData {
                radiance: vec![Radiance::ZERO; len],
                counts: vec![0; len],
            }),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Adds a radiance sum with its sample count to a pixel.
    pub fn add(&self, x: u32, y: u32, radiance: Radiance, count: u32) {
        let idx = (y * self.width + x) as usize;
        let mut data = self.data.lock();
        data.radiance[idx] += radiance;
        data.counts[idx] += count;
    }

    /// Adds a light-path splat: pure radiance, no sample count.
    pub fn splat(&self, x: u32, y: u32, radiance: Radiance) {
        self.add(x, y, radiance, 0);
    }

    /// Count-normalized radiance of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Radiance {
        let idx = (y * self.width + x) as usize;
        let data = self.data.lock();
        data.radiance[idx] / data.counts[idx].max(1) as f32
    }

    /// Count-normalized snapshot of the whole frame.
    pub fn snapshot(&self) -> Vec<Radiance> {
        let data = self.data.lock();
        data.radiance
            .iter()
            .zip(&data.counts)
            .map(|(&r, &c)| r / c.max(1) as f32)
            .collect()
    }

    /// Writes the frame as an 8-bit sRGB PNG.
    pub fn write_png(&self, path: &Path) -> Result<(), image::ImageError> {
        let pixels = self.snapshot();
        let mut img = image::RgbImage::new(self.width, self.height);
        for (i, radiance) in pixels.iter().enumerate() {
            let c = radiance.scrubbed().to_color();
            let px = image::Rgb([
                (c.r * 255.0) as u8,
                (c.g * 255.0) as u8,
                (c.b * 255.0) as u8,
            ]);
            img.put_pixel(i as u32 % self.width, i as u32 / self.width, px);
        }
        img.save(path)
    }
}
