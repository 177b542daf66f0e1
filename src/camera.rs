use glam::{Vec2, Vec3};

use crate::ray::Ray;
use crate::sampling;

/// Pinhole / thin-lens camera. The view screen is a world-space rectangle
/// placed at the focus distance; rays are aimed through it and originate at
/// the pinhole or at a disc-sampled point on the lens.
pub struct Camera {
    origin: Vec3,
    direction: Vec3,
    camera_up: Vec3,
    camera_left: Vec3,
    viewscreen: Vec3,
    viewscreen_x: Vec3,
    viewscreen_y: Vec3,
    lens_size: f32,
    width: u32,
    height: u32,
}

impl Camera {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        position: Vec3,
        lookat: Vec3,
        up: Vec3,
        yview: f32,
        width: u32,
        height: u32,
        focus_plane: f32,
        lens_size: f32,
    ) -> Self {
        let xview = yview * width as f32 / height as f32;
        let direction = (lookat - position).normalize();
        let camera_left = up.cross(direction).normalize();
        let camera_up = camera_left.cross(direction).normalize();

        let viewscreen_x = -xview * camera_left * focus_plane;
        let viewscreen_y = yview * camera_up * focus_plane;
        let viewscreen =
            position + direction * focus_plane - 0.5 * viewscreen_y - 0.5 * viewscreen_x;

        Self {
            origin: position,
            direction,
            camera_up,
            camera_left,
            viewscreen,
            viewscreen_x,
            viewscreen_y,
            lens_size,
            width,
            height,
        }
    }

    pub fn is_pinhole(&self) -> bool {
        self.lens_size == 0.0
    }

    pub fn position(&self) -> Vec3 {
        self.origin
    }

    fn view_screen_point(&self, x: f32, y: f32) -> Vec3 {
        self.viewscreen + x * self.viewscreen_x + y * self.viewscreen_y
    }

    /// Ray from the pinhole through pixel (x, y) jittered by `sample`.
    pub fn pixel_ray(&self, x: u32, y: u32, sample: Vec2) -> Ray {
        let p = self.view_screen_point(
            (x as f32 + sample.x) / self.width as f32,
            (y as f32 + sample.y) / self.height as f32,
        );
        Ray::new(self.origin, p - self.origin)
    }

    /// Ray from a disc-sampled lens point through pixel (x, y). The focus
    /// plane coincides with the view screen, so focused geometry stays sharp.
    pub fn pixel_ray_lens(&self, x: u32, y: u32, sample: Vec2, lens_sample: Vec2) -> Ray {
        let p = self.view_screen_point(
            (x as f32 + sample.x) / self.width as f32,
            (y as f32 + sample.y) / self.height as f32,
        );
        let lens = sampling::square_to_disc(lens_sample) * self.lens_size;
        let origin = self.origin + lens.x * self.camera_left + lens.y * self.camera_up;
        Ray::new(origin, p - origin)
    }

    /// Projects a world direction from the camera origin back to pixel
    /// coordinates. Returns None when the direction misses the view screen.
    pub fn coords_from_direction(&self, dir: Vec3) -> Option<(u32, u32)> {
        let q = dir.dot(self.direction);
        if q < 0.0001 {
            return None; // parallel or behind
        }
        let t = (self.viewscreen - self.origin).dot(self.direction) / q;
        if t <= 0.0 {
            return None;
        }
        let p = self.origin + dir * t;

        let vp = p - self.viewscreen;
        let plen = vp.length();
        if plen <= 0.0 {
            return None;
        }
        let v1_cast = plen * vp.normalize().dot(self.viewscreen_x.normalize());
        let v2_cast = plen * vp.normalize().dot(self.viewscreen_y.normalize());
        let x_ratio = v1_cast / self.viewscreen_x.length();
        let y_ratio = v2_cast / self.viewscreen_y.length();

        if !(0.0..=1.0).contains(&x_ratio) || !(0.0..=1.0).contains(&y_ratio) {
            return None;
        }

        let x = ((self.width as f32 * x_ratio) as u32).min(self.width - 1);
        let y = ((self.height as f32 * y_ratio) as u32).min(self.height - 1);
        Some((x, y))
    }
}
