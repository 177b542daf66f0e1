use glam::Vec3;

/// A ray clipped to the parametric interval `[near, far]`.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub near: f32,
    pub far: f32,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
            near: 0.0,
            far: f32::INFINITY,
        }
    }

    /// Ray covering the segment from `from` to `to`, with `slack` shaved off
    /// both ends. Used for visibility queries between two surface points.
    pub fn segment(from: Vec3, to: Vec3, slack: f32) -> Self {
        let length = from.distance(to);
        Self {
            origin: from,
            direction: (to - from) / length,
            near: slack,
            far: length - slack,
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}
