use std::f32::consts::PI;

use glam::{Quat, Vec2, Vec3};

/// Maps a unit-square sample to the unit disc, area-preserving.
pub fn square_to_disc(sample: Vec2) -> Vec2 {
    let r = sample.x.sqrt();
    let a = sample.y * 2.0 * PI;
    Vec2::new(r * a.sin(), r * a.cos())
}

/// Uniformly distributed direction on the unit sphere.
pub fn square_to_sphere_uniform(sample: Vec2) -> Vec3 {
    let z = sample.x * 2.0 - 1.0;
    let a = sample.y * 2.0 * PI;
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * a.cos(), r * a.sin(), z)
}

/// Cosine-distributed direction on the hemisphere with y > 0.
pub fn square_to_hemisphere_cosine(sample: Vec2) -> Vec3 {
    let p = square_to_disc(sample);
    let y = (1.0 - p.x * p.x - p.y * p.y).max(0.00001).sqrt();
    Vec3::new(p.x, y, p.y)
}

/// Cosine-distributed direction on the hemisphere with z > 0.
pub fn square_to_hemisphere_cosine_z(sample: Vec2) -> Vec3 {
    let p = square_to_disc(sample);
    let z = (1.0 - p.x * p.x - p.y * p.y).max(0.00001).sqrt();
    Vec3::new(p.x, p.y, z)
}

/// Uniformly distributed direction on the hemisphere with z > 0.
pub fn square_to_hemisphere_uniform_z(sample: Vec2) -> Vec3 {
    let z = sample.x;
    let phi = sample.y * 2.0 * PI;
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

/// Cosine-distributed direction around an arbitrary axis.
pub fn square_to_hemisphere_cosine_directed(sample: Vec2, direction: Vec3) -> Vec3 {
    rotation_from_y(direction) * square_to_hemisphere_cosine(sample)
}

/// Rotation carrying the +Y axis onto `dest`, for relocating canonical
/// hemisphere samples.
fn rotation_from_y(dest: Vec3) -> Quat {
    let dest = dest.normalize();
    let cos_theta = dest.y;
    if cos_theta < -1.0 + 0.00001 {
        // Opposite direction, any perpendicular axis works.
        return Quat::from_axis_angle(Vec3::X, PI);
    }
    let axis = Vec3::Y.cross(dest);
    let s = ((1.0 + cos_theta) * 2.0).sqrt();
    Quat::from_xyzw(axis.x / s, axis.y / s, axis.z / s, s * 0.5)
}

/// Splits one uniform sample into a Bernoulli decision and a fresh uniform
/// variate. Returns whether the sample fell within `probability`, rescaling
/// the sample to [0, 1) under the decided branch. Degenerate probabilities
/// leave the sample untouched.
pub fn decide_and_rescale(sample: &mut f32, probability: f32) -> bool {
    if probability == 0.0 || probability == 1.0 {
        return false;
    }
    if *sample < probability {
        *sample /= probability;
        true
    } else {
        *sample = (*sample - probability) / (1.0 - probability);
        false
    }
}

pub fn pcg_hash(input: u32) -> u32 {
    let state = input.wrapping_mul(747796405).wrapping_add(2891336453);
    let word = ((state >> ((state >> 28) + 4)) ^ state).wrapping_mul(277803737);
    (word >> 22) ^ word
}

/// Deterministic per-pixel seed from the image seed and pixel coordinates.
pub fn pixel_seed(seed: u32, x: u32, y: u32) -> u64 {
    let lo = pcg_hash(seed ^ pcg_hash(x));
    let hi = pcg_hash(lo ^ pcg_hash(y));
    ((hi as u64) << 32) | lo as u64
}
