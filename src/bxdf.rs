use std::f32::consts::PI;

use glam::{Mat3, Quat, Vec2, Vec3};

use crate::color::Spectrum;
use crate::ltc::LtcFamily;
use crate::sampling;
use crate::scene::Scene;

/// How a sampled direction was importance-sampled; the path tracer uses this
/// to decide which of cosine, BxDF value and probability density still have
/// to be multiplied in (the rest cancel against the density).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SamplingStrategy {
    Uniform,
    Cosine,
    Brdf,
}

#[derive(Clone, Debug)]
pub enum Bxdf {
    /// Lambertian lobe, cosine-sampled.
    DiffuseCosine,
    /// Lambertian lobe, uniformly sampled.
    DiffuseUniform,
    /// Cook-Torrance specular over a diffuse base, cosine-sampled.
    CookTorrance { roughness: f32, f0: f32 },
    /// Energy-conserving Phong over a diffuse base, cosine-sampled.
    PhongEnergy { exponent: f32 },
    /// Delta reflection across the shading normal.
    Mirror,
    /// Convex combination of two arena materials; `amount` is the first's
    /// selection probability.
    Mix { first: usize, second: usize, amount: f32 },
    /// Linearly-transformed-cosine glossy lobe.
    Ltc { family: LtcFamily, roughness: f32 },
}

pub struct BxdfSample {
    pub direction: Vec3,
    pub transport: Spectrum,
    pub strategy: SamplingStrategy,
}

impl Bxdf {
    /// Cook-Torrance parameters from a Phong exponent and refraction index.
    pub fn cook_torrance(exponent: f32, ior: f32) -> Bxdf {
        let roughness = (2.0 / (2.0 + exponent.max(0.0))).sqrt();
        let f0 = ((ior - 1.0) / (ior + 1.0)).powi(2);
        Bxdf::CookTorrance { roughness, f0 }
    }

    /// LTC roughness from a Phong exponent.
    pub fn ltc(family: LtcFamily, exponent: f32) -> Bxdf {
        let roughness = (2.0 / (2.0 + exponent.max(0.0))).sqrt();
        Bxdf::Ltc { family, roughness }
    }

    /// Reflectance for the incoming/outgoing pair in the local frame (+Z is
    /// the shading normal, X is aligned with `vr`'s tangent-plane
    /// projection). Zero when either direction is in the lower hemisphere.
    pub fn value(&self, scene: &Scene, kd: Spectrum, ks: Spectrum, vi: Vec3, vr: Vec3, uv: Vec2) -> Spectrum {
        if vi.z <= 0.0 || vr.z <= 0.0 {
            return Spectrum::ZERO;
        }
        match *self {
            Bxdf::DiffuseCosine | Bxdf::DiffuseUniform => kd * (1.0 / PI),
            Bxdf::CookTorrance { roughness, f0 } => {
                kd * (1.0 / PI) + ks * cook_torrance_specular(vi, vr, roughness, f0)
            }
            Bxdf::PhongEnergy { exponent } => {
                let mirrored = Vec3::new(-vi.x, -vi.y, vi.z);
                let c = mirrored.dot(vr).max(0.0).powf(exponent);
                kd * (1.0 / PI) + ks * (c * (exponent + 2.0) / (2.0 * PI))
            }
            // A delta lobe never matches an arbitrary direction pair.
            Bxdf::Mirror => Spectrum::ZERO,
            Bxdf::Mix { first, second, amount } => {
                let (kd1, ks1) = scene.materials[first].colors_at(scene, uv);
                let (kd2, ks2) = scene.materials[second].colors_at(scene, uv);
                let v1 = scene.materials[first].bxdf.value(scene, kd1, ks1, vi, vr, uv);
                let v2 = scene.materials[second].bxdf.value(scene, kd2, ks2, vi, vr, uv);
                v1 * amount + v2 * (1.0 - amount)
            }
            Bxdf::Ltc { family, roughness } => ks * family.table().pdf(vr, vi, roughness),
        }
    }

    /// Importance-samples an outgoing direction for a viewer along `vr`
    /// (local frame). The transport weight folds in whatever the sampling
    /// density does not cancel.
    pub fn sample(&self, scene: &Scene, kd: Spectrum, ks: Spectrum, vr: Vec3, uv: Vec2, sample: Vec2) -> BxdfSample {
        match *self {
            Bxdf::DiffuseCosine | Bxdf::CookTorrance { .. } | Bxdf::PhongEnergy { .. } => BxdfSample {
                direction: sampling::square_to_hemisphere_cosine_z(sample),
                transport: Spectrum::ONE,
                strategy: SamplingStrategy::Cosine,
            },
            Bxdf::DiffuseUniform => BxdfSample {
                direction: sampling::square_to_hemisphere_uniform_z(sample),
                transport: Spectrum::ONE,
                strategy: SamplingStrategy::Uniform,
            },
            Bxdf::Mirror => BxdfSample {
                direction: Vec3::new(-vr.x, -vr.y, vr.z),
                transport: kd,
                strategy: SamplingStrategy::Brdf,
            },
            Bxdf::Mix { first, second, amount } => {
                let mut s = sample.x;
                let use_first = sampling::decide_and_rescale(&mut s, amount);
                let index = if use_first { first } else { second };
                let material = &scene.materials[index];
                let (kd_sub, ks_sub) = material.colors_at(scene, uv);
                material
                    .bxdf
                    .sample(scene, kd_sub, ks_sub, vr, uv, Vec2::new(s, sample.y))
            }
            Bxdf::Ltc { family, roughness } => {
                let hemi = sampling::square_to_hemisphere_cosine_z(sample);
                let direction = family.table().sample(vr, roughness, hemi);
                // Below-hemisphere samples keep the direction but carry no
                // energy; the caller decides the path's fate.
                let transport = if direction.z <= 0.0 { Spectrum::ZERO } else { ks };
                BxdfSample { direction, transport, strategy: SamplingStrategy::Brdf }
            }
        }
    }
}

fn ggx_distribution(cos_h: f32, roughness: f32) -> f32 {
    let a2 = roughness * roughness;
    let denom = cos_h * cos_h * (a2 - 1.0) + 1.0;
    a2 / (PI * denom * denom).max(1e-6)
}

fn geometry_schlick_ggx(cos: f32, roughness: f32) -> f32 {
    let r = roughness * roughness / 8.0;
    cos / (cos * (1.0 - r) + r)
}

fn cook_torrance_specular(vi: Vec3, vr: Vec3, roughness: f32, f0: f32) -> f32 {
    let h = (vi + vr).normalize();
    let d = ggx_distribution(h.z, roughness);
    let g = geometry_schlick_ggx(vr.z, roughness) * geometry_schlick_ggx(vi.z, roughness);
    let f = f0 + (1.0 - f0) * (1.0 - h.dot(vr).max(0.0)).powi(5);
    d * g * f / (4.0 * vr.z * vi.z).max(1e-6)
}

/// Orthonormal shading frame with +Z along the normal and +X along the
/// anchor direction's tangent-plane projection.
pub struct TangentFrame {
    mat: Mat3,
}

impl TangentFrame {
    pub fn new(normal: Vec3, anchor: Vec3) -> Self {
        let t = normal.cross(anchor);
        let y = if t.length_squared() < 1e-8 {
            // Anchor is (anti)parallel to the normal, any frame will do.
            let arbitrary = Vec3::new(0.1, 0.5, 0.9);
            normal.cross(arbitrary).normalize()
        } else {
            t.normalize()
        };
        let x = y.cross(normal);
        Self { mat: Mat3::from_cols(x, y, normal) }
    }

    pub fn to_local(&self, v: Vec3) -> Vec3 {
        self.mat.transpose() * v
    }

    pub fn to_world(&self, v: Vec3) -> Vec3 {
        self.mat * v
    }
}

/// Exact unpolarized dielectric Fresnel reflectance.
pub fn fresnel(i: Vec3, n: Vec3, ior: f32) -> f32 {
    let cosi = i.dot(n);
    let (etai, etat) = if cosi > 0.0 { (ior, 1.0) } else { (1.0, ior) };
    // Snell's law
    let sint = etai / etat * (1.0 - cosi * cosi).max(0.0).sqrt();
    if sint >= 1.0 {
        // Total internal reflection
        1.0
    } else {
        let cost = (1.0 - sint * sint).max(0.0).sqrt();
        let cosi = cosi.abs();
        let rs = (etat * cosi - etai * cost) / (etat * cosi + etai * cost);
        let rp = (etai * cosi - etat * cost) / (etai * cosi + etat * cost);
        (rs * rs + rp * rp) / 2.0
    }
}

/// Refracts `incident` (pointing away from the surface) through a boundary
/// with relative index `ior`. Returns None on total internal reflection.
pub fn refract(incident: Vec3, n: Vec3, ior: f32) -> Option<Vec3> {
    if incident.dot(n) > 0.999 {
        return Some(-incident);
    }
    let tangent = n.cross(incident).normalize();
    let cos1 = incident.dot(n);
    let sin1 = (1.0 - cos1 * cos1).max(0.0).sqrt();
    let sin2 = sin1 * ior;
    if sin2 >= 1.0 {
        return None;
    }
    Some(Quat::from_axis_angle(tangent, sin2.asin()) * -n)
}
