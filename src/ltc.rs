use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use glam::{Mat3, Vec3};
use lazy_static::lazy_static;
use log::debug;

/// Table resolution along both the incidence-angle and √roughness axes.
pub const TABLE_SIZE: usize = 32;

/// Roughness floor for the fit; sharper lobes than this are not resolvable
/// by the fitting quadrature and clamp to it.
const MIN_FIT_ALPHA: f32 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LtcFamily {
    Beckmann,
    Ggx,
}

impl LtcFamily {
    pub fn table(self) -> &'static LtcTable {
        match self {
            LtcFamily::Beckmann => &LTC_BECKMANN,
            LtcFamily::Ggx => &LTC_GGX,
        }
    }
}

lazy_static! {
    pub static ref LTC_BECKMANN: LtcTable = LtcTable::fit(LtcFamily::Beckmann, TABLE_SIZE);
    pub static ref LTC_GGX: LtcTable = LtcTable::fit(LtcFamily::Ggx, TABLE_SIZE);
}

/// A fitted table of linearly-transformed-cosine lobes: one 3×3 transform
/// and one amplitude per (incidence angle, √roughness) cell, looked up with
/// bilinear interpolation.
///
/// All directions are in the local shading frame: +Z is the shading normal
/// and the anchoring direction lies in the XZ plane with positive X.
pub struct LtcTable {
    size: usize,
    mats: Vec<Mat3>,
    amps: Vec<f32>,
}

impl LtcTable {
    fn lookup(&self, theta: f32, alpha: f32) -> (Mat3, f32) {
        let size = self.size;
        let mut t = (theta / FRAC_PI_2).clamp(0.0, 1.0);
        let mut a = alpha.max(0.0).sqrt().clamp(0.0, 1.0);
        if t >= 1.0 {
            t = 0.999;
        }
        if a >= 1.0 {
            a = 0.999;
        }
        let tf = t * size as f32;
        let af = a * size as f32;
        let t1 = tf as usize;
        let a1 = af as usize;
        let t2 = (t1 + 1).min(size - 1);
        let a2 = (a1 + 1).min(size - 1);
        let dt = tf - t1 as f32;
        let da = af - a1 as f32;

        let cell = |ti: usize, ai: usize| (self.mats[ai + ti * size], self.amps[ai + ti * size]);
        let (m11, a11) = cell(t1, a1);
        let (m12, a12) = cell(t1, a2);
        let (m21, a21) = cell(t2, a1);
        let (m22, a22) = cell(t2, a2);

        let m = m11 * ((1.0 - dt) * (1.0 - da))
            + m12 * ((1.0 - dt) * da)
            + m21 * (dt * (1.0 - da))
            + m22 * (dt * da);
        let amp = a11 * (1.0 - dt) * (1.0 - da)
            + a12 * (1.0 - dt) * da
            + a21 * dt * (1.0 - da)
            + a22 * dt * da;
        (m, amp)
    }

    /// Interpolated lobe energy at the given incidence angle and roughness;
    /// the density integrates to this over the sphere.
    pub fn amplitude(&self, theta: f32, alpha: f32) -> f32 {
        self.lookup(theta, alpha).1
    }

    /// Density of the fitted lobe in direction `dir`, anchored at `anchor`
    /// (both unit, local frame). The transform is inverted to pull `dir`
    /// back into cosine-lobe space; the Jacobian detM / ‖M·L₀‖³ rescales the
    /// density, and the amplitude restores the lobe's energy.
    pub fn pdf(&self, anchor: Vec3, dir: Vec3, alpha: f32) -> f32 {
        let theta = anchor.z.clamp(-1.0, 1.0).acos();
        let (m, amp) = self.lookup(theta, alpha);
        let w = m.inverse() * dir;
        let len = w.length();
        if !len.is_finite() || len <= 0.0 {
            return 0.0;
        }
        let original = w / len;
        let transformed = m * original;
        let jacobian = m.determinant() / transformed.length().powi(3);
        if jacobian.abs() < 1e-12 {
            return 0.0;
        }
        let d = original.z.max(0.0) / PI;
        amp * d / jacobian
    }

    /// Transforms a cosine-distributed hemisphere direction through the
    /// fitted lobe. The tabulated incidence is clamped to π/4 on this path.
    pub fn sample(&self, anchor: Vec3, alpha: f32, hemi: Vec3) -> Vec3 {
        let theta = anchor.z.clamp(-1.0, 1.0).acos().max(FRAC_PI_4);
        let (m, _) = self.lookup(theta, alpha);
        (m * hemi).normalize()
    }

    /// Fits the table against the normalized microfacet lobe of `family`.
    /// Each cell minimizes the L2 distance between the transformed cosine
    /// distribution and the masked microfacet distribution over a fixed
    /// hemisphere quadrature, warm-started from the neighbouring cell.
    pub fn fit(family: LtcFamily, size: usize) -> Self {
        let grid = hemisphere_grid(32, 32);
        let mut mats = vec![Mat3::IDENTITY; size * size];
        let mut amps = vec![1.0f32; size * size];
        let mut row_seed = [1.0f32, 1.0, 0.0, 0.0];

        for ti in 0..size {
            let theta = (ti as f32 / size as f32) * FRAC_PI_2;
            let view = Vec3::new(theta.sin(), 0.0, theta.cos());
            let mut guess = row_seed;

            for ai in (0..size).rev() {
                let a_param = ai as f32 / size as f32;
                let alpha = (a_param * a_param).max(MIN_FIT_ALPHA);

                let mut target = vec![0.0f32; grid.dirs.len()];
                let mut norm = 0.0f32;
                for (k, (&dir, &w)) in grid.dirs.iter().zip(&grid.weights).enumerate() {
                    let v = brdf_cos(family, view, dir, alpha);
                    target[k] = v;
                    norm += v * w;
                }
                let idx = ai + ti * size;
                if norm <= 0.0 || !norm.is_finite() {
                    mats[idx] = Mat3::IDENTITY;
                    amps[idx] = 0.0;
                    continue;
                }
                for t in target.iter_mut() {
                    *t /= norm;
                }

                let error = |p: &[f32; 4]| -> f32 {
                    let m = params_to_matrix(p);
                    let det = m.determinant();
                    if p[0] <= 1e-5 || p[1] <= 1e-5 || det <= 1e-7 {
                        return f32::MAX;
                    }
                    let minv = m.inverse();
                    let mut err = 0.0;
                    for (k, (&dir, &w)) in grid.dirs.iter().zip(&grid.weights).enumerate() {
                        let d = ltc_distribution(&minv, det, dir);
                        let diff = d - target[k];
                        err += diff * diff * w;
                    }
                    err
                };

                let fitted = nelder_mead(&error, guess, 0.05, 70);
                guess = fitted;
                if ai == size - 1 {
                    row_seed = fitted;
                }
                mats[idx] = params_to_matrix(&fitted);
                amps[idx] = norm;
            }
        }
        debug!("fitted {:?} LTC table, {}x{} cells", family, size, size);
        Self { size, mats, amps }
    }
}

/// Isotropic lobes need only four free entries; the last column's Z stays 1.
fn params_to_matrix(p: &[f32; 4]) -> Mat3 {
    Mat3::from_cols(
        Vec3::new(p[0], 0.0, p[3]),
        Vec3::new(0.0, p[1], 0.0),
        Vec3::new(p[2], 0.0, 1.0),
    )
}

/// Cosine lobe pushed through the inverse transform, with the change of
/// measure. Integrates to one over the sphere for any invertible transform.
fn ltc_distribution(minv: &Mat3, det: f32, dir: Vec3) -> f32 {
    let w = *minv * dir;
    let len = w.length();
    if len <= 0.0 {
        return 0.0;
    }
    let lo = w / len;
    (lo.z.max(0.0) / PI) / (det.abs() * len * len * len)
}

fn ndf(family: LtcFamily, cos_h: f32, alpha: f32) -> f32 {
    if cos_h <= 0.0 {
        return 0.0;
    }
    let c2 = cos_h * cos_h;
    match family {
        LtcFamily::Beckmann => {
            let t2 = (1.0 - c2) / c2;
            (-t2 / (alpha * alpha)).exp() / (PI * alpha * alpha * c2 * c2)
        }
        LtcFamily::Ggx => {
            let a2 = alpha * alpha;
            let d = c2 * (a2 - 1.0) + 1.0;
            a2 / (PI * d * d)
        }
    }
}

fn lambda(family: LtcFamily, cos: f32, alpha: f32) -> f32 {
    let cos = cos.clamp(1e-5, 1.0);
    let tan = (1.0 - cos * cos).sqrt() / cos;
    match family {
        LtcFamily::Beckmann => {
            if tan <= 0.0 {
                return 0.0;
            }
            let a = 1.0 / (alpha * tan);
            if a >= 1.6 {
                0.0
            } else {
                (1.0 - 1.259 * a + 0.396 * a * a) / (3.535 * a + 2.181 * a * a)
            }
        }
        LtcFamily::Ggx => ((1.0 + alpha * alpha * tan * tan).sqrt() - 1.0) * 0.5,
    }
}

/// Masked microfacet lobe times the outgoing cosine (D·G₂ / 4cosθᵥ), the
/// quantity the transformed cosine is fitted against.
fn brdf_cos(family: LtcFamily, v: Vec3, l: Vec3, alpha: f32) -> f32 {
    if v.z <= 0.0 || l.z <= 0.0 {
        return 0.0;
    }
    let h = (v + l).normalize();
    let d = ndf(family, h.z, alpha);
    let g2 = 1.0 / (1.0 + lambda(family, v.z, alpha) + lambda(family, l.z, alpha));
    d * g2 / (4.0 * v.z)
}

struct Grid {
    dirs: Vec<Vec3>,
    weights: Vec<f32>,
}

fn hemisphere_grid(n_theta: usize, n_phi: usize) -> Grid {
    let mut dirs = Vec::with_capacity(n_theta * n_phi);
    let mut weights = Vec::with_capacity(n_theta * n_phi);
    let d_theta = FRAC_PI_2 / n_theta as f32;
    let d_phi = 2.0 * PI / n_phi as f32;
    for i in 0..n_theta {
        let theta = (i as f32 + 0.5) * d_theta;
        for j in 0..n_phi {
            let phi = (j as f32 + 0.5) * d_phi;
            dirs.push(Vec3::new(
                theta.sin() * phi.cos(),
                theta.sin() * phi.sin(),
                theta.cos(),
            ));
            weights.push(theta.sin() * d_theta * d_phi);
        }
    }
    Grid { dirs, weights }
}

/// Downhill simplex in four dimensions.
fn nelder_mead<F: Fn(&[f32; 4]) -> f32>(
    f: &F,
    start: [f32; 4],
    step: f32,
    iterations: usize,
) -> [f32; 4] {
    const REFLECT: f32 = 1.0;
    const EXPAND: f32 = 2.0;
    const CONTRACT: f32 = 0.5;
    const SHRINK: f32 = 0.5;

    let mut simplex: Vec<([f32; 4], f32)> = Vec::with_capacity(5);
    simplex.push((start, f(&start)));
    for i in 0..4 {
        let mut v = start;
        v[i] += step;
        simplex.push((v, f(&v)));
    }

    for _ in 0..iterations {
        simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let mut centroid = [0.0f32; 4];
        for (v, _) in simplex.iter().take(4) {
            for i in 0..4 {
                centroid[i] += v[i] / 4.0;
            }
        }
        let worst = simplex[4];

        let mut reflected = [0.0f32; 4];
        for i in 0..4 {
            reflected[i] = centroid[i] + REFLECT * (centroid[i] - worst.0[i]);
        }
        let fr = f(&reflected);

        if fr < simplex[0].1 {
            let mut expanded = [0.0f32; 4];
            for i in 0..4 {
                expanded[i] = centroid[i] + EXPAND * (reflected[i] - centroid[i]);
            }
            let fe = f(&expanded);
            simplex[4] = if fe < fr { (expanded, fe) } else { (reflected, fr) };
        } else if fr < simplex[3].1 {
            simplex[4] = (reflected, fr);
        } else {
            let mut contracted = [0.0f32; 4];
            for i in 0..4 {
                contracted[i] = centroid[i] + CONTRACT * (worst.0[i] - centroid[i]);
            }
            let fc = f(&contracted);
            if fc < worst.1 {
                simplex[4] = (contracted, fc);
            } else {
                let best = simplex[0].0;
                for vertex in simplex.iter_mut().skip(1) {
                    for i in 0..4 {
                        vertex.0[i] = best[i] + SHRINK * (vertex.0[i] - best[i]);
                    }
                    vertex.1 = f(&vertex.0);
                }
            }
        }
    }

    simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    simplex[0].0
}
