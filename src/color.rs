use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Sub};

use glam::Vec3;

/// Gamma exponent relating stored sRGB colors to linear radiance.
const GAMMA: f32 = 2.2;

/// An sRGB-encoded color with components nominally in [0, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0 };

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn sum(&self) -> f32 {
        self.r + self.g + self.b
    }
}

impl Mul<f32> for Color {
    type Output = Color;
    fn mul(self, q: f32) -> Color {
        Color::new(self.r * q, self.g * q, self.b * q)
    }
}

impl Mul<Color> for Color {
    type Output = Color;
    fn mul(self, o: Color) -> Color {
        Color::new(self.r * o.r, self.g * o.g, self.b * o.b)
    }
}

impl Add<Color> for Color {
    type Output = Color;
    fn add(self, o: Color) -> Color {
        Color::new(self.r + o.r, self.g + o.g, self.b + o.b)
    }
}

/// Linear-light RGB radiance. Unbounded, non-negative in well-formed paths.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Radiance {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// BxDF evaluation results and transport coefficients share the radiance
/// representation.
pub type Spectrum = Radiance;

impl Radiance {
    pub const ZERO: Radiance = Radiance { r: 0.0, g: 0.0, b: 0.0 };
    pub const ONE: Radiance = Radiance { r: 1.0, g: 1.0, b: 1.0 };

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn max_component(&self) -> f32 {
        self.r.max(self.g).max(self.b)
    }

    pub fn sum(&self) -> f32 {
        self.r + self.g + self.b
    }

    pub fn clamped(self, limit: f32) -> Self {
        Radiance::new(self.r.min(limit), self.g.min(limit), self.b.min(limit))
    }

    /// Replaces NaN and negative channels with zero.
    pub fn scrubbed(self) -> Self {
        let fix = |v: f32| if v.is_nan() || v < 0.0 { 0.0 } else { v };
        Radiance::new(fix(self.r), fix(self.g), fix(self.b))
    }

    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }

    /// Encodes back to an sRGB color, clamping to the displayable range.
    pub fn to_color(self) -> Color {
        let enc = |v: f32| v.clamp(0.0, 1.0).powf(1.0 / GAMMA);
        Color::new(enc(self.r), enc(self.g), enc(self.b))
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }
}

impl From<Color> for Radiance {
    fn from(c: Color) -> Radiance {
        Radiance::new(c.r.powf(GAMMA), c.g.powf(GAMMA), c.b.powf(GAMMA))
    }
}

impl Add<Radiance> for Radiance {
    type Output = Radiance;
    fn add(self, o: Radiance) -> Radiance {
        Radiance::new(self.r + o.r, self.g + o.g, self.b + o.b)
    }
}

impl AddAssign<Radiance> for Radiance {
    fn add_assign(&mut self, o: Radiance) {
        *self = *self + o;
    }
}

impl Sub<Radiance> for Radiance {
    type Output = Radiance;
    fn sub(self, o: Radiance) -> Radiance {
        Radiance::new(self.r - o.r, self.g - o.g, self.b - o.b)
    }
}

impl Mul<Radiance> for Radiance {
    type Output = Radiance;
    fn mul(self, o: Radiance) -> Radiance {
        Radiance::new(self.r * o.r, self.g * o.g, self.b * o.b)
    }
}

impl MulAssign<Radiance> for Radiance {
    fn mul_assign(&mut self, o: Radiance) {
        *self = *self * o;
    }
}

impl Mul<f32> for Radiance {
    type Output = Radiance;
    fn mul(self, q: f32) -> Radiance {
        Radiance::new(self.r * q, self.g * q, self.b * q)
    }
}

impl MulAssign<f32> for Radiance {
    fn mul_assign(&mut self, q: f32) {
        *self = *self * q;
    }
}

impl Div<f32> for Radiance {
    type Output = Radiance;
    fn div(self, q: f32) -> Radiance {
        Radiance::new(self.r / q, self.g / q, self.b / q)
    }
}

/// Componentwise filter by a raw color, without gamma expansion. This is how
/// thin-glass transmission tints the radiance passing through it.
impl Mul<Color> for Radiance {
    type Output = Radiance;
    fn mul(self, c: Color) -> Radiance {
        Radiance::new(self.r * c.r, self.g * c.g, self.b * c.b)
    }
}
