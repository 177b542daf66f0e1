use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::bxdf::Bxdf;
use crate::color::{Color, Radiance};
use crate::ltc::LtcFamily;
use crate::sampler::SamplerKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Default BxDF assigned to materials that do not carry their own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum DefaultBrdf {
    #[serde(rename = "diffuse")]
    Diffuse,
    #[serde(rename = "diffusecosine")]
    DiffuseCosine,
    #[serde(rename = "diffuseuniform")]
    DiffuseUniform,
    #[serde(rename = "cooktorr")]
    CookTorr,
    #[serde(rename = "phongenergy")]
    PhongEnergy,
    #[serde(rename = "ltc_beckmann")]
    LtcBeckmann,
    #[serde(rename = "ltc_ggx")]
    LtcGgx,
}

impl DefaultBrdf {
    /// Instantiates the BxDF for a material with the given Phong exponent
    /// and refraction index.
    pub fn instantiate(self, exponent: f32, ior: f32) -> Bxdf {
        match self {
            DefaultBrdf::Diffuse | DefaultBrdf::DiffuseCosine => Bxdf::DiffuseCosine,
            DefaultBrdf::DiffuseUniform => Bxdf::DiffuseUniform,
            DefaultBrdf::CookTorr => Bxdf::cook_torrance(exponent, ior),
            DefaultBrdf::PhongEnergy => Bxdf::PhongEnergy { exponent },
            DefaultBrdf::LtcBeckmann => Bxdf::ltc(LtcFamily::Beckmann, exponent),
            DefaultBrdf::LtcGgx => Bxdf::ltc(LtcFamily::Ggx, exponent),
        }
    }
}

/// Render options recognized by the core, with the loader's defaults.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub multisample: u32,
    pub recursion_max: u32,
    /// Maximum light-path depth; zero disables light paths.
    pub reverse: u32,
    /// Russian-roulette survival probability in (0, 1], or -1 to disable.
    pub russian: f32,
    pub clamp: f32,
    pub bumpscale: f32,
    pub force_fresnell: bool,
    /// Material-name substrings treated as thin glass.
    pub thinglass: Vec<String>,
    pub sky_color: [f32; 3],
    pub sky_intensity: f32,
    /// Lens radius; zero means pinhole.
    pub lens_size: f32,
    pub focus_plane: f32,
    pub brdf: DefaultBrdf,
    pub sampler: SamplerKind,
    pub seed: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            multisample: 1,
            recursion_max: 1,
            reverse: 0,
            russian: -1.0,
            clamp: 10000000.0,
            bumpscale: 1.0,
            force_fresnell: false,
            thinglass: Vec::new(),
            sky_color: [0.0, 0.0, 0.0],
            sky_intensity: 1.0,
            lens_size: 0.0,
            focus_plane: 1.0,
            brdf: DefaultBrdf::DiffuseCosine,
            sampler: SamplerKind::Stratified,
            seed: 42,
        }
    }
}

impl RenderConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: RenderConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid("resolution must be positive".into()));
        }
        if self.multisample < 1 {
            return Err(ConfigError::Invalid("multisample must be at least 1".into()));
        }
        if self.recursion_max < 1 {
            return Err(ConfigError::Invalid("recursion-max must be at least 1".into()));
        }
        if self.russian != -1.0 && !(0.0..=1.0).contains(&self.russian) {
            return Err(ConfigError::Invalid(
                "russian must lie in (0, 1] or be -1 to disable".into(),
            ));
        }
        if self.russian == 0.0 {
            return Err(ConfigError::Invalid("russian probability of 0 never survives".into()));
        }
        if self.clamp <= 0.0 {
            return Err(ConfigError::Invalid("clamp must be positive".into()));
        }
        if self.lens_size < 0.0 {
            return Err(ConfigError::Invalid("lens-size must be non-negative".into()));
        }
        if self.focus_plane <= 0.0 {
            return Err(ConfigError::Invalid("focus-plane must be positive".into()));
        }
        Ok(())
    }

    pub fn sky_radiance(&self) -> Radiance {
        Radiance::from(Color::new(
            self.sky_color[0],
            self.sky_color[1],
            self.sky_color[2],
        )) * self.sky_intensity
    }
}
