use glam::Vec2;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

/// A deterministic per-pixel stream of stratified samples. Each call to
/// `get_1d`/`get_2d` consumes one/two dimension slots of the current sample;
/// `advance` begins the next sample within the multisample set.
pub trait Sampler {
    fn advance(&mut self);
    fn get_1d(&mut self) -> f32;
    fn get_2d(&mut self) -> Vec2 {
        Vec2::new(self.get_1d(), self.get_1d())
    }
    /// Dimension slots consumed since the last `advance`.
    fn usage(&self) -> u32;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum SamplerKind {
    #[serde(rename = "independent")]
    Independent,
    #[serde(rename = "stratified")]
    Stratified,
    #[serde(rename = "latin-hypercube")]
    LatinHypercube,
}

pub fn create_sampler(kind: SamplerKind, seed: u64, dims: u32, set_size: u32) -> Box<dyn Sampler> {
    match kind {
        SamplerKind::Independent => Box::new(IndependentSampler::new(seed)),
        SamplerKind::Stratified => Box::new(TableSampler::new(seed, dims, set_size, false)),
        SamplerKind::LatinHypercube => Box::new(TableSampler::new(seed, dims, set_size, true)),
    }
}

pub struct IndependentSampler {
    rng: SmallRng,
    used: u32,
}

impl IndependentSampler {
    pub fn new(seed: u64) -> Self {
        Self { rng: SmallRng::seed_from_u64(seed), used: 0 }
    }
}

impl Sampler for IndependentSampler {
    fn advance(&mut self) {
        self.used = 0;
    }

    fn get_1d(&mut self) -> f32 {
        self.used += 1;
        self.rng.gen::<f32>()
    }

    fn usage(&self) -> u32 {
        self.used
    }
}

/// Shared implementation of the stratified and Latin-hypercube samplers: a
/// per-dimension table of one stratum per set member, optionally shuffled so
/// strata decorrelate across dimensions. Dimensions beyond the table fall
/// back to independent draws.
pub struct TableSampler {
    samples: Vec<Vec<f32>>,
    dim_count: u32,
    set_size: u32,
    current_dim: u32,
    current_set: u32,
    shuffle: bool,
    rng: SmallRng,
}

impl TableSampler {
    pub fn new(seed: u64, dim_count: u32, set_size: u32, shuffle: bool) -> Self {
        let set_size = set_size.max(1);
        let mut sampler = Self {
            samples: Vec::new(),
            dim_count,
            set_size,
            current_dim: 0,
            current_set: u32::MAX,
            shuffle,
            rng: SmallRng::seed_from_u64(seed),
        };
        sampler.prepare();
        sampler
    }

    fn prepare(&mut self) {
        let set_size = self.set_size;
        self.samples = (0..self.dim_count)
            .map(|_| {
                let mut dim: Vec<f32> = (0..set_size)
                    .map(|i| (i as f32 + self.rng.gen::<f32>()) / set_size as f32)
                    .collect();
                if self.shuffle {
                    dim.shuffle(&mut self.rng);
                }
                dim
            })
            .collect();
    }
}

impl Sampler for TableSampler {
    fn advance(&mut self) {
        self.current_dim = 0;
        self.current_set = self.current_set.wrapping_add(1);
        if self.current_set >= self.set_size {
            self.prepare();
            self.current_set = 0;
        }
    }

    fn get_1d(&mut self) -> f32 {
        if self.current_dim < self.dim_count {
            let v = self.samples[self.current_dim as usize][self.current_set as usize];
            self.current_dim += 1;
            v
        } else {
            self.current_dim += 1;
            self.rng.gen::<f32>()
        }
    }

    fn usage(&self) -> u32 {
        self.current_dim
    }
}
