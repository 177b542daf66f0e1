pub mod bxdf;
pub mod camera;
pub mod color;
pub mod config;
pub mod film;
pub mod kdtree;
pub mod ltc;
pub mod path_tracer;
pub mod ray;
pub mod render;
pub mod sampler;
pub mod sampling;
pub mod scene;
pub mod texture;
