use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use log::{debug, info};
use rayon::prelude::*;

use crate::camera::Camera;
use crate::config::RenderConfig;
use crate::film::Film;
use crate::path_tracer::PathTracer;
use crate::sampler::create_sampler;
use crate::sampling;
use crate::scene::Scene;

const TILE_SIZE: u32 = 32;
/// Dimension slots tabulated per sample; deeper paths fall back to
/// independent draws.
const SAMPLER_DIMS: u32 = 64;

#[derive(Clone, Copy, Debug)]
pub struct RenderTask {
    pub x0: u32,
    pub x1: u32,
    pub y0: u32,
    pub y1: u32,
}

pub fn make_tiles(width: u32, height: u32, tile: u32) -> Vec<RenderTask> {
    let mut tasks = Vec::new();
    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            tasks.push(RenderTask {
                x0: x,
                x1: (x + tile).min(width),
                y0: y,
                y1: (y + tile).min(height),
            });
            x += tile;
        }
        y += tile;
    }
    tasks
}

#[derive(Debug, Default)]
pub struct RenderStats {
    pub rays: AtomicU64,
    pub pixels: AtomicU64,
}

/// Renders the scene into the film with a pool of rayon workers, one tile
/// at a time. Workers hold their own sampler and counters; the committed
/// scene is queried concurrently without synchronization. Cancellation is
/// observed at tile boundaries: a tile that sees the flag publishes
/// nothing.
pub fn render(
    scene: &Scene,
    camera: &Camera,
    config: &RenderConfig,
    film: &Film,
    cancel: &AtomicBool,
) -> RenderStats {
    let tracer = PathTracer {
        scene,
        camera,
        depth: config.recursion_max,
        reverse: config.reverse,
        russian: config.russian,
        clamp: config.clamp,
        bumpmap_scale: config.bumpscale,
        force_fresnel: config.force_fresnell,
    };
    let stats = RenderStats::default();
    let tiles = make_tiles(film.width(), film.height(), TILE_SIZE);
    debug!("rendering {} tiles at {} samples/pixel", tiles.len(), config.multisample);

    tiles.par_iter().for_each(|task| {
        if cancel.load(Ordering::Relaxed) {
            return;
        }
        let mut rays = 0u64;
        let mut pixels = 0u64;
        for y in task.y0..task.y1 {
            for x in task.x0..task.x1 {
                let seed = sampling::pixel_seed(config.seed, x, y);
                let mut sampler =
                    create_sampler(config.sampler, seed, SAMPLER_DIMS, config.multisample);
                let result =
                    tracer.render_pixel(x, y, config.multisample, sampler.as_mut(), &mut rays);
                film.add(x, y, result.main_pixel, config.multisample);
                for (sx, sy, radiance) in result.side_effects {
                    film.splat(sx, sy, radiance);
                }
                pixels += 1;
            }
        }
        stats.rays.fetch_add(rays, Ordering::Relaxed);
        stats.pixels.fetch_add(pixels, Ordering::Relaxed);
    });

    info!(
        "rendered {} pixels with {} rays",
        stats.pixels.load(Ordering::Relaxed),
        stats.rays.load(Ordering::Relaxed)
    );
    stats
}
