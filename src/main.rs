use std::f32::consts::{FRAC_PI_2, PI};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use glam::{Mat4, Quat, Vec3};
use log::{error, info};

use lumen::bxdf::Bxdf;
use lumen::camera::Camera;
use lumen::color::{Color, Radiance};
use lumen::config::RenderConfig;
use lumen::film::Film;
use lumen::ltc::LtcFamily;
use lumen::render;
use lumen::scene::{self, Material, Scene};

fn plane_at(scale: Vec3, rotation: Quat, translation: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale, rotation, translation)
}

/// A box room with an areal ceiling light, a glossy cube and a mirror cube.
fn build_scene(config: &RenderConfig) -> Result<Scene, scene::SceneError> {
    let mut scene = Scene::new();

    let colored = |name: &str, color: Color| Material {
        diffuse: color,
        exponent: 20.0,
        ior: 1.5,
        bxdf: config.brdf.instantiate(20.0, 1.5),
        ..Material::named(name)
    };
    scene.register_material(colored("white", Color::new(0.73, 0.73, 0.73)));
    scene.register_material(colored("red", Color::new(0.65, 0.05, 0.05)));
    scene.register_material(colored("green", Color::new(0.12, 0.45, 0.15)));
    scene.register_material(Material {
        diffuse: Color::new(0.78, 0.78, 0.78),
        emission: Radiance::new(12.0, 12.0, 12.0),
        ..Material::named("light")
    });
    scene.register_material(Material {
        diffuse: Color::new(0.9, 0.9, 0.9),
        bxdf: Bxdf::Mirror,
        ..Material::named("mirror")
    });
    scene.register_material(Material {
        specular: Color::new(0.85, 0.85, 0.85),
        exponent: 60.0,
        bxdf: Bxdf::ltc(LtcFamily::Ggx, 60.0),
        ..Material::named("glossy")
    });

    let quad = scene::unit_plane();
    let walls = Vec3::new(2.0, 1.0, 2.0);
    // floor, ceiling, back, left (red), right (green)
    scene.add_primitive(&quad, plane_at(walls, Quat::IDENTITY, Vec3::ZERO), "white")?;
    scene.add_primitive(
        &quad,
        plane_at(walls, Quat::from_rotation_z(PI), Vec3::new(0.0, 2.0, 0.0)),
        "white",
    )?;
    scene.add_primitive(
        &quad,
        plane_at(walls, Quat::from_rotation_x(FRAC_PI_2), Vec3::new(0.0, 1.0, -1.0)),
        "white",
    )?;
    scene.add_primitive(
        &quad,
        plane_at(walls, Quat::from_rotation_z(-FRAC_PI_2), Vec3::new(-1.0, 1.0, 0.0)),
        "red",
    )?;
    scene.add_primitive(
        &quad,
        plane_at(walls, Quat::from_rotation_z(FRAC_PI_2), Vec3::new(1.0, 1.0, 0.0)),
        "green",
    )?;
    scene.add_primitive(
        &quad,
        plane_at(
            Vec3::new(0.6, 1.0, 0.6),
            Quat::from_rotation_z(PI),
            Vec3::new(0.0, 1.99, 0.0),
        ),
        "light",
    )?;

    let cube = scene::unit_cube();
    scene.add_primitive(
        &cube,
        Mat4::from_scale_rotation_translation(
            Vec3::splat(0.7),
            Quat::from_rotation_y(0.4),
            Vec3::new(-0.4, 0.35, -0.3),
        ),
        "glossy",
    )?;
    scene.add_primitive(
        &cube,
        Mat4::from_scale_rotation_translation(
            Vec3::splat(0.5),
            Quat::from_rotation_y(-0.3),
            Vec3::new(0.45, 0.25, 0.25),
        ),
        "mirror",
    )?;

    Ok(scene)
}

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => match RenderConfig::from_json_file(Path::new(&path)) {
            Ok(config) => config,
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => RenderConfig {
            width: 400,
            height: 400,
            multisample: 32,
            recursion_max: 5,
            reverse: 2,
            russian: 0.85,
            sky_color: [0.05, 0.06, 0.08],
            ..Default::default()
        },
    };
    let output = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("render.png"));

    let mut scene = match build_scene(&config) {
        Ok(scene) => scene,
        Err(e) => {
            error!("failed to build scene: {}", e);
            return ExitCode::FAILURE;
        }
    };
    scene.set_sky(config.sky_radiance());
    scene.set_thinglass(&config.thinglass);
    scene.commit();

    let camera = Camera::new(
        Vec3::new(0.0, 1.0, 2.6),
        Vec3::new(0.0, 1.0, -0.3),
        Vec3::Y,
        0.9,
        config.width,
        config.height,
        config.focus_plane,
        config.lens_size,
    );
    let film = Film::new(config.width, config.height);

    let start = Instant::now();
    let stats = render::render(&scene, &camera, &config, &film, &AtomicBool::new(false));
    let elapsed = start.elapsed();
    let rays = stats.rays.load(Ordering::Relaxed);
    info!(
        "rendered in {:.2?}, {:.2} Mrays/s",
        elapsed,
        rays as f64 / elapsed.as_secs_f64() / 1.0e6
    );

    if let Err(e) = film.write_png(&output) {
        error!("failed to write {}: {}", output.display(), e);
        return ExitCode::FAILURE;
    }
    info!("wrote {}", output.display());
    ExitCode::SUCCESS
}
