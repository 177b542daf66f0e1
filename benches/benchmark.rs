// This file contains benchmarks for the purpose of guarding against
// performance regressions. To run them, use `cargo bench`.

use std::f32::consts::FRAC_PI_2;
use std::sync::atomic::AtomicBool;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::{Mat4, Quat, Vec3};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use lumen::camera::Camera;
use lumen::color::Color;
use lumen::config::RenderConfig;
use lumen::film::Film;
use lumen::ray::Ray;
use lumen::render;
use lumen::scene::{self, Light, Material, MeshData, Scene};

fn random_vec3(rng: &mut SmallRng, lo: f32, hi: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(lo..hi),
        rng.gen_range(lo..hi),
        rng.gen_range(lo..hi),
    )
}

fn random_mesh(n: usize) -> MeshData {
    let mut rng = SmallRng::seed_from_u64(1234);
    let mut mesh = MeshData::default();
    for _ in 0..n {
        let center = random_vec3(&mut rng, 0.0, 1.0);
        let e1 = random_vec3(&mut rng, -0.02, 0.02);
        let e2 = random_vec3(&mut rng, -0.02, 0.02);
        let normal = e1.cross(e2);
        if normal.length_squared() < 1e-12 {
            continue;
        }
        let normal = normal.normalize();
        mesh.positions.extend([center, center + e1, center + e2]);
        mesh.normals.extend([normal, normal, normal]);
        let base = (mesh.positions.len() - 3) as u32;
        mesh.faces.push([base, base + 1, base + 2]);
    }
    mesh
}

fn committed_scene(mesh: &MeshData) -> Scene {
    let mut scene = Scene::new();
    scene.register_material(Material::named("solid"));
    scene.add_mesh(mesh, Mat4::IDENTITY, "solid").unwrap();
    scene.commit();
    scene
}

fn box_scene() -> Scene {
    let mut scene = Scene::new();
    scene.register_material(Material {
        diffuse: Color::new(0.73, 0.73, 0.73),
        ..Material::named("white")
    });
    scene
        .add_primitive(
            &scene::unit_plane(),
            Mat4::from_scale_rotation_translation(
                Vec3::new(4.0, 1.0, 4.0),
                Quat::from_rotation_x(FRAC_PI_2),
                Vec3::new(0.0, 0.0, -1.0),
            ),
            "white",
        )
        .unwrap();
    scene.add_point_light(Light::sphere(Vec3::ZERO, Color::WHITE, 1.0, 0.0));
    scene.commit();
    scene
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Performance regression tests");
    group.sample_size(10);

    let mesh = random_mesh(100_000);
    group.bench_function("KdTree build (100k triangles)", |b| {
        b.iter(|| committed_scene(black_box(&mesh)))
    });

    let scene = committed_scene(&mesh);
    group.bench_function("Closest-hit traversal (100k triangles)", |b| {
        let mut rng = SmallRng::seed_from_u64(7);
        b.iter(|| {
            let origin = random_vec3(&mut rng, -2.0, -1.0);
            let target = random_vec3(&mut rng, 0.2, 0.8);
            black_box(scene.intersect(&Ray::new(origin, target - origin)))
        })
    });

    let demo = box_scene();
    let config = RenderConfig {
        width: 64,
        height: 64,
        multisample: 4,
        recursion_max: 4,
        russian: 0.8,
        ..Default::default()
    };
    let camera = Camera::new(
        Vec3::ZERO,
        Vec3::new(0.0, 0.0, -1.0),
        Vec3::Y,
        0.9,
        config.width,
        config.height,
        1.0,
        0.0,
    );
    group.bench_function("Render 64x64 (4 samples)", |b| {
        b.iter(|| {
            let film = Film::new(config.width, config.height);
            render::render(&demo, &camera, &config, &film, &AtomicBool::new(false))
        })
    });

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
