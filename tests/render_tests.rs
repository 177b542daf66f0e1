use std::f32::consts::{FRAC_PI_2, PI};
use std::sync::atomic::AtomicBool;

use glam::{Mat4, Quat, Vec2, Vec3};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use lumen::bxdf::Bxdf;
use lumen::camera::Camera;
use lumen::color::{Color, Radiance};
use lumen::config::RenderConfig;
use lumen::film::Film;
use lumen::ltc::LtcFamily;
use lumen::render;
use lumen::scene::{self, Light, Material, Scene};

fn forward_camera(config: &RenderConfig) -> Camera {
    Camera::new(
        Vec3::ZERO,
        Vec3::new(0.0, 0.0, -1.0),
        Vec3::Y,
        0.9,
        config.width,
        config.height,
        config.focus_plane,
        config.lens_size,
    )
}

fn render_film(scene: &Scene, camera: &Camera, config: &RenderConfig) -> Film {
    let film = Film::new(config.width, config.height);
    render::render(scene, camera, config, &film, &AtomicBool::new(false));
    film
}

/// Quad facing +Z, scaled by `extent`, placed at depth `z`.
fn facing_quad(scene: &mut Scene, extent: f32, z: f32, material: &str) {
    scene
        .add_primitive(
            &scene::unit_plane(),
            Mat4::from_scale_rotation_translation(
                Vec3::new(extent, 1.0, extent),
                Quat::from_rotation_x(FRAC_PI_2),
                Vec3::new(0.0, 0.0, z),
            ),
            material,
        )
        .expect("quad ingest");
}

#[test]
fn empty_scene_renders_the_sky_color() {
    let config = RenderConfig {
        width: 16,
        height: 16,
        multisample: 4,
        recursion_max: 2,
        sky_color: [0.2, 0.3, 0.4],
        ..Default::default()
    };
    let mut scene = Scene::new();
    scene.set_sky(config.sky_radiance());
    scene.commit();
    let camera = forward_camera(&config);
    let film = render_film(&scene, &camera, &config);

    let expected = config.sky_radiance();
    for y in 0..config.height {
        for x in 0..config.width {
            let p = film.pixel(x, y);
            assert!((p.r - expected.r).abs() < 1e-4);
            assert!((p.g - expected.g).abs() < 1e-4);
            assert!((p.b - expected.b).abs() < 1e-4);
        }
    }
}

#[test]
fn point_lit_lambertian_square_reaches_one_over_pi() {
    let config = RenderConfig {
        width: 64,
        height: 64,
        multisample: 16,
        recursion_max: 1,
        ..Default::default()
    };
    let mut scene = Scene::new();
    scene.register_material(Material {
        diffuse: Color::WHITE,
        ..Material::named("white")
    });
    facing_quad(&mut scene, 4.0, -1.0, "white");
    scene.add_point_light(Light::sphere(Vec3::ZERO, Color::WHITE, 1.0, 0.0));
    scene.commit();

    let camera = forward_camera(&config);
    let film = render_film(&scene, &camera, &config);

    let center = film.pixel(config.width / 2, config.height / 2);
    let expected = 1.0 / PI;
    for channel in [center.r, center.g, center.b] {
        assert!(
            (channel - expected).abs() / expected < 0.05,
            "center radiance {} should be close to 1/π",
            channel
        );
    }
}

#[test]
fn thin_glass_filters_the_surface_behind_it() {
    let config = RenderConfig {
        width: 64,
        height: 64,
        multisample: 16,
        recursion_max: 1,
        thinglass: vec!["glass".to_string()],
        ..Default::default()
    };
    let mut scene = Scene::new();
    scene.register_material(Material {
        diffuse: Color::WHITE,
        ..Material::named("white")
    });
    scene.register_material(Material {
        diffuse: Color::new(0.5, 1.0, 0.5),
        ..Material::named("glass_pane")
    });
    facing_quad(&mut scene, 4.0, -1.0, "white");
    facing_quad(&mut scene, 4.0, -0.5, "glass_pane");
    scene.add_point_light(Light::sphere(Vec3::ZERO, Color::WHITE, 1.0, 0.0));
    scene.set_thinglass(&config.thinglass);
    scene.commit();

    let camera = forward_camera(&config);
    let film = render_film(&scene, &camera, &config);

    let center = film.pixel(config.width / 2, config.height / 2);
    let expected_g = 1.0 / PI;
    assert!(
        (center.g - expected_g).abs() / expected_g < 0.05,
        "green channel {} should pass unfiltered",
        center.g
    );
    assert!(
        (center.r / center.g - 0.5).abs() < 0.03,
        "red channel should be halved by the glass tint, ratio {}",
        center.r / center.g
    );
    assert!(
        (center.b / center.g - 0.5).abs() < 0.03,
        "blue channel should be halved by the glass tint, ratio {}",
        center.b / center.g
    );
}

#[test]
fn mirror_in_a_red_room_stays_bounded_and_picks_up_red() {
    let config = RenderConfig {
        width: 32,
        height: 32,
        multisample: 8,
        recursion_max: 8,
        reverse: 2,
        ..Default::default()
    };
    let mut scene = Scene::new();
    scene.register_material(Material {
        diffuse: Color::new(0.9, 0.2, 0.2),
        ..Material::named("red")
    });
    scene.register_material(Material {
        diffuse: Color::new(0.9, 0.9, 0.9),
        bxdf: Bxdf::Mirror,
        ..Material::named("mirror")
    });
    // Room: a large cube seen from the inside; mirror cube at its center.
    scene
        .add_primitive(
            &scene::unit_cube(),
            Mat4::from_scale_rotation_translation(Vec3::splat(4.0), Quat::IDENTITY, Vec3::ZERO),
            "red",
        )
        .unwrap();
    scene
        .add_primitive(
            &scene::unit_cube(),
            Mat4::from_scale_rotation_translation(
                Vec3::splat(1.0),
                Quat::from_rotation_y(0.5),
                Vec3::ZERO,
            ),
            "mirror",
        )
        .unwrap();
    scene.add_point_light(Light::sphere(Vec3::new(0.0, 1.2, 1.2), Color::WHITE, 2.0, 0.0));
    scene.commit();

    let camera = Camera::new(
        Vec3::new(0.0, 0.4, 1.8),
        Vec3::ZERO,
        Vec3::Y,
        0.9,
        config.width,
        config.height,
        1.0,
        0.0,
    );
    let film = render_film(&scene, &camera, &config);

    let mut red_total = 0.0f64;
    let mut green_total = 0.0f64;
    for y in 0..config.height {
        for x in 0..config.width {
            let p = film.pixel(x, y);
            assert!(p.is_finite(), "pixel ({}, {}) is not finite", x, y);
            assert!(p.r >= 0.0 && p.g >= 0.0 && p.b >= 0.0);
            assert!(p.max_component() < 1000.0, "unbounded radiance at ({}, {})", x, y);
            red_total += p.r as f64;
            green_total += p.g as f64;
        }
    }
    assert!(
        red_total > green_total,
        "a red room should dominate red ({} vs {})",
        red_total,
        green_total
    );
}

#[test]
fn camera_inverse_projection_roundtrip() {
    let camera = Camera::new(
        Vec3::new(1.0, 2.0, 3.0),
        Vec3::new(-0.5, 0.2, -1.0),
        Vec3::Y,
        0.8,
        128,
        96,
        1.0,
        0.0,
    );
    let mut rng = SmallRng::seed_from_u64(21);
    for _ in 0..50 {
        let x = rng.gen_range(0..128u32);
        let y = rng.gen_range(0..96u32);
        let ray = camera.pixel_ray(x, y, Vec2::new(0.5, 0.5));
        let (rx, ry) = camera
            .coords_from_direction(ray.direction)
            .expect("pixel-centered directions stay in view");
        assert!(
            (rx as i64 - x as i64).abs() <= 1 && (ry as i64 - y as i64).abs() <= 1,
            "roundtrip drifted: ({}, {}) -> ({}, {})",
            x,
            y,
            rx,
            ry
        );
    }
}

#[test]
fn diffuse_bxdf_integrates_to_its_albedo() {
    let scene = Scene::new();
    let bxdf = Bxdf::DiffuseCosine;
    let vr = Vec3::new(0.3f32.sin(), 0.0, 0.3f32.cos());
    let n_theta = 256;
    let n_phi = 256;
    let d_theta = FRAC_PI_2 / n_theta as f32;
    let d_phi = 2.0 * PI / n_phi as f32;
    let mut integral = 0.0f64;
    for i in 0..n_theta {
        let theta = (i as f32 + 0.5) * d_theta;
        for j in 0..n_phi {
            let phi = (j as f32 + 0.5) * d_phi;
            let vi = Vec3::new(
                theta.sin() * phi.cos(),
                theta.sin() * phi.sin(),
                theta.cos(),
            );
            let f = bxdf.value(&scene, Radiance::ONE, Radiance::ZERO, vi, vr, Vec2::ZERO);
            integral += (f.r * vi.z * theta.sin() * d_theta * d_phi) as f64;
        }
    }
    assert!(
        (integral - 1.0).abs() < 0.005,
        "∫ f·cos dω should equal the albedo, got {}",
        integral
    );
}

#[test]
fn ltc_lobe_integrates_to_its_amplitude() {
    let table = LtcFamily::Ggx.table();
    let theta: f32 = 0.7;
    let anchor = Vec3::new(theta.sin(), 0.0, theta.cos());

    for &(alpha, tolerance) in &[(0.1f32, 0.05f32), (0.5, 0.02), (0.9, 0.02)] {
        let amplitude = table.amplitude(theta, alpha);
        assert!(amplitude > 0.0);

        // Full-sphere quadrature; the transformed lobe may dip below the
        // horizon, which is still part of its normalization.
        let n_theta = 1024;
        let n_phi = 512;
        let d_theta = PI / n_theta as f32;
        let d_phi = 2.0 * PI / n_phi as f32;
        let mut integral = 0.0f64;
        for i in 0..n_theta {
            let th = (i as f32 + 0.5) * d_theta;
            for j in 0..n_phi {
                let ph = (j as f32 + 0.5) * d_phi;
                let dir = Vec3::new(th.sin() * ph.cos(), th.sin() * ph.sin(), th.cos());
                let pdf = table.pdf(anchor, dir, alpha);
                integral += (pdf * th.sin() * d_theta * d_phi) as f64;
            }
        }
        let relative = ((integral - amplitude as f64) / amplitude as f64).abs();
        assert!(
            relative < tolerance as f64,
            "alpha {}: integral {} vs amplitude {} (relative error {})",
            alpha,
            integral,
            amplitude,
            relative
        );
    }
}

#[test]
fn ltc_sample_below_horizon_has_zero_weight() {
    let scene = Scene::new();
    let bxdf = Bxdf::ltc(LtcFamily::Ggx, 5.0);
    let vr = Vec3::new(0.9, 0.0, (1.0f32 - 0.81).sqrt());
    let mut rng = SmallRng::seed_from_u64(31);
    for _ in 0..1000 {
        let sample = Vec2::new(rng.gen(), rng.gen());
        let s = bxdf.sample(&scene, Radiance::ZERO, Radiance::ONE, vr, Vec2::ZERO, sample);
        assert!((s.direction.length() - 1.0).abs() < 1e-4);
        if s.direction.z <= 0.0 {
            assert_eq!(s.transport, Radiance::ZERO);
        }
    }
}

#[test]
fn texture_bilinear_fetch_and_bump_slopes() {
    use lumen::texture::Texture;

    let mut tex = Texture::new(8, 8);
    tex.fill_stripes(2, Color::WHITE, Color::BLACK);

    // Texel-centered fetches return the stored colors.
    let white = tex.sample(Vec2::new(0.5 / 8.0, 0.5 / 8.0));
    assert!((white.r - 1.0).abs() < 1e-5);
    let black = tex.sample(Vec2::new(2.5 / 8.0, 0.5 / 8.0));
    assert!(black.r.abs() < 1e-5);

    // Halfway between texels the filter blends.
    let mid = tex.sample(Vec2::new(2.0 / 8.0, 0.5 / 8.0));
    assert!((mid.r - 0.5).abs() < 1e-3);

    // Finite differences across a stripe boundary.
    assert!((tex.slope_right(Vec2::new(1.5 / 8.0, 0.5 / 8.0)) - 1.0).abs() < 1e-5);
    assert!((tex.slope_bottom(Vec2::new(0.5 / 8.0, 1.5 / 8.0)) - 1.0).abs() < 1e-5);
    assert!(tex.slope_right(Vec2::new(0.5 / 8.0, 0.5 / 8.0)).abs() < 1e-5);
}

#[test]
fn bump_mapped_quad_renders_finite_and_uneven() {
    use lumen::texture::Texture;

    let config = RenderConfig {
        width: 32,
        height: 32,
        multisample: 8,
        recursion_max: 1,
        bumpscale: 1.0,
        ..Default::default()
    };
    let mut scene = Scene::new();
    let mut stripes = Texture::new(16, 16);
    stripes.fill_stripes(2, Color::WHITE, Color::BLACK);
    let bump = scene.add_texture(stripes);
    scene.register_material(Material {
        diffuse: Color::WHITE,
        bump_texture: Some(bump),
        ..Material::named("bumpy")
    });
    facing_quad(&mut scene, 4.0, -1.0, "bumpy");
    scene.add_point_light(Light::sphere(Vec3::new(0.5, 0.5, 0.0), Color::WHITE, 1.0, 0.0));
    scene.commit();

    let camera = forward_camera(&config);
    let film = render_film(&scene, &camera, &config);

    let mut min = f32::INFINITY;
    let mut max = 0.0f32;
    for y in 0..config.height {
        for x in 0..config.width {
            let p = film.pixel(x, y);
            assert!(p.is_finite(), "bump shading produced a non-finite pixel");
            assert!(p.r >= 0.0);
            min = min.min(p.r);
            max = max.max(p.r);
        }
    }
    // The perturbed normals modulate the shading across the stripes.
    assert!(max > min + 1e-3, "bump map left the shading flat ({} vs {})", min, max);
}

#[test]
fn mix_material_blends_its_members() {
    let config = RenderConfig {
        width: 32,
        height: 32,
        multisample: 8,
        recursion_max: 1,
        ..Default::default()
    };
    let mut scene = Scene::new();
    let red = scene.register_material(Material {
        diffuse: Color::new(1.0, 0.0, 0.0),
        ..Material::named("mix_red")
    });
    let blue = scene.register_material(Material {
        diffuse: Color::new(0.0, 0.0, 1.0),
        ..Material::named("mix_blue")
    });
    scene.register_material(Material {
        bxdf: Bxdf::Mix { first: red, second: blue, amount: 0.5 },
        ..Material::named("blend")
    });
    facing_quad(&mut scene, 4.0, -1.0, "blend");
    scene.add_point_light(Light::sphere(Vec3::ZERO, Color::WHITE, 1.0, 0.0));
    scene.commit();

    let camera = forward_camera(&config);
    let film = render_film(&scene, &camera, &config);

    let center = film.pixel(config.width / 2, config.height / 2);
    let expected = 0.5 / PI;
    assert!(
        (center.r - expected).abs() / expected < 0.05,
        "red member contributes half, got {}",
        center.r
    );
    assert!(
        (center.b - expected).abs() / expected < 0.05,
        "blue member contributes half, got {}",
        center.b
    );
    assert!(center.g < 1e-3, "neither member is green, got {}", center.g);
}

#[test]
fn alternate_brdfs_evaluate_and_sample_sanely() {
    let scene = Scene::new();
    let vr = Vec3::new(0.4f32.sin(), 0.0, 0.4f32.cos());
    let bxdfs = [
        Bxdf::DiffuseUniform,
        Bxdf::cook_torrance(20.0, 1.5),
        Bxdf::PhongEnergy { exponent: 20.0 },
    ];
    let mut rng = SmallRng::seed_from_u64(41);
    for bxdf in &bxdfs {
        for _ in 0..200 {
            let vi = lumen::sampling::square_to_hemisphere_uniform_z(Vec2::new(
                rng.gen(),
                rng.gen(),
            ));
            let f = bxdf.value(&scene, Radiance::ONE, Radiance::ONE, vi, vr, Vec2::ZERO);
            assert!(f.is_finite());
            assert!(f.r >= 0.0 && f.g >= 0.0 && f.b >= 0.0);

            let s = bxdf.sample(
                &scene,
                Radiance::ONE,
                Radiance::ONE,
                vr,
                Vec2::ZERO,
                Vec2::new(rng.gen(), rng.gen()),
            );
            assert!(s.direction.z >= 0.0, "hemisphere samplers stay above the surface");
            assert!(s.transport.is_finite());
        }
    }
}
