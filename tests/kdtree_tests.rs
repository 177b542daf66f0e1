use glam::{Vec2, Vec3};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use lumen::kdtree::{Aabb, KdTree, PackedKdNode};
use lumen::ray::Ray;
use lumen::scene::{Material, MeshData, Scene};

fn random_vec3(rng: &mut SmallRng, lo: f32, hi: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(lo..hi),
        rng.gen_range(lo..hi),
        rng.gen_range(lo..hi),
    )
}

/// A committed scene of `n` small random triangles inside the unit cube.
fn random_triangle_scene(n: usize, seed: u64) -> Scene {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut mesh = MeshData::default();
    for _ in 0..n {
        let center = random_vec3(&mut rng, 0.0, 1.0);
        let e1 = random_vec3(&mut rng, -0.05, 0.05);
        let e2 = random_vec3(&mut rng, -0.05, 0.05);
        let normal = e1.cross(e2);
        if normal.length_squared() < 1e-12 {
            // Degenerate draw; nudge one edge.
            continue;
        }
        let normal = normal.normalize();
        mesh.positions.extend([center, center + e1, center + e2]);
        mesh.normals.extend([normal, normal, normal]);
        let base = (mesh.positions.len() - 3) as u32;
        mesh.faces.push([base, base + 1, base + 2]);
    }
    let mut scene = Scene::new();
    scene.register_material(Material::named("solid"));
    scene
        .add_mesh(&mesh, glam::Mat4::IDENTITY, "solid")
        .expect("mesh ingest");
    scene.commit();
    scene
}

fn brute_force_closest(scene: &Scene, ray: &Ray) -> Option<(u32, f32)> {
    let mut best: Option<(u32, f32)> = None;
    for (i, tri) in scene.triangles.iter().enumerate() {
        if let Some((t, _, _)) = tri.intersect(&scene.positions, ray) {
            if t <= ray.near || t >= ray.far {
                continue;
            }
            if best.map_or(true, |(_, bt)| t < bt) {
                best = Some((i as u32, t));
            }
        }
    }
    best
}

fn random_ray(rng: &mut SmallRng) -> Ray {
    let origin = random_vec3(rng, -2.0, -1.0);
    let target = random_vec3(rng, 0.2, 0.8);
    Ray::new(origin, target - origin)
}

#[test]
fn closest_hit_matches_brute_force() {
    let scene = random_triangle_scene(4_000, 1);
    let mut rng = SmallRng::seed_from_u64(2);
    for _ in 0..500 {
        let ray = random_ray(&mut rng);
        let kd_hit = scene.intersect(&ray);
        let brute = brute_force_closest(&scene, &ray);
        match (kd_hit, brute) {
            (None, None) => {}
            (Some(kd), Some((_, bt))) => {
                assert!(
                    (kd.t - bt).abs() < 1e-3,
                    "kd t {} vs brute force t {}",
                    kd.t,
                    bt
                );
            }
            (kd, brute) => panic!("hit disagreement: kd {:?} vs brute {:?}", kd, brute),
        }
    }
}

#[test]
fn any_hit_agrees_with_closest_hit_on_occlusion() {
    let scene = random_triangle_scene(2_000, 3);
    let mut rng = SmallRng::seed_from_u64(4);
    for _ in 0..300 {
        let ray = random_ray(&mut rng);
        let closest = scene.intersect(&ray).is_some();
        let any = scene.intersect_any(&ray);
        assert_eq!(closest, any, "any-hit and closest-hit disagree on occlusion");
    }
}

#[test]
fn compressed_tree_is_compact() {
    let scene = random_triangle_scene(10_000, 5);
    let n = scene.triangles.len();
    let kd = scene.kd().expect("kd-tree built");
    assert!(
        kd.nodes.len() <= 4 * n,
        "node count {} exceeds 4x triangle count {}",
        kd.nodes.len(),
        n
    );
    let per_leaf = kd.totals.triangles as f32 / kd.totals.leaves as f32;
    assert!(per_leaf <= 8.0, "average leaf population {}", per_leaf);
}

/// Every triangle referenced by a leaf must overlap the leaf's AABB implied
/// by the ancestor splits.
#[test]
fn leaf_triangles_overlap_leaf_bounds() {
    let scene = random_triangle_scene(3_000, 6);
    let kd = scene.kd().expect("kd-tree built");

    fn triangle_aabb(scene: &Scene, tri: u32) -> Aabb {
        let t = &scene.triangles[tri as usize];
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for &v in &t.vertices {
            min = min.min(scene.positions[v as usize]);
            max = max.max(scene.positions[v as usize]);
        }
        Aabb { min, max }
    }

    fn walk(kd: &KdTree, scene: &Scene, node: usize, bounds: Aabb) {
        let packed: PackedKdNode = kd.nodes[node];
        if packed.is_leaf() {
            let first = packed.first_triangle() as usize;
            let count = packed.triangle_count() as usize;
            for &tri in &kd.triangle_refs[first..first + count] {
                let tb = triangle_aabb(scene, tri);
                assert!(
                    tb.overlaps(&bounds),
                    "triangle {} does not overlap its leaf bounds",
                    tri
                );
            }
        } else {
            let axis = packed.split_axis();
            let split = packed.split_pos();
            let mut below = bounds;
            let mut above = bounds;
            below.max[axis] = split;
            above.min[axis] = split;
            walk(kd, scene, node + 1, below);
            walk(kd, scene, packed.other_child() as usize, above);
        }
    }

    walk(kd, &scene, 0, kd.bounds);
}

#[test]
fn commit_is_idempotent() {
    let mut scene = random_triangle_scene(2_000, 7);
    let (nodes, refs, leaves) = {
        let kd = scene.kd().unwrap();
        (kd.nodes.len(), kd.triangle_refs.len(), kd.totals.leaves)
    };
    scene.commit();
    let kd = scene.kd().unwrap();
    assert_eq!(kd.nodes.len(), nodes);
    assert_eq!(kd.triangle_refs.len(), refs);
    assert_eq!(kd.totals.leaves, leaves);
}

#[test]
fn triangle_barycentric_roundtrip() {
    let mut rng = SmallRng::seed_from_u64(8);
    for _ in 0..100 {
        let mut mesh = MeshData::default();
        let a = random_vec3(&mut rng, -1.0, 1.0);
        let e1 = random_vec3(&mut rng, -1.0, 1.0);
        let e2 = random_vec3(&mut rng, -1.0, 1.0);
        if e1.cross(e2).length_squared() < 1e-6 {
            continue;
        }
        let n = e1.cross(e2).normalize();
        mesh.positions.extend([a, a + e1, a + e2]);
        mesh.normals.extend([n, n, n]);
        mesh.faces.push([0, 1, 2]);

        let mut scene = Scene::new();
        scene.register_material(Material::named("solid"));
        scene.add_mesh(&mesh, glam::Mat4::IDENTITY, "solid").unwrap();
        scene.commit();
        if scene.triangles.is_empty() {
            continue;
        }

        let tri = scene.triangles[0];
        let sample = Vec2::new(rng.gen(), rng.gen());
        let p = tri.random_point(&scene.positions, sample);
        let origin = p + tri.normal() * 1.5;
        let ray = Ray::new(origin, p - origin);
        let hit = scene.intersect(&ray).expect("ray aimed at the triangle must hit");
        let recovered = hit.lerp3(
            scene.positions[tri.vertices[0] as usize],
            scene.positions[tri.vertices[1] as usize],
            scene.positions[tri.vertices[2] as usize],
        );
        let err = (recovered - p).abs().max_element();
        assert!(err < 1e-4, "barycentric L∞ error {}", err);
    }
}

#[test]
fn empty_scene_has_no_tree_and_never_hits() {
    let mut scene = Scene::new();
    scene.commit();
    assert!(scene.kd().is_none());
    let ray = Ray::new(Vec3::ZERO, Vec3::Z);
    assert!(scene.intersect(&ray).is_none());
    assert!(!scene.intersect_any(&ray));
}
