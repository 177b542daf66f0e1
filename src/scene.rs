use std::collections::HashMap;
use std::f32::consts::PI;
use std::path::Path;

use glam::{Mat4, Vec2, Vec3, Vec4, Vec4Swizzles};
use log::{debug, info, warn};
use thiserror::Error;

use crate::bxdf::{Bxdf, BxdfSample, TangentFrame};
use crate::color::{Color, Radiance, Spectrum};
use crate::kdtree::{Aabb, KdTree};
use crate::ray::Ray;
use crate::texture::Texture;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("material \"{0}\" is not defined")]
    UnknownMaterial(String),
    #[error("mesh has {positions} positions but {normals} normals")]
    MissingNormals { positions: usize, normals: usize },
    #[error("face references vertex {index} outside the mesh ({count} vertices)")]
    FaceOutOfBounds { index: u32, count: usize },
    #[error("failed to load texture {path}")]
    Texture {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// A triangle referencing the scene's vertex arrays, with its plane
/// (unit normal + signed distance) recomputed at commit.
#[derive(Clone, Copy, Debug)]
pub struct Triangle {
    pub vertices: [u32; 3],
    pub material: u32,
    pub plane: Vec4,
}

impl Triangle {
    pub fn new(vertices: [u32; 3], material: u32) -> Self {
        Self { vertices, material, plane: Vec4::ZERO }
    }

    pub fn normal(&self) -> Vec3 {
        self.plane.xyz()
    }

    pub fn recompute_plane(&mut self, positions: &[Vec3]) {
        let v0 = positions[self.vertices[0] as usize];
        let v1 = positions[self.vertices[1] as usize];
        let v2 = positions[self.vertices[2] as usize];
        let n = (v2 - v0).cross(v1 - v0).normalize();
        self.plane = Vec4::new(n.x, n.y, n.z, -n.dot(v0));
    }

    pub fn area(&self, positions: &[Vec3]) -> f32 {
        let v0 = positions[self.vertices[0] as usize];
        let v1 = positions[self.vertices[1] as usize];
        let v2 = positions[self.vertices[2] as usize];
        0.5 * (v1 - v0).cross(v2 - v0).length()
    }

    /// Uniformly distributed point on the triangle.
    pub fn random_point(&self, positions: &[Vec3], sample: Vec2) -> Vec3 {
        let v0 = positions[self.vertices[0] as usize];
        let v1 = positions[self.vertices[1] as usize];
        let v2 = positions[self.vertices[2] as usize];
        let su = sample.x.sqrt();
        (1.0 - su) * v0 + su * (1.0 - sample.y) * v1 + su * sample.y * v2
    }

    /// Plane-then-2D-barycentric intersection test. Returns (t, α, β) with
    /// the barycentrics relative to vertices B and C; the caller derives
    /// the vertex-A weight as 1 − α − β.
    pub fn intersect(&self, positions: &[Vec3], ray: &Ray) -> Option<(f32, f32, f32)> {
        const EPSILON: f32 = 1e-6;
        let pn = self.plane.xyz();
        let dot = ray.direction.dot(pn);
        if dot.abs() < EPSILON {
            return None; // parallel to the plane
        }
        let t = -(self.plane.w + ray.origin.dot(pn)) / dot;
        if t <= 0.0 {
            return None;
        }

        // Project onto the plane of the largest normal component.
        let pq = pn.abs();
        let (i1, i2) = if pq.x > pq.y && pq.x > pq.z {
            (1, 2)
        } else if pq.y > pq.z {
            (0, 2)
        } else {
            (0, 1)
        };

        let v0 = positions[self.vertices[0] as usize];
        let v1 = positions[self.vertices[1] as usize];
        let v2 = positions[self.vertices[2] as usize];

        let point = Vec2::new(
            ray.origin[i1] + ray.direction[i1] * t,
            ray.origin[i2] + ray.direction[i2] * t,
        );
        let q0 = Vec2::new(point.x - v0[i1], point.y - v0[i2]);
        let q1 = Vec2::new(v1[i1] - v0[i1], v1[i2] - v0[i2]);
        let q2 = Vec2::new(v2[i1] - v0[i1], v2[i2] - v0[i2]);

        let (alpha, beta);
        if q1.x.abs() < EPSILON {
            beta = q0.x / q2.x;
            if !(0.0..=1.0).contains(&beta) {
                return None;
            }
            alpha = (q0.y - beta * q2.y) / q1.y;
        } else {
            beta = (q0.y * q1.x - q0.x * q1.y) / (q2.y * q1.x - q2.x * q1.y);
            if !(0.0..=1.0).contains(&beta) {
                return None;
            }
            alpha = (q0.x - beta * q2.x) / q1.x;
        }
        if alpha < 0.0 || alpha + beta > 1.0 {
            return None;
        }
        Some((t, alpha, beta))
    }
}

/// Closest-hit result. The barycentric triple (a, b, c) weighs vertices
/// A, B and C when interpolating vertex attributes.
#[derive(Clone, Copy, Debug)]
pub struct Intersection {
    pub triangle: u32,
    pub t: f32,
    pub a: f32,
    pub b: f32,
    pub c: f32,
}

impl Intersection {
    pub fn lerp3(&self, x: Vec3, y: Vec3, z: Vec3) -> Vec3 {
        x * self.a + y * self.b + z * self.c
    }

    pub fn lerp2(&self, x: Vec2, y: Vec2, z: Vec2) -> Vec2 {
        x * self.a + y * self.b + z * self.c
    }
}

/// Crossings through thin-glass triangles, ordered by distance along the ray.
pub type ThinglassCrossings = Vec<(u32, f32)>;

#[derive(Clone, Debug)]
pub struct Material {
    pub name: String,
    pub diffuse: Color,
    pub specular: Color,
    pub ambient: Color,
    pub emission: Radiance,
    pub exponent: f32,
    pub ior: f32,
    pub translucency: f32,
    pub diffuse_texture: Option<usize>,
    pub specular_texture: Option<usize>,
    pub ambient_texture: Option<usize>,
    pub bump_texture: Option<usize>,
    pub bxdf: Bxdf,
    pub thin_glass: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            diffuse: Color::BLACK,
            specular: Color::BLACK,
            ambient: Color::BLACK,
            emission: Radiance::ZERO,
            exponent: 1.0,
            ior: 1.0,
            translucency: 0.0,
            diffuse_texture: None,
            specular_texture: None,
            ambient_texture: None,
            bump_texture: None,
            bxdf: Bxdf::DiffuseCosine,
            thin_glass: false,
        }
    }
}

impl Material {
    pub fn named(name: &str) -> Self {
        Self { name: name.to_string(), ..Default::default() }
    }

    pub fn is_emissive(&self) -> bool {
        self.emission.sum() > 0.0
    }

    pub fn has_any_texture(&self) -> bool {
        self.diffuse_texture.is_some()
            || self.specular_texture.is_some()
            || self.ambient_texture.is_some()
            || self.bump_texture.is_some()
    }

    /// Diffuse/specular reflectance at the given texture coordinates.
    pub fn colors_at(&self, scene: &Scene, uv: Vec2) -> (Spectrum, Spectrum) {
        let kd = match self.diffuse_texture {
            Some(t) => Radiance::from(scene.textures[t].sample(uv)),
            None => Radiance::from(self.diffuse),
        };
        let ks = match self.specular_texture {
            Some(t) => Radiance::from(scene.textures[t].sample(uv)),
            None => Radiance::from(self.specular),
        };
        (kd, ks)
    }

    /// BxDF evaluation in world space: `vi` points toward the light side,
    /// `vr` toward the viewer side; the local frame is anchored at `vr`.
    #[allow(clippy::too_many_arguments)]
    pub fn bxdf_value(
        &self,
        scene: &Scene,
        kd: Spectrum,
        ks: Spectrum,
        normal: Vec3,
        vi: Vec3,
        vr: Vec3,
        uv: Vec2,
    ) -> Spectrum {
        let frame = TangentFrame::new(normal, vr);
        self.bxdf.value(scene, kd, ks, frame.to_local(vi), frame.to_local(vr), uv)
    }

    /// World-space importance sampling for a viewer along `vr`.
    #[allow(clippy::too_many_arguments)]
    pub fn bxdf_sample(
        &self,
        scene: &Scene,
        kd: Spectrum,
        ks: Spectrum,
        normal: Vec3,
        vr: Vec3,
        uv: Vec2,
        sample: Vec2,
    ) -> BxdfSample {
        let frame = TangentFrame::new(normal, vr);
        let s = self.bxdf.sample(scene, kd, ks, frame.to_local(vr), uv, sample);
        BxdfSample {
            direction: frame.to_world(s.direction),
            transport: s.transport,
            strategy: s.strategy,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum LightKind {
    /// Point light emitting over the full sphere; `size` jitters the
    /// emission point for soft shadows.
    Sphere { size: f32 },
    /// Point on an emissive triangle, emitting over the outward hemisphere.
    Hemisphere { normal: Vec3 },
}

#[derive(Clone, Debug)]
pub struct Light {
    pub kind: LightKind,
    pub position: Vec3,
    pub color: Radiance,
    pub intensity: f32,
}

impl Light {
    pub fn sphere(position: Vec3, color: Color, intensity: f32, size: f32) -> Self {
        Self {
            kind: LightKind::Sphere { size },
            position,
            color: Radiance::from(color),
            intensity,
        }
    }

    pub fn directional_factor(&self, v: Vec3) -> f32 {
        match self.kind {
            LightKind::Sphere { .. } => 1.0,
            LightKind::Hemisphere { normal } => normal.dot(v).max(0.0),
        }
    }
}

/// An emissive mesh, sampled proportionally to triangle area. Triangles are
/// kept in descending area order so the prefix walk stays short.
#[derive(Clone, Debug, Default)]
pub struct ArealLight {
    pub triangles_with_areas: Vec<(f32, u32)>,
    pub total_area: f32,
    pub emission: Radiance,
    pub power: f32,
}

impl ArealLight {
    fn random_light(&self, scene: &Scene, tri_sample: f32, point_sample: Vec2) -> Light {
        let mut p = tri_sample * self.total_area;
        let mut chosen = self.triangles_with_areas.len() - 1;
        for (i, &(area, _)) in self.triangles_with_areas.iter().enumerate() {
            p -= area;
            if p <= 0.0 {
                chosen = i;
                break;
            }
        }
        let tri = &scene.triangles[self.triangles_with_areas[chosen].1 as usize];
        let position = tri.random_point(&scene.positions, point_sample);
        let mut normal = scene.normals[tri.vertices[0] as usize];
        if normal.length_squared() <= 0.0 || !normal.is_finite() {
            normal = tri.normal();
        }
        Light {
            kind: LightKind::Hemisphere { normal },
            position,
            color: self.emission,
            intensity: 1.0,
        }
    }
}

/// Mesh arrays handed over by an external importer: parallel attribute
/// arrays indexed by the face index triples. Normals are required; missing
/// tangents and UVs are zero-filled.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub faces: Vec<[u32; 3]>,
}

/// One vertex of a procedural primitive.
#[derive(Clone, Copy, Debug)]
pub struct PrimVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub tangent: Vec3,
}

pub struct Scene {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub triangles: Vec<Triangle>,
    pub materials: Vec<Material>,
    materials_by_name: HashMap<String, usize>,
    pub textures: Vec<Texture>,
    pub point_lights: Vec<Light>,
    pub areal_lights: Vec<(f32, ArealLight)>,
    total_point_power: f32,
    total_areal_power: f32,
    events: [Vec<f32>; 3],
    pub bounds: Aabb,
    pub epsilon: f32,
    kd: Option<KdTree>,
    pub sky: Radiance,
    pub has_thinglass: bool,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            tangents: Vec::new(),
            uvs: Vec::new(),
            triangles: Vec::new(),
            materials: Vec::new(),
            materials_by_name: HashMap::new(),
            textures: Vec::new(),
            point_lights: Vec::new(),
            areal_lights: Vec::new(),
            total_point_power: 0.0,
            total_areal_power: 0.0,
            events: [Vec::new(), Vec::new(), Vec::new()],
            bounds: Aabb::default(),
            epsilon: 0.0001,
            kd: None,
            sky: Radiance::ZERO,
            has_thinglass: false,
        }
    }

    pub fn kd(&self) -> Option<&KdTree> {
        self.kd.as_ref()
    }

    pub fn set_sky(&mut self, sky: Radiance) {
        self.sky = sky;
    }

    pub fn sky_radiance(&self, _direction: Vec3) -> Radiance {
        self.sky
    }

    pub fn register_material(&mut self, material: Material) -> usize {
        if let Some(&idx) = self.materials_by_name.get(&material.name) {
            debug!("material \"{}\" re-registered, replacing", material.name);
            self.materials[idx] = material;
            idx
        } else {
            let idx = self.materials.len();
            self.materials_by_name.insert(material.name.clone(), idx);
            self.materials.push(material);
            idx
        }
    }

    pub fn material_index(&self, name: &str) -> Option<usize> {
        self.materials_by_name.get(name).copied()
    }

    pub fn add_texture(&mut self, texture: Texture) -> usize {
        self.textures.push(texture);
        self.textures.len() - 1
    }

    pub fn add_texture_from_path(&mut self, path: &Path) -> Result<usize, SceneError> {
        let texture = Texture::from_path(path).map_err(|source| SceneError::Texture {
            path: path.display().to_string(),
            source,
        })?;
        Ok(self.add_texture(texture))
    }

    /// Materials whose name contains any of the given substrings.
    pub fn material_set(&self, phrases: &[String]) -> Vec<usize> {
        self.materials
            .iter()
            .enumerate()
            .filter(|(_, m)| phrases.iter().any(|p| m.name.contains(p.as_str())))
            .map(|(i, _)| i)
            .collect()
    }

    /// Flags every material matching the name substrings as thin glass.
    pub fn set_thinglass(&mut self, phrases: &[String]) {
        for idx in self.material_set(phrases) {
            self.materials[idx].thin_glass = true;
        }
        self.has_thinglass = self.materials.iter().any(|m| m.thin_glass);
    }

    pub fn add_point_light(&mut self, light: Light) {
        self.point_lights.push(light);
    }

    /// Appends external mesh arrays under `transform`, wiring faces to the
    /// named material. Degenerate faces are skipped with a warning.
    pub fn add_mesh(
        &mut self,
        mesh: &MeshData,
        transform: Mat4,
        material: &str,
    ) -> Result<(), SceneError> {
        let material_idx = self
            .material_index(material)
            .ok_or_else(|| SceneError::UnknownMaterial(material.to_string()))? as u32;
        if mesh.normals.len() != mesh.positions.len() {
            return Err(SceneError::MissingNormals {
                positions: mesh.positions.len(),
                normals: mesh.normals.len(),
            });
        }
        let vertex_count = mesh.positions.len();
        for face in &mesh.faces {
            for &index in face {
                if index as usize >= vertex_count {
                    return Err(SceneError::FaceOutOfBounds { index, count: vertex_count });
                }
            }
        }

        let offset = self.positions.len() as u32;
        let (scale, rotation, _) = transform.to_scale_rotation_translation();
        for &p in &mesh.positions {
            self.positions.push(transform.transform_point3(p));
        }
        for &n in &mesh.normals {
            let rotated = rotation * (n / scale);
            self.normals.push(if rotated.length_squared() > 0.0 {
                rotated.normalize()
            } else {
                Vec3::ZERO
            });
        }
        for i in 0..vertex_count {
            let t = mesh.tangents.get(i).copied().unwrap_or(Vec3::ZERO);
            let rotated = rotation * (t / scale);
            self.tangents.push(if rotated.length_squared() > 0.0 {
                rotated.normalize()
            } else {
                Vec3::ZERO
            });
            self.uvs.push(mesh.uvs.get(i).copied().unwrap_or(Vec2::ZERO));
        }

        let emissive = self.materials[material_idx as usize].is_emissive();
        let mut areal = ArealLight::default();
        let mut skipped = 0usize;
        for face in &mesh.faces {
            if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
                skipped += 1;
                continue;
            }
            let tri = Triangle::new(
                [face[0] + offset, face[1] + offset, face[2] + offset],
                material_idx,
            );
            if tri.area(&self.positions) <= 0.0 {
                skipped += 1;
                continue;
            }
            self.triangles.push(tri);
            if emissive {
                areal
                    .triangles_with_areas
                    .push((0.0, self.triangles.len() as u32 - 1));
            }
        }
        if skipped > 0 {
            warn!("skipped {} degenerate faces in mesh for \"{}\"", skipped, material);
        }
        if emissive && !areal.triangles_with_areas.is_empty() {
            self.areal_lights.push((0.0, areal));
        }
        Ok(())
    }

    /// Adds a procedural primitive (every three vertices form a face).
    pub fn add_primitive(
        &mut self,
        vertices: &[PrimVertex],
        transform: Mat4,
        material: &str,
    ) -> Result<(), SceneError> {
        debug_assert_eq!(vertices.len() % 3, 0);
        let mesh = MeshData {
            positions: vertices.iter().map(|v| v.position).collect(),
            normals: vertices.iter().map(|v| v.normal).collect(),
            tangents: vertices.iter().map(|v| v.tangent).collect(),
            uvs: vertices.iter().map(|v| v.uv).collect(),
            faces: (0..vertices.len() as u32 / 3)
                .map(|i| [3 * i, 3 * i + 1, 3 * i + 2])
                .collect(),
        };
        self.add_mesh(&mesh, transform, material)
    }

    /// Freezes the scene: recomputes triangle planes, light powers, events
    /// and bounds, derives the adaptive epsilon and builds the compressed
    /// kd-tree. The scene is read-only and safe to query concurrently
    /// afterwards.
    pub fn commit(&mut self) {
        let n = self.triangles.len();

        for tri in &mut self.triangles {
            tri.recompute_plane(&self.positions);
        }

        // Light powers; areal triangle lists sorted by descending area.
        self.total_areal_power = 0.0;
        let triangles = &self.triangles;
        let positions = &self.positions;
        let materials = &self.materials;
        for (power, areal) in &mut self.areal_lights {
            areal.total_area = 0.0;
            for entry in &mut areal.triangles_with_areas {
                let area = triangles[entry.1 as usize].area(positions);
                entry.0 = area;
                areal.total_area += area;
            }
            let first = areal.triangles_with_areas[0].1;
            areal.emission = materials[triangles[first as usize].material as usize].emission;
            areal
                .triangles_with_areas
                .sort_unstable_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
            areal.power = areal.total_area * areal.emission.sum();
            *power = areal.power;
            self.total_areal_power += areal.power;
        }
        self.total_point_power = self
            .point_lights
            .iter()
            .map(|l| l.intensity * 4.0 * PI)
            .sum();

        self.has_thinglass = self.materials.iter().any(|m| m.thin_glass);

        if n == 0 {
            self.kd = None;
            info!("committed empty scene");
            return;
        }

        // Per-axis sorted min/max events, two floats per triangle.
        for axis in 0..3 {
            let mut events = vec![0.0f32; 2 * n];
            for (i, tri) in self.triangles.iter().enumerate() {
                let a = self.positions[tri.vertices[0] as usize][axis];
                let b = self.positions[tri.vertices[1] as usize][axis];
                let c = self.positions[tri.vertices[2] as usize][axis];
                events[2 * i] = a.min(b).min(c);
                events[2 * i + 1] = a.max(b).max(c);
            }
            self.events[axis] = events;
        }

        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for axis in 0..3 {
            for &v in &self.events[axis] {
                min[axis] = min[axis].min(v);
                max[axis] = max[axis].max(v);
            }
        }
        let diameter = (max - min).length();
        if diameter > 0.0 {
            self.epsilon = 0.00001 * diameter;
        }
        debug!("scene diameter {}, epsilon {}", diameter, self.epsilon);

        self.bounds = Aabb {
            min: min - Vec3::splat(self.epsilon),
            max: max + Vec3::splat(self.epsilon),
        };

        self.kd = Some(KdTree::build(n, &self.events, self.bounds));

        info!(
            "committed {} vertices, {} triangles, {} materials, {} textures, {} point and {} areal lights ({:.1} W / {:.1} W)",
            self.positions.len(),
            n,
            self.materials.len(),
            self.textures.len(),
            self.point_lights.len(),
            self.areal_lights.len(),
            self.total_point_power,
            self.total_areal_power,
        );
    }

    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        self.kd.as_ref()?.intersect(self, ray, None)
    }

    pub fn intersect_ignoring(&self, ray: &Ray, skip: Option<u32>) -> Option<Intersection> {
        self.kd.as_ref()?.intersect(self, ray, skip)
    }

    pub fn intersect_any(&self, ray: &Ray) -> bool {
        self.kd
            .as_ref()
            .and_then(|kd| kd.intersect_any(self, ray))
            .is_some()
    }

    pub fn intersect_ignoring_with_thinglass(
        &self,
        ray: &Ray,
        skip: Option<u32>,
    ) -> (Option<Intersection>, ThinglassCrossings) {
        match self.kd.as_ref() {
            Some(kd) => kd.intersect_thinglass(self, ray, skip),
            None => (None, Vec::new()),
        }
    }

    /// True when nothing blocks the segment between the two points.
    pub fn visibility(&self, a: Vec3, b: Vec3) -> bool {
        let distance = a.distance(b);
        if distance <= 20.0 * self.epsilon {
            return true;
        }
        let ray = Ray::segment(a, b, 10.0 * self.epsilon);
        !self.intersect_any(&ray)
    }

    /// Visibility that sees through thin glass; returns the crossings for
    /// absorption filtering, or None when the segment is blocked.
    pub fn visibility_with_thinglass(&self, a: Vec3, b: Vec3) -> Option<ThinglassCrossings> {
        let distance = a.distance(b);
        if distance <= 20.0 * self.epsilon {
            return Some(Vec::new());
        }
        let ray = Ray::segment(a, b, 10.0 * self.epsilon);
        let (hit, crossings) = self.intersect_ignoring_with_thinglass(&ray, None);
        if hit.is_some() {
            None
        } else {
            Some(crossings)
        }
    }

    pub fn total_light_power(&self) -> f32 {
        self.total_point_power + self.total_areal_power
    }

    /// Picks a light proportionally to power: point lights weigh
    /// intensity × 4π, areal lights area × emission. For areal lights a
    /// triangle is chosen by area and a uniform point on it is returned.
    pub fn random_light(&self, pick: Vec2, tri_sample: f32, point_sample: Vec2) -> Option<Light> {
        let total = self.total_light_power();
        if total <= 0.0 {
            return None;
        }
        let mut q = pick.x * total;
        if q < self.total_point_power {
            for light in &self.point_lights {
                q -= light.intensity * 4.0 * PI;
                if q <= 0.0 {
                    return Some(light.clone());
                }
            }
            return self.point_lights.last().cloned();
        }
        let mut q = pick.y * self.total_areal_power;
        for (power, areal) in &self.areal_lights {
            q -= power;
            if q <= 0.0 {
                return Some(areal.random_light(self, tri_sample, point_sample));
            }
        }
        self.areal_lights
            .last()
            .map(|(_, areal)| areal.random_light(self, tri_sample, point_sample))
    }
}

fn push_quad(out: &mut Vec<PrimVertex>, a: Vec3, e1: Vec3, e2: Vec3) {
    let normal = e2.cross(e1).normalize();
    let tangent = e1.normalize();
    let mk = |p: Vec3, uv: Vec2| PrimVertex { position: p, normal, uv, tangent };
    let (p00, p10, p11, p01) = (a, a + e1, a + e1 + e2, a + e2);
    out.push(mk(p00, Vec2::new(0.0, 0.0)));
    out.push(mk(p10, Vec2::new(1.0, 0.0)));
    out.push(mk(p11, Vec2::new(1.0, 1.0)));
    out.push(mk(p00, Vec2::new(0.0, 0.0)));
    out.push(mk(p11, Vec2::new(1.0, 1.0)));
    out.push(mk(p01, Vec2::new(0.0, 1.0)));
}

/// Unit plane at y = 0, facing +Y, spanning [-0.5, 0.5]².
pub fn unit_plane() -> Vec<PrimVertex> {
    let mut out = Vec::with_capacity(6);
    push_quad(
        &mut out,
        Vec3::new(-0.5, 0.0, -0.5),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
    );
    out
}

/// Unit cube centered at the origin, outward normals.
pub fn unit_cube() -> Vec<PrimVertex> {
    let mut out = Vec::with_capacity(36);
    let h = 0.5;
    // +X / -X
    push_quad(&mut out, Vec3::new(h, -h, -h), Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 1.0, 0.0));
    push_quad(&mut out, Vec3::new(-h, -h, -h), Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, 1.0));
    // +Y / -Y
    push_quad(&mut out, Vec3::new(-h, h, -h), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0));
    push_quad(&mut out, Vec3::new(-h, -h, -h), Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0));
    // +Z / -Z
    push_quad(&mut out, Vec3::new(-h, -h, h), Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
    push_quad(&mut out, Vec3::new(-h, -h, -h), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
    out
}
