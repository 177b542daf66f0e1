use glam::{Vec2, Vec3};
use log::trace;

use crate::bxdf::{self, SamplingStrategy};
use crate::camera::Camera;
use crate::color::Radiance;
use crate::ray::Ray;
use crate::sampler::Sampler;
use crate::sampling;
use crate::scene::{LightKind, Scene, ThinglassCrossings};

/// Transport below this floor terminates the path.
const TRANSPORT_FLOOR: f32 = 0.001;
/// Geometric-factor floor below which camera splats are dropped.
const SPLAT_G_FLOOR: f32 = 0.00001;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexKind {
    Scattered,
    Reflected,
    Entered,
    Left,
    /// The ray escaped the scene; only `vr`, the contribution and the
    /// thin-glass crossings are meaningful.
    Infinity,
}

#[derive(Clone, Debug)]
pub struct PathVertex {
    pub kind: VertexKind,
    pub position: Vec3,
    /// Geometric normal, flipped to face the incoming ray.
    pub face_normal: Vec3,
    /// Bump-perturbed shading normal.
    pub shading_normal: Vec3,
    /// Toward the previous vertex.
    pub vr: Vec3,
    /// Toward the next vertex.
    pub vi: Vec3,
    pub material: u32,
    pub uv: Vec2,
    pub diffuse: Radiance,
    pub specular: Radiance,
    pub backside: bool,
    /// Cumulative transport from the path origin up to (excluding) this
    /// vertex's own scattering.
    pub contribution: Radiance,
    pub thinglass: ThinglassCrossings,
    /// For light-path vertices: radiance carried from the light source.
    pub light_from_source: Radiance,
}

impl PathVertex {
    fn sky(vr: Vec3, contribution: Radiance, thinglass: ThinglassCrossings) -> Self {
        Self {
            kind: VertexKind::Infinity,
            position: Vec3::ZERO,
            face_normal: Vec3::ZERO,
            shading_normal: Vec3::ZERO,
            vr,
            vi: Vec3::ZERO,
            material: 0,
            uv: Vec2::ZERO,
            diffuse: Radiance::ZERO,
            specular: Radiance::ZERO,
            backside: false,
            contribution,
            thinglass,
            light_from_source: Radiance::ZERO,
        }
    }
}

/// The per-sample output: the pixel's own radiance plus splats that land on
/// arbitrary pixels via inverse camera projection.
#[derive(Clone, Debug, Default)]
pub struct PixelRenderResult {
    pub main_pixel: Radiance,
    pub side_effects: Vec<(u32, u32, Radiance)>,
}

pub struct PathTracer<'a> {
    pub scene: &'a Scene,
    pub camera: &'a Camera,
    /// Maximum view-path depth.
    pub depth: u32,
    /// Maximum light-path depth; zero disables light paths.
    pub reverse: u32,
    /// Russian-roulette survival probability, or negative to disable.
    pub russian: f32,
    /// Radiance clamp bounding fireflies.
    pub clamp: f32,
    pub bumpmap_scale: f32,
    pub force_fresnel: bool,
}

impl<'a> PathTracer<'a> {
    /// Renders one pixel: `multisample` stratified camera samples, each
    /// traced bidirectionally. Returns the radiance sum (not the average)
    /// together with any camera splats.
    pub fn render_pixel(
        &self,
        x: u32,
        y: u32,
        multisample: u32,
        sampler: &mut dyn Sampler,
        raycount: &mut u64,
    ) -> PixelRenderResult {
        let mut total = PixelRenderResult::default();
        for _ in 0..multisample {
            sampler.advance();
            let coords = sampler.get_2d();
            let ray = if self.camera.is_pinhole() {
                self.camera.pixel_ray(x, y, coords)
            } else {
                self.camera.pixel_ray_lens(x, y, coords, sampler.get_2d())
            };
            let q = self.trace_path(&ray, sampler, raycount);
            total.main_pixel += q.main_pixel;
            total.side_effects.extend(q.side_effects);
        }
        total
    }

    pub fn trace_path(
        &self,
        ray: &Ray,
        sampler: &mut dyn Sampler,
        raycount: &mut u64,
    ) -> PixelRenderResult {
        let scene = self.scene;
        let mut result = PixelRenderResult::default();
        let camera_pos = ray.origin;

        // One light for the whole path, picked proportionally to power.
        let areal_sample = sampler.get_2d();
        let lightdir_sample = sampler.get_2d();
        let pick = sampler.get_2d();
        let tri_sample = sampler.get_1d();
        let mut main_light = scene.random_light(pick, tri_sample, areal_sample);

        let path = self.generate_path(ray, self.depth, self.russian, sampler, raycount);

        // Light path, started from a cosine-distributed direction on the
        // chosen light's surface.
        let mut light_path = Vec::new();
        let mut light_at_path_start = Radiance::ZERO;
        if let Some(light) = main_light.as_mut() {
            let (light_normal, light_dir) = match light.kind {
                LightKind::Sphere { size } => {
                    let dir = sampling::square_to_sphere_uniform(areal_sample);
                    light.position += dir * size;
                    (dir, sampling::square_to_hemisphere_cosine_directed(lightdir_sample, dir))
                }
                LightKind::Hemisphere { normal } => {
                    (normal, sampling::square_to_hemisphere_cosine_directed(lightdir_sample, normal))
                }
            };
            if self.reverse > 0 {
                let origin = light.position + light_normal * scene.epsilon * 100.0;
                let light_ray = Ray::new(origin, light_dir);
                light_path = self.generate_path(&light_ray, self.reverse, -1.0, sampler, raycount);
            }
            light_at_path_start =
                light.color * light.intensity * light.directional_factor(light_dir);
        }

        // Carry radiance along the light path; scattering vertices visible
        // from the camera splat through the inverse projection.
        for vertex in light_path.iter_mut() {
            let light_here = vertex.contribution * light_at_path_start;
            vertex.light_from_source = light_here;

            if vertex.kind != VertexKind::Scattered {
                continue;
            }
            if !scene.visibility(vertex.position, camera_pos) {
                continue;
            }
            let direction = (vertex.position - camera_pos).normalize();
            let material = &scene.materials[vertex.material as usize];
            let f = material.bxdf_value(
                scene,
                vertex.diffuse,
                vertex.specular,
                vertex.shading_normal,
                vertex.vr,
                -direction,
                vertex.uv,
            );
            let g = vertex.shading_normal.dot(-direction).max(0.0)
                / camera_pos.distance_squared(vertex.position);
            let q = light_here * f;
            if g >= SPLAT_G_FLOOR && q.is_finite() {
                if let Some((sx, sy)) = self.camera.coords_from_direction(direction) {
                    result.side_effects.push((sx, sy, q * g));
                }
            }
        }

        // Accumulate along the view path.
        let mut path_total = Radiance::ZERO;
        for vertex in &path {
            if vertex.kind == VertexKind::Infinity {
                let sky = scene.sky_radiance(vertex.vr);
                path_total += vertex.contribution
                    * self.apply_thinglass(sky, &vertex.thinglass, -vertex.vr);
                continue;
            }

            let material = &scene.materials[vertex.material as usize];
            let mut total_here = Radiance::ZERO;

            if vertex.kind == VertexKind::Scattered {
                // Direct illumination from the chosen light.
                if let Some(light) = &main_light {
                    let filter = if scene.has_thinglass {
                        scene.visibility_with_thinglass(light.position, vertex.position)
                    } else if scene.visibility(light.position, vertex.position) {
                        Some(Vec::new())
                    } else {
                        None
                    };
                    if let Some(crossings) = filter {
                        let vi = (light.position - vertex.position).normalize();
                        let f = material.bxdf_value(
                            scene,
                            vertex.diffuse,
                            vertex.specular,
                            vertex.shading_normal,
                            vi,
                            vertex.vr,
                            vertex.uv,
                        );
                        let g = vertex.shading_normal.dot(vi).max(0.0)
                            / light.position.distance_squared(vertex.position);
                        let mut incoming =
                            light.color * light.intensity * light.directional_factor(-vi);
                        incoming = self.apply_thinglass(incoming, &crossings, vi);
                        total_here += incoming * f * g;
                    }
                }

                // Connections to every light-path vertex visible from here.
                for lv in &light_path {
                    if lv.kind == VertexKind::Infinity {
                        continue;
                    }
                    if !scene.visibility(lv.position, vertex.position) {
                        continue;
                    }
                    let light_to_p = (vertex.position - lv.position).normalize();
                    let light_material = &scene.materials[lv.material as usize];
                    let f_light = light_material.bxdf_value(
                        scene,
                        lv.diffuse,
                        lv.specular,
                        lv.shading_normal,
                        light_to_p,
                        lv.vr,
                        lv.uv,
                    );
                    let f_point = material.bxdf_value(
                        scene,
                        vertex.diffuse,
                        vertex.specular,
                        vertex.shading_normal,
                        vertex.vr,
                        -light_to_p,
                        vertex.uv,
                    );
                    let g = vertex.shading_normal.dot(-light_to_p).max(0.0)
                        / lv.position.distance_squared(vertex.position);
                    total_here += lv.light_from_source * f_light * f_point * g;
                }
            }
            // Reflected/entered/left vertices carry their transport in the
            // path weights; nothing to add locally.

            // Self-emission, suppressed on the back of emissive faces.
            if material.is_emissive() && !vertex.backside {
                total_here += material.emission;
            }

            path_total += total_here.clamped(self.clamp) * vertex.contribution;
        }

        result.main_pixel = path_total.clamped(self.clamp).scrubbed();
        result
    }

    /// Extends a path vertex by vertex until a termination condition:
    /// escape, degenerate shading data, transport floor, Russian roulette
    /// or the depth cap.
    pub fn generate_path(
        &self,
        start: &Ray,
        max_depth: u32,
        russian: f32,
        sampler: &mut dyn Sampler,
        raycount: &mut u64,
    ) -> Vec<PathVertex> {
        let scene = self.scene;
        let mut path: Vec<PathVertex> = Vec::new();
        let mut cumulative = Radiance::ONE;
        let mut ray = *start;
        let mut last_triangle: Option<u32> = None;
        let mut n = 0;

        while n < max_depth {
            n += 1;
            *raycount += 1;

            let (hit, crossings) = if scene.has_thinglass {
                scene.intersect_ignoring_with_thinglass(&ray, last_triangle)
            } else {
                (scene.intersect_ignoring(&ray, last_triangle), Vec::new())
            };

            let isect = match hit {
                Some(isect) => isect,
                None => {
                    path.push(PathVertex::sky(-ray.direction, cumulative, crossings));
                    break;
                }
            };

            let tri = &scene.triangles[isect.triangle as usize];
            let material_idx = tri.material;
            let material = &scene.materials[material_idx as usize];
            let position = ray.at(isect.t);

            let mut face_normal = isect.lerp3(
                scene.normals[tri.vertices[0] as usize],
                scene.normals[tri.vertices[1] as usize],
                scene.normals[tri.vertices[2] as usize],
            );
            if !face_normal.is_finite() {
                // Broken vertex normals; fall back to any usable one.
                face_normal = tri
                    .vertices
                    .iter()
                    .map(|&v| scene.normals[v as usize])
                    .find(|nv| nv.is_finite())
                    .unwrap_or(Vec3::ZERO);
            }
            if !face_normal.is_finite() || face_normal.length_squared() <= 0.0 {
                // All three degenerate; abandon this path.
                return path;
            }
            face_normal = face_normal.normalize();

            let vr = -ray.direction;
            let mut backside = false;
            let mut from_inside = false;
            if face_normal.dot(vr) < 0.0 {
                from_inside = true;
                face_normal = -face_normal;
                backside = true;
            }

            let uv = if material.has_any_texture() {
                isect.lerp2(
                    scene.uvs[tri.vertices[0] as usize],
                    scene.uvs[tri.vertices[1] as usize],
                    scene.uvs[tri.vertices[2] as usize],
                )
            } else {
                Vec2::ZERO
            };

            let (diffuse_color, specular_color) = (
                material
                    .diffuse_texture
                    .map_or(material.diffuse, |t| scene.textures[t].sample(uv)),
                material
                    .specular_texture
                    .map_or(material.specular, |t| scene.textures[t].sample(uv)),
            );
            let diffuse = Radiance::from(diffuse_color);
            let specular = Radiance::from(specular_color);

            // Bump-perturbed shading normal.
            let mut shading_normal = face_normal;
            if let Some(bump) = material.bump_texture {
                let bump_tex = &scene.textures[bump];
                let right = bump_tex.slope_right(uv);
                let bottom = bump_tex.slope_bottom(uv);
                let tangent = isect.lerp3(
                    scene.tangents[tri.vertices[0] as usize],
                    scene.tangents[tri.vertices[1] as usize],
                    scene.tangents[tri.vertices[2] as usize],
                );
                // Opposed tangents at coincident vertices interpolate to
                // zero; ignore the bump map there rather than produce NaNs.
                if tangent.length_squared() >= 0.001 {
                    let tangent = tangent.normalize();
                    let bitangent = face_normal.cross(tangent).normalize();
                    let tangent2 = bitangent.cross(face_normal);
                    let perturbed = (face_normal
                        + (tangent2 * right + bitangent * bottom) * self.bumpmap_scale)
                        .normalize();
                    if perturbed.is_finite() {
                        shading_normal = perturbed;
                    }
                }
            }

            // Classify the vertex with a single rescaled 1D sample.
            let mut type_sample = sampler.get_1d();
            let mut kind = if material.translucency > 0.001 {
                if from_inside {
                    VertexKind::Left
                } else {
                    let q = bxdf::fresnel(vr, shading_normal, 1.0 / material.ior);
                    if sampling::decide_and_rescale(&mut type_sample, q) {
                        VertexKind::Reflected
                    } else if sampling::decide_and_rescale(&mut type_sample, material.translucency)
                    {
                        VertexKind::Entered
                    } else {
                        VertexKind::Scattered
                    }
                }
            } else if self.force_fresnel {
                let total = diffuse_color.sum() + specular_color.sum();
                let strength = if total > 0.0 { specular_color.sum() / total } else { 0.0 };
                // Both decisions rescale the same sample; the joint
                // probability is their product.
                if sampling::decide_and_rescale(&mut type_sample, strength)
                    && sampling::decide_and_rescale(
                        &mut type_sample,
                        bxdf::fresnel(vr, shading_normal, 1.0 / material.ior),
                    )
                {
                    VertexKind::Reflected
                } else {
                    VertexKind::Scattered
                }
            } else {
                VertexKind::Scattered
            };

            // Next direction and transport.
            let mut transfer = Radiance::ONE;
            let mut strategy = SamplingStrategy::Cosine;
            let mut direction = Vec3::ZERO;
            let mut scatter = false;

            match kind {
                VertexKind::Reflected => {
                    direction = 2.0 * vr.dot(shading_normal) * shading_normal - vr;
                    if direction.dot(face_normal) <= 0.0 {
                        // The mirrored ray would enter the face; scatter
                        // instead.
                        kind = VertexKind::Scattered;
                        scatter = true;
                    }
                }
                VertexKind::Scattered => scatter = true,
                VertexKind::Entered => {
                    match bxdf::refract(vr, shading_normal, 1.0 / material.ior) {
                        Some(d) => direction = d,
                        None => {
                            kind = VertexKind::Reflected;
                            direction = 2.0 * vr.dot(shading_normal) * shading_normal - vr;
                        }
                    }
                }
                VertexKind::Left => match bxdf::refract(vr, shading_normal, material.ior) {
                    Some(d) => direction = d,
                    None => {
                        kind = VertexKind::Reflected;
                        direction = 2.0 * vr.dot(shading_normal) * shading_normal - vr;
                    }
                },
                VertexKind::Infinity => unreachable!(),
            }

            if scatter {
                kind = VertexKind::Scattered;
                // A shading normal pointing away from the viewer would
                // sample the wrong hemisphere; revert to the face normal.
                if shading_normal.dot(vr) <= 0.0 {
                    shading_normal = face_normal;
                }
                let sample = sampler.get_2d();
                let s = material.bxdf_sample(
                    scene,
                    diffuse,
                    specular,
                    shading_normal,
                    vr,
                    uv,
                    sample,
                );
                direction = s.direction;
                transfer = s.transport;
                strategy = s.strategy;
            }

            let russian_coeff = if russian > 0.0 && n > 1 { 1.0 / russian } else { 1.0 };

            if kind == VertexKind::Scattered {
                // Fold in whatever the sampling density does not already
                // cancel: cosine-sampled lobes cancel cos/p into π, BxDF
                // sampling cancels everything, uniform sampling divides by
                // the constant density.
                if strategy != SamplingStrategy::Cosine {
                    let cos = shading_normal.dot(direction);
                    if strategy != SamplingStrategy::Brdf {
                        transfer *= cos;
                    }
                } else {
                    transfer *= std::f32::consts::PI;
                }
                if strategy != SamplingStrategy::Brdf {
                    transfer *= material.bxdf_value(
                        scene,
                        diffuse,
                        specular,
                        shading_normal,
                        direction,
                        vr,
                        uv,
                    );
                }
                if strategy == SamplingStrategy::Uniform {
                    transfer *= 2.0 * std::f32::consts::PI;
                }
            } else if kind == VertexKind::Entered {
                // Absorption tint on entering a translucent medium.
                transfer *= Radiance::from(material.diffuse);
            }

            path.push(PathVertex {
                kind,
                position,
                face_normal,
                shading_normal,
                vr,
                vi: direction,
                material: material_idx,
                uv,
                diffuse,
                specular,
                backside,
                contribution: cumulative,
                thinglass: crossings,
                light_from_source: Radiance::ZERO,
            });

            cumulative *= russian_coeff;
            cumulative *= transfer;
            trace!("path vertex {}, cumulative transport {:?}", n, cumulative);

            if cumulative.max_component() < TRANSPORT_FLOOR {
                break;
            }
            if russian >= 0.0 && sampler.get_1d() > russian {
                break;
            }
            if !direction.is_finite() || direction.length_squared() <= 0.0 {
                break;
            }

            let offset = if kind == VertexKind::Entered || kind == VertexKind::Left {
                -1.0
            } else {
                1.0
            };
            ray = Ray::new(
                position + face_normal * scene.epsilon * 10.0 * offset,
                direction,
            );
            last_triangle = Some(isect.triangle);
        }

        path
    }

    /// Multiplies in the transmission tint of every thin-glass crossing the
    /// ray entered through, walking the ordered list from the far end.
    /// Crossings within epsilon of each other are kd-tree clones of the same
    /// triangle and filter once.
    fn apply_thinglass(
        &self,
        input: Radiance,
        crossings: &[(u32, f32)],
        ray_direction: Vec3,
    ) -> Radiance {
        let mut result = input;
        let mut last_t = -1.0f32;
        for &(tri_idx, t) in crossings.iter().rev() {
            if last_t >= 0.0 && (last_t - t).abs() <= self.scene.epsilon {
                continue;
            }
            last_t = t;
            let tri = &self.scene.triangles[tri_idx as usize];
            if tri.normal().dot(ray_direction) >= 0.0 {
                let material = &self.scene.materials[tri.material as usize];
                result = result * material.diffuse;
            }
        }
        result
    }
}
