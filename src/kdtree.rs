use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use log::{debug, info};

use crate::ray::Ray;
use crate::scene::{Intersection, Scene};

pub const ISECT_COST: f32 = 80.0;
pub const TRAV_COST: f32 = 2.0;
pub const EMPTY_BONUS: f32 = 0.5;

/// Traversal stack capacity; comfortably above the build depth cap of
/// ⌊log₂ n⌋ + 8 for any realistic triangle count.
const MAX_STACK: usize = 64;

#[derive(Clone, Copy, Debug, Default)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn axis_bounds(&self, axis: usize) -> (f32, f32) {
        (self.min[axis], self.max[axis])
    }

    fn split(&self, axis: usize, pos: f32) -> (Aabb, Aabb) {
        let mut below = *self;
        let mut above = *self;
        below.max[axis] = pos;
        above.min[axis] = pos;
        (below, above)
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        (0..3).all(|i| self.min[i] <= other.max[i] && self.max[i] >= other.min[i])
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EventKind {
    Begin,
    End,
}

#[derive(Clone, Copy)]
struct BbEvent {
    pos: f32,
    triangle: u32,
    kind: EventKind,
}

/// Build-phase node. The tree is discarded once compressed.
pub struct BuildNode {
    bounds: Aabb,
    depth: u32,
    triangles: Vec<u32>,
    children: Option<Box<(BuildNode, BuildNode)>>,
    split_axis: usize,
    split_pos: f32,
    prob_below: f32,
    prob_above: f32,
    dups: usize,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TreeTotals {
    pub triangles: usize,
    pub leaves: usize,
    pub nodes: usize,
    pub dups: usize,
}

impl BuildNode {
    fn new(bounds: Aabb, depth: u32, triangles: Vec<u32>) -> Self {
        Self {
            bounds,
            depth,
            triangles,
            children: None,
            split_axis: 0,
            split_pos: 0.0,
            prob_below: 0.0,
            prob_above: 0.0,
            dups: 0,
        }
    }

    /// SAH subdivision over the BEGIN/END events of this node's triangles.
    /// Candidate positions are event positions inside the node bounds; ties
    /// between coincident events are settled by the BEGIN-before-END sort so
    /// the sweep state at the chosen offset is what the split distributes.
    fn subdivide(&mut self, events: &[Vec<f32>; 3], max_depth: u32) {
        if self.depth >= max_depth {
            return;
        }
        let n = self.triangles.len();
        if n < 2 {
            return;
        }

        let extent = self.bounds.extent();
        let sizes = [extent.x, extent.y, extent.z];
        let mut axis = 0;
        if sizes[1] > sizes[0] {
            axis = 1;
        }
        if sizes[2] > sizes[axis] {
            axis = 2;
        }
        let inv_total_sa =
            1.0 / (2.0 * (sizes[0] * sizes[1] + sizes[0] * sizes[2] + sizes[1] * sizes[2]));

        for _attempt in 0..3 {
            let axis_events = &events[axis];
            let mut evs: Vec<BbEvent> = Vec::with_capacity(2 * n);
            for &t in &self.triangles {
                evs.push(BbEvent {
                    pos: axis_events[2 * t as usize],
                    triangle: t,
                    kind: EventKind::Begin,
                });
                evs.push(BbEvent {
                    pos: axis_events[2 * t as usize + 1],
                    triangle: t,
                    kind: EventKind::End,
                });
            }
            evs.sort_unstable_by(|a, b| {
                a.pos
                    .partial_cmp(&b.pos)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.kind.cmp(&b.kind))
            });

            let (lo, hi) = self.bounds.axis_bounds(axis);
            let axis2 = (axis + 1) % 3;
            let axis3 = (axis + 2) % 3;

            let nosplit_cost = ISECT_COST * n as f32;
            let mut best: Option<(usize, f32, f32, f32)> = None;
            let mut best_cost = f32::INFINITY;
            let mut n_before: i64 = 0;
            let mut n_after: i64 = n as i64;

            for (i, ev) in evs.iter().enumerate() {
                if ev.kind == EventKind::End {
                    n_after -= 1;
                }
                let pos = ev.pos;
                // Candidates outside the node bounds cannot split it.
                if pos > lo && pos < hi {
                    let below_sa = 2.0
                        * (sizes[axis2] * sizes[axis3]
                            + (pos - lo) * sizes[axis2]
                            + (pos - lo) * sizes[axis3]);
                    let above_sa = 2.0
                        * (sizes[axis2] * sizes[axis3]
                            + (hi - pos) * sizes[axis2]
                            + (hi - pos) * sizes[axis3]);
                    let p_below = below_sa * inv_total_sa;
                    let p_above = above_sa * inv_total_sa;
                    let bonus = if n_before == 0 || n_after == 0 { EMPTY_BONUS } else { 0.0 };
                    let cost = TRAV_COST
                        + ISECT_COST
                            * (1.0 - bonus)
                            * (p_below * n_before as f32 + p_above * n_after as f32);
                    if cost < best_cost {
                        best_cost = cost;
                        best = Some((i, pos, p_below, p_above));
                    }
                }
                if ev.kind == EventKind::Begin {
                    n_before += 1;
                }
            }

            let (offset, pos, p_below, p_above) = match best {
                Some(b) if best_cost <= nosplit_cost => b,
                // No candidate beats staying a leaf; try the next axis.
                _ => {
                    axis = (axis + 1) % 3;
                    continue;
                }
            };

            let mut left = Vec::new();
            let mut right = Vec::new();
            for ev in &evs[..offset] {
                if ev.kind == EventKind::Begin {
                    left.push(ev.triangle);
                }
            }
            for ev in &evs[offset + 1..] {
                if ev.kind == EventKind::End {
                    right.push(ev.triangle);
                }
            }
            self.dups = left.len() + right.len() - n;

            let (below_bounds, above_bounds) = self.bounds.split(axis, pos);
            let mut ch0 = BuildNode::new(below_bounds, self.depth + 1, left);
            let mut ch1 = BuildNode::new(above_bounds, self.depth + 1, right);
            ch0.subdivide(events, max_depth);
            ch1.subdivide(events, max_depth);

            self.split_axis = axis;
            self.split_pos = pos;
            self.prob_below = p_below;
            self.prob_above = p_above;
            self.triangles = Vec::new();
            self.children = Some(Box::new((ch0, ch1)));
            return;
        }
    }

    /// Triangles across leaves / leaf count / node count / duplicates.
    pub fn totals(&self) -> TreeTotals {
        match &self.children {
            None => TreeTotals {
                triangles: self.triangles.len(),
                leaves: 1,
                nodes: 1,
                dups: self.dups,
            },
            Some(ch) => {
                let a = ch.0.totals();
                let b = ch.1.totals();
                TreeTotals {
                    triangles: a.triangles + b.triangles,
                    leaves: a.leaves + b.leaves,
                    nodes: a.nodes + b.nodes + 1,
                    dups: a.dups + b.dups + self.dups,
                }
            }
        }
    }

    /// Expected traversal cost under the SAH model.
    pub fn expected_cost(&self) -> f32 {
        match &self.children {
            None => ISECT_COST * self.triangles.len() as f32,
            Some(ch) => {
                TRAV_COST
                    + self.prob_below * ch.0.expected_cost()
                    + self.prob_above * ch.1.expected_cost()
            }
        }
    }
}

/// One 8-byte compressed node. The two low bits of `meta` discriminate:
/// 0–2 is an internal node split on that axis, 3 a leaf. Internal nodes
/// keep the split position in `data` and the right child index in the high
/// bits of `meta`; the left child is the next node in the array. Leaves keep
/// the first-triangle offset in `data` and the count in `meta`'s high bits.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Default)]
pub struct PackedKdNode {
    data: u32,
    meta: u32,
}

impl PackedKdNode {
    fn internal(axis: usize, split: f32) -> Self {
        Self { data: split.to_bits(), meta: axis as u32 }
    }

    fn leaf(count: u32, first: u32) -> Self {
        Self { data: first, meta: (count << 2) | 0x3 }
    }

    fn set_other_child(&mut self, pos: u32) {
        self.meta = (self.meta & 0x3) | (pos << 2);
    }

    pub fn is_leaf(&self) -> bool {
        self.meta & 0x3 == 0x3
    }

    pub fn split_axis(&self) -> usize {
        (self.meta & 0x3) as usize
    }

    pub fn split_pos(&self) -> f32 {
        f32::from_bits(self.data)
    }

    pub fn other_child(&self) -> u32 {
        self.meta >> 2
    }

    pub fn triangle_count(&self) -> u32 {
        self.meta >> 2
    }

    pub fn first_triangle(&self) -> u32 {
        self.data
    }
}

#[derive(Clone, Copy, Default)]
struct Todo {
    node: u32,
    tmin: f32,
    tmax: f32,
}

pub struct KdTree {
    pub nodes: Vec<PackedKdNode>,
    pub triangle_refs: Vec<u32>,
    pub bounds: Aabb,
    pub totals: TreeTotals,
}

impl KdTree {
    /// Builds and compresses the tree over `n_triangles`, using the per-axis
    /// sorted min/max events precomputed by the scene.
    pub fn build(n_triangles: usize, events: &[Vec<f32>; 3], bounds: Aabb) -> KdTree {
        let max_depth = (n_triangles as f32).log2() as u32 + 8;
        debug!("building kd-tree over {} triangles, max depth {}", n_triangles, max_depth);

        let mut root = BuildNode::new(bounds, 0, (0..n_triangles as u32).collect());
        root.subdivide(events, max_depth);

        let totals = root.totals();
        info!(
            "kd-tree: {} triangles in {} leaves over {} nodes ({} duplicates), {:.1} per leaf",
            totals.triangles,
            totals.leaves,
            totals.nodes,
            totals.dups,
            totals.triangles as f32 / totals.leaves as f32
        );
        debug!(
            "expected cost {:.0} vs flat {:.0}",
            root.expected_cost(),
            ISECT_COST * n_triangles as f32
        );

        let mut nodes = Vec::with_capacity(totals.nodes);
        let mut refs = Vec::with_capacity(totals.triangles);
        compress_rec(&root, &mut nodes, &mut refs);
        debug_assert_eq!(nodes.len(), totals.nodes);
        debug_assert_eq!(refs.len(), totals.triangles);
        info!(
            "compressed kd-tree: {} kiB of nodes",
            nodes.len() * std::mem::size_of::<PackedKdNode>() / 1024
        );

        KdTree { nodes, triangle_refs: refs, bounds, totals }
    }

    /// Slab test against the scene bounds, pre-clipped to [near, far].
    fn clip_to_bounds(&self, ray: &Ray) -> Option<(f32, f32)> {
        let mut t0 = ray.near;
        let mut t1 = ray.far;
        for i in 0..3 {
            let inv = 1.0 / ray.direction[i];
            let mut tn = (self.bounds.min[i] - ray.origin[i]) * inv;
            let mut tf = (self.bounds.max[i] - ray.origin[i]) * inv;
            if tn > tf {
                std::mem::swap(&mut tn, &mut tf);
            }
            t0 = t0.max(tn);
            t1 = t1.min(tf);
            if t0 > t1 {
                return None;
            }
        }
        Some((t0, t1))
    }

    fn push_children(
        &self,
        node: u32,
        packed: &PackedKdNode,
        ray: &Ray,
        tmin: f32,
        tmax: f32,
        stack: &mut [Todo; MAX_STACK],
        sp: &mut usize,
    ) {
        let axis = packed.split_axis();
        let split = packed.split_pos();
        let tplane = (split - ray.origin[axis]) / ray.direction[axis];
        let below_first = ray.origin[axis] < split
            || (ray.origin[axis] == split && ray.direction[axis] <= 0.0);
        let (first, second) = if below_first {
            (node + 1, packed.other_child())
        } else {
            (packed.other_child(), node + 1)
        };

        if tplane > tmax || tplane <= 0.0 {
            stack[*sp] = Todo { node: first, tmin, tmax };
            *sp += 1;
        } else if tplane < tmin {
            stack[*sp] = Todo { node: second, tmin, tmax };
            *sp += 1;
        } else {
            stack[*sp] = Todo { node: second, tmin: tplane, tmax };
            *sp += 1;
            stack[*sp] = Todo { node: first, tmin, tmax: tplane };
            *sp += 1;
        }
    }

    /// Closest-hit query, optionally ignoring one triangle (the origin of a
    /// bounced ray).
    pub fn intersect(&self, scene: &Scene, ray: &Ray, skip: Option<u32>) -> Option<Intersection> {
        let (t0, t1) = self.clip_to_bounds(ray)?;
        let eps = scene.epsilon;

        let mut stack = [Todo::default(); MAX_STACK];
        stack[0] = Todo { node: 0, tmin: t0, tmax: t1 };
        let mut sp = 1usize;
        let mut best: Option<Intersection> = None;

        while sp > 0 {
            sp -= 1;
            let Todo { node, tmin, tmax } = stack[sp];
            if ray.far < tmin {
                break;
            }
            let packed = self.nodes[node as usize];
            if packed.is_leaf() {
                let first = packed.first_triangle() as usize;
                let count = packed.triangle_count() as usize;
                let mut hit = false;
                for &t_idx in &self.triangle_refs[first..first + count] {
                    if skip == Some(t_idx) {
                        continue;
                    }
                    let tri = &scene.triangles[t_idx as usize];
                    if let Some((t, a, b)) = tri.intersect(&scene.positions, ray) {
                        if t < tmin - eps || t > tmax + eps {
                            continue;
                        }
                        if best.map_or(true, |prev| t < prev.t) {
                            best = Some(Intersection {
                                triangle: t_idx,
                                t,
                                a: 1.0 - a - b,
                                b: a,
                                c: b,
                            });
                            hit = true;
                        }
                    }
                }
                // Leaves come off the stack front to back, so the first leaf
                // with an accepted hit terminates the walk.
                if hit {
                    return best;
                }
            } else {
                self.push_children(node, &packed, ray, tmin, tmax, &mut stack, &mut sp);
            }
        }
        best
    }

    /// Any-hit query; returns on the first triangle inside the clip window,
    /// without the epsilon slop of the closest-hit walk.
    pub fn intersect_any(&self, scene: &Scene, ray: &Ray) -> Option<u32> {
        let (t0, t1) = self.clip_to_bounds(ray)?;

        let mut stack = [Todo::default(); MAX_STACK];
        stack[0] = Todo { node: 0, tmin: t0, tmax: t1 };
        let mut sp = 1usize;

        while sp > 0 {
            sp -= 1;
            let Todo { node, tmin, tmax } = stack[sp];
            if ray.far < tmin {
                break;
            }
            let packed = self.nodes[node as usize];
            if packed.is_leaf() {
                let first = packed.first_triangle() as usize;
                let count = packed.triangle_count() as usize;
                for &t_idx in &self.triangle_refs[first..first + count] {
                    let tri = &scene.triangles[t_idx as usize];
                    if let Some((t, _, _)) = tri.intersect(&scene.positions, ray) {
                        if t >= tmin && t <= tmax {
                            return Some(t_idx);
                        }
                    }
                }
            } else {
                self.push_children(node, &packed, ray, tmin, tmax, &mut stack, &mut sp);
            }
        }
        None
    }

    /// Closest-hit walk that never terminates on thin-glass triangles;
    /// instead their crossings are collected, ordered by distance, for the
    /// caller to apply as a transmission filter.
    pub fn intersect_thinglass(
        &self,
        scene: &Scene,
        ray: &Ray,
        skip: Option<u32>,
    ) -> (Option<Intersection>, Vec<(u32, f32)>) {
        let mut crossings: Vec<(u32, f32)> = Vec::new();
        let (t0, t1) = match self.clip_to_bounds(ray) {
            Some(w) => w,
            None => return (None, crossings),
        };
        let eps = scene.epsilon;

        let mut stack = [Todo::default(); MAX_STACK];
        stack[0] = Todo { node: 0, tmin: t0, tmax: t1 };
        let mut sp = 1usize;
        let mut best: Option<Intersection> = None;
        let mut done = false;

        while sp > 0 && !done {
            sp -= 1;
            let Todo { node, tmin, tmax } = stack[sp];
            if ray.far < tmin {
                break;
            }
            let packed = self.nodes[node as usize];
            if packed.is_leaf() {
                let first = packed.first_triangle() as usize;
                let count = packed.triangle_count() as usize;
                for &t_idx in &self.triangle_refs[first..first + count] {
                    if skip == Some(t_idx) {
                        continue;
                    }
                    let tri = &scene.triangles[t_idx as usize];
                    if let Some((t, a, b)) = tri.intersect(&scene.positions, ray) {
                        if scene.materials[tri.material as usize].thin_glass {
                            if t > ray.near && t < ray.far {
                                crossings.push((t_idx, t));
                            }
                            continue;
                        }
                        if t < tmin - eps || t > tmax + eps {
                            continue;
                        }
                        if best.map_or(true, |prev| t < prev.t) {
                            best = Some(Intersection {
                                triangle: t_idx,
                                t,
                                a: 1.0 - a - b,
                                b: a,
                                c: b,
                            });
                            done = true;
                        }
                    }
                }
            } else {
                self.push_children(node, &packed, ray, tmin, tmax, &mut stack, &mut sp);
            }
        }

        crossings.sort_unstable_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        if let Some(hit) = best {
            crossings.retain(|&(_, t)| t <= hit.t + eps);
        }
        (best, crossings)
    }
}

fn compress_rec(node: &BuildNode, nodes: &mut Vec<PackedKdNode>, refs: &mut Vec<u32>) {
    match &node.children {
        None => {
            nodes.push(PackedKdNode::leaf(node.triangles.len() as u32, refs.len() as u32));
            refs.extend_from_slice(&node.triangles);
        }
        Some(ch) => {
            let my_pos = nodes.len();
            nodes.push(PackedKdNode::internal(node.split_axis, node.split_pos));
            compress_rec(&ch.0, nodes, refs);
            let other = nodes.len() as u32;
            nodes[my_pos].set_other_child(other);
            compress_rec(&ch.1, nodes, refs);
        }
    }
}
