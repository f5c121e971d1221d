//! Quadric edge collapse
//!
//! Iterative edge collapse driven by Garland-Heckbert quadric error metrics.
//! Edges are kept in an updatable priority queue keyed by their vertex pair,
//! so a collapse only re-scores the edges around the surviving vertex.
//! Collapses that would break the link condition or flip a neighbouring
//! triangle are rejected.

use itertools::Itertools;
use lowpoly_core::{to_point3d, Point3d, Point3f};
use nalgebra::{Matrix3, Matrix4, Vector3, Vector4};
use priority_queue::PriorityQueue;
use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;

type EdgeKey = (usize, usize);

#[inline]
fn edge_key(a: usize, b: usize) -> EdgeKey {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

// ============================================================
// Queue priority
// ============================================================

#[derive(Debug, Clone, Copy)]
struct CollapseCost(f64);

impl PartialEq for CollapseCost {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}
impl Eq for CollapseCost {}

impl PartialOrd for CollapseCost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CollapseCost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Max-queue over `Reverse` cost pops the cheapest edge first.
type EdgeQueue = PriorityQueue<EdgeKey, Reverse<CollapseCost>>;

// ============================================================
// Quadric helpers
// ============================================================

fn plane_quadric(normal: &Vector3<f64>, point: &Point3d, weight: f64) -> Matrix4<f64> {
    let d = -normal.dot(&point.coords);
    let p = Vector4::new(normal.x, normal.y, normal.z, d);
    p * p.transpose() * weight
}

fn quadric_error(q: &Matrix4<f64>, p: &Point3d) -> f64 {
    let v = p.to_homogeneous();
    (v.transpose() * q * v)[0].max(0.0)
}

// ============================================================
// Collapse state
// ============================================================

struct CollapseState {
    positions: Vec<Point3d>,
    quadrics: Vec<Matrix4<f64>>,
    faces: Vec<[usize; 3]>,
    face_alive: Vec<bool>,
    /// Faces incident to each vertex; entries for dead faces are pruned lazily
    incident: Vec<Vec<usize>>,
    vertex_alive: Vec<bool>,
    boundary: Vec<bool>,
    alive_faces: usize,
}

impl CollapseState {
    fn new(vertices: &[Point3f], triangles: &[[usize; 3]], boundary_weight: f64) -> Self {
        let nv = vertices.len();
        let positions: Vec<Point3d> = vertices.iter().map(to_point3d).collect();
        let mut quadrics = vec![Matrix4::zeros(); nv];
        let mut incident = vec![Vec::new(); nv];
        let mut face_alive = Vec::with_capacity(triangles.len());
        let mut edge_faces: HashMap<EdgeKey, (u32, usize)> = HashMap::with_capacity(triangles.len() * 3 / 2);
        let mut alive_faces = 0;

        for (fi, tri) in triangles.iter().enumerate() {
            let [a, b, c] = *tri;
            let degenerate = a == b || b == c || a == c;
            face_alive.push(!degenerate);
            if degenerate {
                continue;
            }
            alive_faces += 1;

            for &v in tri {
                incident[v].push(fi);
            }
            for (x, y) in tri.iter().copied().circular_tuple_windows() {
                let entry = edge_faces.entry(edge_key(x, y)).or_insert((0, fi));
                entry.0 += 1;
            }

            let cross = (positions[b] - positions[a]).cross(&(positions[c] - positions[a]));
            let double_area = cross.norm();
            if double_area > 0.0 && double_area.is_finite() {
                let q = plane_quadric(&(cross / double_area), &positions[a], double_area * 0.5);
                quadrics[a] += q;
                quadrics[b] += q;
                quadrics[c] += q;
            }
        }

        // Boundary edges get a constraint plane perpendicular to their face.
        // Sorted so quadric sums do not depend on hash order.
        let mut boundary_edges: Vec<(EdgeKey, usize)> = edge_faces
            .into_iter()
            .filter(|(_, (count, _))| *count == 1)
            .map(|(key, (_, fi))| (key, fi))
            .collect();
        boundary_edges.sort_unstable();

        let mut boundary = vec![false; nv];
        for ((a, b), fi) in boundary_edges {
            boundary[a] = true;
            boundary[b] = true;

            let [f0, f1, f2] = triangles[fi];
            let face_normal =
                (positions[f1] - positions[f0]).cross(&(positions[f2] - positions[f0]));
            let edge = positions[b] - positions[a];
            let constraint = edge.cross(&face_normal);
            let len = constraint.norm();
            if len > 0.0 && len.is_finite() && boundary_weight > 0.0 {
                let q = plane_quadric(
                    &(constraint / len),
                    &positions[a],
                    boundary_weight * edge.norm_squared(),
                );
                quadrics[a] += q;
                quadrics[b] += q;
            }
        }

        Self {
            positions,
            quadrics,
            faces: triangles.to_vec(),
            face_alive,
            incident,
            vertex_alive: vec![true; nv],
            boundary,
            alive_faces,
        }
    }

    fn alive_incident(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        self.incident[v].iter().copied().filter(|&f| self.face_alive[f])
    }

    fn neighbors(&self, v: usize) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .alive_incident(v)
            .flat_map(|f| self.faces[f])
            .filter(|&w| w != v)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Optimal placement and its quadric error for collapsing `(u, v)`.
    fn placement(&self, u: usize, v: usize) -> (Point3d, f64) {
        let q = self.quadrics[u] + self.quadrics[v];
        let pu = self.positions[u];
        let pv = self.positions[v];
        let midpoint = nalgebra::center(&pu, &pv);

        let a: Matrix3<f64> = q.fixed_view::<3, 3>(0, 0).into_owned();
        let b = -Vector3::new(q[(0, 3)], q[(1, 3)], q[(2, 3)]);
        let reach = (pv - pu).norm() * 2.0;

        if let Some(inv) = a.try_inverse() {
            let optimal = Point3d::from(inv * b);
            if optimal.iter().all(|c| c.is_finite()) && (optimal - midpoint).norm() <= reach {
                return (optimal, quadric_error(&q, &optimal));
            }
        }

        [midpoint, pu, pv]
            .into_iter()
            .map(|p| (p, quadric_error(&q, &p)))
            .min_by(|x, y| x.1.total_cmp(&y.1))
            .unwrap_or((midpoint, 0.0))
    }

    /// Link condition plus a triangle flip test around the moved vertices.
    fn can_collapse(&self, u: usize, v: usize, target: &Point3d) -> bool {
        let mut opposite: Vec<usize> = Vec::new();
        for f in self.alive_incident(u) {
            let face = self.faces[f];
            if face.contains(&v) {
                opposite.extend(face.iter().copied().filter(|&w| w != u && w != v));
            }
        }
        if opposite.is_empty() {
            return false;
        }
        opposite.sort_unstable();
        opposite.dedup();

        let nu = self.neighbors(u);
        let nv = self.neighbors(v);
        let common = nu.iter().filter(|w| nv.binary_search(w).is_ok()).count();
        if common != opposite.len() {
            return false;
        }

        for moved in [u, v] {
            for f in self.alive_incident(moved) {
                let face = self.faces[f];
                if face.contains(&u) && face.contains(&v) {
                    continue;
                }
                let old = face.map(|w| self.positions[w]);
                let new = face.map(|w| if w == moved { *target } else { self.positions[w] });
                let n_old = (old[1] - old[0]).cross(&(old[2] - old[0]));
                let n_new = (new[1] - new[0]).cross(&(new[2] - new[0]));
                let old_len = n_old.norm();
                if old_len == 0.0 {
                    continue;
                }
                if n_new.norm() <= old_len * 1e-8 || n_old.dot(&n_new) <= 0.0 {
                    return false;
                }
            }
        }
        true
    }

    /// Merge `v` into `u` at `target`. Returns the vertices whose edges need re-scoring.
    fn collapse(&mut self, u: usize, v: usize, target: Point3d) -> Vec<usize> {
        let v_faces = std::mem::take(&mut self.incident[v]);
        for f in v_faces {
            if !self.face_alive[f] {
                continue;
            }
            if self.faces[f].contains(&u) {
                self.face_alive[f] = false;
                self.alive_faces -= 1;
            } else {
                for w in self.faces[f].iter_mut() {
                    if *w == v {
                        *w = u;
                    }
                }
                self.incident[u].push(f);
            }
        }

        let face_alive = &self.face_alive;
        self.incident[u].retain(|&f| face_alive[f]);
        self.incident[u].sort_unstable();
        self.incident[u].dedup();

        self.positions[u] = target;
        let qv = self.quadrics[v];
        self.quadrics[u] += qv;
        self.boundary[u] |= self.boundary[v];
        self.vertex_alive[v] = false;

        self.neighbors(u)
    }

    fn into_output(self, collapses: usize) -> CollapseOutput {
        let mut remap = vec![usize::MAX; self.positions.len()];
        let mut vertices = Vec::new();
        let mut triangles = Vec::with_capacity(self.alive_faces);

        for (f, face) in self.faces.iter().enumerate() {
            if !self.face_alive[f] {
                continue;
            }
            let mapped = face.map(|w| {
                if remap[w] == usize::MAX {
                    remap[w] = vertices.len();
                    let p = self.positions[w];
                    vertices.push(Point3f::new(p.x as f32, p.y as f32, p.z as f32));
                }
                remap[w]
            });
            triangles.push(mapped);
        }

        CollapseOutput {
            vertices,
            triangles,
            collapses,
        }
    }
}

// ============================================================
// Public collapser
// ============================================================

/// Result of a collapse run: a compacted triangle mesh.
#[derive(Debug, Clone)]
pub struct CollapseOutput {
    pub vertices: Vec<Point3f>,
    pub triangles: Vec<[usize; 3]>,
    /// Number of edge collapses performed
    pub collapses: usize,
}

/// Quadric error edge collapse simplifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadricCollapser {
    /// Stop when the cheapest remaining collapse costs more than this
    pub max_error: Option<f64>,
    /// Never collapse an edge touching the open boundary
    pub preserve_boundary: bool,
    /// Weight of the boundary constraint planes (ignored when preserving)
    pub boundary_weight: f64,
}

impl Default for QuadricCollapser {
    fn default() -> Self {
        Self {
            max_error: None,
            preserve_boundary: false,
            boundary_weight: 100.0,
        }
    }
}

impl QuadricCollapser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(max_error: Option<f64>, preserve_boundary: bool, boundary_weight: f64) -> Self {
        Self {
            max_error,
            preserve_boundary,
            boundary_weight,
        }
    }

    fn skips(&self, state: &CollapseState, a: usize, b: usize) -> bool {
        self.preserve_boundary && (state.boundary[a] || state.boundary[b])
    }

    fn enqueue(&self, state: &CollapseState, queue: &mut EdgeQueue, a: usize, b: usize) {
        let key = edge_key(a, b);
        if self.skips(state, a, b) {
            queue.remove(&key);
            return;
        }
        let (_, cost) = state.placement(key.0, key.1);
        queue.push(key, Reverse(CollapseCost(cost)));
    }

    /// Collapse edges until at most `target_triangles` remain or no valid
    /// collapse is left.
    pub fn collapse(
        &self,
        vertices: &[Point3f],
        triangles: &[[usize; 3]],
        target_triangles: usize,
    ) -> CollapseOutput {
        let boundary_weight = if self.preserve_boundary { 0.0 } else { self.boundary_weight };
        let mut state = CollapseState::new(vertices, triangles, boundary_weight);

        let mut queue = EdgeQueue::new();
        for (f, face) in state.faces.iter().enumerate() {
            if !state.face_alive[f] {
                continue;
            }
            for (a, b) in face.iter().copied().circular_tuple_windows() {
                let key = edge_key(a, b);
                if queue.get(&key).is_none() {
                    self.enqueue(&state, &mut queue, a, b);
                }
            }
        }

        let mut collapses = 0usize;
        while state.alive_faces > target_triangles {
            let ((a, b), Reverse(CollapseCost(cost))) = match queue.pop() {
                Some(item) => item,
                None => break,
            };
            if let Some(max_error) = self.max_error {
                if cost > max_error {
                    break;
                }
            }
            if !state.vertex_alive[a] || !state.vertex_alive[b] {
                continue;
            }

            let (target, _) = state.placement(a, b);
            if !state.can_collapse(a, b, &target) {
                continue;
            }

            for w in state.neighbors(b) {
                queue.remove(&edge_key(b, w));
            }
            for w in state.collapse(a, b, target) {
                self.enqueue(&state, &mut queue, a, w);
            }
            collapses += 1;
        }

        state.into_output(collapses)
    }
}
