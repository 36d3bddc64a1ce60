// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Isotropic remeshing
//!
//! Every iteration splits edges longer than 4/3 of the target length,
//! collapses edges shorter than 4/5 of it, flips edges to bring vertex
//! valences toward 6 (4 on the boundary), relaxes vertices tangentially and
//! optionally projects them back onto the input surface.
//!
//! Feature edges (caller-constrained edges, and boundary edges when
//! protected) are never split, collapsed or flipped, and their vertices
//! never move.

use ahash::AHashSet;
use nalgebra::{Point3, Vector3};
use tracing::debug;

use super::halfedge::{edge_key, vertex_face_incidence, HalfEdgeMesh};
use super::projection::SurfaceProjector;
use super::TriMesh;
use crate::config::RemeshConfig;
use crate::error::{KernelError, Result};
use crate::utils::math::triangle_normal;

/// Upper bound on split passes per iteration
const MAX_SPLIT_PASSES: usize = 32;
/// Flips are refused across creases sharper than this (cosine of the
/// dihedral between face normals)
const FLIP_MIN_COS: f64 = 0.5;

/// Remeshes `mesh` toward edges of `target_edge_length`.
///
/// Fails with `InvalidParameter` for a non-positive target length and with
/// `InvalidTopology` for non-manifold input or constrained edges that are
/// not edges of the mesh. Zero iterations return an unchanged copy.
pub fn remesh(
    mesh: &TriMesh,
    target_edge_length: f64,
    iterations: usize,
    config: &RemeshConfig,
) -> Result<TriMesh> {
    if !(target_edge_length.is_finite() && target_edge_length > 0.0) {
        return Err(KernelError::invalid_parameter(
            "target_edge_length",
            format!("must be finite and positive, got {target_edge_length}"),
        ));
    }
    let topology = HalfEdgeMesh::from_mesh(mesh);
    topology.validate_manifold()?;
    mesh.check_non_degenerate()?;
    let features = feature_edges(mesh, &topology, config)?;

    if iterations == 0 || mesh.is_empty() {
        return Ok(mesh.clone());
    }

    let projector = if config.do_project {
        Some(SurfaceProjector::new(mesh)?)
    } else {
        None
    };

    let high = target_edge_length * 4.0 / 3.0;
    let low = target_edge_length * 4.0 / 5.0;
    let mut remesher = Remesher::new(mesh, features);
    debug!(
        faces = mesh.face_count(),
        target = target_edge_length,
        iterations,
        "remeshing"
    );

    for iteration in 0..iterations {
        let splits = remesher.split_long_edges(high);
        let collapses = remesher.collapse_short_edges(low, high);
        let flips = remesher.equalize_valences();
        for _ in 0..config.relaxation_steps {
            remesher.relax();
        }
        if let Some(projector) = &projector {
            remesher.project(projector);
        }
        remesher.compact_faces();
        debug!(iteration, splits, collapses, flips, faces = remesher.faces.len(), "remesh iteration");
    }

    Ok(remesher.into_mesh())
}

impl TriMesh {
    /// In-place variant of [`remesh`]; the mesh is left untouched on error
    pub fn remesh(&mut self, target_edge_length: f64, iterations: usize, config: &RemeshConfig) -> Result<()> {
        *self = remesh(self, target_edge_length, iterations, config)?;
        Ok(())
    }
}

/// Constrained edges, validated against the mesh, plus boundary edges when
/// protected
fn feature_edges(
    mesh: &TriMesh,
    topology: &HalfEdgeMesh,
    config: &RemeshConfig,
) -> Result<AHashSet<(usize, usize)>> {
    let existing: AHashSet<(usize, usize)> = mesh
        .faces()
        .iter()
        .flat_map(|f| (0..3).map(move |i| edge_key(f[i], f[(i + 1) % 3])))
        .collect();

    let mut features = AHashSet::new();
    for &[a, b] in &config.constrained_edges {
        let key = edge_key(a, b);
        if !existing.contains(&key) {
            return Err(KernelError::invalid_topology(format!(
                "constrained edge ({a}, {b}) is not an edge of the mesh"
            )));
        }
        features.insert(key);
    }
    if config.protect_boundary {
        features.extend(topology.boundary_edges().into_iter().map(|(a, b)| edge_key(a, b)));
    }
    Ok(features)
}

/// Working mesh with stable vertex indices and tombstoned faces
struct Remesher {
    points: Vec<Point3<f64>>,
    faces: Vec<[usize; 3]>,
    alive: Vec<bool>,
    vertex_faces: Vec<Vec<usize>>,
    features: AHashSet<(usize, usize)>,
    locked: Vec<bool>,
}

impl Remesher {
    fn new(mesh: &TriMesh, features: AHashSet<(usize, usize)>) -> Self {
        let mut locked = vec![false; mesh.vertex_count()];
        for &(a, b) in &features {
            locked[a] = true;
            locked[b] = true;
        }
        Self {
            points: mesh.vertices().to_vec(),
            faces: mesh.faces().to_vec(),
            alive: vec![true; mesh.face_count()],
            vertex_faces: vertex_face_incidence(mesh),
            features,
            locked,
        }
    }

    fn into_mesh(self) -> TriMesh {
        let faces = self
            .faces
            .into_iter()
            .zip(self.alive)
            .filter_map(|(f, alive)| alive.then_some(f))
            .collect();
        let mut mesh = TriMesh::from_parts(self.points, faces);
        mesh.cull_vertices();
        mesh
    }

    // ------------------------------------------------------------------
    // Local queries
    // ------------------------------------------------------------------

    fn edge_faces(&self, u: usize, w: usize) -> Vec<usize> {
        self.vertex_faces[u]
            .iter()
            .copied()
            .filter(|&f| self.faces[f].contains(&w))
            .collect()
    }

    fn neighbors(&self, v: usize) -> Vec<usize> {
        let mut result: Vec<usize> = self.vertex_faces[v]
            .iter()
            .flat_map(|&f| self.faces[f])
            .filter(|&n| n != v)
            .collect();
        result.sort_unstable();
        result.dedup();
        result
    }

    fn is_boundary_vertex(&self, v: usize) -> bool {
        self.neighbors(v)
            .into_iter()
            .any(|n| self.edge_faces(v, n).len() == 1)
    }

    /// Vertices that never move: feature vertices and boundary vertices
    fn is_pinned(&self, v: usize) -> bool {
        self.locked[v] || self.is_boundary_vertex(v)
    }

    fn target_valence(&self, v: usize) -> i64 {
        if self.is_boundary_vertex(v) {
            4
        } else {
            6
        }
    }

    fn length(&self, u: usize, w: usize) -> f64 {
        (self.points[u] - self.points[w]).norm()
    }

    /// Undirected edges of live faces, sorted
    fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges: Vec<(usize, usize)> = self
            .faces
            .iter()
            .zip(&self.alive)
            .filter(|(_, alive)| **alive)
            .flat_map(|(f, _)| (0..3).map(move |i| edge_key(f[i], f[(i + 1) % 3])))
            .collect();
        edges.sort_unstable();
        edges.dedup();
        edges
    }

    fn add_face(&mut self, face: [usize; 3]) {
        let f = self.faces.len();
        self.faces.push(face);
        self.alive.push(true);
        for v in face {
            self.vertex_faces[v].push(f);
        }
    }

    fn remove_face(&mut self, f: usize) {
        self.alive[f] = false;
        for v in self.faces[f] {
            self.vertex_faces[v].retain(|&g| g != f);
        }
    }

    /// Drops tombstoned faces; vertex indices are unchanged
    fn compact_faces(&mut self) {
        let faces: Vec<[usize; 3]> = self
            .faces
            .iter()
            .zip(&self.alive)
            .filter_map(|(f, &alive)| alive.then_some(*f))
            .collect();
        self.alive = vec![true; faces.len()];
        for list in &mut self.vertex_faces {
            list.clear();
        }
        for (f, face) in faces.iter().enumerate() {
            for &v in face {
                self.vertex_faces[v].push(f);
            }
        }
        self.faces = faces;
    }

    // ------------------------------------------------------------------
    // Split
    // ------------------------------------------------------------------

    fn split_long_edges(&mut self, high: f64) -> usize {
        let mut splits = 0;
        for _ in 0..MAX_SPLIT_PASSES {
            let mut long: Vec<(f64, usize, usize)> = self
                .edges()
                .into_iter()
                .filter(|e| !self.features.contains(e))
                .map(|(u, w)| (self.length(u, w), u, w))
                .filter(|&(length, _, _)| length > high)
                .collect();
            if long.is_empty() {
                break;
            }
            long.sort_by(|x, y| y.0.total_cmp(&x.0).then((x.1, x.2).cmp(&(y.1, y.2))));
            for (_, u, w) in long {
                if self.length(u, w) > high && self.split_edge(u, w) {
                    splits += 1;
                }
            }
        }
        splits
    }

    fn split_edge(&mut self, u: usize, w: usize) -> bool {
        let adjacent = self.edge_faces(u, w);
        if adjacent.is_empty() {
            return false;
        }
        let m = self.points.len();
        let midpoint = nalgebra::center(&self.points[u], &self.points[w]);
        self.points.push(midpoint);
        self.vertex_faces.push(Vec::new());
        self.locked.push(false);

        for f in adjacent {
            let face = self.faces[f];
            let Some(i) = (0..3).find(|&i| {
                let (a, b) = (face[i], face[(i + 1) % 3]);
                (a == u && b == w) || (a == w && b == u)
            }) else {
                continue;
            };
            let (a, b, c) = (face[i], face[(i + 1) % 3], face[(i + 2) % 3]);
            self.remove_face(f);
            self.add_face([a, m, c]);
            self.add_face([m, b, c]);
        }
        true
    }

    // ------------------------------------------------------------------
    // Collapse
    // ------------------------------------------------------------------

    fn collapse_short_edges(&mut self, low: f64, high: f64) -> usize {
        let mut short: Vec<(f64, usize, usize)> = self
            .edges()
            .into_iter()
            .filter(|e| !self.features.contains(e))
            .map(|(u, w)| (self.length(u, w), u, w))
            .filter(|&(length, _, _)| length < low)
            .collect();
        short.sort_by(|x, y| x.0.total_cmp(&y.0).then((x.1, x.2).cmp(&(y.1, y.2))));

        let mut collapses = 0;
        for (_, u, w) in short {
            if self.vertex_faces[u].is_empty() || self.vertex_faces[w].is_empty() {
                continue;
            }
            if self.length(u, w) < low && self.try_collapse(u, w, high) {
                collapses += 1;
            }
        }
        collapses
    }

    /// Merges `u` and `w` when the result stays manifold, unfolded and free
    /// of long edges
    fn try_collapse(&mut self, u: usize, w: usize, high: f64) -> bool {
        let (keep, removed, target) = match (self.is_pinned(u), self.is_pinned(w)) {
            (true, true) => return false,
            (true, false) => (u, w, self.points[u]),
            (false, true) => (w, u, self.points[w]),
            (false, false) => (w, u, nalgebra::center(&self.points[u], &self.points[w])),
        };

        let shared = self.edge_faces(u, w);
        if shared.is_empty() {
            return false;
        }
        let opposite: Vec<usize> = shared
            .iter()
            .filter_map(|&f| self.faces[f].iter().copied().find(|&v| v != u && v != w))
            .collect();

        // Link condition: the only common neighbours are the opposite vertices
        let nu = self.neighbors(u);
        let nw = self.neighbors(w);
        let common: Vec<usize> = nu.iter().copied().filter(|v| nw.binary_search(v).is_ok()).collect();
        if common.len() != opposite.len() || !common.iter().all(|v| opposite.contains(v)) {
            return false;
        }
        if opposite.iter().any(|&o| self.neighbors(o).len() <= 3) {
            return false;
        }
        if nu
            .iter()
            .chain(&nw)
            .filter(|&&n| n != u && n != w)
            .any(|&n| (self.points[n] - target).norm() > high)
        {
            return false;
        }

        // Surviving faces must not flip or degenerate
        let mut affected: Vec<usize> = self.vertex_faces[u]
            .iter()
            .chain(&self.vertex_faces[w])
            .copied()
            .filter(|f| !shared.contains(f))
            .collect();
        affected.sort_unstable();
        affected.dedup();
        for &f in &affected {
            let face = self.faces[f];
            let [a, b, c] = face.map(|v| self.points[v]);
            let before = triangle_normal(&a, &b, &c);
            let [a, b, c] = face.map(|v| if v == u || v == w { target } else { self.points[v] });
            let after = triangle_normal(&a, &b, &c);
            if before.dot(&after) <= 0.0 || after.norm_squared() <= f64::EPSILON * before.norm_squared() {
                return false;
            }
        }

        for f in shared {
            self.remove_face(f);
        }
        self.points[keep] = target;
        let moved = std::mem::take(&mut self.vertex_faces[removed]);
        for f in moved {
            for v in self.faces[f].iter_mut() {
                if *v == removed {
                    *v = keep;
                }
            }
            self.vertex_faces[keep].push(f);
        }
        true
    }

    // ------------------------------------------------------------------
    // Flip
    // ------------------------------------------------------------------

    fn equalize_valences(&mut self) -> usize {
        let mut flips = 0;
        for (u, w) in self.edges() {
            if !self.features.contains(&(u, w)) && self.try_flip(u, w) {
                flips += 1;
            }
        }
        flips
    }

    fn try_flip(&mut self, u: usize, w: usize) -> bool {
        let shared = self.edge_faces(u, w);
        if shared.len() != 2 {
            return false;
        }
        // f1 holds the directed edge u -> w, f2 the edge w -> u
        let directed = |f: usize, from: usize, to: usize| {
            let face = self.faces[f];
            (0..3).any(|i| face[i] == from && face[(i + 1) % 3] == to)
        };
        let (f1, f2) = if directed(shared[0], u, w) {
            (shared[0], shared[1])
        } else {
            (shared[1], shared[0])
        };
        if !directed(f1, u, w) || !directed(f2, w, u) {
            return false;
        }
        let third = |f: usize| self.faces[f].iter().copied().find(|&v| v != u && v != w);
        let (Some(a), Some(b)) = (third(f1), third(f2)) else {
            return false;
        };
        if a == b || self.neighbors(a).binary_search(&b).is_ok() {
            return false;
        }

        let valence = |v: usize| self.neighbors(v).len() as i64;
        let (vu, vw, va, vb) = (valence(u), valence(w), valence(a), valence(b));
        if vu <= 3 || vw <= 3 {
            return false;
        }
        let (tu, tw, ta, tb) = (
            self.target_valence(u),
            self.target_valence(w),
            self.target_valence(a),
            self.target_valence(b),
        );
        let deviation = |x: [i64; 4]| -> i64 {
            (x[0] - tu).pow(2) + (x[1] - tw).pow(2) + (x[2] - ta).pow(2) + (x[3] - tb).pow(2)
        };
        if deviation([vu - 1, vw - 1, va + 1, vb + 1]) >= deviation([vu, vw, va, vb]) {
            return false;
        }

        let p = |v: usize| self.points[v];
        let old1 = triangle_normal(&p(u), &p(w), &p(a));
        let old2 = triangle_normal(&p(w), &p(u), &p(b));
        let new1 = triangle_normal(&p(a), &p(u), &p(b));
        let new2 = triangle_normal(&p(b), &p(w), &p(a));
        let (Some(o1), Some(o2), Some(n1), Some(n2)) = (
            old1.try_normalize(0.0),
            old2.try_normalize(0.0),
            new1.try_normalize(0.0),
            new2.try_normalize(0.0),
        ) else {
            return false;
        };
        let reference = o1 + o2;
        if o1.dot(&o2) < FLIP_MIN_COS
            || n1.dot(&n2) < FLIP_MIN_COS
            || n1.dot(&reference) <= 0.0
            || n2.dot(&reference) <= 0.0
        {
            return false;
        }

        self.remove_face(f1);
        self.remove_face(f2);
        self.add_face([a, u, b]);
        self.add_face([b, w, a]);
        true
    }

    // ------------------------------------------------------------------
    // Relaxation and projection
    // ------------------------------------------------------------------

    fn vertex_normal(&self, v: usize) -> Vector3<f64> {
        let sum: Vector3<f64> = self.vertex_faces[v]
            .iter()
            .map(|&f| {
                let [a, b, c] = self.faces[f].map(|i| self.points[i]);
                triangle_normal(&a, &b, &c)
            })
            .sum();
        sum.try_normalize(0.0).unwrap_or_else(Vector3::zeros)
    }

    /// Moves free vertices toward the centroid of their neighbours within
    /// the tangent plane
    fn relax(&mut self) {
        let mut updated = self.points.clone();
        for v in 0..self.points.len() {
            if self.vertex_faces[v].is_empty() || self.is_pinned(v) {
                continue;
            }
            let neighbors = self.neighbors(v);
            let centroid = neighbors
                .iter()
                .map(|&n| self.points[n].coords)
                .sum::<Vector3<f64>>()
                / neighbors.len() as f64;
            let p = self.points[v];
            let normal = self.vertex_normal(v);
            let delta = centroid - p.coords;
            updated[v] = p + (delta - normal * normal.dot(&delta));
        }
        self.points = updated;
    }

    fn project(&mut self, projector: &SurfaceProjector<'_>) {
        for v in 0..self.points.len() {
            if !self.vertex_faces[v].is_empty() && !self.is_pinned(v) {
                self.points[v] = projector.project(&self.points[v]);
            }
        }
    }
}
