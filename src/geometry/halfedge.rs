// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Half-edge connectivity derived from a [`TriMesh`]
//!
//! Built on demand into flat index arrays; nothing here points back into
//! the mesh, so it can be rebuilt after any mutation without dangling state.

use ahash::AHashMap;

use super::TriMesh;
use crate::error::{KernelError, Result};

/// Half-edge in a half-edge mesh
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge {
    /// Next half-edge in the same face
    pub next: usize,
    /// Previous half-edge in the same face
    pub prev: usize,
    /// Opposite half-edge, `None` on a boundary
    pub twin: Option<usize>,
    /// Vertex this half-edge starts from
    pub origin: usize,
    /// Vertex this half-edge points to
    pub vertex: usize,
    pub face: usize,
}

/// Half-edge connectivity with the defects found while building it
#[derive(Debug, Clone)]
pub struct HalfEdgeMesh {
    pub half_edges: Vec<HalfEdge>,
    /// One outgoing half-edge per vertex, `None` for isolated vertices
    pub vertex_half_edge: Vec<Option<usize>>,
    /// Undirected edges with more than two incident faces
    pub non_manifold_edges: Vec<(usize, usize)>,
    /// Directed edges used by two faces in the same direction
    pub inconsistent_edges: Vec<(usize, usize)>,
    vertex_count: usize,
}

impl HalfEdgeMesh {
    pub fn from_mesh(mesh: &TriMesh) -> Self {
        let faces = mesh.faces();
        let mut half_edges = Vec::with_capacity(faces.len() * 3);
        let mut vertex_half_edge = vec![None; mesh.vertex_count()];

        for (face_idx, face) in faces.iter().enumerate() {
            let base = half_edges.len();
            for k in 0..3 {
                half_edges.push(HalfEdge {
                    next: base + (k + 1) % 3,
                    prev: base + (k + 2) % 3,
                    twin: None,
                    origin: face[k],
                    vertex: face[(k + 1) % 3],
                    face: face_idx,
                });
                vertex_half_edge[face[k]].get_or_insert(base + k);
            }
        }

        // Undirected edge -> incident half-edges
        let mut edge_map: AHashMap<(usize, usize), Vec<usize>> =
            AHashMap::with_capacity(half_edges.len());
        for (he_idx, he) in half_edges.iter().enumerate() {
            edge_map
                .entry(edge_key(he.origin, he.vertex))
                .or_default()
                .push(he_idx);
        }

        let mut non_manifold_edges = Vec::new();
        let mut inconsistent_edges = Vec::new();
        for (&key, incident) in &edge_map {
            match incident.as_slice() {
                [_] => {}
                [a, b] => {
                    if half_edges[*a].origin == half_edges[*b].origin {
                        inconsistent_edges.push(key);
                    } else {
                        half_edges[*a].twin = Some(*b);
                        half_edges[*b].twin = Some(*a);
                    }
                }
                _ => non_manifold_edges.push(key),
            }
        }
        non_manifold_edges.sort_unstable();
        inconsistent_edges.sort_unstable();

        // Prefer a boundary half-edge as the vertex handle so fan walks
        // starting from it cover the whole one-ring.
        for (he_idx, he) in half_edges.iter().enumerate() {
            if he.twin.is_none() {
                vertex_half_edge[he.origin] = Some(he_idx);
            }
        }

        Self {
            half_edges,
            vertex_half_edge,
            non_manifold_edges,
            inconsistent_edges,
            vertex_count: mesh.vertex_count(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn half_edge_count(&self) -> usize {
        self.half_edges.len()
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        let mut keys: Vec<(usize, usize)> = self
            .half_edges
            .iter()
            .map(|he| edge_key(he.origin, he.vertex))
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys.len()
    }

    /// Directed boundary edges (half-edges without a twin)
    pub fn boundary_edges(&self) -> Vec<(usize, usize)> {
        self.half_edges
            .iter()
            .filter(|he| he.twin.is_none())
            .map(|he| (he.origin, he.vertex))
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.half_edges.iter().all(|he| he.twin.is_some())
            && self.non_manifold_edges.is_empty()
            && self.inconsistent_edges.is_empty()
    }

    /// Faces around `vertex`, walking the fan through twins
    pub fn vertex_faces(&self, vertex: usize) -> Vec<usize> {
        self.outgoing(vertex)
            .into_iter()
            .map(|he| self.half_edges[he].face)
            .collect()
    }

    /// One-ring neighbours of `vertex`
    pub fn vertex_neighbors(&self, vertex: usize) -> Vec<usize> {
        let outgoing = self.outgoing(vertex);
        let mut neighbors: Vec<usize> = outgoing
            .iter()
            .map(|&he| self.half_edges[he].vertex)
            .collect();
        // An open fan also reaches the vertex closing it from the other side
        if let Some(&last) = outgoing.last() {
            let closing = self.half_edges[self.half_edges[last].prev];
            if closing.twin.is_none() {
                neighbors.push(closing.origin);
            }
        }
        neighbors
    }

    pub fn valence(&self, vertex: usize) -> usize {
        self.vertex_neighbors(vertex).len()
    }

    /// Outgoing half-edges of `vertex` in fan order (clockwise around the
    /// vertex normal), starting from its handle.
    fn outgoing(&self, vertex: usize) -> Vec<usize> {
        let Some(start) = self.vertex_half_edge.get(vertex).copied().flatten() else {
            return Vec::new();
        };
        let mut result = vec![start];
        let mut current = start;
        // Rotate: prev half-edge points into the vertex, its twin leaves it
        while let Some(twin) = self.half_edges[self.half_edges[current].prev].twin {
            if twin == start || result.len() > self.half_edges.len() {
                break;
            }
            result.push(twin);
            current = twin;
        }
        result
    }

    /// Count of outgoing half-edges per vertex
    fn outgoing_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.vertex_count];
        for he in &self.half_edges {
            counts[he.origin] += 1;
        }
        counts
    }

    /// Edge-manifold with consistent orientation, and every vertex
    /// neighbourhood a single disk or half-disk
    pub fn is_manifold(&self) -> bool {
        self.first_vertex_defect().is_none()
            && self.non_manifold_edges.is_empty()
            && self.inconsistent_edges.is_empty()
    }

    fn first_vertex_defect(&self) -> Option<usize> {
        let counts = self.outgoing_counts();
        (0..self.vertex_count).find(|&v| counts[v] > 0 && self.outgoing(v).len() != counts[v])
    }

    /// Fails with `InvalidTopology` describing the first defect found
    pub fn validate_manifold(&self) -> Result<()> {
        if let Some(&(a, b)) = self.non_manifold_edges.first() {
            return Err(KernelError::invalid_topology(format!(
                "edge ({a}, {b}) is shared by more than two faces"
            )));
        }
        if let Some(&(a, b)) = self.inconsistent_edges.first() {
            return Err(KernelError::invalid_topology(format!(
                "faces sharing edge ({a}, {b}) have inconsistent orientation"
            )));
        }
        if let Some(v) = self.first_vertex_defect() {
            return Err(KernelError::invalid_topology(format!(
                "vertex {v} is non-manifold (its faces do not form a single fan)"
            )));
        }
        Ok(())
    }

    pub fn validate_closed_manifold(&self) -> Result<()> {
        self.validate_manifold()?;
        if let Some(he) = self.half_edges.iter().find(|he| he.twin.is_none()) {
            return Err(KernelError::invalid_topology(format!(
                "mesh is open: boundary edge ({}, {})",
                he.origin, he.vertex
            )));
        }
        Ok(())
    }
}

/// Canonical key of an undirected edge
pub fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Faces incident to each vertex
pub fn vertex_face_incidence(mesh: &TriMesh) -> Vec<Vec<usize>> {
    let mut incidence = vec![Vec::new(); mesh.vertex_count()];
    for (f, face) in mesh.faces().iter().enumerate() {
        for &v in face {
            incidence[v].push(f);
        }
    }
    incidence
}

/// Number of faces incident to each vertex
pub fn vertex_degrees(mesh: &TriMesh) -> Vec<usize> {
    let mut degrees = vec![0; mesh.vertex_count()];
    for face in mesh.faces() {
        for &v in face {
            degrees[v] += 1;
        }
    }
    degrees
}

/// Fails with `InvalidTopology` unless `mesh` is a closed, consistently
/// oriented 2-manifold
pub fn validate_closed_manifold(mesh: &TriMesh) -> Result<()> {
    HalfEdgeMesh::from_mesh(mesh).validate_closed_manifold()
}
