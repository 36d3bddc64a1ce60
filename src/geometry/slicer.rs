// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Planar cross sections
//!
//! Every plane is cut against every face with exact side tests. Crossing
//! points are computed from the edge's lower-indexed vertex so that the two
//! faces sharing an edge produce bit-identical points, and the resulting
//! segments are chained with [`stitch_segments`].
//!
//! Polyline direction is not canonical. Closed polylines do not repeat their
//! first point.

use ahash::AHashMap;
use nalgebra::Point3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::halfedge::edge_key;
use super::plane::Plane;
use super::polyline::{stitch_segments, Polyline};
use super::robust_predicates::Orientation;
use super::TriMesh;
use crate::config::SliceConfig;
use crate::error::{KernelError, Result};

/// Cross section of a mesh with one plane
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaneSlice {
    pub polylines: Vec<Polyline>,
    /// Segment endpoints without a partner; non-zero on open or
    /// non-manifold input
    pub open_ends: usize,
}

impl PlaneSlice {
    pub fn is_complete(&self) -> bool {
        self.open_ends == 0
    }

    pub fn closed_count(&self) -> usize {
        self.polylines.iter().filter(|p| p.is_closed()).count()
    }
}

/// Slices `mesh` with every plane using default settings.
///
/// Slices come back in the order of `planes`. A plane that misses the
/// mesh yields an empty slice.
///
/// # Example
///
/// ```
/// use polyframe_mesh::geometry::{primitives::cube, slice_mesh, Plane};
///
/// let mesh = cube(1.0, false);
/// let slices = slice_mesh(&mesh, &[Plane::horizontal(0.5)]);
/// assert_eq!(slices[0].polylines.len(), 1);
/// assert_eq!(slices[0].polylines[0].len(), 4);
/// ```
pub fn slice_mesh(mesh: &TriMesh, planes: &[Plane]) -> Vec<PlaneSlice> {
    slice_planes(mesh, planes, &SliceConfig::default())
}

/// Slices `mesh` with explicit settings
pub fn slice_mesh_with(mesh: &TriMesh, planes: &[Plane], config: &SliceConfig) -> Result<Vec<PlaneSlice>> {
    config.tolerance.validate()?;
    Ok(slice_planes(mesh, planes, config))
}

/// Like [`slice_mesh`], but unmatched segment endpoints are an error
pub fn slice_mesh_strict(mesh: &TriMesh, planes: &[Plane]) -> Result<Vec<PlaneSlice>> {
    let slices = slice_planes(mesh, planes, &SliceConfig::default());
    if let Some((index, slice)) = slices.iter().enumerate().find(|(_, s)| !s.is_complete()) {
        return Err(KernelError::degenerate(format!(
            "plane {index} leaves {} unmatched segment endpoints",
            slice.open_ends
        )));
    }
    Ok(slices)
}

fn slice_planes(mesh: &TriMesh, planes: &[Plane], config: &SliceConfig) -> Vec<PlaneSlice> {
    let tolerance = config.tolerance.resolve(mesh.bounding_box().diagonal());

    let slices: Vec<PlaneSlice> = if config.parallel {
        planes
            .par_iter()
            .map(|plane| slice_one(mesh, plane, tolerance, config.merge_collinear))
            .collect()
    } else {
        planes
            .iter()
            .map(|plane| slice_one(mesh, plane, tolerance, config.merge_collinear))
            .collect()
    };

    for (index, slice) in slices.iter().enumerate() {
        if !slice.is_complete() {
            warn!(
                plane = index,
                open_ends = slice.open_ends,
                "slice has unmatched segment endpoints"
            );
        }
    }
    info!(
        planes = planes.len(),
        polylines = slices.iter().map(|s| s.polylines.len()).sum::<usize>(),
        faces = mesh.face_count(),
        "mesh sliced"
    );
    slices
}

fn slice_one(mesh: &TriMesh, plane: &Plane, tolerance: f64, merge_collinear: bool) -> PlaneSlice {
    let segments = plane_segments(mesh, plane);
    let stitched = stitch_segments(&segments, tolerance);
    let mut polylines = stitched.polylines;
    if merge_collinear {
        for polyline in &mut polylines {
            polyline.merge_collinear(tolerance);
        }
    }
    PlaneSlice {
        polylines,
        open_ends: stitched.open_ends,
    }
}

/// Raw intersection segments of one plane with the mesh surface
fn plane_segments(mesh: &TriMesh, plane: &Plane) -> Vec<(Point3<f64>, Point3<f64>)> {
    let points = mesh.vertices();
    let sides: Vec<Orientation> = points.iter().map(|p| plane.side(p)).collect();
    let distances: Vec<f64> = points.iter().map(|p| plane.signed_distance(p)).collect();

    let crossing = |u: usize, w: usize| -> Point3<f64> {
        let (lo, hi) = (u.min(w), u.max(w));
        let t = distances[lo] / (distances[lo] - distances[hi]);
        points[lo] + (points[hi] - points[lo]) * t
    };

    let mut segments = Vec::new();
    // Edges lying in the plane with the side of each adjacent face's third vertex
    let mut plane_edges: Vec<((usize, usize), Vec<Orientation>)> = Vec::new();
    let mut plane_edge_slot: AHashMap<(usize, usize), usize> = AHashMap::new();

    for face in mesh.faces() {
        let s = face.map(|v| sides[v]);
        let zeros = s.iter().filter(|o| o.is_zero()).count();
        match zeros {
            3 => {
                for i in 0..3 {
                    record_plane_edge(
                        &mut plane_edges,
                        &mut plane_edge_slot,
                        edge_key(face[i], face[(i + 1) % 3]),
                        Orientation::Zero,
                    );
                }
            }
            2 => {
                let Some(k) = (0..3).find(|&i| !s[i].is_zero()) else {
                    continue;
                };
                let key = edge_key(face[(k + 1) % 3], face[(k + 2) % 3]);
                record_plane_edge(&mut plane_edges, &mut plane_edge_slot, key, s[k]);
            }
            1 => {
                let Some(k) = (0..3).find(|&i| s[i].is_zero()) else {
                    continue;
                };
                let (u, w) = (face[(k + 1) % 3], face[(k + 2) % 3]);
                if sides[u] != sides[w] {
                    segments.push((points[face[k]], crossing(u, w)));
                }
            }
            _ => {
                if s[0] == s[1] && s[1] == s[2] {
                    continue;
                }
                // Exactly one vertex is alone on its side
                let lone = if s[0] == s[1] {
                    2
                } else if s[0] == s[2] {
                    1
                } else {
                    0
                };
                let v = face[lone];
                let a = crossing(v, face[(lone + 1) % 3]);
                let b = crossing(v, face[(lone + 2) % 3]);
                segments.push((a, b));
            }
        }
    }

    // An edge in the plane is part of the section unless every face around
    // it lies on the same side (touching contact, or interior of a flat region)
    for ((u, w), thirds) in plane_edges {
        let emit = thirds.len() == 1 || thirds.iter().any(|&o| o != thirds[0]);
        if emit {
            segments.push((points[u], points[w]));
        }
    }
    segments
}

fn record_plane_edge(
    plane_edges: &mut Vec<((usize, usize), Vec<Orientation>)>,
    slots: &mut AHashMap<(usize, usize), usize>,
    key: (usize, usize),
    third: Orientation,
) {
    let slot = *slots.entry(key).or_insert_with(|| {
        plane_edges.push((key, Vec::new()));
        plane_edges.len() - 1
    });
    plane_edges[slot].1.push(third);
}
