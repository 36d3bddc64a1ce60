// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Volume, area and summary statistics

use std::fmt;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::bbox::Aabb;
use super::halfedge::HalfEdgeMesh;
use super::TriMesh;
use crate::utils::math::{triangle_normal, CompensatedSum};

/// Relative volume under which `centroid` falls back to the surface centroid
const FLAT_VOLUME_EPSILON: f64 = 1e-12;

/// Signed volume enclosed by `mesh` (divergence theorem).
///
/// Positive for outward-oriented closed meshes, negative when the
/// orientation is inverted. Open meshes are not rejected, but the value is
/// then meaningless. Tetrahedra are taken from the bounding-box centre to
/// keep the terms small.
pub fn volume(mesh: &TriMesh) -> f64 {
    if mesh.is_empty() {
        return 0.0;
    }
    let reference = mesh.bounding_box().center();
    let mut sum = CompensatedSum::new();
    for f in 0..mesh.face_count() {
        sum.add(signed_tet_volume(&reference, &mesh.face_points(f)));
    }
    sum.value()
}

/// Total surface area
pub fn area(mesh: &TriMesh) -> f64 {
    let mut sum = CompensatedSum::new();
    for f in 0..mesh.face_count() {
        sum.add(mesh.face_area(f));
    }
    sum.value()
}

/// Centre of mass of the enclosed solid; for meshes enclosing no volume,
/// the area-weighted centroid of the surface. The origin for empty meshes.
pub fn centroid(mesh: &TriMesh) -> Point3<f64> {
    if mesh.is_empty() {
        return Point3::origin();
    }
    let bbox = mesh.bounding_box();
    let reference = bbox.center();

    let mut weight = 0.0;
    let mut moment = Vector3::zeros();
    for f in 0..mesh.face_count() {
        let [a, b, c] = mesh.face_points(f);
        let v = signed_tet_volume(&reference, &[a, b, c]);
        weight += v;
        moment += (reference.coords + a.coords + b.coords + c.coords) * (v / 4.0);
    }
    let scale = bbox.diagonal().powi(3).max(f64::MIN_POSITIVE);
    if weight.abs() > FLAT_VOLUME_EPSILON * scale {
        return Point3::from(moment / weight);
    }

    let mut weight = 0.0;
    let mut moment = Vector3::zeros();
    for f in 0..mesh.face_count() {
        let [a, b, c] = mesh.face_points(f);
        let w = triangle_normal(&a, &b, &c).norm();
        weight += w;
        moment += (a.coords + b.coords + c.coords) * (w / 3.0);
    }
    if weight > 0.0 {
        Point3::from(moment / weight)
    } else {
        reference
    }
}

fn signed_tet_volume(reference: &Point3<f64>, [a, b, c]: &[Point3<f64>; 3]) -> f64 {
    let (a, b, c) = (a - reference, b - reference, c - reference);
    a.dot(&b.cross(&c)) / 6.0
}

/// Summary of a mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshStats {
    /// Signed volume
    pub volume: f64,
    pub area: f64,
    pub bounding_box: Aabb,
    pub centroid: Point3<f64>,
    pub vertex_count: usize,
    pub face_count: usize,
    /// Every edge has exactly two faces
    pub is_closed: bool,
    pub is_manifold: bool,
}

/// Computes [`MeshStats`] for `mesh`
pub fn analyze(mesh: &TriMesh) -> MeshStats {
    let topology = HalfEdgeMesh::from_mesh(mesh);
    MeshStats {
        volume: volume(mesh),
        area: area(mesh),
        bounding_box: mesh.bounding_box(),
        centroid: centroid(mesh),
        vertex_count: mesh.vertex_count(),
        face_count: mesh.face_count(),
        is_closed: topology.is_closed(),
        is_manifold: topology.is_manifold(),
    }
}

impl fmt::Display for MeshStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Volume:       {:.6}", self.volume)?;
        writeln!(f, "Surface area: {:.6}", self.area)?;
        writeln!(
            f,
            "Centroid:     ({:.4}, {:.4}, {:.4})",
            self.centroid.x, self.centroid.y, self.centroid.z
        )?;
        if self.bounding_box.is_empty() {
            writeln!(f, "Bounding box: empty")?;
        } else {
            let (min, max) = (self.bounding_box.min, self.bounding_box.max);
            writeln!(
                f,
                "Bounding box: ({:.4}, {:.4}, {:.4}) - ({:.4}, {:.4}, {:.4})",
                min.x, min.y, min.z, max.x, max.y, max.z
            )?;
        }
        writeln!(f, "Vertices:     {}", self.vertex_count)?;
        writeln!(f, "Faces:        {}", self.face_count)?;
        write!(
            f,
            "Closed:       {}\nManifold:     {}",
            if self.is_closed { "yes" } else { "no" },
            if self.is_manifold { "yes" } else { "no" }
        )
    }
}
