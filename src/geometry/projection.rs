// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Closest-point projection and normal-directed pulling onto a mesh surface

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use super::bvh::Bvh;
use super::robust_predicates::check_coordinate;
use super::TriMesh;
use crate::error::{KernelError, Result};

/// Projects points onto a fixed mesh; the BVH is built once
pub struct SurfaceProjector<'a> {
    mesh: &'a TriMesh,
    bvh: Bvh,
}

impl<'a> SurfaceProjector<'a> {
    pub fn new(mesh: &'a TriMesh) -> Result<Self> {
        if mesh.face_count() == 0 {
            return Err(KernelError::invalid_topology("cannot project onto a mesh without faces"));
        }
        Ok(Self {
            mesh,
            bvh: Bvh::from_mesh(mesh),
        })
    }

    pub fn project(&self, point: &Point3<f64>) -> Point3<f64> {
        self.bvh
            .closest_point(self.mesh, point)
            .map_or(*point, |hit| hit.point)
    }

    /// Nearest intersection of the line `point + t * direction` with the
    /// surface, searching both ways along the line
    pub fn pull(&self, point: &Point3<f64>, direction: &Vector3<f64>) -> Option<Point3<f64>> {
        let direction = direction.try_normalize(0.0)?;
        let mut candidates = self.bvh.query_ray(point, &direction);
        candidates.extend(self.bvh.query_ray(point, &-direction));
        candidates
            .into_iter()
            .filter_map(|f| {
                let [a, b, c] = self.mesh.face_points(f);
                line_triangle(point, &direction, &a, &b, &c)
            })
            .min_by(|s, t| s.abs().total_cmp(&t.abs()))
            .map(|t| point + direction * t)
    }

    /// Closest point together with the face it lies on
    pub fn project_with_face(&self, point: &Point3<f64>) -> Option<(usize, Point3<f64>)> {
        self.bvh
            .closest_point(self.mesh, point)
            .map(|hit| (hit.face, hit.point))
    }
}

/// Closest point on `mesh` for every input point, in input order
pub fn project_points_on_mesh(points: &[Point3<f64>], mesh: &TriMesh) -> Result<Vec<Point3<f64>>> {
    for p in points {
        for c in p.iter() {
            check_coordinate(*c)?;
        }
    }
    let projector = SurfaceProjector::new(mesh)?;
    Ok(points.par_iter().map(|p| projector.project(p)).collect())
}

/// Pulls every point along its normal onto `mesh`; points whose line misses
/// the surface, or whose normal is zero, are returned unchanged
pub fn pull_points_on_mesh(
    points: &[Point3<f64>],
    normals: &[Vector3<f64>],
    mesh: &TriMesh,
) -> Result<Vec<Point3<f64>>> {
    if points.len() != normals.len() {
        return Err(KernelError::invalid_parameter(
            "normals",
            format!("{} normals for {} points", normals.len(), points.len()),
        ));
    }
    for c in points.iter().flat_map(|p| p.iter()).chain(normals.iter().flat_map(|n| n.iter())) {
        check_coordinate(*c)?;
    }
    let projector = SurfaceProjector::new(mesh)?;
    Ok(points
        .par_iter()
        .zip(normals.par_iter())
        .map(|(p, n)| projector.pull(p, n).unwrap_or(*p))
        .collect())
}

/// Copy of `source` with every vertex moved to its closest point on `target`
pub fn project_mesh_on_mesh(source: &TriMesh, target: &TriMesh) -> Result<TriMesh> {
    let vertices = project_points_on_mesh(source.vertices(), target)?;
    Ok(TriMesh::from_parts(vertices, source.faces().to_vec()))
}

/// Copy of `source` with every vertex pulled onto `target` along its
/// area-weighted vertex normal
pub fn pull_mesh_on_mesh(source: &TriMesh, target: &TriMesh) -> Result<TriMesh> {
    let vertices = pull_points_on_mesh(source.vertices(), &source.vertex_normals(), target)?;
    Ok(TriMesh::from_parts(vertices, source.faces().to_vec()))
}

/// Signed parameter `t` where the line `origin + t * direction` crosses
/// triangle `a b c`, edges included
fn line_triangle(
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> Option<f64> {
    const EPS: f64 = 1e-12;
    let (e1, e2) = (b - a, c - a);
    let h = direction.cross(&e2);
    let det = e1.dot(&h);
    if det.abs() < EPS * e1.norm() * e2.norm() {
        return None;
    }
    let s = origin - a;
    let u = s.dot(&h) / det;
    let q = s.cross(&e1);
    let v = direction.dot(&q) / det;
    if u < -EPS || v < -EPS || u + v > 1.0 + EPS {
        return None;
    }
    Some(e2.dot(&q) / det)
}
