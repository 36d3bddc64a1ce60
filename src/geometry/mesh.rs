// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh representation and utilities

use ahash::AHashMap;
use nalgebra::{Matrix4, Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::robust_predicates::{are_collinear, check_coordinate};
use super::triangulation::triangulate_polygon;
use super::Aabb;
use crate::error::{KernelError, Result};
use crate::utils::math::{dominant_axis, drop_axis, triangle_normal};

/// Indexed triangle mesh: a dense vertex array and faces referencing it.
///
/// Every face holds three distinct in-bounds vertex indices; the winding
/// of a face determines its outward normal. Adjacency is derived on demand
/// (see [`super::HalfEdgeMesh`]) and never stored here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriMesh {
    vertices: Vec<Point3<f64>>,
    faces: Vec<[usize; 3]>,
}

impl TriMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mesh from the boundary array pair, validating every face.
    pub fn from_arrays(vertices: &[[f64; 3]], faces: &[[usize; 3]]) -> Result<Self> {
        let vertices = vertices
            .iter()
            .map(|v| Point3::new(v[0], v[1], v[2]))
            .collect();
        Self::from_points(vertices, faces.to_vec())
    }

    pub fn from_points(vertices: Vec<Point3<f64>>, faces: Vec<[usize; 3]>) -> Result<Self> {
        for (i, v) in vertices.iter().enumerate() {
            for c in v.iter() {
                check_coordinate(*c)
                    .map_err(|e| KernelError::numeric(format!("vertex {i}: {e}")))?;
            }
        }
        for (f, face) in faces.iter().enumerate() {
            if let Some(&bad) = face.iter().find(|&&i| i >= vertices.len()) {
                return Err(KernelError::invalid_topology(format!(
                    "face {f} references vertex {bad} but the mesh has {} vertices",
                    vertices.len()
                )));
            }
            if face[0] == face[1] || face[1] == face[2] || face[2] == face[0] {
                return Err(KernelError::invalid_topology(format!(
                    "face {f} repeats a vertex: {face:?}"
                )));
            }
        }
        Ok(Self { vertices, faces })
    }

    /// Internal constructor for arrays already known to be valid
    pub(crate) fn from_parts(vertices: Vec<Point3<f64>>, faces: Vec<[usize; 3]>) -> Self {
        debug_assert!(faces
            .iter()
            .all(|f| f.iter().all(|&i| i < vertices.len())));
        Self { vertices, faces }
    }

    /// Builds a mesh from polygons given as coordinate loops.
    ///
    /// Identical coordinates are merged into one vertex; polygons with more
    /// than three corners are ear-cut in their dominant projection plane.
    pub fn from_polygon_soup(polygons: &[Vec<[f64; 3]>]) -> Result<Self> {
        let mut vertices: Vec<Point3<f64>> = Vec::new();
        let mut lookup: AHashMap<[u64; 3], usize> = AHashMap::new();
        let mut faces = Vec::new();

        for (p, polygon) in polygons.iter().enumerate() {
            let mut loop_indices: Vec<usize> = Vec::with_capacity(polygon.len());
            for coords in polygon {
                let key = [coords[0].to_bits(), coords[1].to_bits(), coords[2].to_bits()];
                let index = *lookup.entry(key).or_insert_with(|| {
                    vertices.push(Point3::new(coords[0], coords[1], coords[2]));
                    vertices.len() - 1
                });
                if loop_indices.last() != Some(&index) {
                    loop_indices.push(index);
                }
            }
            if loop_indices.len() > 1 && loop_indices.first() == loop_indices.last() {
                loop_indices.pop();
            }
            if loop_indices.len() < 3 {
                return Err(KernelError::degenerate(format!(
                    "polygon {p} has fewer than three distinct corners"
                )));
            }
            faces.extend(triangulate_face(&vertices, &loop_indices)?);
        }

        Self::from_points(vertices, faces)
    }

    /// Converts back to the boundary array pair
    pub fn to_arrays(&self) -> (Vec<[f64; 3]>, Vec<[usize; 3]>) {
        let vertices = self.vertices.iter().map(|p| [p.x, p.y, p.z]).collect();
        (vertices, self.faces.clone())
    }

    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn face_points(&self, face: usize) -> [Point3<f64>; 3] {
        let [a, b, c] = self.faces[face];
        [self.vertices[a], self.vertices[b], self.vertices[c]]
    }

    /// Unit normal of a face, zero for a degenerate face
    pub fn face_normal(&self, face: usize) -> Vector3<f64> {
        let [a, b, c] = self.face_points(face);
        triangle_normal(&a, &b, &c)
            .try_normalize(0.0)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Area-weighted unit vertex normals, zero for unreferenced vertices
    pub fn vertex_normals(&self) -> Vec<Vector3<f64>> {
        let mut normals = vec![Vector3::zeros(); self.vertices.len()];
        for (f, face) in self.faces.iter().enumerate() {
            let [a, b, c] = self.face_points(f);
            let n = triangle_normal(&a, &b, &c);
            for &v in face {
                normals[v] += n;
            }
        }
        normals
            .into_iter()
            .map(|n| n.try_normalize(0.0).unwrap_or_else(Vector3::zeros))
            .collect()
    }

    pub fn face_area(&self, face: usize) -> f64 {
        let [a, b, c] = self.face_points(face);
        triangle_normal(&a, &b, &c).norm() * 0.5
    }

    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_points(&self.vertices)
    }

    /// Removes vertices no face references, keeping survivor order.
    /// Returns the number of removed vertices.
    pub fn cull_vertices(&mut self) -> usize {
        let mut used = vec![false; self.vertices.len()];
        for face in &self.faces {
            for &i in face {
                used[i] = true;
            }
        }

        let mut remap = vec![usize::MAX; self.vertices.len()];
        let mut kept = Vec::with_capacity(self.vertices.len());
        for (i, vertex) in self.vertices.iter().enumerate() {
            if used[i] {
                remap[i] = kept.len();
                kept.push(*vertex);
            }
        }

        let removed = self.vertices.len() - kept.len();
        self.vertices = kept;
        for face in &mut self.faces {
            for i in face.iter_mut() {
                *i = remap[*i];
            }
        }
        removed
    }

    /// Applies a homogeneous transform in place.
    ///
    /// The new coordinates are validated before any vertex is written, so a
    /// failing transform leaves the mesh untouched.
    pub fn transform(&mut self, matrix: &Matrix4<f64>) -> Result<()> {
        self.vertices = self.transformed_vertices(matrix)?;
        Ok(())
    }

    /// Returns a transformed copy; `self` is not modified
    pub fn transformed(&self, matrix: &Matrix4<f64>) -> Result<TriMesh> {
        Ok(TriMesh {
            vertices: self.transformed_vertices(matrix)?,
            faces: self.faces.clone(),
        })
    }

    fn transformed_vertices(&self, matrix: &Matrix4<f64>) -> Result<Vec<Point3<f64>>> {
        if matrix.iter().any(|m| !m.is_finite()) {
            return Err(KernelError::numeric("transform matrix has non-finite entries"));
        }
        self.vertices
            .iter()
            .map(|p| {
                let q = matrix.transform_point(p);
                for c in q.iter() {
                    check_coordinate(*c)?;
                }
                Ok(q)
            })
            .collect()
    }

    /// Reverses the winding of every face
    pub fn flip_faces(&mut self) {
        for face in &mut self.faces {
            face.swap(1, 2);
        }
    }

    /// Appends another mesh without any welding
    pub fn merge(&mut self, other: &TriMesh) {
        let offset = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);
        self.faces.extend(
            other
                .faces
                .iter()
                .map(|f| [f[0] + offset, f[1] + offset, f[2] + offset]),
        );
    }

    /// Fails with `DegenerateGeometry` on the first zero-area face
    pub fn check_non_degenerate(&self) -> Result<()> {
        for (f, face) in self.faces.iter().enumerate() {
            let [a, b, c] = face.map(|i| self.vertices[i]);
            if are_collinear(&a, &b, &c) {
                return Err(KernelError::degenerate(format!(
                    "face {f} {face:?} has zero area"
                )));
            }
        }
        Ok(())
    }
}

/// Newell normal of a polygon loop
/// Triangles of one polygonal face given by in-bounds vertex indices, with
/// the winding of the polygon. Triangles pass through unchanged.
pub(crate) fn triangulate_face(vertices: &[Point3<f64>], corners: &[usize]) -> Result<Vec<[usize; 3]>> {
    if corners.len() == 3 {
        return Ok(vec![[corners[0], corners[1], corners[2]]]);
    }
    let normal = polygon_normal(vertices, corners);
    let axis = dominant_axis(&normal);
    let flip = normal[axis] < 0.0;
    let projected: Vec<Point2<f64>> = corners.iter().map(|&i| drop_axis(&vertices[i], axis)).collect();
    Ok(triangulate_polygon(&projected)?
        .into_iter()
        .map(|[a, b, c]| {
            let face = [corners[a], corners[b], corners[c]];
            if flip {
                [face[0], face[2], face[1]]
            } else {
                face
            }
        })
        .collect())
}

fn polygon_normal(vertices: &[Point3<f64>], indices: &[usize]) -> Vector3<f64> {
    let mut normal = Vector3::zeros();
    for (k, &i) in indices.iter().enumerate() {
        let p = vertices[i];
        let q = vertices[indices[(k + 1) % indices.len()]];
        normal.x += (p.y - q.y) * (p.z + q.z);
        normal.y += (p.z - q.z) * (p.x + q.x);
        normal.z += (p.x - q.x) * (p.y + q.y);
    }
    normal
}
