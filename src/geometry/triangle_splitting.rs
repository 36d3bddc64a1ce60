// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Face splitting along intersection constraints
//! Each face that carries intersection points or segments is retriangulated
//! with a constrained Delaunay triangulation in its dominant projection plane.
//! Points lying on a face edge are shared with the neighbouring face so the
//! refined mesh has no T-junctions.

use ahash::{AHashMap, AHashSet};
use nalgebra::{Point2, Point3};
use tracing::debug;

use super::cdt::Cdt;
use super::halfedge::edge_key;
use super::triangle_intersection::closest_point_on_segment;
use super::vertex_map::VertexMap;
use crate::error::Result;
use crate::utils::math::{dominant_axis, drop_axis, lift_axis, triangle_normal};

/// Relative distance under which a point counts as lying on a face edge
/// when the welding tolerance is zero
const EDGE_EPSILON: f64 = 1e-12;

/// Welded intersection points and segments collected on one face
#[derive(Debug, Clone, Default)]
pub(crate) struct FaceConstraints {
    pub points: Vec<usize>,
    pub segments: Vec<[usize; 2]>,
}

impl FaceConstraints {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.segments.is_empty()
    }

    pub fn add_point(&mut self, p: usize) {
        self.points.push(p);
    }

    /// Adds a segment; a segment welded to a single point becomes that point
    pub fn add_segment(&mut self, a: usize, b: usize) {
        self.points.push(a);
        if a != b {
            self.points.push(b);
            self.segments.push([a, b]);
        }
    }
}

/// Retriangulates every face of one mesh against its constraints.
///
/// `faces` index into `vertices`; new points created by the triangulation
/// (crossings of constraint segments) are welded into `vertices`.
/// Faces without constraints and without points on their edges are kept
/// unchanged. Output faces keep the orientation of the face they came from.
pub(crate) fn split_faces(
    faces: &[[usize; 3]],
    constraints: &[FaceConstraints],
    vertices: &mut VertexMap,
) -> Result<Vec<[usize; 3]>> {
    let edge_points = collect_edge_points(faces, constraints, vertices);

    let mut result = Vec::with_capacity(faces.len());
    let mut split = 0usize;
    for (f, &face) in faces.iter().enumerate() {
        let touched_edges = (0..3).any(|i| edge_points.contains_key(&edge_key(face[i], face[(i + 1) % 3])));
        if constraints[f].is_empty() && !touched_edges {
            result.push(face);
            continue;
        }
        split += 1;
        result.extend(split_face(face, &constraints[f], &edge_points, vertices)?);
    }
    debug!(split, total = faces.len(), "faces retriangulated");
    Ok(result)
}

/// Points lying on each edge, keyed by the undirected edge
fn collect_edge_points(
    faces: &[[usize; 3]],
    constraints: &[FaceConstraints],
    vertices: &VertexMap,
) -> AHashMap<(usize, usize), Vec<usize>> {
    let mut edge_points: AHashMap<(usize, usize), Vec<usize>> = AHashMap::new();
    for (f, face) in faces.iter().enumerate() {
        for &v in &constraints[f].points {
            if face.contains(&v) {
                continue;
            }
            let p = vertices.position(v);
            for i in 0..3 {
                let (a, b) = (face[i], face[(i + 1) % 3]);
                let (pa, pb) = (vertices.position(a), vertices.position(b));
                let limit = vertices.tolerance().max(EDGE_EPSILON * (pb - pa).norm());
                if (closest_point_on_segment(p, pa, pb) - p).norm() <= limit {
                    let list = edge_points.entry(edge_key(a, b)).or_default();
                    if !list.contains(&v) {
                        list.push(v);
                    }
                    break;
                }
            }
        }
    }
    edge_points
}

fn split_face(
    face: [usize; 3],
    constraints: &FaceConstraints,
    edge_points: &AHashMap<(usize, usize), Vec<usize>>,
    vertices: &mut VertexMap,
) -> Result<Vec<[usize; 3]>> {
    let corners = face.map(|v| *vertices.position(v));
    let normal = triangle_normal(&corners[0], &corners[1], &corners[2]);
    let axis = dominant_axis(&normal);
    let flip = normal[axis] < 0.0;

    // Boundary ring: corners with the edge points sorted along each edge
    let mut ring = Vec::new();
    for i in 0..3 {
        let (a, b) = (face[i], face[(i + 1) % 3]);
        ring.push(a);
        let Some(points) = edge_points.get(&edge_key(a, b)) else {
            continue;
        };
        let origin = corners[i];
        let direction = corners[(i + 1) % 3] - origin;
        let mut along: Vec<(f64, usize)> = points
            .iter()
            .map(|&v| ((vertices.position(v) - origin).dot(&direction), v))
            .collect();
        along.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)));
        ring.extend(along.into_iter().map(|(_, v)| v));
    }
    let on_ring: AHashSet<usize> = ring.iter().copied().collect();
    let interior: Vec<usize> = constraints
        .points
        .iter()
        .copied()
        .filter(|v| !on_ring.contains(v))
        .collect();

    let project = |v: usize, vertices: &VertexMap| -> (Point2<f64>, f64) {
        let p = vertices.position(v);
        (drop_axis(p, axis), p[axis])
    };

    let mut min = Point2::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for &v in ring.iter().chain(&interior) {
        let (q, _) = project(v, vertices);
        min = min.inf(&q);
        max = max.sup(&q);
    }
    let mut cdt = Cdt::new(min, max)?;

    let mut to_local: AHashMap<usize, usize> = AHashMap::new();
    let mut to_global: AHashMap<usize, usize> = AHashMap::new();
    for &v in ring.iter().chain(&interior) {
        if to_local.contains_key(&v) {
            continue;
        }
        let (q, attr) = project(v, vertices);
        let local = cdt.insert_point(q, attr)?;
        to_local.insert(v, local);
        to_global.entry(local).or_insert(v);
    }

    for i in 0..ring.len() {
        let a = to_local[&ring[i]];
        let b = to_local[&ring[(i + 1) % ring.len()]];
        if a != b {
            cdt.insert_constraint(a, b)?;
        }
    }
    // Intersection segments separate patches but never bound the face
    for [a, b] in &constraints.segments {
        let (a, b) = (to_local[a], to_local[b]);
        if a != b {
            cdt.insert_inner_constraint(a, b)?;
        }
    }

    let triangles = cdt.triangles(true);
    if triangles.is_empty() {
        debug!(?face, "projection collapsed, keeping face");
        return Ok(vec![face]);
    }

    let mut result = Vec::with_capacity(triangles.len());
    for tri in triangles {
        let mut ids = [0usize; 3];
        for (slot, &local) in ids.iter_mut().zip(&tri) {
            *slot = match to_global.get(&local) {
                Some(&global) => global,
                None => {
                    let lifted: Point3<f64> = lift_axis(cdt.point(local), axis, cdt.attr(local));
                    let global = vertices.insert(lifted);
                    to_global.insert(local, global);
                    global
                }
            };
        }
        if ids[0] == ids[1] || ids[1] == ids[2] || ids[0] == ids[2] {
            continue;
        }
        if flip {
            ids.swap(1, 2);
        }
        result.push(ids);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn area(vertices: &VertexMap, faces: &[[usize; 3]]) -> f64 {
        faces
            .iter()
            .map(|f| {
                let [a, b, c] = f.map(|i| *vertices.position(i));
                triangle_normal(&a, &b, &c).norm() * 0.5
            })
            .sum()
    }

    fn square(vertices: &mut VertexMap) -> Vec<[usize; 3]> {
        let a = vertices.insert_unique(Point3::new(0.0, 0.0, 0.0));
        let b = vertices.insert_unique(Point3::new(1.0, 0.0, 0.0));
        let c = vertices.insert_unique(Point3::new(1.0, 1.0, 0.0));
        let d = vertices.insert_unique(Point3::new(0.0, 1.0, 0.0));
        vec![[a, b, c], [a, c, d]]
    }

    #[test]
    fn test_unconstrained_faces_are_kept() {
        let mut vertices = VertexMap::new(1e-9);
        let faces = square(&mut vertices);
        let constraints = vec![FaceConstraints::default(); 2];
        let result = split_faces(&faces, &constraints, &mut vertices).unwrap();
        assert_eq!(result, faces);
    }

    #[test]
    fn test_segment_splits_face_and_neighbour() {
        let mut vertices = VertexMap::new(1e-9);
        let faces = square(&mut vertices);
        // Segment inside the first face ending on the shared diagonal
        let p = vertices.insert(Point3::new(0.9, 0.3, 0.0));
        let q = vertices.insert(Point3::new(0.5, 0.5, 0.0));
        let mut constraints = vec![FaceConstraints::default(); 2];
        constraints[0].add_segment(p, q);

        let result = split_faces(&faces, &constraints, &mut vertices).unwrap();
        assert_relative_eq!(area(&vertices, &result), 1.0, epsilon = 1e-12);

        // The diagonal point is a vertex of faces on both sides
        let users: Vec<_> = result.iter().filter(|f| f.contains(&q)).collect();
        assert!(users.len() >= 3);
        assert!(result.iter().any(|f| f.contains(&p) && f.contains(&q)));
        for f in &result {
            let [a, b, c] = f.map(|i| *vertices.position(i));
            assert!(triangle_normal(&a, &b, &c).z > 0.0);
        }
    }

    #[test]
    fn test_crossing_segments_create_vertex() {
        let mut vertices = VertexMap::new(1e-9);
        let a = vertices.insert_unique(Point3::new(0.0, 0.0, 0.0));
        let b = vertices.insert_unique(Point3::new(0.0, 4.0, 0.0));
        let c = vertices.insert_unique(Point3::new(4.0, 0.0, 0.0));
        // Clockwise seen from +z
        let faces = vec![[a, b, c]];
        let p0 = vertices.insert(Point3::new(0.5, 1.0, 0.0));
        let p1 = vertices.insert(Point3::new(2.0, 1.0, 0.0));
        let q0 = vertices.insert(Point3::new(1.0, 0.5, 0.0));
        let q1 = vertices.insert(Point3::new(1.0, 2.0, 0.0));
        let mut constraints = vec![FaceConstraints::default()];
        constraints[0].add_segment(p0, p1);
        constraints[0].add_segment(q0, q1);

        let before = vertices.len();
        let result = split_faces(&faces, &constraints, &mut vertices).unwrap();
        assert_eq!(vertices.len(), before + 1);
        assert_relative_eq!(*vertices.position(before), Point3::new(1.0, 1.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(area(&vertices, &result), 8.0, epsilon = 1e-12);
        for f in &result {
            let [x, y, z] = f.map(|i| *vertices.position(i));
            assert!(triangle_normal(&x, &y, &z).z < 0.0);
        }
    }

    #[test]
    fn test_tilted_face_keeps_plane() {
        let mut vertices = VertexMap::new(1e-9);
        let a = vertices.insert_unique(Point3::new(0.0, 0.0, 0.0));
        let b = vertices.insert_unique(Point3::new(2.0, 0.0, 1.0));
        let c = vertices.insert_unique(Point3::new(0.0, 2.0, 1.0));
        let faces = vec![[a, b, c]];
        let p = vertices.insert(Point3::new(0.5, 0.5, 0.5));
        let q = vertices.insert(Point3::new(1.0, 0.2, 0.6));
        let mut constraints = vec![FaceConstraints::default()];
        constraints[0].add_segment(p, q);

        let result = split_faces(&faces, &constraints, &mut vertices).unwrap();
        assert!(result.len() >= 4);
        let normal = triangle_normal(vertices.position(a), vertices.position(b), vertices.position(c));
        for f in &result {
            let [x, y, z] = f.map(|i| *vertices.position(i));
            assert!(triangle_normal(&x, &y, &z).dot(&normal) > 0.0);
        }
    }

    #[test]
    fn test_closed_loop_inside_face_keeps_interior() {
        let mut vertices = VertexMap::new(1e-9);
        let a = vertices.insert_unique(Point3::new(0.0, 0.0, 0.0));
        let b = vertices.insert_unique(Point3::new(8.0, 0.0, 0.0));
        let c = vertices.insert_unique(Point3::new(0.0, 8.0, 0.0));
        let faces = vec![[a, b, c]];
        let corners: Vec<usize> = [(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)]
            .iter()
            .map(|&(x, y)| vertices.insert(Point3::new(x, y, 0.0)))
            .collect();
        let mut constraints = vec![FaceConstraints::default()];
        for i in 0..4 {
            constraints[0].add_segment(corners[i], corners[(i + 1) % 4]);
        }

        let result = split_faces(&faces, &constraints, &mut vertices).unwrap();
        assert_relative_eq!(area(&vertices, &result), 32.0, epsilon = 1e-12);

        // Triangles inside the loop cover it exactly
        let inside: Vec<[usize; 3]> = result
            .iter()
            .copied()
            .filter(|f| f.iter().all(|v| corners.contains(v)))
            .collect();
        assert_relative_eq!(area(&vertices, &inside), 4.0, epsilon = 1e-12);
        for i in 0..4 {
            let (p, q) = (corners[i], corners[(i + 1) % 4]);
            let users = result.iter().filter(|f| f.contains(&p) && f.contains(&q)).count();
            assert_eq!(users, 2);
        }
    }
}

