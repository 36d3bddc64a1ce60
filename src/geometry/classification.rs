// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Inside/outside classification of boolean fragments
//! Points are tested against a closed mesh with exact ray crossing tests,
//! retried along other directions when a ray grazes an edge or vertex, and
//! with the generalized winding number as the last resort.

use std::f64::consts::PI;

use ahash::{AHashMap, AHashSet};
use nalgebra::{Point3, Vector3};

use super::bvh::Bvh;
use super::halfedge::edge_key;
use super::robust_predicates::{orient3d_sign, Orientation};
use super::triangle_intersection::closest_point_on_triangle;
use super::{Aabb, TriMesh};
use crate::config::ClassificationMethod;

/// Distance, relative to the mesh size, under which a point is on the surface
const SURFACE_EPSILON: f64 = 1e-10;

/// Smallest |cos| between a fragment and a face it can coincide with
const COINCIDENT_COSINE: f64 = 0.5;

/// Ray directions tried in order; none is parallel to a coordinate plane
const RAY_DIRECTIONS: [[f64; 3]; 7] = [
    [0.5376, 0.6412, 0.5477],
    [-0.3921, 0.7132, 0.5813],
    [0.8137, -0.2419, 0.5286],
    [-0.6483, -0.5311, 0.5456],
    [0.2217, 0.3318, -0.9169],
    [-0.7433, 0.1559, -0.6505],
    [0.4751, -0.8012, -0.3638],
];

/// Where a fragment of one mesh lies relative to the other solid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentClass {
    Inside,
    Outside,
    /// On the other surface with the same facing
    SharedSame,
    /// On the other surface with opposite facing
    SharedOpposite,
}

enum RayHit {
    Miss,
    Cross,
    Degenerate,
}

/// Point-in-solid queries against one closed mesh
pub struct SolidClassifier<'a> {
    mesh: &'a TriMesh,
    bvh: Bvh,
    method: ClassificationMethod,
    surface_tolerance: f64,
}

impl<'a> SolidClassifier<'a> {
    pub fn new(mesh: &'a TriMesh, method: ClassificationMethod, tolerance: f64) -> Self {
        let scale = mesh.bounding_box().diagonal();
        Self {
            mesh,
            bvh: Bvh::from_mesh(mesh),
            method,
            surface_tolerance: tolerance.max(SURFACE_EPSILON * scale),
        }
    }

    /// True when `point` lies strictly inside the solid
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        match self.method {
            ClassificationMethod::RayParity => self
                .ray_parity(point)
                .unwrap_or_else(|| self.winding_number(point) > 0.5),
            ClassificationMethod::WindingNumber => self.winding_number(point) > 0.5,
        }
    }

    /// True when `point` is within the surface tolerance of the mesh
    pub fn is_on_surface(&self, point: &Point3<f64>) -> bool {
        self.bvh
            .closest_point(self.mesh, point)
            .is_some_and(|hit| hit.distance_squared.sqrt() <= self.surface_tolerance)
    }

    /// Facing of a fragment lying on the surface, or `None` when no face
    /// within the surface tolerance of `point` is close to parallel.
    ///
    /// Near edges several faces qualify; the most parallel one decides.
    pub fn coincident_class(&self, point: &Point3<f64>, normal: &Vector3<f64>) -> Option<FragmentClass> {
        let query = Aabb::from_points(std::iter::once(point)).expanded(self.surface_tolerance);
        let mut best: Option<f64> = None;
        for face in self.bvh.query(&query) {
            let [a, b, c] = self.mesh.face_points(face);
            if (closest_point_on_triangle(point, &a, &b, &c) - point).norm() > self.surface_tolerance {
                continue;
            }
            let cosine = self.mesh.face_normal(face).dot(normal);
            if cosine.abs() >= COINCIDENT_COSINE && best.map_or(true, |b| cosine.abs() > b.abs()) {
                best = Some(cosine);
            }
        }
        best.map(|cosine| {
            if cosine >= 0.0 {
                FragmentClass::SharedSame
            } else {
                FragmentClass::SharedOpposite
            }
        })
    }

    /// Classifies a fragment from a representative interior point and the
    /// fragment's normal
    pub fn classify_fragment(&self, point: &Point3<f64>, normal: &Vector3<f64>) -> FragmentClass {
        if let Some(class) = self.coincident_class(point, normal) {
            return class;
        }
        if self.contains(point) {
            FragmentClass::Inside
        } else {
            FragmentClass::Outside
        }
    }

    /// Crossing parity along the first non-degenerate ray, or `None` when
    /// every direction grazes an edge or vertex
    pub fn ray_parity(&self, point: &Point3<f64>) -> Option<bool> {
        if self.bvh.is_empty() {
            return Some(false);
        }
        let bbox = self.bvh.bounding_box();
        let length = 2.0 * (bbox.diagonal() + (point - bbox.center()).norm()) + 1.0;

        'directions: for d in RAY_DIRECTIONS {
            let direction = Vector3::from(d).normalize();
            let far = point + direction * length;
            let mut crossings = 0usize;
            for face in self.bvh.query_ray(point, &direction) {
                let [a, b, c] = self.mesh.face_points(face);
                match ray_hit(point, &far, &a, &b, &c) {
                    RayHit::Miss => {}
                    RayHit::Cross => crossings += 1,
                    RayHit::Degenerate => continue 'directions,
                }
            }
            return Some(crossings % 2 == 1);
        }
        None
    }

    pub fn winding_number(&self, point: &Point3<f64>) -> f64 {
        winding_number(self.mesh, point)
    }
}

/// Exact crossing test of segment `p q` with triangle `a b c`
fn ray_hit(p: &Point3<f64>, q: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> RayHit {
    let sp = orient3d_sign(a, b, c, p);
    let sq = orient3d_sign(a, b, c, q);
    if sp == sq && !sp.is_zero() {
        return RayHit::Miss;
    }
    let edges = [
        orient3d_sign(p, q, a, b),
        orient3d_sign(p, q, b, c),
        orient3d_sign(p, q, c, a),
    ];
    if edges.contains(&Orientation::Positive) && edges.contains(&Orientation::Negative) {
        return RayHit::Miss;
    }
    if sp.is_zero() || sq.is_zero() || edges.iter().any(|e| e.is_zero()) {
        return RayHit::Degenerate;
    }
    RayHit::Cross
}

/// Generalized winding number of `point` with respect to `mesh`: close to 1
/// inside a closed outward-oriented mesh and close to 0 outside
pub fn winding_number(mesh: &TriMesh, point: &Point3<f64>) -> f64 {
    let mut total = 0.0;
    for f in 0..mesh.face_count() {
        let [a, b, c] = mesh.face_points(f).map(|v| v - point);
        let (la, lb, lc) = (a.norm(), b.norm(), c.norm());
        let numerator = a.dot(&b.cross(&c));
        let denominator = la * lb * lc + a.dot(&b) * lc + a.dot(&c) * lb + b.dot(&c) * la;
        total += 2.0 * numerator.atan2(denominator);
    }
    total / (4.0 * PI)
}

/// Point-in-solid test against a closed mesh
pub fn point_in_mesh(mesh: &TriMesh, point: &Point3<f64>, method: ClassificationMethod) -> bool {
    SolidClassifier::new(mesh, method, 0.0).contains(point)
}

/// Groups faces into patches connected across edges not listed in
/// `separators`. Returns the patch id of every face and the patch count.
pub(crate) fn face_patches(
    faces: &[[usize; 3]],
    separators: &AHashSet<(usize, usize)>,
) -> (Vec<usize>, usize) {
    let mut edge_faces: AHashMap<(usize, usize), Vec<usize>> = AHashMap::new();
    for (f, face) in faces.iter().enumerate() {
        for i in 0..3 {
            edge_faces
                .entry(edge_key(face[i], face[(i + 1) % 3]))
                .or_default()
                .push(f);
        }
    }

    let mut patch = vec![usize::MAX; faces.len()];
    let mut count = 0;
    for seed in 0..faces.len() {
        if patch[seed] != usize::MAX {
            continue;
        }
        patch[seed] = count;
        let mut stack = vec![seed];
        while let Some(f) = stack.pop() {
            let face = faces[f];
            for i in 0..3 {
                let key = edge_key(face[i], face[(i + 1) % 3]);
                if separators.contains(&key) {
                    continue;
                }
                for &g in &edge_faces[&key] {
                    if patch[g] == usize::MAX {
                        patch[g] = count;
                        stack.push(g);
                    }
                }
            }
        }
        count += 1;
    }
    (patch, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::primitives::{cube, uv_sphere};

    #[test]
    fn test_cube_inside_outside() {
        let mesh = cube(2.0, true);
        for method in [ClassificationMethod::RayParity, ClassificationMethod::WindingNumber] {
            assert!(point_in_mesh(&mesh, &Point3::new(0.1, 0.2, 0.3), method));
            assert!(!point_in_mesh(&mesh, &Point3::new(3.0, 0.0, 0.0), method));
            assert!(!point_in_mesh(&mesh, &Point3::new(0.0, 1.5, 0.0), method));
        }
    }

    #[test]
    fn test_ray_through_vertex_retries() {
        // The origin sees every cube vertex along a diagonal, but no test
        // direction is diagonal; parity must still be decided
        let mesh = cube(2.0, true);
        let classifier = SolidClassifier::new(&mesh, ClassificationMethod::RayParity, 1e-9);
        assert_eq!(classifier.ray_parity(&Point3::origin()), Some(true));
    }

    #[test]
    fn test_winding_number_values() {
        let mesh = uv_sphere(1.0, 24, 12);
        assert!((winding_number(&mesh, &Point3::origin()) - 1.0).abs() < 1e-9);
        assert!(winding_number(&mesh, &Point3::new(5.0, 0.0, 0.0)).abs() < 1e-9);
    }

    #[test]
    fn test_fragment_classes() {
        let mesh = cube(2.0, true);
        let classifier = SolidClassifier::new(&mesh, ClassificationMethod::RayParity, 1e-9);
        let up = Vector3::z();
        assert_eq!(
            classifier.classify_fragment(&Point3::new(0.2, 0.1, 1.0), &up),
            FragmentClass::SharedSame
        );
        assert_eq!(
            classifier.classify_fragment(&Point3::new(0.2, 0.1, 1.0), &-up),
            FragmentClass::SharedOpposite
        );
        assert_eq!(
            classifier.classify_fragment(&Point3::new(0.2, 0.1, 0.5), &up),
            FragmentClass::Inside
        );
        assert_eq!(
            classifier.classify_fragment(&Point3::new(0.2, 0.1, 1.5), &up),
            FragmentClass::Outside
        );
    }

    #[test]
    fn test_coincident_class_picks_parallel_face() {
        let mesh = cube(2.0, true);
        let classifier = SolidClassifier::new(&mesh, ClassificationMethod::RayParity, 1e-9);
        // On the top edge both the top and the side face are in reach
        let edge = Point3::new(1.0, 0.2, 1.0);
        assert_eq!(
            classifier.coincident_class(&edge, &Vector3::z()),
            Some(FragmentClass::SharedSame)
        );
        assert_eq!(
            classifier.coincident_class(&edge, &-Vector3::x()),
            Some(FragmentClass::SharedOpposite)
        );
        // Crossing the surface at a right angle is not coincident
        assert_eq!(
            classifier.coincident_class(&Point3::new(0.2, 0.1, 1.0), &Vector3::x()),
            None
        );
        assert_eq!(classifier.coincident_class(&Point3::new(0.2, 0.1, 0.5), &Vector3::z()), None);
    }

    #[test]
    fn test_patches_split_by_separator() {
        // Strip of four triangles over a 2x1 grid of squares
        let faces = vec![[0, 1, 4], [0, 4, 3], [1, 2, 5], [1, 5, 4]];
        let (patch, count) = face_patches(&faces, &AHashSet::new());
        assert_eq!(count, 1);
        assert!(patch.iter().all(|&p| p == 0));

        let separators: AHashSet<_> = [edge_key(1, 4)].into_iter().collect();
        let (patch, count) = face_patches(&faces, &separators);
        assert_eq!(count, 2);
        assert_eq!(patch[0], patch[1]);
        assert_eq!(patch[2], patch[3]);
        assert_ne!(patch[0], patch[2]);
    }
}
