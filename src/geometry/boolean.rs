// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boolean operations on closed triangle meshes
//!
//! Both meshes are cut along their intersection curve (corefinement), the
//! pieces are grouped into patches bounded by the curve, every patch is
//! classified against the other solid and the kept patches are assembled
//! into the result. All constructed points go through one shared
//! [`VertexMap`], so both refined meshes agree along the curve.
//!
//! Patches lying on the other surface are resolved deterministically:
//! same-facing shared patches are taken from A for union and intersection,
//! opposite-facing shared patches are taken from A for difference.

use ahash::{AHashMap, AHashSet};
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::bvh::Bvh;
use super::classification::{face_patches, FragmentClass, SolidClassifier};
use super::halfedge::{edge_key, validate_closed_manifold};
use super::polyline::{stitch_segments, Polyline};
use super::triangle_intersection::{
    clip_coplanar_segment, coplanar_overlap, nearly_coplanar, triangle_triangle, Intersection,
    TriangleIntersection,
};
use super::triangle_splitting::{split_faces, FaceConstraints};
use super::vertex_map::VertexMap;
use super::{Aabb, TriMesh};
use crate::config::BooleanConfig;
use crate::error::{KernelError, Result};
use crate::utils::math::triangle_normal;

/// Distance, relative to the scene size, used when the configured
/// tolerance is zero and points still have to be matched
const STITCH_EPSILON: f64 = 1e-12;

/// Boolean operation types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BooleanOp {
    Union,
    Intersection,
    /// A minus B
    Difference,
}

impl BooleanOp {
    fn keeps_from_a(self, class: FragmentClass) -> bool {
        matches!(
            (self, class),
            (BooleanOp::Union, FragmentClass::Outside | FragmentClass::SharedSame)
                | (BooleanOp::Intersection, FragmentClass::Inside | FragmentClass::SharedSame)
                | (BooleanOp::Difference, FragmentClass::Outside | FragmentClass::SharedOpposite)
        )
    }

    fn keeps_from_b(self, class: FragmentClass) -> bool {
        matches!(
            (self, class),
            (BooleanOp::Union, FragmentClass::Outside)
                | (BooleanOp::Intersection, FragmentClass::Inside)
                | (BooleanOp::Difference, FragmentClass::Inside)
        )
    }
}

pub fn boolean_union(a: &TriMesh, b: &TriMesh) -> Result<TriMesh> {
    boolean_with(a, b, BooleanOp::Union, &BooleanConfig::default())
}

pub fn boolean_intersection(a: &TriMesh, b: &TriMesh) -> Result<TriMesh> {
    boolean_with(a, b, BooleanOp::Intersection, &BooleanConfig::default())
}

/// A minus B
pub fn boolean_difference(a: &TriMesh, b: &TriMesh) -> Result<TriMesh> {
    boolean_with(a, b, BooleanOp::Difference, &BooleanConfig::default())
}

pub fn boolean(a: &TriMesh, b: &TriMesh, op: BooleanOp) -> Result<TriMesh> {
    boolean_with(a, b, op, &BooleanConfig::default())
}

/// Boolean of two closed manifold meshes.
///
/// Inputs are validated before any work is done: open or non-manifold
/// meshes fail with `InvalidTopology`, zero-area faces with
/// `DegenerateGeometry`. Empty meshes are accepted as empty solids.
pub fn boolean_with(a: &TriMesh, b: &TriMesh, op: BooleanOp, config: &BooleanConfig) -> Result<TriMesh> {
    config.tolerance.validate()?;
    validate_operand(a)?;
    validate_operand(b)?;

    if a.is_empty() || b.is_empty() {
        return Ok(match (op, a.is_empty(), b.is_empty()) {
            (BooleanOp::Union, true, _) => b.clone(),
            (BooleanOp::Union, false, _) | (BooleanOp::Difference, false, _) => a.clone(),
            _ => TriMesh::new(),
        });
    }

    let refined = corefine(a, b, config)?;
    let tolerance = refined.vertices.tolerance();
    let classifier_a = SolidClassifier::new(a, config.classification, tolerance);
    let classifier_b = SolidClassifier::new(b, config.classification, tolerance);

    let classes_a = classify_patches(&refined, &refined.faces_a, &classifier_b, config.parallel);
    let classes_b = classify_patches(&refined, &refined.faces_b, &classifier_a, config.parallel);

    let mut faces = Vec::new();
    for (face, class) in refined.faces_a.iter().zip(&classes_a) {
        if op.keeps_from_a(*class) {
            faces.push(*face);
        }
    }
    for (face, class) in refined.faces_b.iter().zip(&classes_b) {
        if op.keeps_from_b(*class) {
            let mut face = *face;
            if op == BooleanOp::Difference {
                face.swap(1, 2);
            }
            faces.push(face);
        }
    }
    let faces = remove_duplicate_faces(faces);
    debug!(?op, faces = faces.len(), "boolean assembled");

    let mut result = TriMesh::from_parts(refined.vertices.into_points(), faces);
    result.cull_vertices();

    if config.validate_output {
        if let Err(err) = validate_closed_manifold(&result) {
            warn!(?op, %err, "boolean result failed validation");
            return Err(KernelError::numeric(format!(
                "boolean result is not a closed manifold: {err}"
            )));
        }
    }
    Ok(result)
}

/// Mesh A refined along its intersection curve with B; no face is removed
pub fn split_mesh_mesh(a: &TriMesh, b: &TriMesh) -> Result<TriMesh> {
    split_mesh_mesh_with(a, b, &BooleanConfig::default())
}

pub fn split_mesh_mesh_with(a: &TriMesh, b: &TriMesh, config: &BooleanConfig) -> Result<TriMesh> {
    config.tolerance.validate()?;
    a.check_non_degenerate()?;
    b.check_non_degenerate()?;
    if a.is_empty() || b.is_empty() {
        return Ok(a.clone());
    }
    let refined = corefine(a, b, config)?;
    let mut result = TriMesh::from_parts(refined.vertices.into_points(), refined.faces_a);
    result.cull_vertices();
    Ok(result)
}

/// Curves along which the surfaces of A and B cross, stitched into
/// polylines. Regions where the surfaces overlap are not reported.
pub fn intersection_mesh_mesh(a: &TriMesh, b: &TriMesh) -> Result<Vec<Polyline>> {
    intersection_mesh_mesh_with(a, b, &BooleanConfig::default())
}

pub fn intersection_mesh_mesh_with(a: &TriMesh, b: &TriMesh, config: &BooleanConfig) -> Result<Vec<Polyline>> {
    config.tolerance.validate()?;
    a.check_non_degenerate()?;
    b.check_non_degenerate()?;
    if a.is_empty() || b.is_empty() {
        return Ok(Vec::new());
    }
    let tolerance = resolve_tolerance(a, b, config);
    let hits = intersect_faces(a, b, tolerance, config.parallel)?;
    let segments: Vec<_> = hits
        .iter()
        .filter_map(|hit| match hit.kind {
            HitKind::Crossing(p, q) => Some((p, q)),
            _ => None,
        })
        .collect();
    let stitched = stitch_segments(&segments, tolerance);
    debug!(
        segments = segments.len(),
        polylines = stitched.polylines.len(),
        open_ends = stitched.open_ends,
        "intersection curve stitched"
    );
    Ok(stitched.polylines)
}

fn validate_operand(mesh: &TriMesh) -> Result<()> {
    if mesh.is_empty() {
        return Ok(());
    }
    validate_closed_manifold(mesh)?;
    mesh.check_non_degenerate()
}

fn resolve_tolerance(a: &TriMesh, b: &TriMesh, config: &BooleanConfig) -> f64 {
    let scale = a.bounding_box().union(&b.bounding_box()).diagonal();
    config.tolerance.resolve(scale).max(STITCH_EPSILON * scale)
}

// ----------------------------------------------------------------------
// Face pair intersection
// ----------------------------------------------------------------------

#[derive(Debug, Clone)]
struct PairHit {
    face_a: usize,
    face_b: usize,
    kind: HitKind,
}

#[derive(Debug, Clone)]
enum HitKind {
    /// Transversal crossing, a piece of the intersection curve
    Crossing(Point3<f64>, Point3<f64>),
    /// Faces touch in one point
    Touch(Point3<f64>),
    /// Coplanar overlap: B's edges clipped to A's face and A's edges
    /// clipped to B's face
    Coplanar {
        on_a: Vec<(Point3<f64>, Point3<f64>)>,
        on_b: Vec<(Point3<f64>, Point3<f64>)>,
    },
}

/// Every intersecting face pair, ordered by face of A then face of B
fn intersect_faces(a: &TriMesh, b: &TriMesh, tolerance: f64, parallel: bool) -> Result<Vec<PairHit>> {
    let bvh = Bvh::from_mesh(b);

    let per_face = |face_a: usize| -> Result<Vec<PairHit>> {
        let tri_a = a.face_points(face_a);
        let query = Aabb::from_points(tri_a.iter()).expanded(tolerance);
        let mut candidates = bvh.query(&query);
        candidates.sort_unstable();

        let mut hits = Vec::new();
        for face_b in candidates {
            let tri_b = b.face_points(face_b);
            let coplanar = || HitKind::Coplanar {
                on_a: clip_edges(&tri_b, &tri_a),
                on_b: clip_edges(&tri_a, &tri_b),
            };
            // Refined copies of a face are off its plane by rounding only
            let kind = if nearly_coplanar(&tri_a, &tri_b, tolerance) {
                if !coplanar_overlap(&tri_a, &tri_b) {
                    continue;
                }
                coplanar()
            } else {
                match triangle_triangle(&tri_a, &tri_b)? {
                    TriangleIntersection::None => continue,
                    TriangleIntersection::Point(p) => HitKind::Touch(p),
                    TriangleIntersection::Segment(p, q) => HitKind::Crossing(p, q),
                    TriangleIntersection::Coplanar => coplanar(),
                }
            };
            hits.push(PairHit { face_a, face_b, kind });
        }
        Ok(hits)
    };

    let per_face: Vec<Result<Vec<PairHit>>> = if parallel {
        (0..a.face_count()).into_par_iter().map(per_face).collect()
    } else {
        (0..a.face_count()).map(per_face).collect()
    };

    let mut hits = Vec::new();
    for face_hits in per_face {
        hits.extend(face_hits?);
    }
    debug!(pairs = hits.len(), "intersecting face pairs");
    Ok(hits)
}

/// Edges of `source` clipped to the coplanar triangle `target`
fn clip_edges(source: &[Point3<f64>; 3], target: &[Point3<f64>; 3]) -> Vec<(Point3<f64>, Point3<f64>)> {
    let mut pieces = Vec::new();
    for i in 0..3 {
        match clip_coplanar_segment(&source[i], &source[(i + 1) % 3], target) {
            Intersection::None => {}
            Intersection::Point(p) => pieces.push((p, p)),
            Intersection::Segment(p, q) => pieces.push((p, q)),
        }
    }
    pieces
}

// ----------------------------------------------------------------------
// Corefinement
// ----------------------------------------------------------------------

/// Both meshes refined along their intersection, on shared vertices
struct Corefinement {
    vertices: VertexMap,
    faces_a: Vec<[usize; 3]>,
    faces_b: Vec<[usize; 3]>,
}

fn corefine(a: &TriMesh, b: &TriMesh, config: &BooleanConfig) -> Result<Corefinement> {
    let tolerance = resolve_tolerance(a, b, config);
    let mut vertices = VertexMap::new(tolerance);

    let ids_a: Vec<usize> = a.vertices().iter().map(|p| vertices.insert_unique(*p)).collect();
    let count_a = vertices.len();
    let mut ids_b = Vec::with_capacity(b.vertex_count());
    for p in b.vertices() {
        // Vertices of B coinciding with a vertex of A share its index
        let id = match vertices.get(p) {
            Some(id) if id < count_a => id,
            _ => vertices.insert_unique(*p),
        };
        ids_b.push(id);
    }

    let hits = intersect_faces(a, b, tolerance, config.parallel)?;

    let mut constraints_a = vec![FaceConstraints::default(); a.face_count()];
    let mut constraints_b = vec![FaceConstraints::default(); b.face_count()];
    for hit in &hits {
        match &hit.kind {
            HitKind::Crossing(p, q) => {
                let (i, j) = (vertices.insert(*p), vertices.insert(*q));
                constraints_a[hit.face_a].add_segment(i, j);
                constraints_b[hit.face_b].add_segment(i, j);
            }
            HitKind::Touch(p) => {
                let i = vertices.insert(*p);
                constraints_a[hit.face_a].add_point(i);
                constraints_b[hit.face_b].add_point(i);
            }
            HitKind::Coplanar { on_a, on_b } => {
                for (p, q) in on_a {
                    let (i, j) = (vertices.insert(*p), vertices.insert(*q));
                    constraints_a[hit.face_a].add_segment(i, j);
                }
                for (p, q) in on_b {
                    let (i, j) = (vertices.insert(*p), vertices.insert(*q));
                    constraints_b[hit.face_b].add_segment(i, j);
                }
            }
        }
    }

    let faces_a: Vec<[usize; 3]> = a.faces().iter().map(|f| f.map(|v| ids_a[v])).collect();
    let faces_b: Vec<[usize; 3]> = b.faces().iter().map(|f| f.map(|v| ids_b[v])).collect();
    let faces_a = split_faces(&faces_a, &constraints_a, &mut vertices)?;
    let faces_b = split_faces(&faces_b, &constraints_b, &mut vertices)?;

    debug!(
        faces_a = faces_a.len(),
        faces_b = faces_b.len(),
        vertices = vertices.len(),
        "meshes corefined"
    );

    Ok(Corefinement {
        vertices,
        faces_a,
        faces_b,
    })
}

// ----------------------------------------------------------------------
// Classification
// ----------------------------------------------------------------------

/// Class of every face.
///
/// Faces lying on the other surface are classified one by one against the
/// face they coincide with. The remaining faces are grouped into patches
/// bounded by edges on the other surface, and each patch is decided once.
fn classify_patches(
    refined: &Corefinement,
    faces: &[[usize; 3]],
    other: &SolidClassifier<'_>,
    parallel: bool,
) -> Vec<FragmentClass> {
    let points = refined.vertices.points();
    let fragment = |f: usize| -> (Point3<f64>, Vector3<f64>) {
        let [a, b, c] = faces[f].map(|v| points[v]);
        let centroid = Point3::from((a.coords + b.coords + c.coords) / 3.0);
        let normal = triangle_normal(&a, &b, &c)
            .try_normalize(0.0)
            .unwrap_or_else(Vector3::zeros);
        (centroid, normal)
    };

    let coincident = |f: usize| {
        let (centroid, normal) = fragment(f);
        other.coincident_class(&centroid, &normal)
    };
    let shared: Vec<Option<FragmentClass>> = if parallel {
        (0..faces.len()).into_par_iter().map(coincident).collect()
    } else {
        (0..faces.len()).map(coincident).collect()
    };

    let mut used: Vec<usize> = faces.iter().flatten().copied().collect();
    used.sort_unstable();
    used.dedup();
    let on_surface_flags: Vec<bool> = if parallel {
        used.par_iter().map(|&v| other.is_on_surface(&points[v])).collect()
    } else {
        used.iter().map(|&v| other.is_on_surface(&points[v])).collect()
    };
    let on_surface: AHashSet<usize> = used
        .iter()
        .zip(on_surface_flags)
        .filter_map(|(&v, on)| on.then_some(v))
        .collect();

    let mut separators = AHashSet::new();
    for (f, face) in faces.iter().enumerate() {
        for i in 0..3 {
            let (u, w) = (face[i], face[(i + 1) % 3]);
            let key = edge_key(u, w);
            if shared[f].is_some() {
                separators.insert(key);
                continue;
            }
            if separators.contains(&key) || !(on_surface.contains(&u) && on_surface.contains(&w)) {
                continue;
            }
            if other.is_on_surface(&nalgebra::center(&points[u], &points[w])) {
                separators.insert(key);
            }
        }
    }

    let (patch, count) = face_patches(faces, &separators);

    // Largest face of each patch stands in for the patch
    let mut representative = vec![(usize::MAX, f64::NEG_INFINITY); count];
    for (f, face) in faces.iter().enumerate() {
        let [a, b, c] = face.map(|v| points[v]);
        let area = triangle_normal(&a, &b, &c).norm();
        let entry = &mut representative[patch[f]];
        if area > entry.1 {
            *entry = (f, area);
        }
    }

    let classify = |p: usize| -> FragmentClass {
        let f = representative[p].0;
        if let Some(class) = shared[f] {
            return class;
        }
        let (centroid, _) = fragment(f);
        if other.contains(&centroid) {
            FragmentClass::Inside
        } else {
            FragmentClass::Outside
        }
    };
    let classes: Vec<FragmentClass> = if parallel {
        (0..count).into_par_iter().map(classify).collect()
    } else {
        (0..count).map(classify).collect()
    };
    let shared_count = shared.iter().filter(|c| c.is_some()).count();
    debug!(
        patches = count,
        shared = shared_count,
        separators = separators.len(),
        "patches classified"
    );

    patch.into_iter().map(|p| classes[p]).collect()
}

/// Drops repeated faces; a face paired with its reverse removes both
fn remove_duplicate_faces(faces: Vec<[usize; 3]>) -> Vec<[usize; 3]> {
    let canonical = |f: &[usize; 3]| {
        let mut sorted = *f;
        sorted.sort_unstable();
        sorted
    };
    let mut seen: AHashMap<[usize; 3], Vec<usize>> = AHashMap::new();
    for (i, f) in faces.iter().enumerate() {
        seen.entry(canonical(f)).or_default().push(i);
    }

    let mut keep = vec![true; faces.len()];
    for group in seen.values().filter(|g| g.len() > 1) {
        let first = faces[group[0]];
        let same_winding = |f: &[usize; 3]| {
            (0..3).any(|r| [f[r], f[(r + 1) % 3], f[(r + 2) % 3]] == first)
        };
        let opposite = group.iter().filter(|&&i| !same_winding(&faces[i])).count();
        if opposite > 0 {
            for &i in group {
                keep[i] = false;
            }
        } else {
            for &i in &group[1..] {
                keep[i] = false;
            }
        }
    }

    faces
        .into_iter()
        .zip(keep)
        .filter_map(|(f, k)| k.then_some(f))
        .collect()
}
