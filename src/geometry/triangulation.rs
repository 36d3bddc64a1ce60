// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polygon triangulation
//!
//! Delaunay, constrained Delaunay (outer boundary plus holes) and conforming
//! Delaunay triangulations of points in the XY plane. The z coordinate of
//! every input point is carried through unchanged; Steiner points receive a
//! linearly interpolated z.

use earcutr::earcut;
use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::cdt::Cdt;
use super::robust_predicates::{check_coordinate, orient2d};
use super::triangle_intersection::{segment_segment_2d, Intersection};
use super::{Aabb, TriMesh};
use crate::config::TriangulationConfig;
use crate::error::{KernelError, Result};

const LLOYD_MAX_ITERATIONS: usize = 100;
/// Relaxation stops once no vertex moves further than this share of the
/// edge length bound
const LLOYD_MIN_MOVE: f64 = 1e-4;

/// Input of a conforming or constrained triangulation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangulationInput {
    /// Outer polygon
    pub boundary: Vec<[f64; 3]>,
    /// Hole polygons strictly inside the boundary
    pub holes: Vec<Vec<[f64; 3]>>,
    /// Isolated points that must appear as vertices
    pub points: Vec<[f64; 3]>,
    /// Open polylines whose segments must appear as edges
    pub curves: Vec<Vec<[f64; 3]>>,
}

impl TriangulationInput {
    pub fn new(boundary: Vec<[f64; 3]>) -> Self {
        Self {
            boundary,
            ..Default::default()
        }
    }

    pub fn with_holes(mut self, holes: Vec<Vec<[f64; 3]>>) -> Self {
        self.holes = holes;
        self
    }

    pub fn with_points(mut self, points: Vec<[f64; 3]>) -> Self {
        self.points = points;
        self
    }

    pub fn with_curves(mut self, curves: Vec<Vec<[f64; 3]>>) -> Self {
        self.curves = curves;
        self
    }
}

/// Constrained Delaunay triangulation of `boundary` minus `holes`.
///
/// Boundary and hole edges survive as (possibly subdivided) edges of the
/// result. With `max_edge_length` set, Steiner points are inserted until no
/// edge is longer than the limit.
///
/// # Errors
/// `InvalidTopology` for self-intersecting polygons or holes not strictly
/// inside the boundary, `DegenerateGeometry` for polygons with fewer than
/// three distinct points or zero area.
pub fn constrained_delaunay_triangulation(
    boundary: &[[f64; 3]],
    holes: &[Vec<[f64; 3]>],
    max_edge_length: Option<f64>,
) -> Result<TriMesh> {
    let input = TriangulationInput::new(boundary.to_vec()).with_holes(holes.to_vec());
    let config = TriangulationConfig::default().with_max_edge_length(max_edge_length);
    triangulate(&input, &config, false)
}

/// Constrained triangulation whose constrained edges are additionally split
/// until every edge is locally Delaunay
pub fn conforming_delaunay_triangulation(
    input: &TriangulationInput,
    config: &TriangulationConfig,
) -> Result<TriMesh> {
    triangulate(input, config, true)
}

/// Conforming Delaunay mesh refined until no edge exceeds
/// `config.max_edge_length`. With `config.optimize` set, the free Steiner
/// points are then Lloyd-relaxed; boundary, hole, curve and input points do
/// not move.
///
/// # Errors
/// `InvalidParameter` when no edge length bound is given, otherwise as
/// [`constrained_delaunay_triangulation`].
pub fn refined_delaunay_mesh(input: &TriangulationInput, config: &TriangulationConfig) -> Result<TriMesh> {
    if config.max_edge_length.is_none() {
        return Err(KernelError::invalid_parameter(
            "max_edge_length",
            "refinement needs an edge length bound",
        ));
    }
    triangulate(input, config, true)
}

/// Delaunay triangulation of a point set
pub fn delaunay_triangulation(points: &[[f64; 3]]) -> Result<TriMesh> {
    let points = to_points(points)?;
    let planar: Vec<Point2<f64>> = points.iter().map(|p| p.xy()).collect();
    if all_collinear(&planar) {
        return Err(KernelError::degenerate(
            "point set needs three non-collinear points",
        ));
    }

    let mut cdt = new_cdt(&points)?;
    for p in &points {
        cdt.insert_point(p.xy(), p.z)?;
    }
    let triangles = cdt.triangles(false);
    Ok(compact(&cdt, &triangles))
}

/// Ear-cut triangulation of a simple polygon given in either winding.
///
/// Returned triangles index into `polygon` and are counter-clockwise;
/// zero-area triangles are dropped.
pub fn triangulate_polygon(polygon: &[Point2<f64>]) -> Result<Vec<[usize; 3]>> {
    if polygon.len() < 3 {
        return Ok(Vec::new());
    }
    let flattened: Vec<f64> = polygon.iter().flat_map(|p| [p.x, p.y]).collect();
    let indices = earcut(&flattened, &[], 2)
        .map_err(|err| KernelError::degenerate(format!("polygon could not be ear-cut: {err:?}")))?;

    Ok(indices
        .chunks_exact(3)
        .filter_map(|tri| {
            let (a, b, c) = (tri[0], tri[1], tri[2]);
            let o = orient2d(&polygon[a], &polygon[b], &polygon[c]);
            if o > 0.0 {
                Some([a, b, c])
            } else if o < 0.0 {
                Some([a, c, b])
            } else {
                None
            }
        })
        .collect())
}

fn triangulate(
    input: &TriangulationInput,
    config: &TriangulationConfig,
    conforming: bool,
) -> Result<TriMesh> {
    if let Some(max) = config.max_edge_length {
        if !(max.is_finite() && max > 0.0) {
            return Err(KernelError::invalid_parameter(
                "max_edge_length",
                format!("must be a positive finite length, got {max}"),
            ));
        }
    }

    let boundary = clean_ring(&input.boundary, "boundary")?;
    let holes = input
        .holes
        .iter()
        .map(|hole| clean_ring(hole, "hole"))
        .collect::<Result<Vec<_>>>()?;
    let points = to_points(&input.points)?;
    let curves = input
        .curves
        .iter()
        .map(|curve| to_points(curve.as_slice()))
        .collect::<Result<Vec<_>>>()?;

    validate_domain(&boundary, &holes, &points, &curves)?;

    let all_points: Vec<Point3<f64>> = boundary
        .iter()
        .chain(holes.iter().flatten())
        .chain(points.iter())
        .chain(curves.iter().flatten())
        .copied()
        .collect();
    let mut cdt = new_cdt(&all_points)?;

    let mut rings = Vec::with_capacity(1 + holes.len());
    for ring in std::iter::once(&boundary).chain(holes.iter()) {
        let ids = ring
            .iter()
            .map(|p| cdt.insert_point(p.xy(), p.z))
            .collect::<Result<Vec<_>>>()?;
        rings.push(ids);
    }
    let point_ids = points
        .iter()
        .map(|p| cdt.insert_point(p.xy(), p.z))
        .collect::<Result<Vec<_>>>()?;
    let mut curve_ids = Vec::with_capacity(curves.len());
    for curve in &curves {
        let ids = curve
            .iter()
            .map(|p| cdt.insert_point(p.xy(), p.z))
            .collect::<Result<Vec<_>>>()?;
        curve_ids.push(ids);
    }

    for ids in &rings {
        for i in 0..ids.len() {
            cdt.insert_constraint(ids[i], ids[(i + 1) % ids.len()])?;
        }
    }
    for ids in &curve_ids {
        for pair in ids.windows(2) {
            cdt.insert_inner_constraint(pair[0], pair[1])?;
        }
    }

    let mut steiner = 0;
    if conforming {
        steiner += cdt.make_conforming(config.max_steiner_points)?;
    }
    if let Some(max) = config.max_edge_length {
        let budget = config.max_steiner_points.saturating_sub(steiner);
        steiner += cdt.refine_edge_length(max, budget)?;
    }
    if config.optimize {
        let scale = config
            .max_edge_length
            .unwrap_or_else(|| Aabb::from_points(all_points.iter()).diagonal());
        let sweeps = cdt.lloyd_smooth(&point_ids, LLOYD_MAX_ITERATIONS, LLOYD_MIN_MOVE * scale);
        debug!(sweeps, "lloyd relaxation");
    }

    let triangles = cdt.triangles(true);
    debug!(
        triangles = triangles.len(),
        steiner_points = steiner,
        holes = holes.len(),
        "triangulated polygon"
    );
    Ok(compact(&cdt, &triangles))
}

fn to_points(coords: &[[f64; 3]]) -> Result<Vec<Point3<f64>>> {
    coords
        .iter()
        .map(|c| {
            for v in c {
                check_coordinate(*v)?;
            }
            Ok(Point3::new(c[0], c[1], c[2]))
        })
        .collect()
}

/// Drops repeated and closing points; rejects collapsed polygons
fn clean_ring(coords: &[[f64; 3]], what: &str) -> Result<Vec<Point3<f64>>> {
    let mut ring: Vec<Point3<f64>> = Vec::with_capacity(coords.len());
    for p in to_points(coords)? {
        if ring.last().map_or(true, |q| q.xy() != p.xy()) {
            ring.push(p);
        }
    }
    while ring.len() > 1 && ring[0].xy() == ring[ring.len() - 1].xy() {
        ring.pop();
    }
    if ring.len() < 3 {
        return Err(KernelError::degenerate(format!(
            "{what} has fewer than three distinct points"
        )));
    }
    let planar: Vec<Point2<f64>> = ring.iter().map(|p| p.xy()).collect();
    if all_collinear(&planar) {
        return Err(KernelError::degenerate(format!("{what} has zero area")));
    }
    Ok(ring)
}

fn all_collinear(points: &[Point2<f64>]) -> bool {
    let Some(first) = points.first() else {
        return true;
    };
    let Some(second) = points.iter().find(|p| *p != first) else {
        return true;
    };
    points.iter().all(|p| orient2d(first, second, p) == 0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Containment {
    Inside,
    Boundary,
    Outside,
}

/// Winding-number point-in-polygon with exact orientation tests
fn locate_in_ring(p: &Point2<f64>, ring: &[Point3<f64>]) -> Containment {
    let n = ring.len();
    let mut winding = 0i32;
    for i in 0..n {
        let a = ring[i].xy();
        let b = ring[(i + 1) % n].xy();
        let o = orient2d(&a, &b, p);
        if o == 0.0
            && p.x >= a.x.min(b.x)
            && p.x <= a.x.max(b.x)
            && p.y >= a.y.min(b.y)
            && p.y <= a.y.max(b.y)
        {
            return Containment::Boundary;
        }
        if a.y <= p.y {
            if b.y > p.y && o > 0.0 {
                winding += 1;
            }
        } else if b.y <= p.y && o < 0.0 {
            winding -= 1;
        }
    }
    if winding != 0 {
        Containment::Inside
    } else {
        Containment::Outside
    }
}

fn ring_edges(ring: &[Point3<f64>]) -> impl Iterator<Item = (Point2<f64>, Point2<f64>)> + '_ {
    let n = ring.len();
    (0..n).map(move |i| (ring[i].xy(), ring[(i + 1) % n].xy()))
}

fn validate_domain(
    boundary: &[Point3<f64>],
    holes: &[Vec<Point3<f64>>],
    points: &[Point3<f64>],
    curves: &[Vec<Point3<f64>>],
) -> Result<()> {
    // (edge, ring, position, ring length)
    let mut edges = Vec::new();
    for (r, ring) in std::iter::once(boundary).chain(holes.iter().map(|h| h.as_slice())).enumerate() {
        for (i, edge) in ring_edges(ring).enumerate() {
            edges.push((edge, r, i, ring.len()));
        }
    }

    for (x, &((a0, a1), ra, ia, len)) in edges.iter().enumerate() {
        for &((b0, b1), rb, ib, _) in &edges[x + 1..] {
            if !boxes_overlap(&a0, &a1, &b0, &b1) {
                continue;
            }
            let hit = segment_segment_2d(&a0, &a1, &b0, &b1);
            let adjacent = ra == rb && ((ia + 1) % len == ib || (ib + 1) % len == ia);
            let allowed = match hit {
                Intersection::None => true,
                Intersection::Point(p) => adjacent && (p == a0 || p == a1),
                Intersection::Segment(..) => false,
            };
            if !allowed {
                return Err(KernelError::invalid_topology(format!(
                    "polygon edges intersect near ({}, {})",
                    a0.x, a0.y
                )));
            }
        }
    }

    for (h, hole) in holes.iter().enumerate() {
        if locate_in_ring(&hole[0].xy(), boundary) != Containment::Inside {
            return Err(KernelError::invalid_topology(format!(
                "hole {h} is not contained in the boundary"
            )));
        }
        for (o, other) in holes.iter().enumerate() {
            if o != h && locate_in_ring(&hole[0].xy(), other) != Containment::Outside {
                return Err(KernelError::invalid_topology(format!(
                    "hole {h} lies inside hole {o}"
                )));
            }
        }
    }

    for p in points.iter().chain(curves.iter().flatten()) {
        if locate_in_ring(&p.xy(), boundary) == Containment::Outside {
            return Err(KernelError::invalid_topology(format!(
                "constraint point ({}, {}) lies outside the boundary",
                p.x, p.y
            )));
        }
    }
    for curve in curves {
        for pair in curve.windows(2) {
            let (c0, c1) = (pair[0].xy(), pair[1].xy());
            for &((e0, e1), ..) in &edges {
                match segment_segment_2d(&c0, &c1, &e0, &e1) {
                    Intersection::None => {}
                    Intersection::Point(p) if p == c0 || p == c1 => {}
                    _ => {
                        return Err(KernelError::invalid_topology(
                            "constraint curve crosses a polygon edge",
                        ))
                    }
                }
            }
        }
    }
    Ok(())
}

fn boxes_overlap(a0: &Point2<f64>, a1: &Point2<f64>, b0: &Point2<f64>, b1: &Point2<f64>) -> bool {
    a0.x.min(a1.x) <= b0.x.max(b1.x)
        && b0.x.min(b1.x) <= a0.x.max(a1.x)
        && a0.y.min(a1.y) <= b0.y.max(b1.y)
        && b0.y.min(b1.y) <= a0.y.max(a1.y)
}

fn new_cdt(points: &[Point3<f64>]) -> Result<Cdt> {
    let bbox = Aabb::from_points(points.iter());
    Cdt::new(bbox.min.xy(), bbox.max.xy())
}

/// Mesh of the selected triangles over the vertices they use, in
/// insertion order
fn compact(cdt: &Cdt, triangles: &[[usize; 3]]) -> TriMesh {
    let mut remap = vec![usize::MAX; cdt.vertex_count()];
    let mut used: Vec<usize> = triangles.iter().flatten().copied().collect();
    used.sort_unstable();
    used.dedup();

    let mut vertices = Vec::with_capacity(used.len());
    for v in used {
        remap[v] = vertices.len();
        let p = cdt.point(v);
        vertices.push(Point3::new(p.x, p.y, cdt.attr(v)));
    }
    let faces = triangles
        .iter()
        .map(|t| [remap[t[0]], remap[t[1]], remap[t[2]]])
        .collect();
    TriMesh::from_parts(vertices, faces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{area, HalfEdgeMesh};
    use approx::assert_relative_eq;

    fn square(size: f64) -> Vec<[f64; 3]> {
        vec![
            [0.0, 0.0, 0.0],
            [size, 0.0, 0.0],
            [size, size, 0.0],
            [0.0, size, 0.0],
        ]
    }

    #[test]
    fn test_square_two_triangles() {
        let mesh = constrained_delaunay_triangulation(&square(1.0), &[], None).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 2);
        assert_relative_eq!(area(&mesh), 1.0, epsilon = 1e-12);
        for f in 0..mesh.face_count() {
            assert!(mesh.face_normal(f).z > 0.0);
        }
    }

    #[test]
    fn test_square_with_hole() {
        let hole = vec![
            [0.4, 0.4, 0.0],
            [0.6, 0.4, 0.0],
            [0.6, 0.6, 0.0],
            [0.4, 0.6, 0.0],
        ];
        let mesh = constrained_delaunay_triangulation(&square(1.0), &[hole], None).unwrap();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.face_count(), 8);
        assert_relative_eq!(area(&mesh), 1.0 - 0.04, epsilon = 1e-12);
        let topology = HalfEdgeMesh::from_mesh(&mesh);
        assert_eq!(topology.boundary_edges().len(), 8);
    }

    #[test]
    fn test_max_edge_length() {
        let mesh = constrained_delaunay_triangulation(&square(1.0), &[], Some(0.25)).unwrap();
        assert!(mesh.vertex_count() > 4);
        assert_relative_eq!(area(&mesh), 1.0, epsilon = 1e-9);
        for &[a, b, c] in mesh.faces() {
            let v = mesh.vertices();
            for (p, q) in [(a, b), (b, c), (c, a)] {
                assert!((v[p] - v[q]).norm() <= 0.25 + 1e-12);
            }
        }
    }

    #[test]
    fn test_z_is_carried() {
        let boundary = vec![
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 2.0],
            [2.0, 2.0, 2.0],
            [0.0, 2.0, 0.0],
        ];
        let mesh = constrained_delaunay_triangulation(&boundary, &[], Some(0.5)).unwrap();
        for p in mesh.vertices() {
            assert_relative_eq!(p.z, p.x, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_non_convex_boundary() {
        let boundary = vec![
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [2.0, 2.0, 0.0],
            [1.0, 0.5, 0.0],
            [0.0, 2.0, 0.0],
        ];
        let mesh = constrained_delaunay_triangulation(&boundary, &[], None).unwrap();
        assert_eq!(mesh.face_count(), 3);
        assert_relative_eq!(area(&mesh), 2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_inputs() {
        let bowtie = vec![
            [0.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        assert!(matches!(
            constrained_delaunay_triangulation(&bowtie, &[], None),
            Err(KernelError::InvalidTopology { .. })
        ));

        let outside_hole = vec![[2.0, 2.0, 0.0], [3.0, 2.0, 0.0], [3.0, 3.0, 0.0]];
        assert!(matches!(
            constrained_delaunay_triangulation(&square(1.0), &[outside_hole], None),
            Err(KernelError::InvalidTopology { .. })
        ));

        let line = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]];
        assert!(matches!(
            constrained_delaunay_triangulation(&line, &[], None),
            Err(KernelError::DegenerateGeometry { .. })
        ));
        assert!(matches!(
            constrained_delaunay_triangulation(&square(1.0)[..2], &[], None),
            Err(KernelError::DegenerateGeometry { .. })
        ));
        assert!(matches!(
            constrained_delaunay_triangulation(&square(1.0), &[], Some(0.0)),
            Err(KernelError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_delaunay_of_points() {
        let points = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.5, 0.5, 1.0],
        ];
        let mesh = delaunay_triangulation(&points).unwrap();
        assert_eq!(mesh.vertex_count(), 5);
        assert_eq!(mesh.face_count(), 4);
        assert!(delaunay_triangulation(&points[..2]).is_err());
    }

    #[test]
    fn test_conforming_with_points_and_curves() {
        let input = TriangulationInput::new(square(4.0))
            .with_points(vec![[1.0, 3.0, 0.0]])
            .with_curves(vec![vec![[1.0, 1.0, 0.0], [3.0, 1.5, 0.0]]]);
        let mesh = conforming_delaunay_triangulation(&input, &TriangulationConfig::default()).unwrap();
        assert_relative_eq!(area(&mesh), 16.0, epsilon = 1e-9);
        assert!(mesh
            .vertices()
            .iter()
            .any(|p| (p - Point3::new(1.0, 3.0, 0.0)).norm() == 0.0));
    }

    #[test]
    fn test_closed_curve_keeps_domain() {
        let input = TriangulationInput::new(square(4.0)).with_curves(vec![vec![
            [1.0, 1.0, 0.0],
            [3.0, 1.0, 0.0],
            [3.0, 3.0, 0.0],
            [1.0, 1.0, 0.0],
        ]]);
        let mesh = conforming_delaunay_triangulation(&input, &TriangulationConfig::default()).unwrap();
        assert_relative_eq!(area(&mesh), 16.0, epsilon = 1e-9);
        // The loop interior is meshed, not cut out
        let inside: f64 = (0..mesh.face_count())
            .filter(|&f| {
                let [a, b, c] = mesh.face_points(f);
                let m = (a.coords + b.coords + c.coords) / 3.0;
                m.x < 3.0 && m.y > 1.0 && m.y < m.x
            })
            .map(|f| mesh.face_area(f))
            .sum();
        assert_relative_eq!(inside, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_refined_mesh_needs_length() {
        let input = TriangulationInput::new(square(1.0));
        assert!(matches!(
            refined_delaunay_mesh(&input, &TriangulationConfig::default()),
            Err(KernelError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_refined_mesh_with_lloyd() {
        let hole = vec![
            [1.5, 1.5, 0.0],
            [2.5, 1.5, 0.0],
            [2.5, 2.5, 0.0],
            [1.5, 2.5, 0.0],
        ];
        let input = TriangulationInput::new(square(4.0))
            .with_holes(vec![hole])
            .with_points(vec![[0.7, 3.1, 0.0]]);
        let config = TriangulationConfig::default().with_max_edge_length(Some(0.6));
        let plain = refined_delaunay_mesh(&input, &config).unwrap();
        let optimized = refined_delaunay_mesh(&input, &config.clone().with_optimize(true)).unwrap();

        for (f, [a, b, c]) in plain.faces().iter().enumerate() {
            let [pa, pb, pc] = [a, b, c].map(|&v| plain.vertices()[v]);
            for (p, q) in [(pa, pb), (pb, pc), (pc, pa)] {
                assert!((p - q).norm() <= 0.6 + 1e-9, "face {f}");
            }
        }
        assert_relative_eq!(area(&plain), 15.0, epsilon = 1e-9);
        assert_relative_eq!(area(&optimized), 15.0, epsilon = 1e-9);
        assert_eq!(optimized.vertex_count(), plain.vertex_count());
        assert_eq!(optimized.face_count(), plain.face_count());
        assert_ne!(optimized.vertices(), plain.vertices());
        for f in 0..optimized.face_count() {
            assert!(optimized.face_normal(f).z > 0.5);
        }
        let pinned = [[0.0, 0.0], [4.0, 4.0], [1.5, 2.5], [0.7, 3.1]];
        for [x, y] in pinned {
            assert!(optimized.vertices().iter().any(|p| p.x == x && p.y == y));
        }
        assert!(optimized.vertices().iter().all(|p| p.z == 0.0));
    }

    #[test]
    fn test_polygon_triangulation_winding() {
        let l_shape = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        let triangles = triangulate_polygon(&l_shape).unwrap();
        assert_eq!(triangles.len(), 4);
        let mut reversed = l_shape.clone();
        reversed.reverse();
        let triangles = triangulate_polygon(&reversed).unwrap();
        let mut total = 0.0;
        for [a, b, c] in triangles {
            let o = orient2d(&reversed[a], &reversed[b], &reversed[c]);
            assert!(o > 0.0);
            total += 0.5 * o;
        }
        assert_relative_eq!(total, 3.0, epsilon = 1e-12);
        assert!(triangulate_polygon(&l_shape[..2]).unwrap().is_empty());
    }
}
