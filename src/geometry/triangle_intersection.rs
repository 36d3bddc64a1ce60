// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Segment and triangle intersection classification
//! Topological decisions come from the exact predicates; only the
//! coordinates of constructed points are rounded.

use nalgebra::{Point2, Point3, Vector3};

use super::robust_predicates::{are_collinear, orient2d, orient3d, Orientation};
use crate::error::{KernelError, Result};
use crate::utils::math::{dominant_axis, drop_axis, lerp, triangle_normal};

/// Intersection of two segments or of a segment with a triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intersection<P> {
    None,
    Point(P),
    /// Overlapping segment
    Segment(P, P),
}

impl<P> Intersection<P> {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Type of triangle-triangle intersection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriangleIntersection {
    None,
    /// Triangles touch in a single point
    Point(Point3<f64>),
    /// Triangles cross along a segment
    Segment(Point3<f64>, Point3<f64>),
    /// Triangles are coplanar and overlap
    Coplanar,
}

/// Fails with `DegenerateGeometry` when the triangle has zero area
pub fn check_triangle(tri: &[Point3<f64>; 3]) -> Result<()> {
    if are_collinear(&tri[0], &tri[1], &tri[2]) {
        return Err(KernelError::degenerate(format!(
            "zero-area triangle {:?}",
            tri.map(|p| [p.x, p.y, p.z])
        )));
    }
    Ok(())
}

/// Intersection of segments (a0, a1) and (b0, b1) in the plane
pub fn segment_segment_2d(
    a0: &Point2<f64>,
    a1: &Point2<f64>,
    b0: &Point2<f64>,
    b1: &Point2<f64>,
) -> Intersection<Point2<f64>> {
    if a0 == a1 {
        return point_on_segment_2d(a0, b0, b1);
    }
    if b0 == b1 {
        return point_on_segment_2d(b0, a0, a1);
    }

    let o1 = orient2d(a0, a1, b0);
    let o2 = orient2d(a0, a1, b1);
    let o3 = orient2d(b0, b1, a0);
    let o4 = orient2d(b0, b1, a1);

    if o1 == 0.0 && o2 == 0.0 {
        return collinear_overlap(a0, a1, b0, b1);
    }
    if o1 * o2 > 0.0 || o3 * o4 > 0.0 {
        return Intersection::None;
    }
    if o1 == 0.0 {
        return Intersection::Point(*b0);
    }
    if o2 == 0.0 {
        return Intersection::Point(*b1);
    }
    if o3 == 0.0 {
        return Intersection::Point(*a0);
    }
    if o4 == 0.0 {
        return Intersection::Point(*a1);
    }
    let t = o1 / (o1 - o2);
    Intersection::Point(b0 + (b1 - b0) * t)
}

fn point_on_segment_2d(
    p: &Point2<f64>,
    s0: &Point2<f64>,
    s1: &Point2<f64>,
) -> Intersection<Point2<f64>> {
    if p == s0 || p == s1 {
        return Intersection::Point(*p);
    }
    if s0 == s1 || orient2d(s0, s1, p) != 0.0 {
        return Intersection::None;
    }
    let within = |i: usize| p[i] >= s0[i].min(s1[i]) && p[i] <= s0[i].max(s1[i]);
    if within(0) && within(1) {
        Intersection::Point(*p)
    } else {
        Intersection::None
    }
}

fn collinear_overlap(
    a0: &Point2<f64>,
    a1: &Point2<f64>,
    b0: &Point2<f64>,
    b1: &Point2<f64>,
) -> Intersection<Point2<f64>> {
    let d = a1 - a0;
    let axis = if d.x.abs() >= d.y.abs() { 0 } else { 1 };
    let order = |p: &Point2<f64>, q: &Point2<f64>| {
        if p[axis] <= q[axis] {
            (*p, *q)
        } else {
            (*q, *p)
        }
    };
    let (amin, amax) = order(a0, a1);
    let (bmin, bmax) = order(b0, b1);
    let lo = if amin[axis] >= bmin[axis] { amin } else { bmin };
    let hi = if amax[axis] <= bmax[axis] { amax } else { bmax };

    if lo[axis] > hi[axis] {
        Intersection::None
    } else if lo[axis] == hi[axis] {
        Intersection::Point(lo)
    } else {
        Intersection::Segment(lo, hi)
    }
}

/// Intersection of two segments in space; non-coplanar segments never meet
pub fn segment_segment(
    a0: &Point3<f64>,
    a1: &Point3<f64>,
    b0: &Point3<f64>,
    b1: &Point3<f64>,
) -> Intersection<Point3<f64>> {
    if orient3d(a0, a1, b0, b1) != 0.0 {
        return Intersection::None;
    }

    // Projection that keeps the common plane (or line) non-degenerate
    let mut normal = triangle_normal(a0, a1, b0);
    if normal == Vector3::zeros() {
        normal = triangle_normal(a0, a1, b1);
    }
    let axis = if normal == Vector3::zeros() {
        let d = if a0 != a1 { a1 - a0 } else { b1 - b0 };
        let abs = d.map(f64::abs);
        if abs.x <= abs.y && abs.x <= abs.z {
            0
        } else if abs.y <= abs.z {
            1
        } else {
            2
        }
    } else {
        dominant_axis(&normal)
    };

    let project = |p: &Point3<f64>| drop_axis(p, axis);
    let lift = |q: &Point2<f64>| lift_on_segment(q, a0, a1, b0, b1, axis);
    match segment_segment_2d(&project(a0), &project(a1), &project(b0), &project(b1)) {
        Intersection::None => Intersection::None,
        Intersection::Point(p) => Intersection::Point(lift(&p)),
        Intersection::Segment(p, q) => Intersection::Segment(lift(&p), lift(&q)),
    }
}

/// Maps a projected intersection point back onto the 3D segments,
/// returning an input endpoint verbatim when the projection hits one
fn lift_on_segment(
    q: &Point2<f64>,
    a0: &Point3<f64>,
    a1: &Point3<f64>,
    b0: &Point3<f64>,
    b1: &Point3<f64>,
    axis: usize,
) -> Point3<f64> {
    for p in [a0, a1, b0, b1] {
        if drop_axis(p, axis) == *q {
            return *p;
        }
    }
    let (s0, s1) = if a0 != a1 { (a0, a1) } else { (b0, b1) };
    let p0 = drop_axis(s0, axis);
    let d = drop_axis(s1, axis) - p0;
    let t = (q - p0).dot(&d) / d.norm_squared();
    lerp(s0, s1, t)
}

/// Intersection of segment (p0, p1) with a triangle
pub fn segment_triangle(
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    tri: &[Point3<f64>; 3],
) -> Result<Intersection<Point3<f64>>> {
    check_triangle(tri)?;
    let [a, b, c] = tri;
    let d0 = orient3d(a, b, c, p0);
    let d1 = orient3d(a, b, c, p1);

    if d0 * d1 > 0.0 {
        return Ok(Intersection::None);
    }
    if d0 == 0.0 && d1 == 0.0 {
        return Ok(clip_coplanar_segment(p0, p1, tri));
    }

    // The supporting line passes through the triangle iff the three
    // edge orientations agree in sign
    let s0 = orient3d(p0, p1, a, b);
    let s1 = orient3d(p0, p1, b, c);
    let s2 = orient3d(p0, p1, c, a);
    let has_pos = s0 > 0.0 || s1 > 0.0 || s2 > 0.0;
    let has_neg = s0 < 0.0 || s1 < 0.0 || s2 < 0.0;
    if has_pos && has_neg {
        return Ok(Intersection::None);
    }

    let point = if d0 == 0.0 {
        *p0
    } else if d1 == 0.0 {
        *p1
    } else {
        lerp(p0, p1, d0 / (d0 - d1))
    };
    Ok(Intersection::Point(point))
}

/// Clips a segment lying in the triangle's plane against the triangle.
///
/// Works in the triangle's dominant projection, so endpoints slightly off
/// the plane are clipped as if they were projected onto it.
pub fn clip_coplanar_segment(
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    tri: &[Point3<f64>; 3],
) -> Intersection<Point3<f64>> {
    let normal = triangle_normal(&tri[0], &tri[1], &tri[2]);
    let axis = dominant_axis(&normal);
    let mut t2: Vec<Point2<f64>> = tri.iter().map(|p| drop_axis(p, axis)).collect();
    if normal[axis] < 0.0 {
        t2.swap(1, 2);
    }
    let s0 = drop_axis(p0, axis);
    let s1 = drop_axis(p1, axis);

    let mut t_enter: f64 = 0.0;
    let mut t_exit: f64 = 1.0;
    for i in 0..3 {
        let (u, v) = (&t2[i], &t2[(i + 1) % 3]);
        let o0 = orient2d(u, v, &s0);
        let o1 = orient2d(u, v, &s1);
        if o0 < 0.0 && o1 < 0.0 {
            return Intersection::None;
        }
        if o0 >= 0.0 && o1 >= 0.0 {
            continue;
        }
        let t = o0 / (o0 - o1);
        if o0 < 0.0 {
            t_enter = t_enter.max(t);
        } else {
            t_exit = t_exit.min(t);
        }
    }

    let at = |t: f64| {
        if t <= 0.0 {
            *p0
        } else if t >= 1.0 {
            *p1
        } else {
            lerp(p0, p1, t)
        }
    };
    if t_enter > t_exit {
        Intersection::None
    } else if t_enter == t_exit {
        Intersection::Point(at(t_enter))
    } else {
        Intersection::Segment(at(t_enter), at(t_exit))
    }
}

/// Classifies the intersection of two triangles
pub fn triangle_triangle(
    tri_a: &[Point3<f64>; 3],
    tri_b: &[Point3<f64>; 3],
) -> Result<TriangleIntersection> {
    check_triangle(tri_a)?;
    check_triangle(tri_b)?;

    let side_b = tri_b.map(|p| Orientation::of(orient3d(&tri_a[0], &tri_a[1], &tri_a[2], &p)));
    if same_strict_side(&side_b) {
        return Ok(TriangleIntersection::None);
    }
    if side_b.iter().all(|s| s.is_zero()) {
        return Ok(if coplanar_overlap(tri_a, tri_b) {
            TriangleIntersection::Coplanar
        } else {
            TriangleIntersection::None
        });
    }
    let side_a = tri_a.map(|p| Orientation::of(orient3d(&tri_b[0], &tri_b[1], &tri_b[2], &p)));
    if same_strict_side(&side_a) {
        return Ok(TriangleIntersection::None);
    }

    let mut points: Vec<Point3<f64>> = Vec::with_capacity(6);
    let mut collect = |hit: Intersection<Point3<f64>>| match hit {
        Intersection::None => {}
        Intersection::Point(p) => points.push(p),
        Intersection::Segment(p, q) => {
            points.push(p);
            points.push(q);
        }
    };
    for i in 0..3 {
        collect(segment_triangle(&tri_a[i], &tri_a[(i + 1) % 3], tri_b)?);
        collect(segment_triangle(&tri_b[i], &tri_b[(i + 1) % 3], tri_a)?);
    }

    let scale = tri_a
        .iter()
        .chain(tri_b.iter())
        .flat_map(|p| p.iter().map(|c| c.abs()))
        .fold(1.0, f64::max);
    let points = deduplicate_points(&points, 1e-12 * scale);

    Ok(match points.len() {
        0 => TriangleIntersection::None,
        1 => TriangleIntersection::Point(points[0]),
        _ => {
            let (p, q) = farthest_pair(&points);
            TriangleIntersection::Segment(p, q)
        }
    })
}

fn same_strict_side(sides: &[Orientation; 3]) -> bool {
    sides.iter().all(|s| *s == Orientation::Positive)
        || sides.iter().all(|s| *s == Orientation::Negative)
}

/// Whether every vertex of each triangle lies within `tolerance` of the
/// other triangle's plane
pub fn nearly_coplanar(tri_a: &[Point3<f64>; 3], tri_b: &[Point3<f64>; 3], tolerance: f64) -> bool {
    let within = |tri: &[Point3<f64>; 3], other: &[Point3<f64>; 3]| {
        let Some(normal) = triangle_normal(&tri[0], &tri[1], &tri[2]).try_normalize(0.0) else {
            return false;
        };
        other.iter().all(|p| (p - tri[0]).dot(&normal).abs() <= tolerance)
    };
    within(tri_a, tri_b) && within(tri_b, tri_a)
}

/// Whether two coplanar triangles share at least one point, decided in the
/// dominant projection of the first
pub fn coplanar_overlap(tri_a: &[Point3<f64>; 3], tri_b: &[Point3<f64>; 3]) -> bool {
    let normal = triangle_normal(&tri_a[0], &tri_a[1], &tri_a[2]);
    let axis = dominant_axis(&normal);
    let a: Vec<Point2<f64>> = tri_a.iter().map(|p| drop_axis(p, axis)).collect();
    let b: Vec<Point2<f64>> = tri_b.iter().map(|p| drop_axis(p, axis)).collect();

    for i in 0..3 {
        for j in 0..3 {
            let hit = segment_segment_2d(&a[i], &a[(i + 1) % 3], &b[j], &b[(j + 1) % 3]);
            if !hit.is_none() {
                return true;
            }
        }
    }
    point_in_triangle_2d(&a[0], &b[0], &b[1], &b[2]) != Orientation::Negative
        || point_in_triangle_2d(&b[0], &a[0], &a[1], &a[2]) != Orientation::Negative
}

/// Positive inside, zero on the boundary, negative outside; works for
/// either winding of the triangle
pub fn point_in_triangle_2d(
    p: &Point2<f64>,
    a: &Point2<f64>,
    b: &Point2<f64>,
    c: &Point2<f64>,
) -> Orientation {
    let o = [orient2d(a, b, p), orient2d(b, c, p), orient2d(c, a, p)];
    let has_pos = o.iter().any(|v| *v > 0.0);
    let has_neg = o.iter().any(|v| *v < 0.0);
    if has_pos && has_neg {
        Orientation::Negative
    } else if o.iter().any(|v| *v == 0.0) {
        Orientation::Zero
    } else {
        Orientation::Positive
    }
}

/// Closest point to `p` on triangle (a, b, c)
pub fn closest_point_on_triangle(
    p: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> Point3<f64> {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return *a;
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return *b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return *c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = va + vb + vc;
    if denom == 0.0 {
        // Degenerate triangle: fall back to the nearest edge
        return [(a, b), (b, c), (c, a)]
            .into_iter()
            .map(|(s, e)| closest_point_on_segment(p, s, e))
            .min_by(|x, y| (x - p).norm_squared().total_cmp(&(y - p).norm_squared()))
            .unwrap_or(*a);
    }
    let v = vb / denom;
    let w = vc / denom;
    a + ab * v + ac * w
}

/// Closest point to `p` on segment (a, b)
pub fn closest_point_on_segment(p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> Point3<f64> {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 == 0.0 {
        return *a;
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    a + ab * t
}

/// Deduplicate points within `eps` distance
fn deduplicate_points(points: &[Point3<f64>], eps: f64) -> Vec<Point3<f64>> {
    let mut result: Vec<Point3<f64>> = Vec::with_capacity(points.len());
    for point in points {
        if !result.iter().any(|q| (point - q).norm() <= eps) {
            result.push(*point);
        }
    }
    result
}

fn farthest_pair(points: &[Point3<f64>]) -> (Point3<f64>, Point3<f64>) {
    let mut best = (points[0], points[0], -1.0);
    for (i, p) in points.iter().enumerate() {
        for q in &points[i + 1..] {
            let d = (p - q).norm_squared();
            if d > best.2 {
                best = (*p, *q, d);
            }
        }
    }
    (best.0, best.1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3<f64> {
        Point3::new(x, y, z)
    }

    fn q(x: f64, y: f64) -> Point2<f64> {
        Point2::new(x, y)
    }

    #[test]
    fn test_segment_segment_2d_cases() {
        assert_eq!(
            segment_segment_2d(&q(0., 0.), &q(2., 2.), &q(0., 2.), &q(2., 0.)),
            Intersection::Point(q(1., 1.))
        );
        assert_eq!(
            segment_segment_2d(&q(0., 0.), &q(1., 0.), &q(0., 1.), &q(1., 1.)),
            Intersection::None
        );
        assert_eq!(
            segment_segment_2d(&q(0., 0.), &q(2., 0.), &q(1., 0.), &q(3., 0.)),
            Intersection::Segment(q(1., 0.), q(2., 0.))
        );
        assert_eq!(
            segment_segment_2d(&q(0., 0.), &q(1., 0.), &q(1., 0.), &q(1., 5.)),
            Intersection::Point(q(1., 0.))
        );
        assert_eq!(
            segment_segment_2d(&q(0., 0.), &q(1., 0.), &q(2., 0.), &q(3., 0.)),
            Intersection::None
        );
    }

    #[test]
    fn test_segment_segment_3d() {
        let hit = segment_segment(&p(0., 0., 0.), &p(2., 2., 2.), &p(0., 2., 2.), &p(2., 0., 0.));
        match hit {
            Intersection::Point(x) => assert_relative_eq!(x, p(1., 1., 1.), epsilon = 1e-12),
            other => panic!("unexpected {other:?}"),
        }
        // Skew lines
        assert!(segment_segment(&p(0., 0., 0.), &p(1., 0., 0.), &p(0., 1., 1.), &p(0., 2., 1.))
            .is_none());
        // Collinear overlap
        assert_eq!(
            segment_segment(&p(0., 0., 0.), &p(0., 0., 2.), &p(0., 0., 1.), &p(0., 0., 3.)),
            Intersection::Segment(p(0., 0., 1.), p(0., 0., 2.))
        );
    }

    #[test]
    fn test_segment_triangle() {
        let tri = [p(0., 0., 0.), p(2., 0., 0.), p(0., 2., 0.)];
        let hit = segment_triangle(&p(0.5, 0.5, -1.), &p(0.5, 0.5, 1.), &tri).unwrap();
        assert_eq!(hit, Intersection::Point(p(0.5, 0.5, 0.)));

        let miss = segment_triangle(&p(3., 3., -1.), &p(3., 3., 1.), &tri).unwrap();
        assert!(miss.is_none());

        let coplanar = segment_triangle(&p(-1., 0.5, 0.), &p(3., 0.5, 0.), &tri).unwrap();
        match coplanar {
            Intersection::Segment(a, b) => {
                assert_relative_eq!(a, p(0., 0.5, 0.), epsilon = 1e-12);
                assert_relative_eq!(b, p(1.5, 0.5, 0.), epsilon = 1e-12);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_degenerate_triangle_rejected() {
        let flat = [p(0., 0., 0.), p(1., 1., 1.), p(2., 2., 2.)];
        let tri = [p(0., 0., 0.), p(1., 0., 0.), p(0., 1., 0.)];
        assert!(matches!(
            triangle_triangle(&flat, &tri),
            Err(KernelError::DegenerateGeometry { .. })
        ));
        assert!(segment_triangle(&p(0., 0., 0.), &p(1., 0., 0.), &flat).is_err());
    }

    #[test]
    fn test_triangle_intersection_disjoint() {
        let tri_a = [p(0., 0., 0.), p(1., 0., 0.), p(0., 1., 0.)];
        let tri_b = [p(2., 0., 0.), p(3., 0., 0.), p(2., 1., 0.)];
        assert_eq!(triangle_triangle(&tri_a, &tri_b).unwrap(), TriangleIntersection::None);
    }

    #[test]
    fn test_triangle_intersection_coplanar_overlap() {
        let tri_a = [p(0., 0., 0.), p(1., 0., 0.), p(0., 1., 0.)];
        let tri_b = [p(0.5, 0., 0.), p(1.5, 0., 0.), p(0.5, 1., 0.)];
        assert_eq!(
            triangle_triangle(&tri_a, &tri_b).unwrap(),
            TriangleIntersection::Coplanar
        );
        // Contained without edge crossings
        let small = [p(0.1, 0.1, 0.), p(0.2, 0.1, 0.), p(0.1, 0.2, 0.)];
        assert_eq!(
            triangle_triangle(&tri_a, &small).unwrap(),
            TriangleIntersection::Coplanar
        );
    }

    #[test]
    fn test_nearly_coplanar_pair() {
        let tri_a = [p(0., 0., 0.), p(1., 0., 0.), p(0., 1., 0.)];
        // Rounded copy of a piece of tri_a, just off its plane
        let piece = [p(0.1, 0.1, 1e-15), p(0.6, 0.1, -1e-15), p(0.1, 0.6, 0.)];
        assert!(nearly_coplanar(&tri_a, &piece, 1e-9));
        assert!(coplanar_overlap(&tri_a, &piece));
        let tilted = [p(0.1, 0.1, 0.), p(0.6, 0.1, 0.), p(0.1, 0.6, 0.1)];
        assert!(!nearly_coplanar(&tri_a, &tilted, 1e-9));

        match clip_coplanar_segment(&p(0.5, 0.2, 1e-15), &p(0.5, 2.0, 1e-15), &tri_a) {
            Intersection::Segment(s, t) => {
                assert_eq!(s, p(0.5, 0.2, 1e-15));
                assert_relative_eq!(t, p(0.5, 0.5, 0.), epsilon = 1e-12);
            }
            other => panic!("unexpected clip {other:?}"),
        }
    }

    #[test]
    fn test_triangle_intersection_crossing() {
        let tri_a = [p(0., 0., 0.), p(4., 0., 0.), p(0., 4., 0.)];
        let tri_b = [p(1., 1., -1.), p(1., 1., 1.), p(3., -2., 0.)];
        match triangle_triangle(&tri_a, &tri_b).unwrap() {
            TriangleIntersection::Segment(s, e) => {
                assert_relative_eq!(s.z, 0.0);
                assert_relative_eq!(e.z, 0.0);
                assert!((s - e).norm() > 0.1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_triangle_intersection_touching_vertex() {
        let tri_a = [p(0., 0., 0.), p(1., 0., 0.), p(0., 1., 0.)];
        let tri_b = [p(0.2, 0.2, 0.), p(0.2, 0.2, 1.), p(1., 1., 1.)];
        assert_eq!(
            triangle_triangle(&tri_a, &tri_b).unwrap(),
            TriangleIntersection::Point(p(0.2, 0.2, 0.))
        );
    }

    #[test]
    fn test_closest_point_on_triangle() {
        let (a, b, c) = (p(0., 0., 0.), p(1., 0., 0.), p(0., 1., 0.));
        assert_relative_eq!(
            closest_point_on_triangle(&p(0.2, 0.2, 3.), &a, &b, &c),
            p(0.2, 0.2, 0.),
            epsilon = 1e-12
        );
        assert_eq!(closest_point_on_triangle(&p(-1., -1., 0.), &a, &b, &c), a);
        assert_relative_eq!(
            closest_point_on_triangle(&p(1., 1., 0.), &a, &b, &c),
            p(0.5, 0.5, 0.),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_point_in_triangle_2d() {
        let (a, b, c) = (q(0., 0.), q(1., 0.), q(0., 1.));
        assert_eq!(point_in_triangle_2d(&q(0.2, 0.2), &a, &b, &c), Orientation::Positive);
        assert_eq!(point_in_triangle_2d(&q(0.5, 0.0), &a, &b, &c), Orientation::Zero);
        assert_eq!(point_in_triangle_2d(&q(1.0, 1.0), &a, &c, &b), Orientation::Negative);
    }
}
