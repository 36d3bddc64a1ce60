// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polylines and segment stitching
//! Closed polylines do not repeat their first point. Traversal direction
//! of stitched polylines is not canonical.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use super::triangle_intersection::closest_point_on_segment;
use super::vertex_map::VertexMap;

/// Ordered sequence of 3D points, optionally closed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub points: Vec<Point3<f64>>,
    pub closed: bool,
}

impl Polyline {
    pub fn new(points: Vec<Point3<f64>>, closed: bool) -> Self {
        Self { points, closed }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Segments in traversal order, including the closing one
    pub fn segments(&self) -> impl Iterator<Item = (Point3<f64>, Point3<f64>)> + '_ {
        let n = self.points.len();
        let count = match (self.closed, n) {
            (_, 0) | (_, 1) => 0,
            (true, _) => n,
            (false, _) => n - 1,
        };
        (0..count).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| (b - a).norm()).sum()
    }

    /// Drops interior points lying within `tolerance` of the line through
    /// their neighbours
    pub fn merge_collinear(&mut self, tolerance: f64) {
        let min_len = if self.closed { 3 } else { 2 };
        let mut changed = true;
        while changed && self.points.len() > min_len {
            changed = false;
            let n = self.points.len();
            let range = if self.closed { 0..n } else { 1..n - 1 };
            for i in range {
                let prev = self.points[(i + n - 1) % n];
                let next = self.points[(i + 1) % n];
                let p = self.points[i];
                if point_line_distance(&p, &prev, &next) <= tolerance
                    && (p - prev).dot(&(next - p)) >= 0.0
                {
                    self.points.remove(i);
                    changed = true;
                    break;
                }
            }
        }
    }
}

/// Result of stitching loose segments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StitchResult {
    pub polylines: Vec<Polyline>,
    /// Endpoints left unmatched (nodes of odd degree)
    pub open_ends: usize,
}

/// Chains segments into polylines by matching endpoints within `tolerance`
pub fn stitch_segments(segments: &[(Point3<f64>, Point3<f64>)], tolerance: f64) -> StitchResult {
    let mut nodes = VertexMap::new(tolerance);
    let mut edges: Vec<[usize; 2]> = Vec::with_capacity(segments.len());
    let mut seen = ahash::AHashSet::new();
    for (a, b) in segments {
        let ia = nodes.insert(*a);
        let ib = nodes.insert(*b);
        if ia != ib && seen.insert((ia.min(ib), ia.max(ib))) {
            edges.push([ia, ib]);
        }
    }

    let mut incident: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for (e, [a, b]) in edges.iter().enumerate() {
        incident[*a].push(e);
        incident[*b].push(e);
    }
    let open_ends = incident.iter().filter(|list| list.len() % 2 == 1).count();

    let mut used = vec![false; edges.len()];
    let mut polylines = Vec::new();

    let walk = |start: usize, used: &mut Vec<bool>| -> (Vec<usize>, bool) {
        let mut chain = vec![start];
        let mut current = start;
        loop {
            let Some(&e) = incident[current].iter().find(|&&e| !used[e]) else {
                break;
            };
            used[e] = true;
            let [a, b] = edges[e];
            current = if a == current { b } else { a };
            if current == start {
                return (chain, true);
            }
            chain.push(current);
            if incident[current].len() != 2 {
                break;
            }
        }
        (chain, false)
    };

    // Chains through branch points and dangling ends first
    for node in 0..nodes.len() {
        if incident[node].len() == 2 {
            continue;
        }
        while incident[node].iter().any(|&e| !used[e]) {
            let (chain, closed) = walk(node, &mut used);
            polylines.push(to_polyline(&nodes, &chain, closed));
        }
    }
    // Remaining edges form simple loops
    for e in 0..edges.len() {
        if !used[e] {
            let (chain, closed) = walk(edges[e][0], &mut used);
            polylines.push(to_polyline(&nodes, &chain, closed));
        }
    }

    StitchResult {
        polylines,
        open_ends,
    }
}

fn to_polyline(nodes: &VertexMap, chain: &[usize], closed: bool) -> Polyline {
    Polyline::new(chain.iter().map(|&i| *nodes.position(i)).collect(), closed)
}

fn point_line_distance(p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    let ab = b - a;
    let len = ab.norm();
    if len == 0.0 {
        return (p - a).norm();
    }
    ab.cross(&(p - a)).norm() / len
}

/// Douglas-Peucker simplification of an open point sequence
pub fn simplify_polyline(points: &[Point3<f64>], threshold: f64) -> Vec<Point3<f64>> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    let mut stack = vec![(0, points.len() - 1)];
    while let Some((start, end)) = stack.pop() {
        let mut farthest = (start, 0.0);
        for i in start + 1..end {
            let d = (points[i] - closest_point_on_segment(&points[i], &points[start], &points[end])).norm();
            if d > farthest.1 {
                farthest = (i, d);
            }
        }
        if farthest.1 > threshold {
            keep[farthest.0] = true;
            stack.push((start, farthest.0));
            stack.push((farthest.0, end));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Simplifies every polyline; closed ones are split at the point farthest
/// from their start so both halves keep their anchors
pub fn simplify_polylines(polylines: &[Polyline], threshold: f64) -> Vec<Polyline> {
    polylines
        .iter()
        .map(|polyline| {
            if !polyline.closed || polyline.len() < 4 {
                return Polyline::new(simplify_polyline(&polyline.points, threshold), polyline.closed);
            }
            let first = polyline.points[0];
            let split = (1..polyline.len())
                .max_by(|&i, &j| {
                    (polyline.points[i] - first)
                        .norm_squared()
                        .total_cmp(&(polyline.points[j] - first).norm_squared())
                })
                .unwrap_or(1);

            let mut head = simplify_polyline(&polyline.points[..=split], threshold);
            let mut tail_points = polyline.points[split..].to_vec();
            tail_points.push(first);
            let tail = simplify_polyline(&tail_points, threshold);
            head.extend_from_slice(&tail[1..tail.len() - 1]);
            Polyline::new(head, true)
        })
        .collect()
}

/// Closest point on `polyline` for each query point
pub fn closest_points_on_polyline(queries: &[Point3<f64>], polyline: &Polyline) -> Vec<Point3<f64>> {
    queries
        .iter()
        .map(|q| {
            if polyline.len() == 1 {
                return polyline.points[0];
            }
            polyline
                .segments()
                .map(|(a, b)| closest_point_on_segment(q, &a, &b))
                .min_by(|x, y| (x - q).norm_squared().total_cmp(&(y - q).norm_squared()))
                .unwrap_or(*q)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point3<f64> {
        Point3::new(x, y, 0.0)
    }

    #[test]
    fn test_stitch_closed_square() {
        let segments = vec![
            (p(0., 0.), p(1., 0.)),
            (p(1., 1.), p(0., 1.)),
            (p(1., 0.), p(1., 1.)),
            (p(0., 0.), p(0., 1.)),
        ];
        let result = stitch_segments(&segments, 1e-9);
        assert_eq!(result.open_ends, 0);
        assert_eq!(result.polylines.len(), 1);
        let loop_ = &result.polylines[0];
        assert!(loop_.closed);
        assert_eq!(loop_.len(), 4);
        assert_relative_eq!(loop_.length(), 4.0);
    }

    #[test]
    fn test_stitch_open_chain_reports_ends() {
        let segments = vec![(p(0., 0.), p(1., 0.)), (p(1., 0.), p(2., 1.))];
        let result = stitch_segments(&segments, 1e-9);
        assert_eq!(result.open_ends, 2);
        assert_eq!(result.polylines.len(), 1);
        assert!(!result.polylines[0].closed);
        assert_eq!(result.polylines[0].len(), 3);
    }

    #[test]
    fn test_stitch_tolerance_and_duplicates() {
        let segments = vec![
            (p(0., 0.), p(1., 0.)),
            (p(1.0 + 1e-12, 0.), p(0., 1.)),
            (p(0., 1.), p(0., 1e-12)),
            (p(1., 0.), p(0., 0.)),
        ];
        let result = stitch_segments(&segments, 1e-9);
        assert_eq!(result.open_ends, 0);
        assert_eq!(result.polylines.len(), 1);
        assert_eq!(result.polylines[0].len(), 3);
    }

    #[test]
    fn test_merge_collinear() {
        let mut square = Polyline::new(
            vec![p(0., 0.), p(0.5, 0.), p(1., 0.), p(1., 1.), p(0., 1.), p(0., 0.5)],
            true,
        );
        square.merge_collinear(1e-9);
        assert_eq!(square.len(), 4);
    }

    #[test]
    fn test_simplify() {
        let points = vec![p(0., 0.), p(1., 0.01), p(2., 0.), p(3., 5.), p(4., 0.)];
        let simplified = simplify_polyline(&points, 0.1);
        assert_eq!(simplified, vec![p(0., 0.), p(2., 0.), p(3., 5.), p(4., 0.)]);

        let ring = Polyline::new(
            vec![p(0., 0.), p(1., 0.001), p(2., 0.), p(2., 2.), p(0., 2.)],
            true,
        );
        let simplified = simplify_polylines(&[ring], 0.1);
        assert_eq!(simplified[0].len(), 4);
        assert!(simplified[0].closed);
    }

    #[test]
    fn test_closest_points() {
        let line = Polyline::new(vec![p(0., 0.), p(2., 0.), p(2., 2.)], false);
        let result = closest_points_on_polyline(&[p(1., 1.), p(3., 1.), p(-1., -1.)], &line);
        assert_relative_eq!(result[0], p(1., 0.));
        assert_relative_eq!(result[1], p(2., 1.));
        assert_relative_eq!(result[2], p(0., 0.));
    }
}
