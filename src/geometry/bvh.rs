// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Bounding Volume Hierarchy (BVH) over mesh faces
//! Accelerates overlap queries, ray casts and closest-point searches

use nalgebra::{Point3, Vector3};

use super::triangle_intersection::closest_point_on_triangle;
use super::{Aabb, TriMesh};

/// BVH node
#[derive(Debug, Clone)]
pub struct BvhNode {
    /// Bounding box of this node
    pub bbox: Aabb,
    /// Left child (None for leaf)
    pub left: Option<Box<BvhNode>>,
    /// Right child (None for leaf)
    pub right: Option<Box<BvhNode>>,
    /// Face indices (only for leaf nodes)
    pub items: Vec<usize>,
}

impl BvhNode {
    fn leaf(bbox: Aabb, items: Vec<usize>) -> Self {
        Self {
            bbox,
            left: None,
            right: None,
            items,
        }
    }

    fn internal(left: Box<BvhNode>, right: Box<BvhNode>) -> Self {
        Self {
            bbox: left.bbox.union(&right.bbox),
            left: Some(left),
            right: Some(right),
            items: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Closest-point query result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestHit {
    pub face: usize,
    pub point: Point3<f64>,
    pub distance_squared: f64,
}

/// Bounding Volume Hierarchy
#[derive(Debug, Clone)]
pub struct Bvh {
    root: BvhNode,
    len: usize,
}

const MAX_DEPTH: usize = 48;
const LEAF_SIZE: usize = 4;
const RAY_BOX_MARGIN: f64 = 1e-9;

impl Bvh {
    /// Build from `(item_index, bbox)` pairs
    pub fn build(items: Vec<(usize, Aabb)>) -> Self {
        let len = items.len();
        if items.is_empty() {
            return Self {
                root: BvhNode::leaf(Aabb::empty(), Vec::new()),
                len,
            };
        }
        Self {
            root: Self::build_recursive(items, 0),
            len,
        }
    }

    /// BVH over every face of `mesh`
    pub fn from_mesh(mesh: &TriMesh) -> Self {
        let items = (0..mesh.face_count())
            .map(|f| (f, Aabb::from_points(mesh.face_points(f).iter())))
            .collect();
        Self::build(items)
    }

    fn build_recursive(mut items: Vec<(usize, Aabb)>, depth: usize) -> BvhNode {
        if items.len() <= LEAF_SIZE || depth >= MAX_DEPTH {
            let bbox = items
                .iter()
                .fold(Aabb::empty(), |acc, (_, bbox)| acc.union(bbox));
            return BvhNode::leaf(bbox, items.into_iter().map(|(idx, _)| idx).collect());
        }

        let centroids = items.iter().map(|(_, bbox)| bbox.center()).collect::<Vec<_>>();
        let axis = Aabb::from_points(centroids.iter()).longest_axis();
        items.sort_by(|(_, a), (_, b)| a.center()[axis].total_cmp(&b.center()[axis]));

        let right_items = items.split_off(items.len() / 2);
        let left = Box::new(Self::build_recursive(items, depth + 1));
        let right = Box::new(Self::build_recursive(right_items, depth + 1));
        BvhNode::internal(left, right)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bounding_box(&self) -> &Aabb {
        &self.root.bbox
    }

    /// Items whose boxes intersect `bbox`
    pub fn query(&self, bbox: &Aabb) -> Vec<usize> {
        let mut result = Vec::new();
        if !self.is_empty() {
            Self::query_recursive(&self.root, bbox, &mut result);
        }
        result
    }

    fn query_recursive(node: &BvhNode, bbox: &Aabb, result: &mut Vec<usize>) {
        if !node.bbox.intersects(bbox) {
            return;
        }
        if node.is_leaf() {
            result.extend_from_slice(&node.items);
            return;
        }
        if let Some(ref left) = node.left {
            Self::query_recursive(left, bbox, result);
        }
        if let Some(ref right) = node.right {
            Self::query_recursive(right, bbox, result);
        }
    }

    /// Items whose boxes are hit by the ray `origin + t * direction`, `t >= 0`
    pub fn query_ray(&self, origin: &Point3<f64>, direction: &Vector3<f64>) -> Vec<usize> {
        let mut result = Vec::new();
        if !self.is_empty() {
            let inv = direction.map(|d| 1.0 / d);
            Self::ray_recursive(&self.root, origin, &inv, &mut result);
        }
        result
    }

    fn ray_recursive(
        node: &BvhNode,
        origin: &Point3<f64>,
        inv_dir: &Vector3<f64>,
        result: &mut Vec<usize>,
    ) {
        if !ray_hits_box(&node.bbox, origin, inv_dir) {
            return;
        }
        if node.is_leaf() {
            result.extend_from_slice(&node.items);
            return;
        }
        if let Some(ref left) = node.left {
            Self::ray_recursive(left, origin, inv_dir, result);
        }
        if let Some(ref right) = node.right {
            Self::ray_recursive(right, origin, inv_dir, result);
        }
    }

    /// Closest point on the faces of `mesh` this BVH was built over
    pub fn closest_point(&self, mesh: &TriMesh, point: &Point3<f64>) -> Option<ClosestHit> {
        if self.is_empty() {
            return None;
        }
        let mut best: Option<ClosestHit> = None;
        Self::closest_recursive(&self.root, mesh, point, &mut best);
        best
    }

    fn closest_recursive(
        node: &BvhNode,
        mesh: &TriMesh,
        point: &Point3<f64>,
        best: &mut Option<ClosestHit>,
    ) {
        let bound = best.map_or(f64::INFINITY, |b| b.distance_squared);
        if node.bbox.distance_squared(point) > bound {
            return;
        }
        if node.is_leaf() {
            for &face in &node.items {
                let [a, b, c] = mesh.face_points(face);
                let candidate = closest_point_on_triangle(point, &a, &b, &c);
                let distance_squared = (candidate - point).norm_squared();
                if best.map_or(true, |b| distance_squared < b.distance_squared) {
                    *best = Some(ClosestHit {
                        face,
                        point: candidate,
                        distance_squared,
                    });
                }
            }
            return;
        }

        // Visit the nearer child first to tighten the bound early
        let (Some(left), Some(right)) = (&node.left, &node.right) else {
            return;
        };
        let dl = left.bbox.distance_squared(point);
        let dr = right.bbox.distance_squared(point);
        let (first, second) = if dl <= dr { (left, right) } else { (right, left) };
        Self::closest_recursive(first, mesh, point, best);
        Self::closest_recursive(second, mesh, point, best);
    }

    #[cfg(test)]
    pub(crate) fn root(&self) -> &BvhNode {
        &self.root
    }
}

/// Slab test against the box grown by a relative margin, so rays grazing a
/// face of the box are not lost to rounding
fn ray_hits_box(bbox: &Aabb, origin: &Point3<f64>, inv_dir: &Vector3<f64>) -> bool {
    if bbox.is_empty() {
        return false;
    }
    let bbox = bbox.expanded(RAY_BOX_MARGIN * (bbox.diagonal() + origin.coords.amax()));
    let mut t_min: f64 = 0.0;
    let mut t_max = f64::INFINITY;
    for axis in 0..3 {
        if inv_dir[axis].is_infinite() {
            if origin[axis] < bbox.min[axis] || origin[axis] > bbox.max[axis] {
                return false;
            }
            continue;
        }
        let t0 = (bbox.min[axis] - origin[axis]) * inv_dir[axis];
        let t1 = (bbox.max[axis] - origin[axis]) * inv_dir[axis];
        let (near, far) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
        t_min = t_min.max(near);
        t_max = t_max.min(far);
        if t_min > t_max {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::primitives::{cube, uv_sphere};
    use approx::assert_relative_eq;

    #[test]
    fn test_bvh_build() {
        let mesh = uv_sphere(1.0, 16, 8);
        let bvh = Bvh::from_mesh(&mesh);
        assert_eq!(bvh.len(), mesh.face_count());
        assert!(!bvh.root().is_leaf());
        assert_relative_eq!(bvh.bounding_box().max.z, 1.0);
    }

    #[test]
    fn test_bvh_query() {
        let mesh = cube(10.0, false);
        let bvh = Bvh::from_mesh(&mesh);

        let mut all = bvh.query(&mesh.bounding_box());
        all.sort_unstable();
        assert_eq!(all, (0..12).collect::<Vec<_>>());

        // Thin box around the top face only
        let top = Aabb::new(Point3::new(1.0, 1.0, 9.9), Point3::new(2.0, 2.0, 10.1));
        let hits = bvh.query(&top);
        assert!(hits.iter().any(|&f| mesh.face_normal(f).z > 0.9));
        assert!(bvh.query(&Aabb::new(Point3::new(20.0, 20.0, 20.0), Point3::new(21.0, 21.0, 21.0))).is_empty());
    }

    #[test]
    fn test_bvh_closest_point() {
        let mesh = cube(2.0, true);
        let bvh = Bvh::from_mesh(&mesh);
        let hit = bvh.closest_point(&mesh, &Point3::new(0.2, 0.3, 5.0)).unwrap();
        assert_relative_eq!(hit.point, Point3::new(0.2, 0.3, 1.0), epsilon = 1e-12);
        assert_relative_eq!(hit.distance_squared, 16.0, epsilon = 1e-9);

        let inside = bvh.closest_point(&mesh, &Point3::new(0.9, 0.0, 0.0)).unwrap();
        assert_relative_eq!(inside.point.x, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_bvh_ray_query() {
        let mesh = cube(2.0, true);
        let bvh = Bvh::from_mesh(&mesh);
        let hits = bvh.query_ray(&Point3::new(0.1, 0.2, -5.0), &Vector3::z());
        assert!(!hits.is_empty());
        let away = bvh.query_ray(&Point3::new(0.1, 0.2, 5.0), &Vector3::z());
        assert!(away.is_empty());
    }

    #[test]
    fn test_empty_bvh() {
        let bvh = Bvh::build(Vec::new());
        assert!(bvh.is_empty());
        assert!(bvh.query(&Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))).is_empty());
        assert!(bvh.closest_point(&TriMesh::new(), &Point3::origin()).is_none());
    }
}
