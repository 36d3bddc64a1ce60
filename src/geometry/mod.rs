// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - mesh representation and operations

mod bbox;
mod boolean;
mod bvh;
pub(crate) mod cdt;
mod classification;
mod halfedge;
mod measure;
mod mesh;
mod plane;
mod polyline;
pub mod primitives;
mod projection;
mod remesh;
pub mod robust_predicates;
mod slicer;
pub mod triangle_intersection;
pub(crate) mod triangle_splitting;
mod triangulation;
mod vertex_map;

pub use bbox::Aabb;
pub use boolean::{
    boolean, boolean_difference, boolean_intersection, boolean_union, boolean_with,
    intersection_mesh_mesh, intersection_mesh_mesh_with, split_mesh_mesh, split_mesh_mesh_with,
    BooleanOp,
};
pub use bvh::{Bvh, ClosestHit};
pub use classification::{point_in_mesh, winding_number, FragmentClass, SolidClassifier};
pub use halfedge::{
    edge_key, validate_closed_manifold, vertex_degrees, vertex_face_incidence, HalfEdge,
    HalfEdgeMesh,
};
pub use measure::{analyze, area, centroid, volume, MeshStats};
pub use mesh::TriMesh;
pub(crate) use mesh::triangulate_face;
pub use plane::{planes_from_points, Plane};
pub use polyline::{
    closest_points_on_polyline, simplify_polyline, simplify_polylines, stitch_segments, Polyline,
    StitchResult,
};
pub use primitives::Primitive;
pub use projection::{
    project_mesh_on_mesh, project_points_on_mesh, pull_mesh_on_mesh, pull_points_on_mesh,
    SurfaceProjector,
};
pub use remesh::remesh;
pub use robust_predicates::Orientation;
pub use slicer::{slice_mesh, slice_mesh_strict, slice_mesh_with, PlaneSlice};
pub use triangulation::{
    conforming_delaunay_triangulation, constrained_delaunay_triangulation, delaunay_triangulation,
    refined_delaunay_mesh, triangulate_polygon, TriangulationInput,
};
pub use vertex_map::VertexMap;
