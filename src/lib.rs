// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyframe Mesh Kernel
//!
//! Robust operations on indexed triangle meshes: booleans between closed
//! solids, isotropic remeshing, planar slicing, constrained Delaunay
//! triangulation with holes, and volume measurement.
//!
//! Every operation takes its tolerances from an explicit configuration
//! value (see [`config`]); nothing is stored globally. Geometric decisions
//! go through the adaptive predicates in
//! [`geometry::robust_predicates`].
//!
//! ```
//! use polyframe_mesh::geometry::{boolean_difference, primitives::cube, volume};
//!
//! let outer = cube(4.0, true);
//! let inner = cube(2.0, true);
//! let shell = boolean_difference(&outer, &inner).unwrap();
//! assert!((volume(&shell) - 56.0).abs() < 1e-9);
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod utils;

pub use config::{
    BooleanConfig, ClassificationMethod, KernelConfig, RemeshConfig, SliceConfig, Tolerance,
    TriangulationConfig,
};
pub use error::{KernelError, Result};
pub use geometry::{
    boolean, boolean_difference, boolean_intersection, boolean_union,
    constrained_delaunay_triangulation, remesh, slice_mesh, volume, Aabb, BooleanOp, Plane,
    PlaneSlice, Polyline, TriMesh,
};
