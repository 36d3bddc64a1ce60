// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Closed, outward-oriented primitive meshes

use nalgebra::Point3;
use std::f64::consts::PI;

use super::TriMesh;

/// Geometric primitives
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Cuboid { min: Point3<f64>, max: Point3<f64> },
    Sphere { radius: f64, segments: usize, rings: usize },
    Cylinder { radius: f64, height: f64, segments: usize },
    Tetrahedron,
}

impl Primitive {
    pub fn to_mesh(&self) -> TriMesh {
        match self {
            Self::Cuboid { min, max } => generate_cuboid(min, max),
            Self::Sphere {
                radius,
                segments,
                rings,
            } => generate_sphere(*radius, (*segments).max(3), (*rings).max(2)),
            Self::Cylinder {
                radius,
                height,
                segments,
            } => generate_cylinder(*radius, *height, (*segments).max(3)),
            Self::Tetrahedron => generate_tetrahedron(),
        }
    }
}

/// Cube with edge length `size`, either centred on the origin or spanning
/// `[0, size]` on every axis
pub fn cube(size: f64, center: bool) -> TriMesh {
    let (lo, hi) = if center {
        (-size / 2.0, size / 2.0)
    } else {
        (0.0, size)
    };
    box_mesh(Point3::new(lo, lo, lo), Point3::new(hi, hi, hi))
}

/// Axis-aligned box between two corners
pub fn box_mesh(min: Point3<f64>, max: Point3<f64>) -> TriMesh {
    Primitive::Cuboid { min, max }.to_mesh()
}

/// UV sphere centred on the origin
pub fn uv_sphere(radius: f64, segments: usize, rings: usize) -> TriMesh {
    Primitive::Sphere {
        radius,
        segments,
        rings,
    }
    .to_mesh()
}

/// Cylinder along +z with its base on the z = 0 plane
pub fn cylinder(radius: f64, height: f64, segments: usize) -> TriMesh {
    Primitive::Cylinder {
        radius,
        height,
        segments,
    }
    .to_mesh()
}

/// Unit right-corner tetrahedron
pub fn tetrahedron() -> TriMesh {
    Primitive::Tetrahedron.to_mesh()
}

fn generate_cuboid(min: &Point3<f64>, max: &Point3<f64>) -> TriMesh {
    let vertices = vec![
        Point3::new(min.x, min.y, min.z),
        Point3::new(max.x, min.y, min.z),
        Point3::new(max.x, max.y, min.z),
        Point3::new(min.x, max.y, min.z),
        Point3::new(min.x, min.y, max.z),
        Point3::new(max.x, min.y, max.z),
        Point3::new(max.x, max.y, max.z),
        Point3::new(min.x, max.y, max.z),
    ];

    let faces = vec![
        // z+
        [4, 5, 6],
        [4, 6, 7],
        // z-
        [1, 0, 3],
        [1, 3, 2],
        // x+
        [5, 1, 2],
        [5, 2, 6],
        // x-
        [0, 4, 7],
        [0, 7, 3],
        // y+
        [7, 6, 2],
        [7, 2, 3],
        // y-
        [0, 1, 5],
        [0, 5, 4],
    ];

    TriMesh::from_parts(vertices, faces)
}

fn generate_sphere(radius: f64, segments: usize, rings: usize) -> TriMesh {
    let mut vertices = Vec::with_capacity(2 + segments * (rings - 1));
    vertices.push(Point3::new(0.0, 0.0, radius));
    for i in 1..rings {
        let theta = PI * i as f64 / rings as f64;
        for j in 0..segments {
            let phi = 2.0 * PI * j as f64 / segments as f64;
            vertices.push(Point3::new(
                radius * theta.sin() * phi.cos(),
                radius * theta.sin() * phi.sin(),
                radius * theta.cos(),
            ));
        }
    }
    vertices.push(Point3::new(0.0, 0.0, -radius));
    let south = vertices.len() - 1;

    let ring = |i: usize, j: usize| 1 + (i - 1) * segments + j % segments;
    let mut faces = Vec::with_capacity(2 * segments * (rings - 1));

    for j in 0..segments {
        faces.push([0, ring(1, j), ring(1, j + 1)]);
    }
    for i in 1..rings - 1 {
        for j in 0..segments {
            let a = ring(i, j);
            let b = ring(i + 1, j);
            let c = ring(i + 1, j + 1);
            let d = ring(i, j + 1);
            faces.push([a, b, c]);
            faces.push([a, c, d]);
        }
    }
    for j in 0..segments {
        faces.push([south, ring(rings - 1, j + 1), ring(rings - 1, j)]);
    }

    TriMesh::from_parts(vertices, faces)
}

fn generate_cylinder(radius: f64, height: f64, segments: usize) -> TriMesh {
    let mut vertices = Vec::with_capacity(2 + 2 * segments);
    vertices.push(Point3::new(0.0, 0.0, 0.0));
    vertices.push(Point3::new(0.0, 0.0, height));
    for z in [0.0, height] {
        for j in 0..segments {
            let phi = 2.0 * PI * j as f64 / segments as f64;
            vertices.push(Point3::new(radius * phi.cos(), radius * phi.sin(), z));
        }
    }

    let bottom = |j: usize| 2 + j % segments;
    let top = |j: usize| 2 + segments + j % segments;
    let mut faces = Vec::with_capacity(4 * segments);
    for j in 0..segments {
        faces.push([0, bottom(j + 1), bottom(j)]);
        faces.push([1, top(j), top(j + 1)]);
        faces.push([bottom(j), bottom(j + 1), top(j + 1)]);
        faces.push([bottom(j), top(j + 1), top(j)]);
    }

    TriMesh::from_parts(vertices, faces)
}

fn generate_tetrahedron() -> TriMesh {
    TriMesh::from_parts(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ],
        vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
    )
}
