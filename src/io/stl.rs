// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Binary and ASCII STL through `stl_io`
//!
//! STL stores single-precision coordinates, so values not representable as
//! `f32` are rounded on write.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use stl_io::{Normal, Triangle as StlTriangle, Vertex as StlVertex};
use tracing::debug;

use crate::geometry::TriMesh;

/// Reads binary or ASCII STL; coincident corners are merged by `stl_io`
pub fn read_stl(path: impl AsRef<Path>) -> Result<TriMesh> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open STL file: {:?}", path))?;
    let mut reader = BufReader::new(file);
    let stl = stl_io::read_stl(&mut reader)
        .with_context(|| format!("Failed to parse STL file: {:?}", path))?;

    let vertices: Vec<[f64; 3]> = stl
        .vertices
        .iter()
        .map(|v| [v[0] as f64, v[1] as f64, v[2] as f64])
        .collect();
    let faces: Vec<[usize; 3]> = stl.faces.iter().map(|f| f.vertices).collect();
    let mesh = TriMesh::from_arrays(&vertices, &faces)
        .with_context(|| format!("Invalid mesh in STL file: {:?}", path))?;
    debug!(path = ?path, faces = mesh.face_count(), "read STL mesh");
    Ok(mesh)
}

/// Writes binary STL with per-face normals
pub fn write_stl(mesh: &TriMesh, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let triangles: Vec<StlTriangle> = (0..mesh.face_count())
        .map(|f| {
            let n = mesh.face_normal(f);
            let [a, b, c] = mesh.face_points(f);
            StlTriangle {
                normal: Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [a, b, c].map(|p| StlVertex::new([p.x as f32, p.y as f32, p.z as f32])),
            }
        })
        .collect();

    let file = File::create(path).with_context(|| format!("Failed to create STL file: {:?}", path))?;
    let mut writer = BufWriter::new(file);
    stl_io::write_stl(&mut writer, triangles.iter())
        .with_context(|| format!("Failed to write STL file: {:?}", path))?;
    Ok(())
}
