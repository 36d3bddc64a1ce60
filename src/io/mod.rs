// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Vertex/face array adapters for common mesh files
//!
//! Every reader builds its mesh through [`TriMesh::from_arrays`], so file
//! contents get the same validation as in-memory arrays.

mod json;
mod off;
mod stl;

pub use json::{from_json_str, read_json, to_json_string, write_json, MeshArrays};
pub use off::{parse_off, read_off, to_off_string, write_off};
pub use stl::{read_stl, write_stl};

use anyhow::{bail, Result};
use std::path::Path;

use crate::geometry::TriMesh;

/// Reads a mesh, choosing the format from the file extension
pub fn read_mesh(path: impl AsRef<Path>) -> Result<TriMesh> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("off") => read_off(path),
        Some("stl") => read_stl(path),
        Some("json") => read_json(path),
        _ => bail!("Unsupported mesh format: {:?}", path),
    }
}

/// Writes a mesh, choosing the format from the file extension
pub fn write_mesh(mesh: &TriMesh, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("off") => write_off(mesh, path),
        Some("stl") => write_stl(mesh, path),
        Some("json") => write_json(mesh, path),
        _ => bail!("Unsupported mesh format: {:?}", path),
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
