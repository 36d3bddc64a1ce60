// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! JSON `{ "vertices": [...], "faces": [...] }` documents

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::geometry::TriMesh;

/// The vertex/face array pair as stored on disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshArrays {
    pub vertices: Vec<[f64; 3]>,
    pub faces: Vec<[usize; 3]>,
}

impl MeshArrays {
    pub fn from_mesh(mesh: &TriMesh) -> Self {
        let (vertices, faces) = mesh.to_arrays();
        Self { vertices, faces }
    }

    pub fn to_mesh(&self) -> crate::Result<TriMesh> {
        TriMesh::from_arrays(&self.vertices, &self.faces)
    }
}

pub fn from_json_str(content: &str) -> Result<TriMesh> {
    let arrays: MeshArrays = serde_json::from_str(content).context("Invalid mesh JSON")?;
    Ok(arrays.to_mesh()?)
}

pub fn to_json_string(mesh: &TriMesh) -> Result<String> {
    serde_json::to_string_pretty(&MeshArrays::from_mesh(mesh)).context("Failed to serialize mesh")
}

pub fn read_json(path: impl AsRef<Path>) -> Result<TriMesh> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read mesh file: {:?}", path))?;
    let mesh = from_json_str(&content)
        .with_context(|| format!("Failed to parse mesh file: {:?}", path))?;
    debug!(path = ?path, faces = mesh.face_count(), "read JSON mesh");
    Ok(mesh)
}

pub fn write_json(mesh: &TriMesh, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, to_json_string(mesh)?)
        .with_context(|| format!("Failed to write mesh file: {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::primitives::tetrahedron;

    #[test]
    fn test_json_document_shape() -> Result<()> {
        let mesh = from_json_str(
            r#"{ "vertices": [[0, 0, 0], [1, 0, 0], [0, 1, 0]], "faces": [[0, 1, 2]] }"#,
        )?;
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.faces(), &[[0, 1, 2]]);

        let text = to_json_string(&tetrahedron())?;
        let value: serde_json::Value = serde_json::from_str(&text)?;
        assert_eq!(value["faces"].as_array().map(Vec::len), Some(4));
        assert_eq!(from_json_str(&text)?, tetrahedron());
        Ok(())
    }

    #[test]
    fn test_json_rejects_bad_indices() {
        let err = from_json_str(r#"{ "vertices": [[0, 0, 0]], "faces": [[0, 1, 2]] }"#);
        assert!(err.is_err());
        assert!(from_json_str("{ \"vertices\": 3 }").is_err());
    }
}
