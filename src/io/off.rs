// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Object File Format (OFF)
//!
//! Polygonal faces are ear-cut into triangles in their dominant projection
//! plane. Per-face colours and other trailing values are ignored.

use anyhow::{anyhow, bail, Context, Result};
use nalgebra::Point3;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::geometry::{triangulate_face, TriMesh};

pub fn read_off(path: impl AsRef<Path>) -> Result<TriMesh> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read OFF file: {:?}", path))?;
    let mesh = parse_off(&content).with_context(|| format!("Failed to parse OFF file: {:?}", path))?;
    debug!(path = ?path, faces = mesh.face_count(), "read OFF mesh");
    Ok(mesh)
}

pub fn write_off(mesh: &TriMesh, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, to_off_string(mesh))
        .with_context(|| format!("Failed to write OFF file: {:?}", path))?;
    Ok(())
}

pub fn parse_off(content: &str) -> Result<TriMesh> {
    let mut lines = content
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty());

    let header = lines.next().ok_or_else(|| anyhow!("Empty OFF document"))?;
    let rest = header
        .strip_prefix("OFF")
        .ok_or_else(|| anyhow!("Missing OFF header, found {:?}", header))?
        .trim();
    let counts_line = if rest.is_empty() {
        lines.next().ok_or_else(|| anyhow!("Missing OFF element counts"))?
    } else {
        rest
    };
    let counts = parse_numbers::<usize>(counts_line).context("Invalid OFF element counts")?;
    if counts.len() < 2 {
        bail!("Expected vertex and face counts, found {:?}", counts_line);
    }
    let (vertex_count, face_count) = (counts[0], counts[1]);

    // Counts come from the file; every element needs a line of its own
    let mut vertices = Vec::with_capacity(vertex_count.min(content.len()));
    for i in 0..vertex_count {
        let line = lines
            .next()
            .ok_or_else(|| anyhow!("Expected {} vertices, found {}", vertex_count, i))?;
        let values = parse_numbers::<f64>(line).with_context(|| format!("Invalid vertex {}", i))?;
        if values.len() < 3 {
            bail!("Vertex {} has fewer than three coordinates", i);
        }
        if values[..3].iter().any(|v| !v.is_finite()) {
            bail!("Vertex {} has a non-finite coordinate", i);
        }
        vertices.push(Point3::new(values[0], values[1], values[2]));
    }

    let mut faces = Vec::with_capacity(face_count.min(content.len()));
    for f in 0..face_count {
        let line = lines
            .next()
            .ok_or_else(|| anyhow!("Expected {} faces, found {}", face_count, f))?;
        let mut tokens = line.split_whitespace();
        let corners: usize = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| anyhow!("Face {} has no corner count", f))?;
        let indices = tokens
            .take(corners)
            .map(|t| t.parse::<usize>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("Invalid index in face {}", f))?;
        if corners < 3 || indices.len() != corners {
            bail!("Face {} needs at least three indices", f);
        }
        if let Some(&missing) = indices.iter().find(|&&i| i >= vertices.len()) {
            bail!("Face {} references missing vertex {}", f, missing);
        }
        faces.extend(triangulate_face(&vertices, &indices).with_context(|| format!("Invalid face {}", f))?);
    }

    let coords: Vec<[f64; 3]> = vertices.iter().map(|p| [p.x, p.y, p.z]).collect();
    Ok(TriMesh::from_arrays(&coords, &faces)?)
}

fn parse_numbers<T: std::str::FromStr>(line: &str) -> Result<Vec<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    line.split_whitespace()
        .map(|t| t.parse::<T>().with_context(|| format!("Invalid number {:?}", t)))
        .collect()
}

pub fn to_off_string(mesh: &TriMesh) -> String {
    let header = format!("OFF\n{} {} 0\n", mesh.vertex_count(), mesh.face_count());
    let vertices = mesh
        .vertices()
        .iter()
        .map(|p| format!("{} {} {}\n", p.x, p.y, p.z));
    let faces = mesh
        .faces()
        .iter()
        .map(|[a, b, c]| format!("3 {} {} {}\n", a, b, c));
    std::iter::once(header).chain(vertices).chain(faces).collect()
}
