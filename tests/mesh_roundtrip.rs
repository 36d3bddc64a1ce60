// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Array construction, transforms and file round trips

use anyhow::Result;
use approx::assert_relative_eq;
use nalgebra::{Matrix4, Point3, Vector3};
use polyframe_mesh::geometry::primitives::{cube, uv_sphere};
use polyframe_mesh::geometry::{analyze, volume, TriMesh};
use polyframe_mesh::{io, KernelConfig, KernelError};
use tempfile::{tempdir, NamedTempFile};

#[test]
fn test_arrays_roundtrip_and_cull() -> Result<()> {
    let vertices = vec![
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [9.0, 9.0, 9.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
    ];
    let faces = vec![[0, 3, 1], [0, 1, 4], [0, 4, 3], [1, 3, 4]];
    let mut mesh = TriMesh::from_arrays(&vertices, &faces)?;
    assert_eq!(mesh.to_arrays(), (vertices.clone(), faces.clone()));

    assert_eq!(mesh.cull_vertices(), 1);
    let (v, f) = mesh.to_arrays();
    assert_eq!(v.len(), 4);
    assert!(!v.contains(&[9.0, 9.0, 9.0]));
    assert_eq!(f[0], [0, 2, 1]);
    assert_relative_eq!(volume(&mesh), 1.0 / 6.0, epsilon = 1e-15);
    Ok(())
}

#[test]
fn test_out_of_range_index() {
    let err = TriMesh::from_arrays(&[[0.0, 0.0, 0.0]], &[[0, 1, 2]]).unwrap_err();
    assert!(matches!(err, KernelError::InvalidTopology { .. }));
}

#[test]
fn test_transform_scales_volume() -> Result<()> {
    let mut mesh = cube(1.0, true);
    let scale = Matrix4::new_nonuniform_scaling(&Vector3::new(2.0, 3.0, 0.5));
    mesh.transform(&(Matrix4::new_translation(&Vector3::new(5.0, 0.0, 0.0)) * scale))?;
    assert_relative_eq!(volume(&mesh), 3.0, epsilon = 1e-12);
    assert_relative_eq!(mesh.bounding_box().center(), Point3::new(5.0, 0.0, 0.0), epsilon = 1e-12);
    Ok(())
}

#[test]
fn test_file_roundtrips() -> Result<()> {
    let dir = tempdir()?;
    let mesh = uv_sphere(1.5, 16, 8);

    let off = dir.path().join("sphere.off");
    io::write_off(&mesh, &off)?;
    assert_eq!(io::read_off(&off)?, mesh);

    let json = dir.path().join("sphere.json");
    io::write_json(&mesh, &json)?;
    let loaded = io::read_json(&json)?;
    assert_eq!(loaded.faces(), mesh.faces());
    for (p, q) in loaded.vertices().iter().zip(mesh.vertices()) {
        assert_relative_eq!(p, q, epsilon = 1e-15);
    }

    // STL stores f32 coordinates
    let stl = dir.path().join("sphere.stl");
    io::write_stl(&mesh, &stl)?;
    let loaded = io::read_stl(&stl)?;
    assert_eq!(loaded.face_count(), mesh.face_count());
    assert_relative_eq!(volume(&loaded), volume(&mesh), epsilon = 1e-5);
    Ok(())
}

#[test]
fn test_stats_after_reload() -> Result<()> {
    let file = NamedTempFile::with_suffix(".off")?;
    io::write_mesh(&cube(10.0, false), file.path())?;
    let stats = analyze(&io::read_mesh(file.path())?);

    println!("{stats}");
    assert_relative_eq!(stats.volume, 1000.0, epsilon = 1e-9);
    assert_relative_eq!(stats.area, 600.0, epsilon = 1e-9);
    assert_relative_eq!(stats.centroid, Point3::new(5.0, 5.0, 5.0), epsilon = 1e-9);
    assert!(stats.is_closed && stats.is_manifold);
    Ok(())
}

#[test]
fn test_config_file_drives_operations() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("polyframe-mesh.toml");
    std::fs::write(&path, "[slice]\nmerge_collinear = false\n\n[boolean]\nparallel = false\n")?;
    let config = KernelConfig::from_file(&path)?;
    assert!(!config.slice.merge_collinear);
    assert!(!config.boolean.parallel);

    let slices = polyframe_mesh::geometry::slice_mesh_with(
        &cube(1.0, false),
        &[polyframe_mesh::Plane::horizontal(0.5)],
        &config.slice,
    )?;
    assert_eq!(slices[0].polylines[0].len(), 8);
    Ok(())
}
