// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Isotropic remeshing combined with the other operations

use anyhow::Result;
use polyframe_mesh::geometry::primitives::{cube, uv_sphere};
use polyframe_mesh::geometry::{
    boolean_difference, remesh, slice_mesh, validate_closed_manifold, volume, Plane,
};
use polyframe_mesh::{KernelError, RemeshConfig};

#[test]
fn test_remeshed_sphere_stays_on_surface() -> Result<()> {
    let mesh = uv_sphere(1.0, 24, 12);
    let result = remesh(&mesh, 0.2, 3, &RemeshConfig::default())?;
    validate_closed_manifold(&result)?;

    println!(
        "remeshed sphere: {} -> {} faces, volume {:.5} -> {:.5}",
        mesh.face_count(),
        result.face_count(),
        volume(&mesh),
        volume(&result)
    );
    for p in result.vertices() {
        let r = p.coords.norm();
        assert!(r <= 1.0 + 1e-9 && r > 0.95, "vertex at radius {r}");
    }
    assert!((volume(&result) - volume(&mesh)).abs() < 0.03 * volume(&mesh));

    let slices = slice_mesh(&result, &[Plane::horizontal(0.1)]);
    assert!(slices[0].is_complete());
    assert_eq!(slices[0].closed_count(), 1);
    Ok(())
}

#[test]
fn test_remesh_boolean_result() -> Result<()> {
    let shell = boolean_difference(&cube(4.0, true), &cube(2.0, true))?;
    let result = remesh(&shell, 0.8, 2, &RemeshConfig::default())?;
    validate_closed_manifold(&result)?;
    assert!(result.face_count() > shell.face_count());
    assert!(volume(&result) > 0.0);
    Ok(())
}

#[test]
fn test_without_projection() -> Result<()> {
    let mesh = uv_sphere(1.0, 16, 8);
    let config = RemeshConfig::default().with_projection(false).with_relaxation_steps(2);
    let result = remesh(&mesh, 0.25, 2, &config)?;
    validate_closed_manifold(&result)?;
    Ok(())
}

#[test]
fn test_in_place_failure_leaves_mesh() {
    let mut mesh = cube(1.0, true);
    let before = mesh.clone();
    let err = mesh.remesh(-1.0, 3, &RemeshConfig::default()).unwrap_err();
    assert!(matches!(err, KernelError::InvalidParameter { .. }));
    assert_eq!(mesh, before);
}
