// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Slicing of primitives and boolean results

use anyhow::Result;
use nalgebra::{Point3, Vector3};
use polyframe_mesh::geometry::primitives::{cube, cylinder, uv_sphere};
use polyframe_mesh::geometry::{
    boolean_difference, planes_from_points, slice_mesh, slice_mesh_strict, slice_mesh_with, Plane,
};
use polyframe_mesh::{SliceConfig, Tolerance};

#[test]
fn test_unit_cube_mid_height() {
    let slices = slice_mesh(&cube(1.0, false), &[Plane::horizontal(0.5)]);
    assert_eq!(slices.len(), 1);
    assert_eq!(slices[0].polylines.len(), 1);
    let square = &slices[0].polylines[0];
    assert!(square.is_closed());
    assert_eq!(square.len(), 4);
    assert!((square.length() - 4.0).abs() < 1e-12);
}

#[test]
fn test_slices_follow_plane_order() -> Result<()> {
    let mesh = cylinder(1.0, 4.0, 24);
    let heights = [3.5, 0.5, 2.0, 5.0];
    let planes: Vec<Plane> = heights.iter().map(|&z| Plane::horizontal(z)).collect();
    let slices = slice_mesh_strict(&mesh, &planes)?;
    for (z, slice) in heights.iter().zip(&slices) {
        if *z > 4.0 {
            assert!(slice.polylines.is_empty());
            continue;
        }
        assert_eq!(slice.polylines.len(), 1);
        assert_eq!(slice.polylines[0].len(), 24);
        assert!(slice.polylines[0].points.iter().all(|p| (p.z - z).abs() < 1e-12));
    }
    Ok(())
}

#[test]
fn test_hollow_cube_has_two_loops() -> Result<()> {
    let shell = boolean_difference(&cube(4.0, true), &cube(2.0, true))?;
    let slices = slice_mesh_strict(&shell, &[Plane::horizontal(0.5), Plane::horizontal(1.5)])?;

    assert_eq!(slices[0].closed_count(), 2);
    let mut lengths: Vec<f64> = slices[0].polylines.iter().map(|p| p.length()).collect();
    lengths.sort_by(f64::total_cmp);
    assert!((lengths[0] - 8.0).abs() < 1e-9);
    assert!((lengths[1] - 16.0).abs() < 1e-9);

    // Above the cavity only the outer wall is cut
    assert_eq!(slices[1].closed_count(), 1);
    Ok(())
}

#[test]
fn test_oblique_planes_through_sphere() -> Result<()> {
    let mesh = uv_sphere(2.0, 40, 20);
    let normal = Vector3::new(1.0, -2.0, 0.5);
    let points = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(0.3, 0.1, -0.2),
        Point3::new(-0.5, 0.4, 0.3),
    ];
    let planes = planes_from_points(&points, normal)?;
    let config = SliceConfig::default().with_tolerance(Tolerance::relative(1e-12));
    for slice in slice_mesh_with(&mesh, &planes, &config)? {
        assert!(slice.is_complete());
        assert_eq!(slice.polylines.len(), 1);
        for p in &slice.polylines[0].points {
            assert!(p.coords.norm() <= 2.0 + 1e-9);
        }
    }
    Ok(())
}

#[test]
fn test_invalid_tolerance_rejected() {
    let config = SliceConfig::default().with_tolerance(Tolerance::absolute(f64::NAN));
    assert!(slice_mesh_with(&cube(1.0, true), &[Plane::horizontal(0.0)], &config).is_err());
}
