// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boolean operation volume identities on non-trivial solids

use anyhow::Result;
use nalgebra::{Matrix4, Point3, Vector3};
use polyframe_mesh::geometry::primitives::{box_mesh, cube, cylinder, uv_sphere};
use polyframe_mesh::geometry::{
    boolean, boolean_difference, boolean_intersection, boolean_union, boolean_with, split_mesh_mesh,
    validate_closed_manifold, volume, BooleanOp, TriMesh,
};
use polyframe_mesh::{BooleanConfig, ClassificationMethod};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const EPS: f64 = 1e-8;

fn shifted_sphere() -> Result<TriMesh> {
    let mut sphere = uv_sphere(1.0, 24, 12);
    sphere.transform(&Matrix4::new_translation(&Vector3::new(0.31, 0.22, 0.13)))?;
    Ok(sphere)
}

fn assert_identities(a: &TriMesh, b: &TriMesh) -> Result<()> {
    let (va, vb) = (volume(a), volume(b));
    let union = boolean_union(a, b)?;
    let intersection = boolean_intersection(a, b)?;
    let difference = boolean_difference(a, b)?;

    let (vu, vi, vd) = (volume(&union), volume(&intersection), volume(&difference));
    println!("A = {va:.6}, B = {vb:.6}, A|B = {vu:.6}, A&B = {vi:.6}, A-B = {vd:.6}");

    for mesh in [&union, &intersection, &difference] {
        validate_closed_manifold(mesh)?;
    }
    assert!((vu + vi - va - vb).abs() < EPS, "inclusion-exclusion violated");
    assert!((vd - (va - vi)).abs() < EPS, "difference volume mismatch");
    assert!(vi > 0.0 && vi < va.min(vb));
    Ok(())
}

#[test]
fn test_sphere_and_cube_identities() -> Result<()> {
    assert_identities(&cube(1.5, true), &shifted_sphere()?)
}

#[test]
fn test_rotated_cubes_identities() -> Result<()> {
    let a = cube(2.0, true);
    let rotation = Matrix4::from_axis_angle(&Vector3::z_axis(), 0.5)
        * Matrix4::from_axis_angle(&Vector3::x_axis(), 0.3);
    let b = cube(1.8, true).transformed(&(Matrix4::new_translation(&Vector3::new(0.7, 0.4, 0.2)) * rotation))?;
    assert_identities(&a, &b)
}

#[test]
fn test_cylinder_through_box() -> Result<()> {
    // A rod longer than the box: the difference drills a hole
    let block = box_mesh(Point3::new(-1.0, -1.0, 0.0), Point3::new(1.0, 1.0, 1.0));
    let mut rod = cylinder(0.4, 3.0, 32);
    rod.transform(&Matrix4::new_translation(&Vector3::new(0.05, 0.03, -1.0)))?;

    let drilled = boolean_difference(&block, &rod)?;
    validate_closed_manifold(&drilled)?;
    let rod_in_block = volume(&boolean_intersection(&block, &rod)?);
    // Cross-section of the rod times the block height
    assert!((rod_in_block - volume(&rod) / 3.0).abs() < EPS);
    assert!((volume(&drilled) - (4.0 - rod_in_block)).abs() < EPS);
    Ok(())
}

#[test]
fn test_box_through_single_face() -> Result<()> {
    // The intersection loop closes inside one triangle of the top face
    let a = cube(4.0, true);
    let b = box_mesh(Point3::new(0.9, -1.6, 1.5), Point3::new(1.6, -0.9, 2.5));

    let split = split_mesh_mesh(&a, &b)?;
    validate_closed_manifold(&split)?;
    assert!((volume(&split) - 64.0).abs() < EPS);

    let inside = 0.7 * 0.7 * 0.5;
    let intersection = boolean_intersection(&a, &b)?;
    let difference = boolean_difference(&a, &b)?;
    let union = boolean_union(&a, &b)?;
    for mesh in [&intersection, &difference, &union] {
        validate_closed_manifold(mesh)?;
    }
    assert!((volume(&intersection) - inside).abs() < EPS);
    assert!((volume(&difference) - (64.0 - inside)).abs() < EPS);
    assert!((volume(&union) - (64.0 + 0.49 - inside)).abs() < EPS);
    Ok(())
}

#[test]
fn test_union_with_carved_operand_matches_union() -> Result<()> {
    // The cavity of A - B lies on the curved surface of B
    let a = cube(1.5, true);
    let b = shifted_sphere()?;
    let union = boolean_union(&a, &b)?;
    let carved = boolean_difference(&a, &b)?;
    let refilled = boolean_union(&carved, &b)?;
    validate_closed_manifold(&refilled)?;
    println!("A|B = {:.9}, (A-B)|B = {:.9}", volume(&union), volume(&refilled));
    assert!((volume(&refilled) - volume(&union)).abs() < EPS);
    Ok(())
}

#[test]
fn test_union_with_carved_rotated_operand() -> Result<()> {
    let a = cube(2.0, true);
    let b = cube(1.2, true).transformed(
        &(Matrix4::new_translation(&Vector3::new(0.6, 0.5, 0.4))
            * Matrix4::from_axis_angle(&Vector3::z_axis(), 0.4)
            * Matrix4::from_axis_angle(&Vector3::x_axis(), 0.25)),
    )?;
    let refilled = boolean_union(&boolean_difference(&a, &b)?, &b)?;
    validate_closed_manifold(&refilled)?;
    assert!((volume(&refilled) - volume(&boolean_union(&a, &b)?)).abs() < EPS);
    Ok(())
}

#[test]
fn test_difference_then_union_with_intersection_restores_a() -> Result<()> {
    let a = cube(2.0, true);
    let b = shifted_sphere()?;
    let carved = boolean_difference(&a, &b)?;
    let restored = boolean_union(&carved, &boolean_intersection(&a, &b)?)?;
    validate_closed_manifold(&restored)?;
    assert!((volume(&restored) - volume(&a)).abs() < EPS);
    Ok(())
}

#[test]
fn test_operations_do_not_mutate_inputs() -> Result<()> {
    let a = cube(1.5, true);
    let b = shifted_sphere()?;
    let (a0, b0) = (a.clone(), b.clone());
    for op in [BooleanOp::Union, BooleanOp::Intersection, BooleanOp::Difference] {
        boolean(&a, &b, op)?;
    }
    assert_eq!(a, a0);
    assert_eq!(b, b0);
    Ok(())
}

#[test]
fn test_classification_methods_agree() -> Result<()> {
    let a = cube(1.5, true);
    let b = shifted_sphere()?;
    let rays = BooleanConfig::default();
    let winding = BooleanConfig::default().with_classification(ClassificationMethod::WindingNumber);
    for op in [BooleanOp::Union, BooleanOp::Intersection, BooleanOp::Difference] {
        let x = boolean_with(&a, &b, op, &rays)?;
        let y = boolean_with(&a, &b, op, &winding)?;
        assert_eq!(x.face_count(), y.face_count(), "{op:?}");
        assert!((volume(&x) - volume(&y)).abs() < 1e-12);
    }
    Ok(())
}

#[test]
fn test_self_union_is_identity_volume() -> Result<()> {
    let sphere = shifted_sphere()?;
    let union = boolean_union(&sphere, &sphere)?;
    let intersection = boolean_intersection(&sphere, &sphere)?;
    assert!((volume(&union) - volume(&sphere)).abs() < EPS);
    assert!((volume(&intersection) - volume(&sphere)).abs() < EPS);
    assert!(boolean_difference(&sphere, &sphere)?.is_empty());
    Ok(())
}

#[test]
fn test_random_placements_identities() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let a = cube(1.5, true);
    for _ in 0..8 {
        // Offsets keep the smaller cube poking out of the larger one
        let mut offset = || {
            let magnitude = rng.gen_range(0.3..0.6);
            if rng.gen_bool(0.5) {
                magnitude
            } else {
                -magnitude
            }
        };
        let translation = Vector3::new(offset(), offset(), offset());
        let rotation = Matrix4::from_axis_angle(&Vector3::z_axis(), rng.gen_range(0.1..1.0))
            * Matrix4::from_axis_angle(&Vector3::y_axis(), rng.gen_range(0.1..1.0));
        let b = cube(1.2, true).transformed(&(Matrix4::new_translation(&translation) * rotation))?;
        assert_identities(&a, &b)?;
    }
    Ok(())
}
