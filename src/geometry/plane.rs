// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Planes given by a point and a normal

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::robust_predicates::{check_coordinate, plane_side, Orientation};
use crate::error::{KernelError, Result};

/// Oriented plane through `origin` with unit `normal`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub origin: Point3<f64>,
    pub normal: Vector3<f64>,
}

impl Plane {
    /// Normalizes `normal`; a zero or non-finite normal is rejected
    pub fn new(origin: Point3<f64>, normal: Vector3<f64>) -> Result<Self> {
        for c in origin.iter().chain(normal.iter()) {
            check_coordinate(*c)?;
        }
        let normal = normal
            .try_normalize(f64::MIN_POSITIVE)
            .ok_or_else(|| KernelError::invalid_parameter("normal", "plane normal is zero"))?;
        Ok(Self { origin, normal })
    }

    /// Horizontal plane `z = height` facing +z
    pub fn horizontal(height: f64) -> Self {
        Self {
            origin: Point3::new(0.0, 0.0, height),
            normal: Vector3::z(),
        }
    }

    /// `count` parallel planes starting at `origin`, `spacing` apart along `normal`
    pub fn stack(
        origin: Point3<f64>,
        normal: Vector3<f64>,
        spacing: f64,
        count: usize,
    ) -> Result<Vec<Plane>> {
        if !spacing.is_finite() {
            return Err(KernelError::invalid_parameter("spacing", "must be finite"));
        }
        let base = Plane::new(origin, normal)?;
        Ok((0..count)
            .map(|i| Plane {
                origin: base.origin + base.normal * (spacing * i as f64),
                normal: base.normal,
            })
            .collect())
    }

    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&(point - self.origin))
    }

    /// Exact side of `point`
    pub fn side(&self, point: &Point3<f64>) -> Orientation {
        plane_side(point, &self.origin, &self.normal)
    }

    pub fn project(&self, point: &Point3<f64>) -> Point3<f64> {
        point - self.normal * self.signed_distance(point)
    }
}

/// Planes sharing one normal, one through each point
pub fn planes_from_points(points: &[Point3<f64>], normal: Vector3<f64>) -> Result<Vec<Plane>> {
    points.iter().map(|p| Plane::new(*p, normal)).collect()
}
