// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Math utilities

use nalgebra::{Point2, Point3, Vector3};

/// Compensated (Neumaier) accumulator for long sums of mixed-sign terms
#[derive(Debug, Clone, Copy, Default)]
pub struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    pub fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

/// Unnormalized normal of a triangle (twice its area in magnitude)
pub fn triangle_normal(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> Vector3<f64> {
    (p1 - p0).cross(&(p2 - p0))
}

/// Axis with the largest absolute component
pub fn dominant_axis(v: &Vector3<f64>) -> usize {
    let a = v.map(f64::abs);
    if a.x >= a.y && a.x >= a.z {
        0
    } else if a.y >= a.z {
        1
    } else {
        2
    }
}

/// Drops `axis` and keeps the remaining two coordinates in cyclic order,
/// so a face whose normal points along +axis stays counter-clockwise.
pub fn drop_axis(p: &Point3<f64>, axis: usize) -> Point2<f64> {
    match axis {
        0 => Point2::new(p.y, p.z),
        1 => Point2::new(p.z, p.x),
        _ => Point2::new(p.x, p.y),
    }
}

/// Inverse of [`drop_axis`] given the value of the dropped coordinate
pub fn lift_axis(p: &Point2<f64>, axis: usize, value: f64) -> Point3<f64> {
    match axis {
        0 => Point3::new(value, p.x, p.y),
        1 => Point3::new(p.y, value, p.x),
        _ => Point3::new(p.x, p.y, value),
    }
}

/// Linear interpolation between two points
pub fn lerp(a: &Point3<f64>, b: &Point3<f64>, t: f64) -> Point3<f64> {
    a + (b - a) * t
}
