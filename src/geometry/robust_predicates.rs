// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Robust geometric predicates
//!
//! Every predicate first evaluates its determinant in plain `f64` together
//! with a static error bound. When the magnitude of the result does not
//! clear the bound, the determinant is re-evaluated exactly with
//! floating-point expansion arithmetic (Shewchuk-style two-sum /
//! two-product, the product error taken from a fused multiply-add), so the
//! returned sign is always the sign of the exact determinant.
//!
//! Exactness holds as long as no intermediate value overflows; inputs are
//! kept below [`MAX_COORDINATE`] by the mesh and triangulation
//! constructors, which keeps the degree-4 `incircle` expansion finite.

use nalgebra::{Point2, Point3, Vector3};

use crate::error::{KernelError, Result};

/// Largest accepted coordinate magnitude
pub const MAX_COORDINATE: f64 = 1e60;

const EPSILON: f64 = f64::EPSILON * 0.5;
const ORIENT2D_BOUND: f64 = (3.0 + 16.0 * EPSILON) * EPSILON;
const ORIENT3D_BOUND: f64 = (7.0 + 56.0 * EPSILON) * EPSILON;
const INCIRCLE_BOUND: f64 = (10.0 + 96.0 * EPSILON) * EPSILON;
const PLANE_BOUND: f64 = 8.0 * EPSILON;

/// Sign of a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Negative,
    Zero,
    Positive,
}

impl Orientation {
    pub fn of(value: f64) -> Self {
        if value > 0.0 {
            Self::Positive
        } else if value < 0.0 {
            Self::Negative
        } else {
            Self::Zero
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Self::Negative => Self::Positive,
            Self::Zero => Self::Zero,
            Self::Positive => Self::Negative,
        }
    }

    pub fn is_zero(self) -> bool {
        self == Self::Zero
    }

    /// -1, 0 or 1
    pub fn as_i8(self) -> i8 {
        match self {
            Self::Negative => -1,
            Self::Zero => 0,
            Self::Positive => 1,
        }
    }
}

/// Checks that a coordinate can be fed to the predicates
pub fn check_coordinate(value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(KernelError::numeric(format!("non-finite coordinate {value}")));
    }
    if value.abs() > MAX_COORDINATE {
        return Err(KernelError::numeric(format!(
            "coordinate {value:e} exceeds the supported magnitude {MAX_COORDINATE:e}"
        )));
    }
    Ok(())
}

/// Twice the signed area of triangle (a, b, c); positive when counter-clockwise.
pub fn orient2d(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    let ux = b.x - a.x;
    let uy = b.y - a.y;
    let vx = c.x - a.x;
    let vy = c.y - a.y;

    let left = ux * vy;
    let right = uy * vx;
    let det = left - right;
    let bound = ORIENT2D_BOUND * (left.abs() + right.abs());
    if det > bound || -det > bound {
        return det;
    }

    let ux = Expansion::diff(b.x, a.x);
    let uy = Expansion::diff(b.y, a.y);
    let vx = Expansion::diff(c.x, a.x);
    let vy = Expansion::diff(c.y, a.y);
    ux.mul(&vy).sub(&uy.mul(&vx)).estimate()
}

pub fn orient2d_sign(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> Orientation {
    Orientation::of(orient2d(a, b, c))
}

/// Six times the signed volume of tetrahedron (a, b, c, d).
///
/// Positive when `d` lies on the side of plane (a, b, c) that its normal
/// `(b - a) x (c - a)` points to.
pub fn orient3d(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, d: &Point3<f64>) -> f64 {
    let u = b - a;
    let v = c - a;
    let w = d - a;

    let m0 = v.y * w.z - v.z * w.y;
    let m1 = v.z * w.x - v.x * w.z;
    let m2 = v.x * w.y - v.y * w.x;
    let det = u.x * m0 + u.y * m1 + u.z * m2;

    let permanent = u.x.abs() * ((v.y * w.z).abs() + (v.z * w.y).abs())
        + u.y.abs() * ((v.z * w.x).abs() + (v.x * w.z).abs())
        + u.z.abs() * ((v.x * w.y).abs() + (v.y * w.x).abs());
    let bound = ORIENT3D_BOUND * permanent;
    if det > bound || -det > bound {
        return det;
    }

    orient3d_exact(a, b, c, d)
}

fn orient3d_exact(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, d: &Point3<f64>) -> f64 {
    let u = [
        Expansion::diff(b.x, a.x),
        Expansion::diff(b.y, a.y),
        Expansion::diff(b.z, a.z),
    ];
    let v = [
        Expansion::diff(c.x, a.x),
        Expansion::diff(c.y, a.y),
        Expansion::diff(c.z, a.z),
    ];
    let w = [
        Expansion::diff(d.x, a.x),
        Expansion::diff(d.y, a.y),
        Expansion::diff(d.z, a.z),
    ];

    let m0 = v[1].mul(&w[2]).sub(&v[2].mul(&w[1]));
    let m1 = v[2].mul(&w[0]).sub(&v[0].mul(&w[2]));
    let m2 = v[0].mul(&w[1]).sub(&v[1].mul(&w[0]));

    u[0].mul(&m0)
        .add(&u[1].mul(&m1))
        .add(&u[2].mul(&m2))
        .estimate()
}

pub fn orient3d_sign(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> Orientation {
    Orientation::of(orient3d(a, b, c, d))
}

/// Positive when `d` lies strictly inside the circle through the
/// counter-clockwise triangle (a, b, c), zero when cocircular.
pub fn incircle(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>, d: &Point2<f64>) -> f64 {
    let adx = a.x - d.x;
    let ady = a.y - d.y;
    let bdx = b.x - d.x;
    let bdy = b.y - d.y;
    let cdx = c.x - d.x;
    let cdy = c.y - d.y;

    let alift = adx * adx + ady * ady;
    let blift = bdx * bdx + bdy * bdy;
    let clift = cdx * cdx + cdy * cdy;

    let bc = bdx * cdy - cdx * bdy;
    let ca = cdx * ady - adx * cdy;
    let ab = adx * bdy - bdx * ady;
    let det = alift * bc + blift * ca + clift * ab;

    let permanent = ((bdx * cdy).abs() + (cdx * bdy).abs()) * alift
        + ((cdx * ady).abs() + (adx * cdy).abs()) * blift
        + ((adx * bdy).abs() + (bdx * ady).abs()) * clift;
    let bound = INCIRCLE_BOUND * permanent;
    if det > bound || -det > bound {
        return det;
    }

    let adx = Expansion::diff(a.x, d.x);
    let ady = Expansion::diff(a.y, d.y);
    let bdx = Expansion::diff(b.x, d.x);
    let bdy = Expansion::diff(b.y, d.y);
    let cdx = Expansion::diff(c.x, d.x);
    let cdy = Expansion::diff(c.y, d.y);

    let alift = adx.mul(&adx).add(&ady.mul(&ady));
    let blift = bdx.mul(&bdx).add(&bdy.mul(&bdy));
    let clift = cdx.mul(&cdx).add(&cdy.mul(&cdy));

    let bc = bdx.mul(&cdy).sub(&cdx.mul(&bdy));
    let ca = cdx.mul(&ady).sub(&adx.mul(&cdy));
    let ab = adx.mul(&bdy).sub(&bdx.mul(&ady));

    alift
        .mul(&bc)
        .add(&blift.mul(&ca))
        .add(&clift.mul(&ab))
        .estimate()
}

/// Exact side of `point` relative to the plane through `origin` with `normal`
pub fn plane_side(point: &Point3<f64>, origin: &Point3<f64>, normal: &Vector3<f64>) -> Orientation {
    let dx = point.x - origin.x;
    let dy = point.y - origin.y;
    let dz = point.z - origin.z;
    let value = normal.x * dx + normal.y * dy + normal.z * dz;
    let magnitude = (normal.x * dx).abs() + (normal.y * dy).abs() + (normal.z * dz).abs();
    if value.abs() > PLANE_BOUND * magnitude {
        return Orientation::of(value);
    }

    let exact = Expansion::diff(point.x, origin.x)
        .scale(normal.x)
        .add(&Expansion::diff(point.y, origin.y).scale(normal.y))
        .add(&Expansion::diff(point.z, origin.z).scale(normal.z));
    exact.sign()
}

/// Exact collinearity test for three points in space
pub fn are_collinear(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> bool {
    let xy = |p: &Point3<f64>| Point2::new(p.x, p.y);
    let yz = |p: &Point3<f64>| Point2::new(p.y, p.z);
    let zx = |p: &Point3<f64>| Point2::new(p.z, p.x);
    orient2d_sign(&xy(a), &xy(b), &xy(c)).is_zero()
        && orient2d_sign(&yz(a), &yz(b), &yz(c)).is_zero()
        && orient2d_sign(&zx(a), &zx(b), &zx(c)).is_zero()
}

/// Area of triangle (a, b, c)
pub fn triangle_area(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    (b - a).cross(&(c - a)).norm() * 0.5
}

/// Non-overlapping floating-point expansion, least significant component first
#[derive(Debug, Clone)]
struct Expansion(Vec<f64>);

impl Expansion {
    fn diff(a: f64, b: f64) -> Self {
        let (x, y) = two_diff(a, b);
        Self::from_components(y, x)
    }

    fn from_components(low: f64, high: f64) -> Self {
        match (low != 0.0, high != 0.0) {
            (true, true) => Self(vec![low, high]),
            (true, false) => Self(vec![low]),
            (false, _) => Self(vec![high]),
        }
    }

    fn add(&self, other: &Expansion) -> Expansion {
        let mut components = self.0.clone();
        for &b in &other.0 {
            components = grow(&components, b);
        }
        Expansion(components)
    }

    fn sub(&self, other: &Expansion) -> Expansion {
        self.add(&other.negated())
    }

    fn negated(&self) -> Expansion {
        Expansion(self.0.iter().map(|c| -c).collect())
    }

    fn scale(&self, b: f64) -> Expansion {
        let mut h = Vec::with_capacity(self.0.len() * 2);
        let (mut q, low) = two_product(self.0[0], b);
        if low != 0.0 {
            h.push(low);
        }
        for &component in &self.0[1..] {
            let (high, low) = two_product(component, b);
            let (sum, err) = two_sum(q, low);
            if err != 0.0 {
                h.push(err);
            }
            let (next, err) = fast_two_sum(high, sum);
            if err != 0.0 {
                h.push(err);
            }
            q = next;
        }
        if q != 0.0 || h.is_empty() {
            h.push(q);
        }
        Expansion(h)
    }

    fn mul(&self, other: &Expansion) -> Expansion {
        let mut result = self.scale(other.0[0]);
        for &component in &other.0[1..] {
            result = result.add(&self.scale(component));
        }
        result
    }

    /// Sum of the components; carries the sign of the exact value
    fn estimate(&self) -> f64 {
        self.0.iter().sum()
    }

    fn sign(&self) -> Orientation {
        self.0
            .iter()
            .rev()
            .find(|c| **c != 0.0)
            .map_or(Orientation::Zero, |c| Orientation::of(*c))
    }
}

fn grow(e: &[f64], b: f64) -> Vec<f64> {
    let mut h = Vec::with_capacity(e.len() + 1);
    let mut q = b;
    for &component in e {
        let (sum, err) = two_sum(q, component);
        if err != 0.0 {
            h.push(err);
        }
        q = sum;
    }
    if q != 0.0 || h.is_empty() {
        h.push(q);
    }
    h
}

fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let x = a + b;
    let b_virtual = x - a;
    let a_virtual = x - b_virtual;
    let b_round = b - b_virtual;
    let a_round = a - a_virtual;
    (x, a_round + b_round)
}

fn fast_two_sum(a: f64, b: f64) -> (f64, f64) {
    let x = a + b;
    let b_virtual = x - a;
    (x, b - b_virtual)
}

fn two_diff(a: f64, b: f64) -> (f64, f64) {
    let x = a - b;
    let b_virtual = a - x;
    let a_virtual = x + b_virtual;
    let b_round = b_virtual - b;
    let a_round = a - a_virtual;
    (x, a_round + b_round)
}

fn two_product(a: f64, b: f64) -> (f64, f64) {
    let x = a * b;
    (x, a.mul_add(b, -x))
}
