// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Tolerance-based point welding on a hash grid

use ahash::AHashMap;
use nalgebra::Point3;

/// Grid cell holding a point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PointKey {
    x: i64,
    y: i64,
    z: i64,
}

impl PointKey {
    fn from_point(p: &Point3<f64>, cell: f64) -> Self {
        if cell > 0.0 {
            Self {
                x: (p.x / cell).floor() as i64,
                y: (p.y / cell).floor() as i64,
                z: (p.z / cell).floor() as i64,
            }
        } else {
            // Zero tolerance: only bit-identical points weld
            Self {
                x: p.x.to_bits() as i64,
                y: p.y.to_bits() as i64,
                z: p.z.to_bits() as i64,
            }
        }
    }
}

/// Deduplicates points within `tolerance` of an already stored point
#[derive(Debug, Clone)]
pub struct VertexMap {
    points: Vec<Point3<f64>>,
    cells: AHashMap<PointKey, Vec<usize>>,
    tolerance: f64,
}

impl VertexMap {
    pub fn new(tolerance: f64) -> Self {
        Self {
            points: Vec::new(),
            cells: AHashMap::new(),
            tolerance: tolerance.max(0.0),
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Index of a stored point within tolerance of `p`, nearest first
    pub fn get(&self, p: &Point3<f64>) -> Option<usize> {
        let key = PointKey::from_point(p, self.tolerance);
        if self.tolerance == 0.0 {
            return self.cells.get(&key).and_then(|ids| ids.first().copied());
        }

        let mut best: Option<(usize, f64)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let neighbor = PointKey {
                        x: key.x.saturating_add(dx),
                        y: key.y.saturating_add(dy),
                        z: key.z.saturating_add(dz),
                    };
                    let Some(ids) = self.cells.get(&neighbor) else {
                        continue;
                    };
                    for &id in ids {
                        let d = (self.points[id] - p).norm();
                        if d <= self.tolerance && best.map_or(true, |(_, bd)| d < bd) {
                            best = Some((id, d));
                        }
                    }
                }
            }
        }
        best.map(|(id, _)| id)
    }

    /// Welds `p` onto a stored point or stores it
    pub fn insert(&mut self, p: Point3<f64>) -> usize {
        match self.get(&p) {
            Some(id) => id,
            None => self.insert_unique(p),
        }
    }

    /// Stores `p` without welding; later inserts may still weld onto it
    pub fn insert_unique(&mut self, p: Point3<f64>) -> usize {
        let id = self.points.len();
        self.points.push(p);
        self.cells
            .entry(PointKey::from_point(&p, self.tolerance))
            .or_default()
            .push(id);
        id
    }

    pub fn position(&self, id: usize) -> &Point3<f64> {
        &self.points[id]
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn into_points(self) -> Vec<Point3<f64>> {
        self.points
    }
}
