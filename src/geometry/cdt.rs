// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Incremental constrained Delaunay triangulation in the plane
//!
//! Triangles live in a flat arena and refer to each other by index; edge `i`
//! of a triangle is the edge opposite its vertex `i`. Every vertex carries a
//! scalar attribute that is interpolated linearly for constructed points.
//! Vertices `0..3` belong to the enclosing super triangle.
//!
//! Constraints come in two kinds. Ring constraints bound the domain and
//! decide the nesting levels; inner constraints only force edges into the
//! triangulation.

use std::collections::VecDeque;

use ahash::{AHashMap, AHashSet};
use nalgebra::{Point2, Vector2};
use tracing::warn;

use super::robust_predicates::{incircle, orient2d};
use crate::error::{KernelError, Result};

/// Number of super-triangle vertices preceding user vertices
pub(crate) const SUPER_VERTICES: usize = 3;
const SUPER_SCALE: f64 = 1.0e3;
const MAX_CONSTRAINT_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy)]
struct Tri {
    v: [usize; 3],
    n: [Option<usize>; 3],
    c: [bool; 3],
}

enum Location {
    Vertex(usize),
    Edge(usize, usize),
    Face(usize),
}

#[derive(Debug, Clone)]
pub(crate) struct Cdt {
    points: Vec<Point2<f64>>,
    attrs: Vec<f64>,
    tris: Vec<Tri>,
    vertex_tri: Vec<usize>,
    lookup: AHashMap<[u64; 2], usize>,
    /// Constrained edges that bound the domain, as sorted vertex pairs
    rings: AHashSet<(usize, usize)>,
    hint: usize,
}

fn pair(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

fn point_key(p: &Point2<f64>) -> [u64; 2] {
    // +0.0 folds negative zero
    [(p.x + 0.0).to_bits(), (p.y + 0.0).to_bits()]
}

impl Cdt {
    /// Empty triangulation able to hold points inside `[min, max]`
    pub fn new(min: Point2<f64>, max: Point2<f64>) -> Result<Self> {
        if !(min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite()) {
            return Err(KernelError::numeric("non-finite triangulation bounds"));
        }
        let center = nalgebra::center(&min, &max);
        let mut d = (max.x - min.x).max(max.y - min.y);
        if d <= 0.0 {
            d = 1.0;
        }
        let s = SUPER_SCALE * d;
        let points = vec![
            Point2::new(center.x - s, center.y - s),
            Point2::new(center.x + s, center.y - s),
            Point2::new(center.x, center.y + s),
        ];
        Ok(Self {
            points,
            attrs: vec![0.0; SUPER_VERTICES],
            tris: vec![Tri {
                v: [0, 1, 2],
                n: [None; 3],
                c: [false; 3],
            }],
            vertex_tri: vec![0; SUPER_VERTICES],
            lookup: AHashMap::new(),
            rings: AHashSet::new(),
            hint: 0,
        })
    }

    pub fn point(&self, v: usize) -> &Point2<f64> {
        &self.points[v]
    }

    pub fn attr(&self, v: usize) -> f64 {
        self.attrs[v]
    }

    /// Vertex count including the super triangle
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    // ------------------------------------------------------------------
    // Arena helpers
    // ------------------------------------------------------------------

    fn set_tri(&mut self, t: usize, tri: Tri) {
        for &v in &tri.v {
            self.vertex_tri[v] = t;
        }
        self.tris[t] = tri;
    }

    fn push_tri(&mut self, tri: Tri) -> usize {
        let t = self.tris.len();
        self.tris.push(tri);
        for &v in &tri.v {
            self.vertex_tri[v] = t;
        }
        t
    }

    fn edge_index(&self, t: usize, a: usize, b: usize) -> Option<usize> {
        let v = self.tris[t].v;
        (0..3).find(|&i| {
            let (x, y) = (v[(i + 1) % 3], v[(i + 2) % 3]);
            (x == a && y == b) || (x == b && y == a)
        })
    }

    fn vertex_position(&self, t: usize, v: usize) -> Option<usize> {
        self.tris[t].v.iter().position(|&x| x == v)
    }

    /// Points the neighbour across edge (a, b) of `t` at `target`
    fn relink(&mut self, t: Option<usize>, a: usize, b: usize, target: usize) {
        if let Some(t) = t {
            if let Some(i) = self.edge_index(t, a, b) {
                self.tris[t].n[i] = Some(target);
            }
        }
    }

    fn push_vertex(&mut self, p: Point2<f64>, attr: f64) -> usize {
        let v = self.points.len();
        self.lookup.insert(point_key(&p), v);
        self.points.push(p);
        self.attrs.push(attr);
        self.vertex_tri.push(self.hint);
        v
    }

    fn incident_triangle(&self, v: usize) -> Option<usize> {
        let t = self.vertex_tri[v];
        if t < self.tris.len() && self.tris[t].v.contains(&v) {
            return Some(t);
        }
        (0..self.tris.len()).find(|&t| self.tris[t].v.contains(&v))
    }

    /// Triangles sharing vertex `v`
    fn triangles_around(&self, v: usize) -> Vec<usize> {
        let Some(start) = self.incident_triangle(v) else {
            return Vec::new();
        };
        let mut result = vec![start];
        let limit = self.tris.len();

        let mut t = start;
        let mut closed = false;
        while result.len() <= limit {
            let Some(k) = self.vertex_position(t, v) else { break };
            match self.tris[t].n[(k + 2) % 3] {
                Some(next) if next == start => {
                    closed = true;
                    break;
                }
                Some(next) => {
                    result.push(next);
                    t = next;
                }
                None => break,
            }
        }
        if !closed {
            t = start;
            while result.len() <= limit {
                let Some(k) = self.vertex_position(t, v) else { break };
                match self.tris[t].n[(k + 1) % 3] {
                    Some(next) if next != start => {
                        result.push(next);
                        t = next;
                    }
                    _ => break,
                }
            }
        }
        result
    }

    /// Triangle and local edge index of edge (a, b)
    fn find_edge(&self, a: usize, b: usize) -> Option<(usize, usize)> {
        self.triangles_around(a).into_iter().find_map(|t| {
            if self.tris[t].v.contains(&b) {
                self.edge_index(t, a, b).map(|i| (t, i))
            } else {
                None
            }
        })
    }

    fn mark_constrained(&mut self, t: usize, i: usize) {
        let tri = self.tris[t];
        self.tris[t].c[i] = true;
        if let Some(o) = tri.n[i] {
            if let Some(j) = self.edge_index(o, tri.v[(i + 1) % 3], tri.v[(i + 2) % 3]) {
                self.tris[o].c[j] = true;
            }
        }
    }

    // ------------------------------------------------------------------
    // Point location and insertion
    // ------------------------------------------------------------------

    fn classify_in(&self, t: usize, p: &Point2<f64>) -> Location {
        let tri = &self.tris[t];
        if let Some(&v) = tri.v.iter().find(|&&v| self.points[v] == *p) {
            return Location::Vertex(v);
        }
        for i in 0..3 {
            let a = &self.points[tri.v[(i + 1) % 3]];
            let b = &self.points[tri.v[(i + 2) % 3]];
            if orient2d(a, b, p) == 0.0 {
                return Location::Edge(t, i);
            }
        }
        Location::Face(t)
    }

    fn contains(&self, t: usize, p: &Point2<f64>) -> bool {
        let tri = &self.tris[t];
        (0..3).all(|i| {
            orient2d(
                &self.points[tri.v[(i + 1) % 3]],
                &self.points[tri.v[(i + 2) % 3]],
                p,
            ) >= 0.0
        })
    }

    fn locate(&mut self, p: &Point2<f64>) -> Result<Location> {
        let mut t = self.hint.min(self.tris.len() - 1);
        let max_steps = 2 * self.tris.len() + 16;

        'walk: for step in 0..max_steps {
            let tri = self.tris[t];
            for k in 0..3 {
                let i = (k + step) % 3;
                let a = &self.points[tri.v[(i + 1) % 3]];
                let b = &self.points[tri.v[(i + 2) % 3]];
                if orient2d(a, b, p) < 0.0 {
                    match tri.n[i] {
                        Some(next) => {
                            t = next;
                            continue 'walk;
                        }
                        None => {
                            return Err(KernelError::numeric(format!(
                                "point ({}, {}) outside the triangulation bounds",
                                p.x, p.y
                            )))
                        }
                    }
                }
            }
            self.hint = t;
            return Ok(self.classify_in(t, p));
        }

        // The walk may cycle around constrained edges
        let found = (0..self.tris.len()).find(|&t| self.contains(t, p));
        match found {
            Some(t) => {
                self.hint = t;
                Ok(self.classify_in(t, p))
            }
            None => Err(KernelError::numeric("point location failed")),
        }
    }

    /// Inserts a point, returning the existing vertex for duplicates
    pub fn insert_point(&mut self, p: Point2<f64>, attr: f64) -> Result<usize> {
        if let Some(&v) = self.lookup.get(&point_key(&p)) {
            return Ok(v);
        }
        match self.locate(&p)? {
            Location::Vertex(v) => {
                self.lookup.insert(point_key(&p), v);
                Ok(v)
            }
            Location::Edge(t, i) => {
                let v = self.push_vertex(p, attr);
                self.split_edge(t, i, v)?;
                Ok(v)
            }
            Location::Face(t) => {
                let v = self.push_vertex(p, attr);
                self.split_face(t, v);
                Ok(v)
            }
        }
    }

    /// Splits edge `i` of `t` at `p` without locating it first
    fn insert_on_edge(&mut self, t: usize, i: usize, p: Point2<f64>, attr: f64) -> Result<usize> {
        if let Some(&v) = self.lookup.get(&point_key(&p)) {
            return Ok(v);
        }
        let v = self.push_vertex(p, attr);
        self.split_edge(t, i, v)?;
        Ok(v)
    }

    fn split_face(&mut self, t: usize, p: usize) {
        let Tri {
            v: [a, b, c],
            n: [na, nb, nc],
            c: [ca, cb, cc],
        } = self.tris[t];
        let t1 = self.tris.len();
        let t2 = t1 + 1;

        self.set_tri(
            t,
            Tri {
                v: [p, b, c],
                n: [na, Some(t1), Some(t2)],
                c: [ca, false, false],
            },
        );
        self.push_tri(Tri {
            v: [a, p, c],
            n: [Some(t), nb, Some(t2)],
            c: [false, cb, false],
        });
        self.push_tri(Tri {
            v: [a, b, p],
            n: [Some(t), Some(t1), nc],
            c: [false, false, cc],
        });
        self.relink(nb, c, a, t1);
        self.relink(nc, a, b, t2);

        self.legalize(vec![(t, 0), (t1, 1), (t2, 2)]);
    }

    fn split_edge(&mut self, t: usize, i: usize, p: usize) -> Result<()> {
        let tri = self.tris[t];
        let (c, a, b) = (tri.v[i], tri.v[(i + 1) % 3], tri.v[(i + 2) % 3]);
        let (n_a, c_a) = (tri.n[(i + 1) % 3], tri.c[(i + 1) % 3]);
        let (n_b, c_b) = (tri.n[(i + 2) % 3], tri.c[(i + 2) % 3]);
        let constrained = tri.c[i];

        let u = tri.n[i]
            .ok_or_else(|| KernelError::numeric("cannot split an edge of the super triangle"))?;
        let j = self
            .edge_index(u, a, b)
            .ok_or_else(|| KernelError::numeric("inconsistent triangle adjacency"))?;
        let ut = self.tris[u];
        let d = ut.v[j];
        let (m_b, cm_b) = (ut.n[(j + 1) % 3], ut.c[(j + 1) % 3]);
        let (m_a, cm_a) = (ut.n[(j + 2) % 3], ut.c[(j + 2) % 3]);

        let t2 = self.tris.len();
        let u2 = t2 + 1;
        self.set_tri(
            t,
            Tri {
                v: [c, a, p],
                n: [Some(u), Some(t2), n_b],
                c: [constrained, false, c_b],
            },
        );
        self.set_tri(
            u,
            Tri {
                v: [d, p, a],
                n: [Some(t), m_b, Some(u2)],
                c: [constrained, cm_b, false],
            },
        );
        self.push_tri(Tri {
            v: [c, p, b],
            n: [Some(u2), n_a, Some(t)],
            c: [constrained, c_a, false],
        });
        self.push_tri(Tri {
            v: [d, b, p],
            n: [Some(t2), Some(u), m_a],
            c: [constrained, false, cm_a],
        });
        self.relink(n_a, b, c, t2);
        self.relink(m_a, d, b, u2);
        if constrained && self.rings.remove(&pair(a, b)) {
            self.rings.insert(pair(a, p));
            self.rings.insert(pair(p, b));
        }

        self.legalize(vec![(t, 2), (t2, 1), (u, 1), (u2, 2)]);
        Ok(())
    }

    /// Flips edge `i` of `t`; both returned triangles hold the former
    /// `t.v[i]` at local index 0
    fn flip(&mut self, t: usize, i: usize) -> Option<(usize, usize)> {
        let tri = self.tris[t];
        let o = tri.n[i]?;
        let (p, a, b) = (tri.v[i], tri.v[(i + 1) % 3], tri.v[(i + 2) % 3]);
        let (n_pa, c_pa) = (tri.n[(i + 2) % 3], tri.c[(i + 2) % 3]);
        let (n_bp, c_bp) = (tri.n[(i + 1) % 3], tri.c[(i + 1) % 3]);

        let j = self.edge_index(o, a, b)?;
        let ot = self.tris[o];
        let q = ot.v[j];
        let (n_aq, c_aq) = (ot.n[(j + 1) % 3], ot.c[(j + 1) % 3]);
        let (n_qb, c_qb) = (ot.n[(j + 2) % 3], ot.c[(j + 2) % 3]);

        self.set_tri(
            t,
            Tri {
                v: [p, a, q],
                n: [n_aq, Some(o), n_pa],
                c: [c_aq, false, c_pa],
            },
        );
        self.set_tri(
            o,
            Tri {
                v: [p, q, b],
                n: [n_qb, n_bp, Some(t)],
                c: [c_qb, c_bp, false],
            },
        );
        self.relink(n_aq, a, q, t);
        self.relink(n_bp, b, p, o);
        Some((t, o))
    }

    fn opposite(&self, t: usize, i: usize) -> Option<usize> {
        let tri = &self.tris[t];
        let o = tri.n[i]?;
        let j = self.edge_index(o, tri.v[(i + 1) % 3], tri.v[(i + 2) % 3])?;
        Some(self.tris[o].v[j])
    }

    fn violates_delaunay(&self, t: usize, i: usize) -> bool {
        let Some(q) = self.opposite(t, i) else {
            return false;
        };
        let v = self.tris[t].v;
        incircle(
            &self.points[v[0]],
            &self.points[v[1]],
            &self.points[v[2]],
            &self.points[q],
        ) > 0.0
    }

    /// Lawson flips starting from edges opposite a new vertex
    fn legalize(&mut self, mut stack: Vec<(usize, usize)>) {
        while let Some((t, i)) = stack.pop() {
            if self.tris[t].c[i] || !self.violates_delaunay(t, i) {
                continue;
            }
            if let Some((t1, t2)) = self.flip(t, i) {
                stack.push((t1, 0));
                stack.push((t2, 0));
            }
        }
    }

    // ------------------------------------------------------------------
    // Constraints
    // ------------------------------------------------------------------

    /// Forces segment (a, b) into the triangulation as a chain of
    /// constrained edges bounding the domain
    pub fn insert_constraint(&mut self, a: usize, b: usize) -> Result<()> {
        self.insert_constraint_at(a, b, true, 0)
    }

    /// Forces segment (a, b) into the triangulation without making it part
    /// of the domain boundary
    pub fn insert_inner_constraint(&mut self, a: usize, b: usize) -> Result<()> {
        self.insert_constraint_at(a, b, false, 0)
    }

    fn insert_constraint_at(&mut self, a: usize, b: usize, ring: bool, depth: usize) -> Result<()> {
        if a == b {
            return Ok(());
        }
        if depth > MAX_CONSTRAINT_DEPTH {
            return Err(KernelError::numeric("constraint recovery recursion too deep"));
        }
        if let Some((t, i)) = self.find_edge(a, b) {
            self.mark_constrained(t, i);
            if ring {
                self.rings.insert(pair(a, b));
            }
            return Ok(());
        }

        let (pa, pb) = (self.points[a], self.points[b]);
        let ab = pb - pa;

        let mut first = None;
        for t in self.triangles_around(a) {
            let Some(k) = self.vertex_position(t, a) else { continue };
            let u = self.tris[t].v[(k + 1) % 3];
            let w = self.tris[t].v[(k + 2) % 3];
            for x in [u, w] {
                let px = self.points[x];
                if orient2d(&pa, &pb, &px) == 0.0 && (px - pa).dot(&ab) > 0.0 {
                    return self.split_constraint(a, x, b, ring, depth);
                }
            }
            if orient2d(&pa, &pb, &self.points[u]) < 0.0 && orient2d(&pa, &pb, &self.points[w]) > 0.0 {
                first = Some((t, k, u, w));
                break;
            }
        }
        let (mut t, mut k, mut right, mut left) =
            first.ok_or_else(|| KernelError::numeric("constraint walk found no start triangle"))?;

        let mut crossed = Vec::new();
        loop {
            let tri = self.tris[t];
            if tri.c[k] {
                let x = self.split_crossed_constraint(t, k, a, b)?;
                return self.split_constraint(a, x, b, ring, depth);
            }
            crossed.push((right, left));
            let next = tri.n[k].ok_or_else(|| KernelError::numeric("constraint left the triangulation"))?;
            let x = self
                .opposite(t, k)
                .ok_or_else(|| KernelError::numeric("inconsistent triangle adjacency"))?;
            if x == b {
                break;
            }
            let ox = orient2d(&pa, &pb, &self.points[x]);
            if ox == 0.0 {
                return self.split_constraint(a, x, b, ring, depth);
            }
            if ox > 0.0 {
                left = x;
            } else {
                right = x;
            }
            t = next;
            k = self
                .edge_index(t, right, left)
                .ok_or_else(|| KernelError::numeric("inconsistent triangle adjacency"))?;
        }

        self.flip_out(a, b, crossed)?;
        let (t, i) = self
            .find_edge(a, b)
            .ok_or_else(|| KernelError::numeric("constraint edge missing after recovery"))?;
        self.mark_constrained(t, i);
        if ring {
            self.rings.insert(pair(a, b));
        }
        Ok(())
    }

    fn split_constraint(&mut self, a: usize, x: usize, b: usize, ring: bool, depth: usize) -> Result<()> {
        self.insert_constraint_at(a, x, ring, depth + 1)?;
        self.insert_constraint_at(x, b, ring, depth + 1)
    }

    /// Inserts the crossing of segment (a, b) with constrained edge `k` of `t`
    fn split_crossed_constraint(&mut self, t: usize, k: usize, a: usize, b: usize) -> Result<usize> {
        let tri = self.tris[t];
        let (u, w) = (tri.v[(k + 1) % 3], tri.v[(k + 2) % 3]);
        let (pa, pb) = (self.points[a], self.points[b]);
        let ou = orient2d(&pa, &pb, &self.points[u]);
        let ow = orient2d(&pa, &pb, &self.points[w]);
        let s = ou / (ou - ow);
        let p = self.points[u] + (self.points[w] - self.points[u]) * s;
        let attr = self.attrs[u] + (self.attrs[w] - self.attrs[u]) * s;
        self.insert_on_edge(t, k, p, attr)
    }

    fn segments_cross(&self, a: usize, b: usize, p: usize, q: usize) -> bool {
        if p == a || p == b || q == a || q == b {
            return false;
        }
        let (pa, pb, pp, pq) = (
            &self.points[a],
            &self.points[b],
            &self.points[p],
            &self.points[q],
        );
        orient2d(pa, pb, pp) * orient2d(pa, pb, pq) < 0.0 && orient2d(pp, pq, pa) * orient2d(pp, pq, pb) < 0.0
    }

    /// Removes the edges crossed by (a, b) by flipping, then restores the
    /// Delaunay property among the new edges
    fn flip_out(&mut self, a: usize, b: usize, crossed: Vec<(usize, usize)>) -> Result<()> {
        let limit = 64 * (crossed.len() + 1).pow(2) + 1024;
        let mut queue: VecDeque<(usize, usize)> = crossed.into();
        let mut new_edges = Vec::new();
        let mut guard = 0;

        while let Some((u, w)) = queue.pop_front() {
            guard += 1;
            if guard > limit {
                return Err(KernelError::numeric("constraint recovery did not converge"));
            }
            let (t, i) = self
                .find_edge(u, w)
                .ok_or_else(|| KernelError::numeric("crossed edge disappeared"))?;
            let tri = self.tris[t];
            let q = self
                .opposite(t, i)
                .ok_or_else(|| KernelError::numeric("crossed edge on the hull"))?;
            let (p, ea, eb) = (tri.v[i], tri.v[(i + 1) % 3], tri.v[(i + 2) % 3]);
            let convex = orient2d(&self.points[p], &self.points[ea], &self.points[q]) > 0.0
                && orient2d(&self.points[p], &self.points[q], &self.points[eb]) > 0.0;
            if !convex {
                queue.push_back((u, w));
                continue;
            }
            self.flip(t, i);
            if self.segments_cross(a, b, p, q) {
                queue.push_back((p, q));
            } else {
                new_edges.push((p, q));
            }
        }

        let mut changed = true;
        let mut rounds = 0;
        while changed && rounds < limit {
            changed = false;
            rounds += 1;
            for edge in new_edges.iter_mut() {
                let (p, q) = *edge;
                if (p == a && q == b) || (p == b && q == a) {
                    continue;
                }
                let Some((t, i)) = self.find_edge(p, q) else { continue };
                if self.tris[t].c[i] || !self.violates_delaunay(t, i) {
                    continue;
                }
                let apex = self.tris[t].v[i];
                let Some(r) = self.opposite(t, i) else { continue };
                if self.flip(t, i).is_some() {
                    *edge = (apex, r);
                    changed = true;
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Domains, refinement, output
    // ------------------------------------------------------------------

    /// Nesting level of every triangle: 0 outside all rings, +1 per ring
    /// edge crossed
    pub fn nesting_levels(&self) -> Vec<i32> {
        let mut level = vec![-1i32; self.tris.len()];
        let Some(start) = self.incident_triangle(0) else {
            return level;
        };
        let mut border = VecDeque::new();
        self.flood(start, 0, &mut level, &mut border);
        while let Some((t, i)) = border.pop_front() {
            if let Some(n) = self.tris[t].n[i] {
                if level[n] == -1 {
                    self.flood(n, level[t] + 1, &mut level, &mut border);
                }
            }
        }
        level
    }

    fn flood(&self, start: usize, index: i32, level: &mut [i32], border: &mut VecDeque<(usize, usize)>) {
        let mut queue = VecDeque::from([start]);
        while let Some(t) = queue.pop_front() {
            if level[t] != -1 {
                continue;
            }
            level[t] = index;
            let tri = &self.tris[t];
            for i in 0..3 {
                let Some(n) = tri.n[i] else { continue };
                if level[n] == -1 {
                    if tri.c[i] && self.is_ring_edge(t, i) {
                        border.push_back((t, i));
                    } else {
                        queue.push_back(n);
                    }
                }
            }
        }
    }

    fn is_ring_edge(&self, t: usize, i: usize) -> bool {
        let v = self.tris[t].v;
        self.rings.contains(&pair(v[(i + 1) % 3], v[(i + 2) % 3]))
    }

    fn touches_super(&self, t: usize) -> bool {
        self.tris[t].v.iter().any(|&v| v < SUPER_VERTICES)
    }

    /// Triangle indices inside the constrained domain (odd nesting level),
    /// or every finite triangle when `domain_only` is false
    fn selected(&self, domain_only: bool) -> Vec<usize> {
        if domain_only {
            let levels = self.nesting_levels();
            (0..self.tris.len())
                .filter(|&t| levels[t] % 2 == 1 && !self.touches_super(t))
                .collect()
        } else {
            (0..self.tris.len()).filter(|&t| !self.touches_super(t)).collect()
        }
    }

    /// Counter-clockwise vertex triples of the selected triangles
    pub fn triangles(&self, domain_only: bool) -> Vec<[usize; 3]> {
        self.selected(domain_only)
            .into_iter()
            .map(|t| self.tris[t].v)
            .collect()
    }

    /// Inserts edge midpoints until no domain edge exceeds `max_length`
    pub fn refine_edge_length(&mut self, max_length: f64, max_steiner: usize) -> Result<usize> {
        let mut inserted = 0;
        loop {
            let mut long = Vec::new();
            let mut seen = AHashSet::new();
            for t in self.selected(true) {
                let v = self.tris[t].v;
                for i in 0..3 {
                    let (a, b) = (v[(i + 1) % 3], v[(i + 2) % 3]);
                    let length = (self.points[a] - self.points[b]).norm();
                    if length > max_length && seen.insert((a.min(b), a.max(b))) {
                        long.push((length, a.min(b), a.max(b)));
                    }
                }
            }
            if long.is_empty() {
                return Ok(inserted);
            }
            long.sort_by(|x, y| y.0.total_cmp(&x.0).then((x.1, x.2).cmp(&(y.1, y.2))));

            for (_, a, b) in long {
                let Some((t, i)) = self.find_edge(a, b) else { continue };
                if inserted >= max_steiner {
                    return Err(KernelError::invalid_parameter(
                        "max_edge_length",
                        format!("refinement exceeded {max_steiner} Steiner points"),
                    ));
                }
                let mid = nalgebra::center(&self.points[a], &self.points[b]);
                let attr = 0.5 * (self.attrs[a] + self.attrs[b]);
                if self.tris[t].c[i] {
                    self.insert_on_edge(t, i, mid, attr)?;
                } else {
                    self.insert_point(mid, attr)?;
                }
                inserted += 1;
            }
        }
    }

    /// Lloyd relaxation: moves every free domain vertex to the centroid of
    /// its Voronoi cell, then flips back to a constrained Delaunay
    /// triangulation. Vertices on constrained edges and those in `fixed`
    /// stay put. Stops after `max_iterations` sweeps or once no vertex moves
    /// further than `min_move`, and returns the number of sweeps run.
    pub fn lloyd_smooth(&mut self, fixed: &[usize], max_iterations: usize, min_move: f64) -> usize {
        let fixed: AHashSet<usize> = fixed.iter().copied().collect();
        for iteration in 0..max_iterations {
            let levels = self.nesting_levels();
            let mut largest: f64 = 0.0;
            for v in SUPER_VERTICES..self.points.len() {
                if fixed.contains(&v) {
                    continue;
                }
                let star = self.triangles_around(v);
                if !self.is_free(v, &star, &levels) {
                    continue;
                }
                let Some((target, attr)) = self.lloyd_target(v, &star) else { continue };
                largest = largest.max((target - self.points[v]).norm());
                self.lookup.remove(&point_key(&self.points[v]));
                self.lookup.insert(point_key(&target), v);
                self.points[v] = target;
                self.attrs[v] = attr;
            }
            self.restore_delaunay();
            if largest <= min_move {
                return iteration + 1;
            }
        }
        max_iterations
    }

    /// Domain vertex with no constrained edge attached
    fn is_free(&self, v: usize, star: &[usize], levels: &[i32]) -> bool {
        !star.is_empty()
            && star.iter().all(|&t| {
                let tri = &self.tris[t];
                levels[t] % 2 == 1
                    && !self.touches_super(t)
                    && (0..3).all(|i| tri.v[i] == v || !tri.c[i])
            })
    }

    /// Voronoi cell centroid of `v` and the attribute interpolated there,
    /// or `None` when moving would fold a triangle of its star
    fn lloyd_target(&self, v: usize, star: &[usize]) -> Option<(Point2<f64>, f64)> {
        let cell = star
            .iter()
            .map(|&t| {
                let [a, b, c] = self.tris[t].v.map(|i| self.points[i]);
                circumcenter(&a, &b, &c)
            })
            .collect::<Option<Vec<_>>>()?;
        let target = polygon_centroid(&cell)?;

        let origin = self.points[v];
        let mut attr = None;
        for &t in star {
            let k = self.vertex_position(t, v)?;
            let tri = self.tris[t].v;
            let (a, b) = (tri[(k + 1) % 3], tri[(k + 2) % 3]);
            let (pa, pb) = (self.points[a], self.points[b]);
            let la = orient2d(&origin, &target, &pb);
            let lb = orient2d(&origin, &pa, &target);
            if orient2d(&target, &pa, &pb) <= 0.0 {
                return None;
            }
            if attr.is_none() && la >= 0.0 && lb >= 0.0 {
                let whole = orient2d(&origin, &pa, &pb);
                let (la, lb) = (la / whole, lb / whole);
                attr = Some((1.0 - la - lb) * self.attrs[v] + la * self.attrs[a] + lb * self.attrs[b]);
            }
        }
        Some((target, attr.unwrap_or(self.attrs[v])))
    }

    /// Lawson flips until every unconstrained edge is locally Delaunay
    fn restore_delaunay(&mut self) {
        let mut stack: Vec<(usize, usize)> = (0..self.tris.len())
            .flat_map(|t| (0..3).map(move |i| (t, i)))
            .collect();
        while let Some((t, i)) = stack.pop() {
            if self.tris[t].c[i] || !self.violates_delaunay(t, i) {
                continue;
            }
            if let Some((t1, t2)) = self.flip(t, i) {
                stack.extend([(t1, 0), (t1, 2), (t2, 0), (t2, 1)]);
            }
        }
    }

    /// Splits constrained edges that are not locally Delaunay
    pub fn make_conforming(&mut self, max_steiner: usize) -> Result<usize> {
        let mut inserted = 0;
        loop {
            let mut pending = Vec::new();
            let mut seen = AHashSet::new();
            for t in 0..self.tris.len() {
                for i in 0..3 {
                    if !self.tris[t].c[i] || !self.violates_delaunay(t, i) {
                        continue;
                    }
                    let v = self.tris[t].v;
                    let (a, b) = (v[(i + 1) % 3], v[(i + 2) % 3]);
                    if a >= SUPER_VERTICES && b >= SUPER_VERTICES && seen.insert((a.min(b), a.max(b))) {
                        pending.push((a.min(b), a.max(b)));
                    }
                }
            }
            if pending.is_empty() {
                return Ok(inserted);
            }
            for (a, b) in pending {
                let Some((t, i)) = self.find_edge(a, b) else { continue };
                if !self.tris[t].c[i] || !self.violates_delaunay(t, i) {
                    continue;
                }
                if inserted >= max_steiner {
                    warn!(inserted, "conforming refinement stopped at the Steiner point limit");
                    return Ok(inserted);
                }
                let mid = nalgebra::center(&self.points[a], &self.points[b]);
                let attr = 0.5 * (self.attrs[a] + self.attrs[b]);
                self.insert_on_edge(t, i, mid, attr)?;
                inserted += 1;
            }
        }
    }
}

fn circumcenter(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> Option<Point2<f64>> {
    let (u, w) = (b - a, c - a);
    let d = 2.0 * (u.x * w.y - u.y * w.x);
    if d == 0.0 {
        return None;
    }
    let (uu, ww) = (u.norm_squared(), w.norm_squared());
    Some(a + Vector2::new(w.y * uu - u.y * ww, u.x * ww - w.x * uu) / d)
}

/// Area centroid of a simple polygon in either winding
fn polygon_centroid(polygon: &[Point2<f64>]) -> Option<Point2<f64>> {
    let origin = *polygon.first()?;
    let mut area = 0.0;
    let mut sum = Vector2::zeros();
    for (p, q) in polygon.iter().zip(polygon.iter().cycle().skip(1)) {
        let (p, q) = (p - origin, q - origin);
        let cross = p.x * q.y - q.x * p.y;
        area += cross;
        sum += (p + q) * cross;
    }
    if area == 0.0 || !area.is_finite() {
        return None;
    }
    Some(origin + sum / (3.0 * area))
}
