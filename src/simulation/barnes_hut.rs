//! # Barnes–Hut Quadtree (2D)
//!
//! This module implements a **2D Barnes–Hut quadtree** for approximating
//! gravitational acceleration in an `N`-body system, and for narrowing down
//! collision candidates. The tree is rebuilt from scratch at every step and
//! thrown away afterwards; nothing about it persists between steps.
//!
//! ## Core Concepts
//!
//! - The root is the smallest square centered at the origin that covers every
//!   live body.
//! - A node holding more than one body is split into up to 4 quadrants; only
//!   non-empty quadrants get a child node.
//! - A node holding exactly one body is a leaf and references it directly.
//! - Each node stores:
//!   - body count of its subtree
//!   - total mass and center of mass (COM)
//!   - center and edge length of its square region
//!
//! ## Arena layout
//!
//! Nodes live in one `Vec` and refer to each other by index. Bodies are
//! referenced by their index into the body slice the tree was built over.
//! During construction bodies are bucketed through an intrusive singly-linked
//! list kept in the tree's own `next` scratch array (one slot per body index),
//! so partitioning never allocates per body and `Body` carries no tree state.

use crate::simulation::states::{Body, NVec2};
use crate::simulation::vector;

/// Subdivision stops at this depth; whatever is left becomes a bucket leaf.
/// Only reachable with coincident (or non-finite) positions.
pub const MAX_DEPTH: usize = 64;

/// A single quadtree node.
///
/// Each node represents a square region of space that may contain:
/// - zero bodies (empty, `count == 0`)
/// - exactly one body (leaf, `first = Some(i)`, no children)
/// - multiple bodies (internal node with children)
/// - multiple bodies at `MAX_DEPTH` (bucket leaf, list starting at `first`)
#[derive(Debug, Clone)]
pub struct QuadNode {
    pub center: NVec2,
    pub size: f64,                      // edge length of the square
    pub children: [Option<usize>; 4],   // indices into QuadTree::nodes
    pub first: Option<usize>,           // head of the body list for leaves
    pub count: usize,                   // bodies in this subtree
    pub com: NVec2,                     // aggregate center of mass
    pub mass: f64,                      // aggregate mass
}

impl QuadNode {
    fn empty(center: NVec2, size: f64) -> Self {
        Self {
            center,
            size,
            children: [None; 4],
            first: None,
            count: 0,
            com: center,
            mass: 0.0,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.iter().all(|c| c.is_none())
    }
}

/// A complete quadtree built over a slice of bodies for one step.
#[derive(Debug)]
pub struct QuadTree {
    nodes: Vec<QuadNode>,
    next: Vec<Option<usize>>, // intrusive list links, indexed by body index
    root: usize,
}

impl QuadTree {
    /// Build the tree over every non-destroyed body of `bodies`.
    ///
    /// 1. Finds the largest `|x|` / `|y|` over all live bodies; the root is the
    ///    square of that half-width centered at the origin.
    /// 2. Threads all live bodies into one linked list.
    /// 3. Recursively partitions the list by quadrant.
    ///
    /// Aggregates are not computed here, call
    /// [`QuadTree::update_center_of_mass`] afterwards.
    pub fn build(bodies: &[Body]) -> Self {
        let mut half: f64 = 0.0;
        let mut head = None;
        let mut count = 0;
        let mut next = vec![None; bodies.len()];

        // Thread in reverse so the list comes out in slice order
        for (i, b) in bodies.iter().enumerate().rev() {
            if b.is_destroyed() {
                continue;
            }
            half = half.max(b.x.x.abs()).max(b.x.y.abs());
            next[i] = head;
            head = Some(i);
            count += 1;
        }

        let mut tree = QuadTree {
            nodes: vec![QuadNode::empty(NVec2::zeros(), 2.0 * half)],
            next,
            root: 0,
        };
        tree.partition(bodies, tree.root, head, count, 0);
        tree
    }

    pub fn root(&self) -> &QuadNode {
        &self.nodes[self.root]
    }

    pub fn node(&self, idx: usize) -> &QuadNode {
        &self.nodes[idx]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Split the list starting at `head` among the quadrants of `node_idx`.
    ///
    /// - `count <= 1`: the node keeps the list as-is (empty or single leaf).
    /// - otherwise each body is unlinked and pushed onto the list of its
    ///   quadrant, a child node is created for each non-empty quadrant with
    ///   half the edge length, and the sublists are partitioned recursively.
    fn partition(&mut self, bodies: &[Body], node_idx: usize, head: Option<usize>, count: usize, depth: usize) {
        self.nodes[node_idx].count = count;

        if count <= 1 || depth >= MAX_DEPTH {
            self.nodes[node_idx].first = head;
            return;
        }

        let center = self.nodes[node_idx].center;
        let size = self.nodes[node_idx].size;

        let mut heads: [Option<usize>; 4] = [None; 4];
        let mut counts = [0usize; 4];

        let mut cursor = head;
        while let Some(i) = cursor {
            cursor = self.next[i];
            let q = quadrant(&bodies[i].x, &center);
            self.next[i] = heads[q];
            heads[q] = Some(i);
            counts[q] += 1;
        }

        for q in 0..4 {
            if counts[q] == 0 {
                continue;
            }
            let child_idx = self.nodes.len();
            self.nodes.push(QuadNode::empty(child_center(&center, size, q), 0.5 * size));
            self.nodes[node_idx].children[q] = Some(child_idx);
            self.partition(bodies, child_idx, heads[q], counts[q], depth + 1);
        }
    }

    /// Compute total mass and center of mass for every node, bottom-up.
    ///
    /// - one-body leaf: COM is the body's position, mass is its mass
    /// - empty node: mass 0
    /// - internal node: children first, then the mass-weighted combination
    pub fn update_center_of_mass(&mut self, bodies: &[Body]) {
        self.aggregate(bodies, self.root);
    }

    fn aggregate(&mut self, bodies: &[Body], node_idx: usize) {
        let children = self.nodes[node_idx].children;
        let mut mass = 0.0;
        let mut weighted = NVec2::zeros();

        if self.nodes[node_idx].is_leaf() {
            if self.nodes[node_idx].count == 1 {
                if let Some(i) = self.nodes[node_idx].first {
                    let node = &mut self.nodes[node_idx];
                    node.mass = bodies[i].m;
                    node.com = bodies[i].x;
                    return;
                }
            }
            let mut cursor = self.nodes[node_idx].first;
            while let Some(i) = cursor {
                let b = &bodies[i];
                mass += b.m;
                vector::add_scaled_assign(&mut weighted, b.m, &b.x);
                cursor = self.next[i];
            }
        } else {
            for child_idx in children.iter().flatten().copied() {
                // recurse first
                self.aggregate(bodies, child_idx);
                let child = &self.nodes[child_idx];
                mass += child.mass;
                vector::add_scaled_assign(&mut weighted, child.mass, &child.com);
            }
        }

        let node = &mut self.nodes[node_idx];
        node.mass = mass;
        node.com = if mass > 0.0 { weighted / mass } else { node.center };
    }

    /// Accumulate softened gravity from the whole tree onto body `target`.
    ///
    /// At each node, with `v = com - x_target` and `r2 = |v|^2`, the node is
    /// treated as one pseudo-body if it is a one-body leaf or if
    /// `r2 * theta2 > size^2`; otherwise its children are visited. An accepted
    /// node of mass `M` contributes
    ///
    /// - `phi -= M / sqrt(r2 + eps2)`
    /// - `acc += M / (r2 + eps2)^(3/2) * v`
    ///
    /// The gravitational constant is *not* applied here.
    ///
    /// The target's own leaf contributes no acceleration and, when `eps2 > 0`,
    /// subtracts `m / eps` from `phi`, cancelling the self-potential seed
    /// the caller puts in before accumulating.
    ///
    /// # Returns
    /// The number of nodes visited.
    pub fn accumulate_gravity(
        &self,
        bodies: &[Body],
        target: usize,
        eps2: f64,
        theta2: f64,
        acc: &mut NVec2,
        phi: &mut f64,
    ) -> usize {
        let pos = bodies[target].x;
        let mut visits = 0;
        self.traverse_gravity(self.root, bodies, target, &pos, eps2, theta2, acc, phi, &mut visits);
        visits
    }

    #[allow(clippy::too_many_arguments)]
    fn traverse_gravity(
        &self,
        node_idx: usize,
        bodies: &[Body],
        target: usize,
        pos: &NVec2,
        eps2: f64,
        theta2: f64,
        acc: &mut NVec2,
        phi: &mut f64,
        visits: &mut usize,
    ) {
        *visits += 1;
        let node = &self.nodes[node_idx];
        if node.count == 0 {
            return;
        }

        let mut v = NVec2::zeros();

        if node.is_leaf() {
            let mut cursor = node.first;
            while let Some(i) = cursor {
                cursor = self.next[i];
                let b = &bodies[i];
                if i == target {
                    if eps2 > 0.0 {
                        *phi -= b.m / eps2.sqrt();
                    }
                    continue;
                }
                vector::sub_into(&b.x, pos, &mut v);
                accept(b.m, &v, vector::length_squared(&v), eps2, acc, phi);
            }
            return;
        }

        vector::sub_into(&node.com, pos, &mut v);
        let r2 = vector::length_squared(&v);

        if r2 * theta2 > node.size * node.size {
            // Far enough away: the whole subtree acts as one mass at its COM
            accept(node.mass, &v, r2, eps2, acc, phi);
        } else {
            for child_idx in node.children.iter().flatten().copied() {
                self.traverse_gravity(child_idx, bodies, target, pos, eps2, theta2, acc, phi, visits);
            }
        }
    }

    /// Visit the index of every body in a leaf whose square may intersect the
    /// square of half-width `radius` around `center`.
    ///
    /// Subtrees are pruned when the Chebyshev distance between the two centers
    /// exceeds half the node's edge plus `radius`. Visited bodies still need an
    /// exact overlap test by the caller.
    pub fn find_bodies_in_square<F>(&self, center: &NVec2, radius: f64, visit: &mut F)
    where
        F: FnMut(usize),
    {
        self.traverse_square(self.root, center, radius, visit);
    }

    fn traverse_square<F>(&self, node_idx: usize, center: &NVec2, radius: f64, visit: &mut F)
    where
        F: FnMut(usize),
    {
        let node = &self.nodes[node_idx];
        if node.count == 0 {
            return;
        }
        if vector::chebyshev_distance(center, &node.center) > 0.5 * node.size + radius {
            return;
        }

        if node.is_leaf() {
            let mut cursor = node.first;
            while let Some(i) = cursor {
                cursor = self.next[i];
                visit(i);
            }
        } else {
            for child_idx in node.children.iter().flatten().copied() {
                self.traverse_square(child_idx, center, radius, visit);
            }
        }
    }
}

// helpers ===========================================================================

#[inline]
fn accept(mass: f64, v: &NVec2, r2: f64, eps2: f64, acc: &mut NVec2, phi: &mut f64) {
    let inv_r = (r2 + eps2).sqrt().recip();
    *phi -= mass * inv_r;
    vector::add_scaled_assign(acc, mass * inv_r * inv_r * inv_r, v);
}

/// Quadrant index of `p` relative to `center`, 2 bits:
///
/// - Bit 0 (value 1): X axis, 1 for `x >= center.x`
/// - Bit 1 (value 2): Y axis, 1 for `y >= center.y`
///
/// Non-finite coordinates compare false and land in quadrant 0.
fn quadrant(p: &NVec2, center: &NVec2) -> usize {
    let mut idx = 0;
    if p.x >= center.x { idx |= 1; } // bit 0
    if p.y >= center.y { idx |= 2; } // bit 1
    idx
}

/// Center of quadrant `q` of the square `(center, size)`, same encoding as [`quadrant`].
fn child_center(center: &NVec2, size: f64, q: usize) -> NVec2 {
    let offset = 0.25 * size;
    NVec2::new(
        if q & 1 == 0 { center.x - offset } else { center.x + offset },
        if q & 2 == 0 { center.y - offset } else { center.y + offset },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(m: f64, x: f64, y: f64) -> Body {
        Body::at_rest(m, 0.1, NVec2::new(x, y))
    }

    #[test]
    fn root_covers_all_bodies() {
        let bodies = vec![body(1.0, 3.0, -1.0), body(1.0, -0.5, 7.0)];
        let tree = QuadTree::build(&bodies);
        assert_eq!(tree.root().center, NVec2::zeros());
        assert_eq!(tree.root().size, 14.0);
        assert_eq!(tree.root().count, 2);
    }

    #[test]
    fn every_body_lands_in_exactly_one_leaf() {
        let bodies: Vec<Body> = (0..50)
            .map(|i| {
                let t = i as f64;
                body(1.0 + t, (t * 0.37).sin() * 10.0, (t * 0.13).cos() * 10.0)
            })
            .collect();
        let tree = QuadTree::build(&bodies);

        let mut seen = vec![0; bodies.len()];
        tree.find_bodies_in_square(&NVec2::zeros(), f64::INFINITY, &mut |i| seen[i] += 1);
        assert!(seen.iter().all(|&n| n == 1));
    }

    #[test]
    fn destroyed_bodies_are_skipped() {
        let mut bodies = vec![body(1.0, 1.0, 1.0), body(1.0, -1.0, -1.0), body(1.0, 50.0, 0.0)];
        bodies[2].tombstone();
        let mut tree = QuadTree::build(&bodies);
        tree.update_center_of_mass(&bodies);
        assert_eq!(tree.root().count, 2);
        assert_eq!(tree.root().size, 2.0);
        assert_eq!(tree.root().mass, 2.0);
    }

    #[test]
    fn coincident_bodies_become_a_bucket() {
        let bodies = vec![body(1.0, 2.0, 2.0), body(3.0, 2.0, 2.0)];
        let mut tree = QuadTree::build(&bodies);
        tree.update_center_of_mass(&bodies);
        assert_eq!(tree.root().mass, 4.0);
        assert_eq!(tree.root().com, NVec2::new(2.0, 2.0));
        assert!(tree.node_count() <= MAX_DEPTH + 1);
    }

    #[test]
    fn square_query_prunes_distant_leaves() {
        let bodies = vec![body(1.0, -8.0, -8.0), body(1.0, 8.0, 8.0), body(1.0, 7.5, 8.0)];
        let tree = QuadTree::build(&bodies);
        let mut hits = Vec::new();
        tree.find_bodies_in_square(&NVec2::new(8.0, 8.0), 1.0, &mut |i| hits.push(i));
        hits.sort();
        assert_eq!(hits, vec![1, 2]);
    }

    #[test]
    fn empty_tree_has_no_mass() {
        let bodies: Vec<Body> = Vec::new();
        let mut tree = QuadTree::build(&bodies);
        tree.update_center_of_mass(&bodies);
        assert_eq!(tree.root().count, 0);
        assert_eq!(tree.root().mass, 0.0);
    }
}
