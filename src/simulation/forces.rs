//! Direct-summation Newtonian gravity
//!
//! The tree in [`crate::simulation::barnes_hut`] is what the space steps
//! with. This O(N^2) pairwise sum uses the same softened force law and is
//! the reference the tree converges to as `theta -> 0`; tests and the
//! benchmark compare against it.

use crate::simulation::states::{Body, NVec2};

/// 2D Newtonian gravity with softening
#[allow(non_snake_case)]
pub struct NewtonianGravity {
    pub G: f64, // gravitational constant
    pub eps2: f64, // softening length squared
}

impl NewtonianGravity {
    /// Write the acceleration on every body into `acc` and its potential into
    /// `phi`. Destroyed bodies neither attract nor receive anything.
    pub fn accelerations(&self, bodies: &[Body], acc: &mut [NVec2], phi: &mut [f64]) {
        // Zero buffers
        for a in acc.iter_mut() {
            *a = NVec2::zeros();
        }
        for p in phi.iter_mut() {
            *p = 0.0;
        }

        let n = bodies.len();

        // Loop over each unordered pair (i, j) with i < j
        for i in 0..n {
            let bi = &bodies[i];
            if bi.is_destroyed() {
                continue;
            }

            for j in (i + 1)..n {
                let bj = &bodies[j];
                if bj.is_destroyed() {
                    continue;
                }

                // r points from i to j: i is pulled along +r, j along -r
                let r = bj.x - bi.x;

                // 1 / |r_soft| and 1 / |r_soft|^3 with |r_soft|^2 = |r|^2 + eps^2
                let inv_r = (r.dot(&r) + self.eps2).sqrt().recip();
                let inv_r3 = inv_r * inv_r * inv_r;

                acc[i] += self.G * bj.m * inv_r3 * r;
                acc[j] -= self.G * bi.m * inv_r3 * r;

                phi[i] -= self.G * bj.m * inv_r;
                phi[j] -= self.G * bi.m * inv_r;
            }
        }
    }
}
