//! Velocity-Verlet time integration, split into predict and correct halves
//!
//! A full step is `predict(dt)`, force evaluation at the new positions, then
//! `correct(dt)`. The acceleration used by `predict` is the one left over from
//! the previous step's force evaluation.

use super::states::Body;
use super::vector;

impl Body {
    /// First half: x_n+1 = x_n + dt v_n + (1/2) dt^2 a_n, v_n+1/2 = v_n + (1/2) dt a_n
    pub fn predict(&mut self, dt: f64) {
        let half_dt = 0.5 * dt;
        vector::add_scaled_assign(&mut self.x, dt, &self.v);
        vector::add_scaled_assign(&mut self.x, half_dt * dt, &self.a);
        vector::add_scaled_assign(&mut self.v, half_dt, &self.a);
    }

    /// Second half: v_n+1 = v_n+1/2 + (1/2) dt a_n+1
    pub fn correct(&mut self, dt: f64) {
        vector::add_scaled_assign(&mut self.v, 0.5 * dt, &self.a);
    }
}

/// Predict every live body
pub fn predict(bodies: &mut [Body], dt: f64) {
    for b in bodies.iter_mut().filter(|b| !b.is_destroyed()) {
        b.predict(dt);
    }
}

/// Correct every live body, skipping those destroyed during force evaluation
pub fn correct(bodies: &mut [Body], dt: f64) {
    for b in bodies.iter_mut().filter(|b| !b.is_destroyed()) {
        b.correct(dt);
    }
}
