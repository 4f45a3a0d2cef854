//! Runtime physical and numerical parameters of a `Space`
//!
//! `SpaceParams` holds:
//! - softening length `eps` and opening angle `theta`,
//! - the gravitational constant `G`,
//! - collision and track-recording toggles,
//! - how many samples each body's track keeps

/// Gravitational constant in SI units (m^3 kg^-1 s^-2)
pub const G_SI: f64 = 6.674e-11;

#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq)]
pub struct SpaceParams {
    pub eps: f64, // softening length
    pub theta: f64, // opening angle
    pub G: f64, // gravitational constant
    pub collision_enabled: bool, // merge overlapping bodies
    pub track_recording_enabled: bool, // append a track sample every step
    pub track_capacity: usize, // samples kept per body
}

impl Default for SpaceParams {
    fn default() -> Self {
        Self {
            eps: 1.0,
            theta: 0.5,
            G: G_SI,
            collision_enabled: true,
            track_recording_enabled: false,
            track_capacity: 4096,
        }
    }
}
