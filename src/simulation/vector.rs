//! 2D vector helpers over [`NVec2`]
//!
//! Every operation comes in two forms: one returning a fresh value and one
//! writing into a caller-supplied `out`. The `_into` forms are what the tree
//! traversal uses in its inner loop.

use crate::simulation::states::NVec2;

/// a + b
#[inline]
pub fn add(a: &NVec2, b: &NVec2) -> NVec2 {
    NVec2::new(a.x + b.x, a.y + b.y)
}

#[inline]
pub fn add_into(a: &NVec2, b: &NVec2, out: &mut NVec2) {
    out.x = a.x + b.x;
    out.y = a.y + b.y;
}

/// a - b
#[inline]
pub fn sub(a: &NVec2, b: &NVec2) -> NVec2 {
    NVec2::new(a.x - b.x, a.y - b.y)
}

#[inline]
pub fn sub_into(a: &NVec2, b: &NVec2, out: &mut NVec2) {
    out.x = a.x - b.x;
    out.y = a.y - b.y;
}

/// s * a
#[inline]
pub fn scale(a: &NVec2, s: f64) -> NVec2 {
    NVec2::new(a.x * s, a.y * s)
}

#[inline]
pub fn scale_into(a: &NVec2, s: f64, out: &mut NVec2) {
    out.x = a.x * s;
    out.y = a.y * s;
}

/// a + s * b
#[inline]
pub fn add_scaled(a: &NVec2, s: f64, b: &NVec2) -> NVec2 {
    NVec2::new(a.x + s * b.x, a.y + s * b.y)
}

/// `out = a + s * b`. `out` may alias neither input, so in-place
/// accumulation goes through [`add_scaled_assign`].
#[inline]
pub fn add_scaled_into(a: &NVec2, s: f64, b: &NVec2, out: &mut NVec2) {
    out.x = a.x + s * b.x;
    out.y = a.y + s * b.y;
}

/// `acc += s * b`
#[inline]
pub fn add_scaled_assign(acc: &mut NVec2, s: f64, b: &NVec2) {
    acc.x += s * b.x;
    acc.y += s * b.y;
}

#[inline]
pub fn dot(a: &NVec2, b: &NVec2) -> f64 {
    a.x * b.x + a.y * b.y
}

/// z component of the 3D cross product of `a` and `b`
#[inline]
pub fn perp_dot(a: &NVec2, b: &NVec2) -> f64 {
    a.x * b.y - a.y * b.x
}

#[inline]
pub fn length_squared(a: &NVec2) -> f64 {
    a.x * a.x + a.y * a.y
}

#[inline]
pub fn length(a: &NVec2) -> f64 {
    length_squared(a).sqrt()
}

#[inline]
pub fn distance_squared(a: &NVec2, b: &NVec2) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

#[inline]
pub fn distance(a: &NVec2, b: &NVec2) -> f64 {
    distance_squared(a, b).sqrt()
}

/// max(|dx|, |dy|), the half-width of the smallest square around `a` reaching `b`
#[inline]
pub fn chebyshev_distance(a: &NVec2, b: &NVec2) -> f64 {
    (a.x - b.x).abs().max((a.y - b.y).abs())
}

#[inline]
pub fn assign(src: &NVec2, out: &mut NVec2) {
    out.x = src.x;
    out.y = src.y;
}

#[inline]
pub fn is_finite(a: &NVec2) -> bool {
    a.x.is_finite() && a.y.is_finite()
}
