//! Scalar 2D geometry and small statistics helpers.
//!
//! Everything here operates on plain tuples and slices so the pose types
//! stay free of math detail. All functions are total: degenerate input
//! produces a neutral finite value, never NaN.

/// Computes the angle in degrees at `vertex` between the rays toward `a`
/// and `b`.
///
/// Uses the `atan2` difference of the two rays, folded into [0, 180] so
/// the result is direction-agnostic (a reflex angle of 300 degrees reads
/// as 60).
#[must_use]
pub fn angle_between_rays(vertex: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    let angle_a = (a.1 - vertex.1).atan2(a.0 - vertex.0);
    let angle_b = (b.1 - vertex.1).atan2(b.0 - vertex.0);

    let mut degrees = (angle_a - angle_b).to_degrees().abs();
    if degrees > 180.0 {
        degrees = 360.0 - degrees;
    }
    degrees
}

/// Computes the midpoint of two points.
#[must_use]
pub fn midpoint(a: (f32, f32), b: (f32, f32)) -> (f32, f32) {
    ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}

/// Computes the arithmetic mean of a slice, 0.0 when empty.
#[must_use]
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// Computes the population standard deviation of a slice.
///
/// Fewer than two samples have no spread and yield 0.0.
#[must_use]
pub fn std_dev(values: &[f32]) -> f32 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m) * (v - m)).sum::<f32>() / values.len() as f32;
    variance.sqrt()
}
