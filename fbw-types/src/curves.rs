//! Piecewise-linear curve primitives.
//!
//! Every ramp in the protection envelope is built from these, so their exact
//! numeric behaviour is what the control-law gains are tuned against.

/// Clamp `value` into `[min, max]`.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// `1.0` for strictly positive values, `-1.0` otherwise (zero included).
pub fn sign(value: f64) -> f64 {
    if value > 0.0 { 1.0 } else { -1.0 }
}

/// Scale a coefficient in `0.0..=1.0` onto `min..=max`.
pub fn linear_range(coefficient: f64, min: f64, max: f64) -> f64 {
    (max - min) * coefficient + min
}

/// Effectiveness coefficient that is maximal (1.0) on the `start` side,
/// falls linearly between `start` and `end`, and is 0.0 beyond `end`.
///
/// ```text
/// start < end:  <-- 1.0 --> start <-- ramp --> end <-- 0.0 -->
/// start >= end: <-- 0.0 --> end <-- ramp --> start <-- 1.0 -->
/// ```
pub fn linear_decay_coefficient(position: f64, start: f64, end: f64) -> f64 {
    if (start < end && position <= start) || (start >= end && position >= start) {
        1.0
    } else if (start < end && position >= end) || (start >= end && position <= end) {
        0.0
    } else {
        1.0 - ((position - start) / (end - start))
    }
}
