//! Distance and human-facing scores between face descriptors.

use ndarray::Zip;

use crate::descriptor::Descriptor;
use crate::error::Result;

/// Euclidean distance between two descriptors of equal length.
///
/// Squares are accumulated in `f64` so that two distinct descriptors never
/// collapse to a distance of exactly zero through underflow.
pub fn distance(a: &Descriptor, b: &Descriptor) -> Result<f32> {
    a.ensure_same_dim(b)?;
    let sum = Zip::from(a.view())
        .and(b.view())
        .fold(0.0f64, |acc, &x, &y| {
            let diff = x as f64 - y as f64;
            acc + diff * diff
        });
    Ok(sum.sqrt() as f32)
}

/// `100 * (1 - distance)`, clamped at 0 but not above.
pub fn similarity_percent(distance: f32) -> f32 {
    (100.0 * (1.0 - distance)).max(0.0)
}

/// Whole-number match percentage as shown on the lock screen.
pub fn match_percent(distance: f32) -> u8 {
    ((1.0 - distance) * 100.0).round().clamp(0.0, 100.0) as u8
}
