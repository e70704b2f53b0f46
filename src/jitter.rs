//! Deterministic micro-perturbation of point clouds.
//!
//! Coincident points make a bisection cut degenerate: no coordinate
//! separates them. Perturbing every point by a vanishingly small random
//! offset breaks the ties. The generator is supplied by the caller, so
//! repeated runs with the same seed produce bit-identical clouds.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::constants::JITTER_RELATIVE_DISTANCE;
use crate::geometry::{Extent, Point};

/// Get a seeded rng.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Displace every point by a random direction scaled to `distance`.
pub fn jitter_by<R: Rng + ?Sized>(points: &mut [Point], distance: f64, rng: &mut R) {
    for point in points.iter_mut() {
        let mut offset = [0.0; 3];
        for value in offset.iter_mut() {
            *value = rng.gen_range(-1.0..1.0);
        }
        let norm = offset.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (axis, value) in offset.iter().enumerate() {
                point[axis] += value / norm * distance;
            }
        }
    }
}

/// Displace every point by a tiny fraction of the cloud's longest edge.
pub fn jitter<R: Rng + ?Sized>(points: &mut [Point], rng: &mut R) {
    if points.is_empty() {
        return;
    }
    let extent = Extent::from_points(points);
    let range = extent.length(extent.longest_axis());
    jitter_by(points, JITTER_RELATIVE_DISTANCE * range, rng);
}
