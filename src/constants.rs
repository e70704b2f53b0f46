//! Crate-wide constants.

/// Maximum number of refinement steps in a cut-coordinate search.
///
/// Exceeding the cap is a soft failure. The search returns its current best
/// coordinate and the caller continues with a possibly imperfect balance.
pub const MAX_CENTER_ITERATIONS: usize = 100;

/// Numerator of the anti-oscillation slack in the count-based acceptance
/// test. The full slack is `COUNT_SLACK / (left + right)`.
pub const COUNT_SLACK: f64 = 10.0;

/// Default relative balance tolerance.
pub const DEFAULT_TOLERANCE: f64 = 1e-8;

/// Jitter distance as a fraction of the longest bounding-box edge.
pub const JITTER_RELATIVE_DISTANCE: f64 = 1e-8;

/// Default seed for the jitter generator.
pub const DEFAULT_JITTER_SEED: u64 = 42;
