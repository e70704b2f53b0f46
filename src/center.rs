//! Cut-coordinate searches.
//!
//! A bisection cut is found by shrinking a bounding interval around a
//! candidate coordinate until the share of points (or weight) strictly left
//! of the candidate matches a target fraction. The count-based and
//! weight-based searches use deliberately different acceptance tests: the
//! count-based test carries an additive `10/n` slack so small populations
//! cannot oscillate around an unreachable count forever, the weight-based
//! test does not. The two must not be unified.

use crate::constants::{COUNT_SLACK, MAX_CENTER_ITERATIONS};
use crate::geometry::{Extent, Point};
use crate::group::GroupComm;

/// Fraction of total weight the left child of an `n`-way bisection should
/// receive: `floor(n/2) / n`.
pub fn cut_ratio(num_partitions: usize) -> f64 {
    let half = num_partitions / 2;
    half as f64 / num_partitions as f64
}

/// Number of partitions handed to the left child.
pub fn left_partitions(num_partitions: usize) -> usize {
    num_partitions / 2
}

/// Number of partitions handed to the right child.
pub fn right_partitions(num_partitions: usize) -> usize {
    num_partitions - left_partitions(num_partitions)
}

fn count_less_than(points: &[Point], center: f64, axis: usize) -> usize {
    points.iter().filter(|point| point[axis] < center).count()
}

fn sum_less_than(points: &[Point], weights: &[f64], center: f64, axis: usize) -> f64 {
    points
        .iter()
        .zip(weights)
        .filter(|(point, _)| point[axis] < center)
        .map(|(_, weight)| weight)
        .sum()
}

fn within_count_tolerance(target_ratio: f64, left: usize, right: usize, tol: f64) -> bool {
    let actual_ratio = left as f64 / (left + right) as f64;
    let error = (actual_ratio - target_ratio).abs() / target_ratio;
    let slack = COUNT_SLACK / (left + right) as f64;
    error < tol + slack
}

/// Shrink the interval toward whichever side is short of its target and
/// re-center on the midpoint.
fn shift_center<T: PartialOrd>(
    domain: &mut Extent,
    center: &mut f64,
    left: T,
    target_left: T,
    axis: usize,
) {
    if left < target_left {
        domain.lo[axis] = *center;
    } else {
        domain.hi[axis] = *center;
    }
    *center = 0.5 * (domain.lo[axis] + domain.hi[axis]);
}

/// Find the coordinate along `axis` with the target fraction of points
/// strictly left of it.
pub fn find_center_by_count(
    mut domain: Extent,
    points: &[Point],
    target: f64,
    mut center: f64,
    axis: usize,
    tol: f64,
) -> f64 {
    for _ in 0..=MAX_CENTER_ITERATIONS {
        let left = count_less_than(points, center, axis);
        let total = points.len();
        let right = total - left;
        let target_left = (total as f64 * target) as usize;
        if within_count_tolerance(target, left, right, tol) {
            return center;
        }
        shift_center(&mut domain, &mut center, left, target_left, axis);
    }
    log::warn!(
        "count-based cut search on axis {} exhausted {} iterations",
        axis,
        MAX_CENTER_ITERATIONS
    );
    center
}

/// Find the coordinate along `axis` with the target fraction of weight
/// strictly left of it.
pub fn find_center_by_weight(
    mut domain: Extent,
    points: &[Point],
    weights: &[f64],
    target: f64,
    mut center: f64,
    axis: usize,
    tol: f64,
) -> f64 {
    for _ in 0..=MAX_CENTER_ITERATIONS {
        let total: f64 = weights.iter().sum();
        let left = sum_less_than(points, weights, center, axis);
        let fraction = left / total;
        if (fraction - target).abs() < tol {
            return center;
        }
        shift_center(&mut domain, &mut center, fraction, target, axis);
    }
    log::warn!(
        "weight-based cut search on axis {} exhausted {} iterations",
        axis,
        MAX_CENTER_ITERATIONS
    );
    center
}

/// [`find_center_by_count`] over a process group.
pub fn find_center_by_count_on_group<G: GroupComm>(
    group: &G,
    mut domain: Extent,
    points: &[Point],
    target: f64,
    mut center: f64,
    axis: usize,
    tol: f64,
) -> f64 {
    for _ in 0..=MAX_CENTER_ITERATIONS {
        // Both reductions run unconditionally on every iteration, so every
        // member of the group issues the same collective sequence.
        let left = group.reduce_sum(count_less_than(points, center, axis));
        let total = group.reduce_sum(points.len());
        let right = total - left;
        let target_left = (total as f64 * target) as usize;
        if within_count_tolerance(target, left, right, tol) {
            return center;
        }
        shift_center(&mut domain, &mut center, left, target_left, axis);
    }
    log::warn!(
        "count-based group cut search on axis {} exhausted {} iterations",
        axis,
        MAX_CENTER_ITERATIONS
    );
    center
}

/// [`find_center_by_weight`] over a process group.
pub fn find_center_by_weight_on_group<G: GroupComm>(
    group: &G,
    mut domain: Extent,
    points: &[Point],
    weights: &[f64],
    target: f64,
    mut center: f64,
    axis: usize,
    tol: f64,
) -> f64 {
    for _ in 0..=MAX_CENTER_ITERATIONS {
        let total = group.reduce_sum(weights.iter().sum::<f64>());
        let left = group.reduce_sum(sum_less_than(points, weights, center, axis));
        let fraction = left / total;
        if (fraction - target).abs() < tol {
            return center;
        }
        shift_center(&mut domain, &mut center, fraction, target, axis);
    }
    log::warn!(
        "weight-based group cut search on axis {} exhausted {} iterations",
        axis,
        MAX_CENTER_ITERATIONS
    );
    center
}
