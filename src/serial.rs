//! Single-process recursive bisection.

use std::collections::{BTreeMap, BTreeSet};

use crate::center::{cut_ratio, find_center_by_weight, left_partitions, right_partitions};
use crate::geometry::{Extent, Point};
use crate::jitter::{jitter, seeded_rng};
use crate::split::{extract, split_along_axis};
use crate::types::{LeafId, PartitionId, RcbConfig, RcbError};

/// Recursively assign a leaf id to every point.
///
/// Each level jitters the points, cuts the longest axis of their bounding
/// box at the weight fraction dictated by the partition-count halving, and
/// recurses into both halves with the child leaf ids `2^depth + 2*parent`
/// and `2^depth + 2*parent + 1`. The result is indexed like the input.
pub(crate) fn bisect(
    mut points: Vec<Point>,
    weights: Vec<f64>,
    leaf_id: LeafId,
    depth: u32,
    num_partitions: usize,
    config: &RcbConfig,
) -> Result<Vec<LeafId>, RcbError> {
    if num_partitions == 0 {
        return Err(RcbError::ZeroPartitions);
    }
    if num_partitions == 1 || points.is_empty() {
        return Ok(vec![leaf_id; points.len()]);
    }

    jitter(&mut points, &mut seeded_rng(config.jitter_seed));

    let domain = Extent::from_points(&points);
    let axis = domain.longest_axis();
    let center = domain.center()[axis];
    let ratio = cut_ratio(num_partitions);
    let cut = find_center_by_weight(
        domain,
        &points,
        &weights,
        ratio,
        center,
        axis,
        config.tolerance,
    );

    let (indices_left, indices_right) = split_along_axis(&points, axis, cut);
    let points_left = extract(&points, &indices_left);
    let weights_left = extract(&weights, &indices_left);
    let points_right = extract(&points, &indices_right);
    let weights_right = extract(&weights, &indices_right);

    let left_leaf_id = (1u64 << depth) + 2 * leaf_id;
    let right_leaf_id = left_leaf_id + 1;
    let ids_left = bisect(
        points_left,
        weights_left,
        left_leaf_id,
        depth + 1,
        left_partitions(num_partitions),
        config,
    )?;
    let ids_right = bisect(
        points_right,
        weights_right,
        right_leaf_id,
        depth + 1,
        right_partitions(num_partitions),
        config,
    )?;

    // Scatter the child results back through the split indices.
    let mut ids = vec![0; points.len()];
    for (index, id) in indices_left.into_iter().zip(ids_left) {
        ids[index] = id;
    }
    for (index, id) in indices_right.into_iter().zip(ids_right) {
        ids[index] = id;
    }
    Ok(ids)
}

/// Remap leaf ids onto dense partition ids, in sorted leaf-id order.
pub(crate) fn compact_ids(leaf_ids: &[LeafId], used: &BTreeSet<LeafId>) -> Vec<PartitionId> {
    let old_to_new: BTreeMap<LeafId, PartitionId> = used
        .iter()
        .enumerate()
        .map(|(new, &old)| (old, new))
        .collect();
    leaf_ids.iter().map(|id| old_to_new[id]).collect()
}

/// Partition a local point cloud into pieces of approximately equal weight.
///
/// Returns one partition id per point, dense in `[0, K)` with
/// `K <= num_partitions`.
pub fn recursive_bisection_serial(
    points: &[Point],
    weights: &[f64],
    num_partitions: usize,
    config: &RcbConfig,
) -> Result<Vec<PartitionId>, RcbError> {
    if points.len() != weights.len() {
        return Err(RcbError::WeightsMismatch {
            points: points.len(),
            weights: weights.len(),
        });
    }
    let leaf_ids = bisect(
        points.to_vec(),
        weights.to_vec(),
        0,
        0,
        num_partitions,
        config,
    )?;
    let used: BTreeSet<LeafId> = leaf_ids.iter().copied().collect();
    Ok(compact_ids(&leaf_ids, &used))
}

/// [`recursive_bisection_serial`] with unit weights.
pub fn recursive_bisection_serial_uniform(
    points: &[Point],
    num_partitions: usize,
    config: &RcbConfig,
) -> Result<Vec<PartitionId>, RcbError> {
    recursive_bisection_serial(points, &vec![1.0; points.len()], num_partitions, config)
}
