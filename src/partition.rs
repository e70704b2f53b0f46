//! Distributed recursive coordinate bisection.
//!
//! The driver repeatedly cuts the group-wide point cloud in two, ships each
//! half onto one half of the process group, and splits the group to match,
//! until every member is alone with its share of the cloud. The remaining
//! local recursion assigns leaf ids, which are then routed back to the
//! ranks that originally owned the points and compacted into dense
//! partition ids.

use std::collections::{BTreeMap, BTreeSet};

use itertools::izip;

use crate::center::{cut_ratio, find_center_by_weight_on_group, left_partitions, right_partitions};
use crate::geometry::{Extent, Point};
use crate::group::{rebalance_over_range, GroupComm};
use crate::jitter::{jitter, seeded_rng};
use crate::serial;
use crate::split::{extract, split_along_axis};
use crate::types::{LeafId, PartitionId, RcbConfig, RcbError};

/// Group items by the rank that should receive them.
fn queue_to_owners<T: Copy>(items: &[T], owners: &[usize]) -> BTreeMap<usize, Vec<T>> {
    let mut queues: BTreeMap<usize, Vec<T>> = BTreeMap::new();
    for (&item, &owner) in items.iter().zip(owners) {
        queues.entry(owner).or_default().push(item);
    }
    queues
}

/// Assign each point a distinct id, ordered by rank.
///
/// Handles clouds with fewer points than ranks, where bisection would
/// produce empty subgroups: the prefix sum of per-rank counts reserves an
/// id range per rank and keeps the ids dense overall.
fn assign_one_per_rank<G: GroupComm>(group: &G, local_count: usize) -> Vec<PartitionId> {
    let counts = group.all_gather(local_count);
    let offset: usize = counts[..group.rank()].iter().sum();
    (offset..offset + local_count).collect()
}

/// Partition a distributed point cloud into `num_partitions` pieces of
/// approximately equal weight.
///
/// Every member of `origin` must call this collectively, with its local
/// share of the cloud (possibly empty). The result is one partition id per
/// local point, in input order, dense in `[0, K)` across the whole group
/// with `K <= num_partitions`.
///
/// # Errors
/// Fails on zero requested partitions, on mismatched point/weight lengths,
/// and when fewer partitions than group members are requested.
pub fn recursive_bisection<G: GroupComm>(
    origin: &G,
    points: &[Point],
    weights: &[f64],
    num_partitions: usize,
    config: &RcbConfig,
) -> Result<Vec<PartitionId>, RcbError> {
    if num_partitions == 0 {
        return Err(RcbError::ZeroPartitions);
    }
    if points.len() != weights.len() {
        return Err(RcbError::WeightsMismatch {
            points: points.len(),
            weights: weights.len(),
        });
    }
    if num_partitions < origin.size() {
        return Err(RcbError::FewerPartitionsThanRanks {
            requested: num_partitions,
            group_size: origin.size(),
        });
    }

    let total_points = origin.reduce_sum(points.len());
    if total_points < origin.size() {
        return Ok(assign_one_per_rank(origin, points.len()));
    }

    let local_count = points.len();
    let mut points = points.to_vec();
    let mut weights = weights.to_vec();
    let mut owners = vec![origin.rank(); local_count];
    let mut indices: Vec<usize> = (0..local_count).collect();

    let mut group = origin.duplicate();
    let mut leaf_id: LeafId = 0;
    let mut depth: u32 = 0;
    let mut num_partitions = num_partitions;

    while group.size() > 1 {
        jitter(&mut points, &mut seeded_rng(config.jitter_seed));

        let domain = group.reduce_bounding_box(Extent::from_points(&points));
        let axis = domain.longest_axis();
        let center = domain.center()[axis];
        // The cut target follows the halving of the requested partition
        // count; the rank split below follows the halving of the group
        // size. Both floor-divide by two, which keeps the two sequences in
        // lockstep, but neither is derived from the other.
        let ratio = cut_ratio(num_partitions);
        let cut = find_center_by_weight_on_group(
            &group,
            domain,
            &points,
            &weights,
            ratio,
            center,
            axis,
            config.tolerance,
        );
        log::debug!(
            "depth {}: group of {} cuts axis {} at {}",
            depth,
            group.size(),
            axis,
            cut
        );

        let (extract_left, extract_right) = split_along_axis(&points, axis, cut);
        let middle = group.size() / 2;
        let size = group.size();

        let points_left = rebalance_over_range(&group, extract(&points, &extract_left), 0, middle);
        let weights_left =
            rebalance_over_range(&group, extract(&weights, &extract_left), 0, middle);
        let owners_left = rebalance_over_range(&group, extract(&owners, &extract_left), 0, middle);
        let indices_left =
            rebalance_over_range(&group, extract(&indices, &extract_left), 0, middle);

        let points_right =
            rebalance_over_range(&group, extract(&points, &extract_right), middle, size);
        let weights_right =
            rebalance_over_range(&group, extract(&weights, &extract_right), middle, size);
        let owners_right =
            rebalance_over_range(&group, extract(&owners, &extract_right), middle, size);
        let indices_right =
            rebalance_over_range(&group, extract(&indices, &extract_right), middle, size);

        let color = usize::from(group.rank() >= middle);
        if color == 0 {
            points = points_left;
            weights = weights_left;
            owners = owners_left;
            indices = indices_left;
            leaf_id = (1u64 << depth) + 2 * leaf_id;
            num_partitions = left_partitions(num_partitions);
        } else {
            points = points_right;
            weights = weights_right;
            owners = owners_right;
            indices = indices_right;
            leaf_id = (1u64 << depth) + 2 * leaf_id + 1;
            num_partitions = right_partitions(num_partitions);
        }

        group = group.split(color);
        depth += 1;
    }
    drop(group);

    let leaf_ids = serial::bisect(points, weights, leaf_id, depth, num_partitions, config)?;

    // Route the results home. Leaf ids and original indices travel in two
    // exchanges grouped by the same owner array, so entry i of both
    // incoming payloads describes the same point.
    let incoming_ids = origin.exchange(&queue_to_owners(&leaf_ids, &owners));
    let incoming_indices = origin.exchange(&queue_to_owners(&indices, &owners));

    let mut local_leaf_ids = vec![LeafId::MAX; local_count];
    for (source, returned_indices) in &incoming_indices {
        let returned_ids = &incoming_ids[source];
        for (&index, &id) in izip!(returned_indices, returned_ids) {
            local_leaf_ids[index] = id;
        }
    }

    let used: BTreeSet<LeafId> = local_leaf_ids.iter().copied().collect();
    let used = origin.reduce_union(&used);
    Ok(serial::compact_ids(&local_leaf_ids, &used))
}

/// [`recursive_bisection`] with unit weights.
pub fn recursive_bisection_uniform<G: GroupComm>(
    origin: &G,
    points: &[Point],
    num_partitions: usize,
    config: &RcbConfig,
) -> Result<Vec<PartitionId>, RcbError> {
    recursive_bisection(origin, points, &vec![1.0; points.len()], num_partitions, config)
}

#[cfg(test)]
mod test {
    use super::queue_to_owners;

    #[test]
    fn queue_groups_by_owner_preserving_order() {
        let items = [10u64, 11, 12, 13];
        let owners = [2, 0, 2, 0];
        let queues = queue_to_owners(&items, &owners);
        assert_eq!(queues[&0], vec![11, 13]);
        assert_eq!(queues[&2], vec![10, 12]);
        assert_eq!(queues.len(), 2);
    }
}
