//! The process-group communication substrate.
//!
//! All coordination in this crate happens through synchronous collective
//! operations on a [`GroupComm`]: group-wide reductions, gathers, an
//! all-to-all exchange and a color split. Every collective blocks until all
//! members of the current group have issued the matching call, so callers
//! must issue collectives the same number of times on every member.
//!
//! Group handles are owned, move-only values. [`GroupComm::split`] consumes
//! the handle it splits, and dropping a handle releases it, so a handle can
//! never outlive its recursion level or be used concurrently with its
//! successor.

pub mod local;
pub mod mpi;

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Add;

use ::mpi::traits::Equivalence;
use num::traits::Zero;

use crate::geometry::Extent;
use crate::types::LeafId;

/// Values that can travel between group members.
pub trait GroupData: Equivalence + Copy + Send + 'static {}

impl<T: Equivalence + Copy + Send + 'static> GroupData for T {}

/// A group of cooperating processes.
pub trait GroupComm: Sized {
    /// This member's rank in `0..size()`.
    fn rank(&self) -> usize;

    /// Number of members.
    fn size(&self) -> usize;

    /// Sum `value` over all members. Every member receives the identical
    /// total.
    fn reduce_sum<T>(&self, value: T) -> T
    where
        T: GroupData + Zero + Add<Output = T>;

    /// Maximum of `value` over all members.
    fn reduce_max<T>(&self, value: T) -> T
    where
        T: GroupData + PartialOrd,
    {
        self.all_gather(value)
            .into_iter()
            .fold(value, |max, candidate| {
                if candidate > max {
                    candidate
                } else {
                    max
                }
            })
    }

    /// Gather one value per member, ordered by rank, onto every member.
    fn all_gather<T: GroupData>(&self, value: T) -> Vec<T>;

    /// Gather variable-length contributions, concatenated in rank order,
    /// onto every member.
    fn all_gather_varcount<T: GroupData>(&self, arr: &[T]) -> Vec<T>;

    /// Deliver per-destination payloads. The result maps each source rank
    /// that sent something here to its payload, in the order it was sent.
    fn exchange<T: GroupData>(&self, outgoing: &BTreeMap<usize, Vec<T>>) -> BTreeMap<usize, Vec<T>>;

    /// Acquire a fresh handle to the same membership.
    fn duplicate(&self) -> Self;

    /// Split into one subgroup per color, releasing this handle. Members
    /// are ranked in the new group by their old rank.
    fn split(self, color: usize) -> Self;

    /// Union of the local bounding boxes of all members.
    fn reduce_bounding_box(&self, local: Extent) -> Extent {
        let mut global = Extent::empty();
        for extent in self.all_gather(local) {
            global.add_extent(&extent);
        }
        global
    }

    /// Sorted union of the leaf ids seen by all members.
    fn reduce_union(&self, ids: &BTreeSet<LeafId>) -> BTreeSet<LeafId> {
        let local: Vec<LeafId> = ids.iter().copied().collect();
        self.all_gather_varcount(&local).into_iter().collect()
    }
}

/// Even out item counts over the destination ranks `lo..hi`.
///
/// Items keep their global order: destination `lo` receives the globally
/// first chunk, and so on, with the remainder spread one item per rank from
/// `lo` upward. Ranks outside the range send everything away and receive
/// nothing. The routing depends only on the gathered per-rank counts, so
/// parallel arrays rebalanced back-to-back are permuted identically.
pub fn rebalance_over_range<T: GroupData, G: GroupComm>(
    group: &G,
    data: Vec<T>,
    lo: usize,
    hi: usize,
) -> Vec<T> {
    debug_assert!(lo < hi && hi <= group.size());

    let counts = group.all_gather(data.len());
    let total: usize = counts.iter().sum();
    let my_offset: usize = counts[..group.rank()].iter().sum();

    let span = hi - lo;
    let base = total / span;
    let remainder = total % span;
    // The first `remainder` destinations hold `base + 1` items; `base` is
    // nonzero whenever any item falls past them.
    let cutoff = remainder * (base + 1);
    let destination = |global: usize| -> usize {
        if global < cutoff {
            lo + global / (base + 1)
        } else {
            lo + remainder + (global - cutoff) / base
        }
    };

    let mut outgoing: BTreeMap<usize, Vec<T>> = BTreeMap::new();
    for (index, item) in data.into_iter().enumerate() {
        outgoing
            .entry(destination(my_offset + index))
            .or_default()
            .push(item);
    }

    let incoming = group.exchange(&outgoing);
    incoming.into_values().flatten().collect()
}

#[cfg(test)]
mod test {
    use super::local::LocalGroup;
    use super::{rebalance_over_range, GroupComm};

    #[test]
    fn rebalance_evens_out_skewed_counts() {
        let results = LocalGroup::run(3, |group| {
            let data: Vec<usize> = match group.rank() {
                0 => (0..7).collect(),
                _ => Vec::new(),
            };
            rebalance_over_range(&group, data, 0, 3)
        });
        assert_eq!(results[0], vec![0, 1, 2]);
        assert_eq!(results[1], vec![3, 4]);
        assert_eq!(results[2], vec![5, 6]);
    }

    #[test]
    fn rebalance_onto_subrange_empties_other_ranks() {
        let results = LocalGroup::run(4, |group| {
            let data = vec![group.rank(); 2];
            rebalance_over_range(&group, data, 0, 2)
        });
        assert_eq!(results[0], vec![0, 0, 1, 1]);
        assert_eq!(results[1], vec![2, 2, 3, 3]);
        assert!(results[2].is_empty());
        assert!(results[3].is_empty());
    }

    #[test]
    fn rebalance_with_fewer_items_than_ranks() {
        let results = LocalGroup::run(3, |group| {
            let data = if group.rank() == 2 { vec![9usize] } else { Vec::new() };
            rebalance_over_range(&group, data, 0, 3)
        });
        assert_eq!(results[0], vec![9]);
        assert!(results[1].is_empty());
        assert!(results[2].is_empty());
    }
}
