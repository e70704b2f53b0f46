//! Common types: errors, configuration and id aliases.

use thiserror::Error;

use crate::constants::{DEFAULT_JITTER_SEED, DEFAULT_TOLERANCE};

/// Identifier of a leaf in the implicit binary bisection tree.
///
/// Children of a node with id `p` at depth `d` are `2^d + 2p` (left) and
/// `2^d + 2p + 1` (right). Leaf ids are not contiguous until compacted.
pub type LeafId = u64;

/// Final partition number, dense in `[0, K)`.
pub type PartitionId = usize;

/// Error type for the bisection routines.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RcbError {
    /// Asking for zero partitions doesn't make sense.
    #[error("cannot bisect into zero partitions")]
    ZeroPartitions,
    /// Every rank must receive at least one partition.
    #[error("cannot request fewer partitions ({requested}) than ranks ({group_size})")]
    FewerPartitionsThanRanks {
        /// The requested partition count.
        requested: usize,
        /// Member count of the calling process group.
        group_size: usize,
    },
    /// Points and weights must be parallel arrays.
    #[error("weights incompatible: {points} points but {weights} weights")]
    WeightsMismatch {
        /// Number of points supplied.
        points: usize,
        /// Number of weights supplied.
        weights: usize,
    },
    /// Writing a partitioned point cloud failed.
    #[error("could not write point cloud: {0}")]
    PointWriter(String),
}

/// Tunables for a bisection run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RcbConfig {
    /// Relative balance tolerance for every binary split.
    pub tolerance: f64,
    /// Seed for the deterministic jitter applied before each cut search.
    pub jitter_seed: u64,
}

impl Default for RcbConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            jitter_seed: DEFAULT_JITTER_SEED,
        }
    }
}

impl RcbConfig {
    /// A configuration with the given tolerance and the default jitter seed.
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            tolerance,
            ..Self::default()
        }
    }
}
