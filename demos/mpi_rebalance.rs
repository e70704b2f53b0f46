//! Rebalance a skewed distributed array onto the lower half of the ranks.

use rcb_partition::group::mpi::MpiGroup;
use rcb_partition::group::{rebalance_over_range, GroupComm};

pub fn main() {
    // Initialise MPI
    let universe = mpi::initialize().unwrap();

    // Get the world communicator
    let comm = universe.world();

    let group = MpiGroup::from_communicator(&comm);
    let size = group.size();
    let rank = group.rank();

    // Give rank r a block of r * 10 items.
    let data = vec![rank as u64; rank * 10];
    let total: usize = group.reduce_sum(data.len());

    let half = usize::max(size / 2, 1);
    let balanced = rebalance_over_range(&group, data, 0, half);

    // The lower half holds everything, spread evenly.
    if rank < half {
        assert!(balanced.len() >= total / half);
        assert!(balanced.len() <= total / half + 1);
    } else {
        assert!(balanced.is_empty());
    }

    let counts = group.all_gather(balanced.len());
    if rank == 0 {
        println!("items per rank after rebalancing: {:?}", counts);
    }
}
