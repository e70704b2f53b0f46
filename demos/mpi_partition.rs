//! Partition a random cloud across MPI ranks and report the balance.

use rand::Rng;
use rcb_partition::geometry::Point;
use rcb_partition::group::mpi::MpiGroup;
use rcb_partition::group::GroupComm;
use rcb_partition::jitter::seeded_rng;
use rcb_partition::partition::recursive_bisection_uniform;
use rcb_partition::types::RcbConfig;

pub fn main() {
    // Initialise MPI
    let universe = mpi::initialize().unwrap();

    // Get the world communicator
    let comm = universe.world();

    let group = MpiGroup::from_communicator(&comm);

    // Seed per rank so every rank contributes a different piece of the cloud.
    let mut rng = seeded_rng(group.rank() as u64);

    let npoints = 1000;
    let points: Vec<Point> = (0..npoints)
        .map(|_| Point::new([rng.gen(), rng.gen(), rng.gen()]))
        .collect();

    let num_partitions = group.size();
    let part_ids = recursive_bisection_uniform(
        &group,
        &points,
        num_partitions,
        &RcbConfig::with_tolerance(1e-4),
    )
    .unwrap();

    assert_eq!(part_ids.len(), points.len());

    let highest_id = group.reduce_max(part_ids.iter().copied().max().unwrap_or(0));
    assert!(highest_id < num_partitions);

    // Count the points of every partition across all ranks.
    let mut local_counts = vec![0; num_partitions];
    for &id in &part_ids {
        local_counts[id] += 1;
    }
    let gathered = group.all_gather_varcount(&local_counts);

    if group.rank() == 0 {
        let mut totals = vec![0; num_partitions];
        for (slot, count) in gathered.into_iter().enumerate() {
            totals[slot % num_partitions] += count;
        }
        println!("points per partition: {:?}", totals);
        let target = npoints;
        for total in totals {
            assert!(total > target / 2 && total < 2 * target);
        }
        println!("balance ok");
    }
}
