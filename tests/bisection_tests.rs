//! Multi-rank partitioning scenarios on the in-process group backend.

use std::collections::BTreeSet;

use rand::Rng;
use rand_distr::{Distribution, Normal};
use rcb_partition::geometry::Point;
use rcb_partition::group::local::LocalGroup;
use rcb_partition::group::GroupComm;
use rcb_partition::jitter::seeded_rng;
use rcb_partition::partition::{recursive_bisection, recursive_bisection_uniform};
use rcb_partition::serial::recursive_bisection_serial_uniform;
use rcb_partition::types::{RcbConfig, RcbError};

fn random_points(n: usize, seed: u64) -> Vec<Point> {
    let mut rng = seeded_rng(seed);
    (0..n)
        .map(|_| Point::new([rng.gen(), rng.gen(), rng.gen()]))
        .collect()
}

#[test]
fn four_ranks_four_partitions_stay_balanced() {
    // 1000 uniform points in the unit cube, 250 per rank.
    let results = LocalGroup::run(4, |group| {
        let points = random_points(250, group.rank() as u64);
        recursive_bisection_uniform(&group, &points, 4, &RcbConfig::with_tolerance(1e-4)).unwrap()
    });

    let mut counts = [0; 4];
    for ids in &results {
        assert_eq!(ids.len(), 250);
        for &id in ids {
            counts[id] += 1;
        }
    }
    for count in counts {
        assert!((225..=275).contains(&count), "partition held {count} points");
    }
}

#[test]
fn output_ids_are_contiguous_from_zero() {
    let sizes = [40, 0, 25];
    let results = LocalGroup::run(3, |group| {
        let points = random_points(sizes[group.rank()], 17 + group.rank() as u64);
        recursive_bisection_uniform(&group, &points, 3, &RcbConfig::with_tolerance(1e-4)).unwrap()
    });

    for (ids, size) in results.iter().zip(sizes) {
        assert_eq!(ids.len(), size);
    }
    let used: BTreeSet<usize> = results.iter().flatten().copied().collect();
    assert_eq!(used, (0..3).collect());
    let total: usize = results.iter().map(|ids| ids.len()).sum();
    assert_eq!(total, 65);
}

#[test]
fn points_only_on_one_rank_get_spread() {
    let results = LocalGroup::run(4, |group| {
        let points = if group.rank() == 1 {
            random_points(100, 5)
        } else {
            Vec::new()
        };
        recursive_bisection_uniform(&group, &points, 4, &RcbConfig::with_tolerance(1e-4)).unwrap()
    });

    for (rank, ids) in results.iter().enumerate() {
        assert_eq!(ids.len(), if rank == 1 { 100 } else { 0 });
    }
    let mut counts = [0i64; 4];
    for &id in &results[1] {
        counts[id] += 1;
    }
    let target = 100i64 / 4;
    for count in counts {
        assert!(count > target - 8 && count < target + 8);
    }
}

#[test]
fn fewer_points_than_ranks_assigns_one_id_per_point() {
    let results = LocalGroup::run(3, |group| {
        let points = match group.rank() {
            0 | 2 => vec![Point::new([group.rank() as f64, 0.0, 0.0])],
            _ => Vec::new(),
        };
        recursive_bisection_uniform(&group, &points, 3, &RcbConfig::default()).unwrap()
    });
    assert_eq!(results[0], vec![0]);
    assert!(results[1].is_empty());
    assert_eq!(results[2], vec![1]);
}

#[test]
fn fewer_partitions_than_ranks_is_fatal() {
    let results = LocalGroup::run(3, |group| {
        let points = random_points(5, group.rank() as u64);
        recursive_bisection_uniform(&group, &points, 2, &RcbConfig::default())
    });
    for result in results {
        assert_eq!(
            result,
            Err(RcbError::FewerPartitionsThanRanks {
                requested: 2,
                group_size: 3
            })
        );
    }
}

#[test]
fn weights_shift_the_distributed_split() {
    // 200 points on a line, dealt alternately to two ranks; the left half
    // of the line carries double weight, dragging the cut toward 0.375.
    let results = LocalGroup::run(2, |group| {
        let points: Vec<Point> = (0..100)
            .map(|i| {
                let x = (2 * i + group.rank()) as f64 / 199.0;
                Point::new([x, 0.0, 0.0])
            })
            .collect();
        let weights: Vec<f64> = points
            .iter()
            .map(|point| if point[0] < 0.5 { 2.0 } else { 1.0 })
            .collect();
        let ids =
            recursive_bisection(&group, &points, &weights, 2, &RcbConfig::with_tolerance(1e-3))
                .unwrap();
        points
            .iter()
            .zip(&ids)
            .filter(|(_, &id)| id == 0)
            .map(|(point, _)| point[0])
            .collect::<Vec<f64>>()
    });

    let left: Vec<f64> = results.into_iter().flatten().collect();
    assert!(
        (70..=80).contains(&left.len()),
        "left partition held {} points",
        left.len()
    );
    // The lighter tail stays in the other partition.
    assert!(left.iter().all(|&x| x < 0.5));
}

#[test]
fn repeated_distributed_runs_are_bit_identical() {
    let run = || {
        LocalGroup::run(4, |group| {
            let points = random_points(100, 31 + group.rank() as u64);
            recursive_bisection_uniform(&group, &points, 8, &RcbConfig::with_tolerance(1e-4))
                .unwrap()
        })
    };
    assert_eq!(run(), run());
}

#[test]
fn distributed_result_matches_serial_on_gathered_cloud() {
    // A cloud living on one rank must get the same leaf structure whether
    // it is partitioned alone or through the group driver.
    let points = random_points(64, 8);
    let serial_ids =
        recursive_bisection_serial_uniform(&points, 2, &RcbConfig::with_tolerance(1e-4)).unwrap();
    let group_ids = LocalGroup::run(1, |group| {
        recursive_bisection_uniform(
            &group,
            &random_points(64, 8),
            2,
            &RcbConfig::with_tolerance(1e-4),
        )
        .unwrap()
    })
    .remove(0);
    assert_eq!(serial_ids, group_ids);
}

#[test]
fn clustered_clouds_still_balance() {
    let normal = Normal::new(0.0, 1.0).unwrap();
    let mut rng = seeded_rng(23);
    let points: Vec<Point> = (0..500)
        .map(|_| {
            Point::new([
                normal.sample(&mut rng),
                normal.sample(&mut rng),
                normal.sample(&mut rng),
            ])
        })
        .collect();
    let ids = recursive_bisection_serial_uniform(&points, 4, &RcbConfig::with_tolerance(1e-4))
        .unwrap();
    let mut counts = [0; 4];
    for &id in &ids {
        counts[id] += 1;
    }
    for count in counts {
        assert!((110..=140).contains(&count), "partition held {count} points");
    }
}
