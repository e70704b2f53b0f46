//! An in-process group backend.
//!
//! Runs every rank of a group as a thread in the current process, which
//! makes multi-rank behavior testable without an MPI launcher. Only the
//! collective interface is exposed; ranks share no other state.

use std::any::Any;
use std::collections::BTreeMap;
use std::ops::Add;
use std::sync::{Arc, Condvar, Mutex};

use num::traits::Zero;

use super::{GroupComm, GroupData};

struct Round {
    slots: Vec<Option<Box<dyn Any + Send>>>,
    arrived: usize,
    departed: usize,
    published: Option<Box<dyn Any + Send>>,
}

struct Shared {
    size: usize,
    round: Mutex<Round>,
    all_present: Condvar,
}

impl Shared {
    fn new(size: usize) -> Self {
        Self {
            size,
            round: Mutex::new(Round {
                slots: (0..size).map(|_| None).collect(),
                arrived: 0,
                departed: 0,
                published: None,
            }),
            all_present: Condvar::new(),
        }
    }
}

/// One member of an in-process group.
pub struct LocalGroup {
    shared: Arc<Shared>,
    rank: usize,
}

impl LocalGroup {
    /// Run `f` on `size` simulated ranks, one thread each, and return the
    /// per-rank results ordered by rank.
    pub fn run<R, F>(size: usize, f: F) -> Vec<R>
    where
        R: Send,
        F: Fn(LocalGroup) -> R + Sync,
    {
        assert!(size > 0, "a group needs at least one member");
        let shared = Arc::new(Shared::new(size));
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..size)
                .map(|rank| {
                    let member = LocalGroup {
                        shared: Arc::clone(&shared),
                        rank,
                    };
                    let f = &f;
                    scope.spawn(move || f(member))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect()
        })
    }

    /// The rendezvous every collective is built on: each member contributes
    /// one value and receives all contributions ordered by rank. Members
    /// block until the whole group has both contributed and read, so rounds
    /// cannot overlap.
    fn rendezvous<T: Clone + Send + 'static>(&self, value: T) -> Vec<T> {
        let shared = &self.shared;
        let mut round = shared.round.lock().unwrap();

        // Wait out the drain phase of the previous round.
        while round.published.is_some() {
            round = shared.all_present.wait(round).unwrap();
        }

        round.slots[self.rank] = Some(Box::new(value));
        round.arrived += 1;
        if round.arrived == shared.size {
            let gathered: Vec<T> = round
                .slots
                .iter_mut()
                .map(|slot| *slot.take().unwrap().downcast::<T>().unwrap())
                .collect();
            round.published = Some(Box::new(gathered));
            shared.all_present.notify_all();
        } else {
            while round.published.is_none() {
                round = shared.all_present.wait(round).unwrap();
            }
        }

        let result = round
            .published
            .as_ref()
            .unwrap()
            .downcast_ref::<Vec<T>>()
            .unwrap()
            .clone();

        round.departed += 1;
        if round.departed == shared.size {
            round.published = None;
            round.arrived = 0;
            round.departed = 0;
            shared.all_present.notify_all();
        }
        result
    }
}

impl GroupComm for LocalGroup {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn reduce_sum<T>(&self, value: T) -> T
    where
        T: GroupData + Zero + Add<Output = T>,
    {
        // Summing the gathered values in rank order gives every member a
        // bit-identical total.
        self.rendezvous(value)
            .into_iter()
            .fold(T::zero(), |total, term| total + term)
    }

    fn all_gather<T: GroupData>(&self, value: T) -> Vec<T> {
        self.rendezvous(value)
    }

    fn all_gather_varcount<T: GroupData>(&self, arr: &[T]) -> Vec<T> {
        self.rendezvous(arr.to_vec()).concat()
    }

    fn exchange<T: GroupData>(&self, outgoing: &BTreeMap<usize, Vec<T>>) -> BTreeMap<usize, Vec<T>> {
        let all = self.rendezvous(outgoing.clone());
        let mut incoming = BTreeMap::new();
        for (source, queue) in all.into_iter().enumerate() {
            if let Some(items) = queue.get(&self.rank) {
                if !items.is_empty() {
                    incoming.insert(source, items.clone());
                }
            }
        }
        incoming
    }

    fn duplicate(&self) -> Self {
        let fresh = (self.rank == 0).then(|| Arc::new(Shared::new(self.size())));
        let shared = self.rendezvous(fresh)[0].clone().unwrap();
        LocalGroup {
            shared,
            rank: self.rank,
        }
    }

    fn split(self, color: usize) -> Self {
        let colors = self.rendezvous(color);
        let members: Vec<usize> = (0..self.size())
            .filter(|&rank| colors[rank] == color)
            .collect();
        let new_rank = members.iter().position(|&rank| rank == self.rank).unwrap();
        // The lowest-ranked member of each color allocates the subgroup
        // state and shares it through a second rendezvous.
        let leader = members[0];
        let fresh = (self.rank == leader).then(|| Arc::new(Shared::new(members.len())));
        let shared = self.rendezvous(fresh)[leader].clone().unwrap();
        LocalGroup {
            shared,
            rank: new_rank,
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use super::LocalGroup;
    use crate::group::GroupComm;

    #[test]
    fn gather_orders_by_rank() {
        let results = LocalGroup::run(4, |group| group.all_gather(group.rank() * 10));
        for gathered in results {
            assert_eq!(gathered, vec![0, 10, 20, 30]);
        }
    }

    #[test]
    fn reduce_sum_is_identical_everywhere() {
        let results = LocalGroup::run(3, |group| group.reduce_sum((group.rank() + 1) as f64));
        assert_eq!(results, vec![6.0, 6.0, 6.0]);
    }

    #[test]
    fn reduce_max_picks_the_group_maximum() {
        let results = LocalGroup::run(4, |group| group.reduce_max((group.rank() * 7) as f64));
        assert_eq!(results, vec![21.0; 4]);
    }

    #[test]
    fn varcount_gather_concatenates() {
        let results = LocalGroup::run(3, |group| {
            let contribution = vec![group.rank(); group.rank()];
            group.all_gather_varcount(&contribution)
        });
        for gathered in results {
            assert_eq!(gathered, vec![1, 2, 2]);
        }
    }

    #[test]
    fn exchange_routes_payloads() {
        let results = LocalGroup::run(2, |group| {
            let peer = 1 - group.rank();
            let mut outgoing = BTreeMap::new();
            outgoing.insert(peer, vec![group.rank() as u64; 2]);
            group.exchange(&outgoing)
        });
        assert_eq!(results[0][&1], vec![1, 1]);
        assert_eq!(results[1][&0], vec![0, 0]);
    }

    #[test]
    fn split_renumbers_members() {
        let results = LocalGroup::run(4, |group| {
            let color = if group.rank() < 2 { 0 } else { 1 };
            let sub = group.split(color);
            (sub.rank(), sub.size(), sub.reduce_sum(1usize))
        });
        assert_eq!(results, vec![(0, 2, 2), (1, 2, 2), (0, 2, 2), (1, 2, 2)]);
    }

    #[test]
    fn duplicate_is_independent_of_the_original() {
        let results = LocalGroup::run(2, |group| {
            let copy = group.duplicate();
            let on_copy = copy.all_gather(group.rank());
            let on_original = group.all_gather(group.rank());
            (on_copy, on_original)
        });
        for (on_copy, on_original) in results {
            assert_eq!(on_copy, vec![0, 1]);
            assert_eq!(on_original, vec![0, 1]);
        }
    }

    #[test]
    fn consecutive_collectives_do_not_interleave() {
        let results = LocalGroup::run(3, |group| {
            let mut sums = Vec::new();
            for round in 0..50 {
                sums.push(group.reduce_sum(group.rank() + round));
            }
            sums
        });
        let expected: Vec<usize> = (0..50).map(|round| 3 + 3 * round).collect();
        for sums in results {
            assert_eq!(sums, expected);
        }
    }
}
