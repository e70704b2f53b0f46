//! The MPI-backed group.

use std::collections::BTreeMap;
use std::ops::Add;

use mpi::collective::{SystemOperation, UserOperation};
use mpi::datatype::{Partition, PartitionMut};
use mpi::topology::{Color, SimpleCommunicator};
use mpi::traits::{Communicator, CommunicatorCollectives};
use num::traits::Zero;

use super::{GroupComm, GroupData};
use crate::geometry::Extent;

/// A process group backed by an owned MPI communicator.
///
/// The communicator is freed when the group is dropped, so the handle is
/// released on every exit path.
pub struct MpiGroup {
    comm: SimpleCommunicator,
}

impl MpiGroup {
    /// Derive a fresh group handle from an existing communicator.
    pub fn from_communicator<C: Communicator>(comm: &C) -> Self {
        // A single-color split clones the membership into an owned handle.
        Self {
            comm: comm.split_by_color(Color::with_value(0)).unwrap(),
        }
    }
}

/// Compute displacements from a vector of counts.
///
/// For counts `[3, 4, 5]` the displacements are `[0, 3, 7]`.
fn displacements(counts: &[i32]) -> Vec<i32> {
    counts
        .iter()
        .scan(0, |acc, &count| {
            let offset = *acc;
            *acc += count;
            Some(offset)
        })
        .collect()
}

impl GroupComm for MpiGroup {
    fn rank(&self) -> usize {
        self.comm.rank() as usize
    }

    fn size(&self) -> usize {
        self.comm.size() as usize
    }

    fn reduce_sum<T>(&self, value: T) -> T
    where
        T: GroupData + Zero + Add<Output = T>,
    {
        let mut total = T::zero();
        self.comm
            .all_reduce_into(&value, &mut total, SystemOperation::sum());
        total
    }

    fn reduce_max<T>(&self, value: T) -> T
    where
        T: GroupData + PartialOrd,
    {
        let mut maximum = value;
        self.comm.all_reduce_into(
            &value,
            &mut maximum,
            &UserOperation::commutative(|read, write| {
                let read: &[T] = read.downcast().unwrap();
                let write: &mut [T] = write.downcast().unwrap();
                for (&candidate, max) in read.iter().zip(write) {
                    if candidate > *max {
                        *max = candidate;
                    }
                }
            }),
        );
        maximum
    }

    fn all_gather<T: GroupData>(&self, value: T) -> Vec<T> {
        let size = self.size();
        let mut gathered = Vec::<T>::with_capacity(size);
        let buf: &mut [T] = unsafe { std::mem::transmute(gathered.spare_capacity_mut()) };
        self.comm.all_gather_into(&value, buf);
        unsafe { gathered.set_len(size) };
        gathered
    }

    fn all_gather_varcount<T: GroupData>(&self, arr: &[T]) -> Vec<T> {
        // First share the contribution sizes, then gather into a partition
        // laid out by the resulting displacements.
        let local_len = arr.len() as i32;
        let mut counts = vec![0; self.size()];
        self.comm.all_gather_into(&local_len, &mut counts[..]);

        let total = counts.iter().sum::<i32>() as usize;
        let mut gathered = Vec::<T>::with_capacity(total);
        let buf: &mut [T] = unsafe { std::mem::transmute(gathered.spare_capacity_mut()) };

        let displs = displacements(&counts);
        let mut partition = PartitionMut::new(buf, counts, &displs[..]);
        self.comm.all_gather_varcount_into(arr, &mut partition);

        unsafe { gathered.set_len(total) };
        gathered
    }

    fn exchange<T: GroupData>(&self, outgoing: &BTreeMap<usize, Vec<T>>) -> BTreeMap<usize, Vec<T>> {
        let size = self.size();

        let mut send_counts = vec![0; size];
        for (&destination, items) in outgoing {
            send_counts[destination] = items.len() as i32;
        }
        // Ascending map order matches the displacement layout.
        let send_buffer: Vec<T> = outgoing
            .values()
            .flat_map(|items| items.iter().copied())
            .collect();

        let mut recv_counts = vec![0; size];
        self.comm
            .all_to_all_into(&send_counts[..], &mut recv_counts[..]);

        let total = recv_counts.iter().sum::<i32>() as usize;
        let mut recv_buffer = Vec::<T>::with_capacity(total);
        let buf: &mut [T] = unsafe { std::mem::transmute(recv_buffer.spare_capacity_mut()) };

        let send_partition =
            Partition::new(&send_buffer[..], &send_counts[..], displacements(&send_counts));
        let mut recv_partition =
            PartitionMut::new(buf, &recv_counts[..], displacements(&recv_counts));
        self.comm
            .all_to_all_varcount_into(&send_partition, &mut recv_partition);
        unsafe { recv_buffer.set_len(total) };

        let mut incoming = BTreeMap::new();
        let mut offset = 0;
        for (source, &count) in recv_counts.iter().enumerate() {
            let count = count as usize;
            if count > 0 {
                incoming.insert(source, recv_buffer[offset..offset + count].to_vec());
            }
            offset += count;
        }
        incoming
    }

    fn duplicate(&self) -> Self {
        Self {
            comm: self.comm.split_by_color(Color::with_value(0)).unwrap(),
        }
    }

    fn split(self, color: usize) -> Self {
        let comm = self
            .comm
            .split_by_color(Color::with_value(color as i32))
            .unwrap();
        Self { comm }
    }

    fn reduce_bounding_box(&self, local: Extent) -> Extent {
        let mut global = local;
        self.comm.all_reduce_into(
            &local,
            &mut global,
            &UserOperation::commutative(|read, write| {
                let read: &[Extent] = read.downcast().unwrap();
                let write: &mut [Extent] = write.downcast().unwrap();
                for (contribution, union) in read.iter().zip(write) {
                    union.add_extent(contribution);
                }
            }),
        );
        global
    }
}
