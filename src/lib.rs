//! Recursive coordinate bisection of distributed weighted point clouds.
//!
//! Given a point cloud spread arbitrarily over a group of cooperating
//! processes, [`partition::recursive_bisection`] produces one partition id
//! per point such that each partition holds an approximately equal share of
//! the total weight, and routes every id back to the process that
//! originally owned the point. [`serial::recursive_bisection_serial`] does
//! the same for a single-process cloud.
#![cfg_attr(feature = "strict", deny(warnings), deny(unused_crate_dependencies))]
#![warn(missing_docs)]

pub mod center;
pub mod constants;
pub mod geometry;
pub mod group;
pub mod jitter;
pub mod partition;
pub mod point_writer;
pub mod serial;
pub mod split;
pub mod types;
