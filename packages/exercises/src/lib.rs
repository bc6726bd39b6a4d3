#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Reference tasks for the taskbench harness.
//!
//! Each exercise comes as a pair: a sequential [`Task`](taskbench::Task) and a distributed one
//! that splits the same computation across the ranks of a [`rank_comm::World`]. Both variants
//! read the same [`TaskData`](taskbench::TaskData) shape and write the same outputs, so the
//! distributed variant can be checked against the sequential one.
//!
//! The exercises are:
//! - [`MismatchCount`] / [`DistributedMismatchCount`] - Weighted count of differing characters
//! - [`BroadcastMax`] / [`DistributedBroadcastMax`] - Distributes a vector and finds its maximum
//! - [`Trapezoid`] / [`DistributedTrapezoid`] - Composite trapezoid rule over a fixed integrand
//!
//! Distributed variants take the [`Communicator`](rank_comm::Communicator) of the rank they
//! run on. Unless documented otherwise, only the root rank needs inputs and outputs; the other
//! ranks pass empty task data and report success from phases that have nothing to do.
//!
//! # Example
//!
//! ```
//! use exercises::DistributedMismatchCount;
//! use new_zealand::nz;
//! use rank_comm::World;
//! use taskbench::{SharedTaskData, TaskData, TaskRunner};
//!
//! let counts = World::new(nz!(2)).run(|comm| {
//!     let data = if comm.is_root() {
//!         TaskData::new()
//!             .with_input(b"abc".to_vec())
//!             .with_input(b"abd".to_vec())
//!             .with_output(vec![0_i32])
//!     } else {
//!         TaskData::new()
//!     };
//!     let data = SharedTaskData::new(data);
//!
//!     let mut task = DistributedMismatchCount::new(data.clone(), comm);
//!     TaskRunner::new(&mut task).execute().unwrap();
//!
//!     data.snapshot()
//! });
//!
//! assert_eq!(counts[0].output::<i32>(0).unwrap(), [2]);
//! ```

use rank_comm::Communicator;
use tracing::warn;

mod broadcast_max;
mod mismatch_count;
mod trapezoid;

pub use broadcast_max::*;
pub use mismatch_count::*;
pub use trapezoid::*;

/// Turns the outcome of a message exchange inside a phase into an `Option`, logging failures.
///
/// Phases report failure as `false`, so the error itself would otherwise be lost.
fn exchanged<T>(comm: &Communicator, outcome: rank_comm::Result<T>) -> Option<T> {
    match outcome {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(rank = comm.rank(), %error, "message exchange failed");
            None
        }
    }
}
