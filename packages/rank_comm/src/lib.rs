#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! In-process message passing between cooperating ranks.
//!
//! Distributed task variants are written against a message-passing contract: point-to-point
//! send and receive between two ranks plus collective operations (broadcast, scatter, gather,
//! reduce, barrier) across all ranks. This package implements that contract inside a single
//! process, running each rank on its own thread, so distributed tasks can be exercised and
//! compared against their sequential counterparts in ordinary tests.
//!
//! The core functionality includes:
//! - [`World`] - Launches a fixed number of ranks and collects their results
//! - [`Communicator`] - The identity of one rank plus its access to the message channels
//! - [`partition_counts()`] - Splits a number of elements as evenly as possible between ranks
//!
//! # Delivery guarantees
//!
//! A message is delivered exactly once. Messages between one pair of ranks are received in the
//! order they were sent. Receiving is selective: a message with a different source or tag than
//! the one requested is held back until someone asks for it.
//!
//! Collective operations must be called by every rank, in the same order. No rank observes the
//! result of a collective before every rank has entered it.
//!
//! All operations block the calling rank until they complete. By default a receive waits
//! forever; [`WorldBuilder::recv_timeout()`] turns a hung receive into [`Error::Timeout`].
//! If any rank panics, ranks blocked waiting for it fail with [`Error::PeerFailed`] instead of
//! hanging. Waiting for a message from a rank that has returned without sending it fails with
//! [`Error::Disconnected`].
//!
//! # Example
//!
//! ```
//! use new_zealand::nz;
//! use rank_comm::World;
//!
//! let world = World::new(nz!(4));
//!
//! let sums = world.run(|comm| {
//!     let local = comm.rank() + 1;
//!     comm.reduce(local, |a, b| a + b, 0).unwrap()
//! });
//!
//! // Only the root receives the combined value.
//! assert_eq!(sums, [Some(10), None, None, None]);
//! ```

mod communicator;
mod envelope;
mod error;
mod partition;
mod world;

pub use communicator::*;
pub(crate) use envelope::*;
pub use error::*;
pub use partition::*;
pub use world::*;
