use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when exchanging messages between ranks.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A rank index was not smaller than the number of ranks.
    #[error("rank {rank} is out of range for a world of {size} ranks")]
    RankOutOfRange {
        /// The offending rank index.
        rank: usize,

        /// The number of ranks in the world.
        size: usize,
    },

    /// The expected peer no longer exists, so the message can never arrive or be delivered.
    #[error("rank {peer} has disconnected")]
    Disconnected {
        /// The rank that was being communicated with.
        peer: usize,
    },

    /// Another rank panicked while this rank was waiting for a message.
    #[error("another rank failed while waiting for a message from rank {peer}")]
    PeerFailed {
        /// The rank that was being waited for.
        peer: usize,
    },

    /// No matching message arrived within the configured receive timeout.
    #[error("no message from rank {peer} arrived within {after:?}")]
    Timeout {
        /// The rank that was being waited for.
        peer: usize,

        /// The configured receive timeout.
        after: Duration,
    },

    /// A message arrived but carried a different type than the receiver expected.
    #[error("message from rank {peer} is not of the expected type {expected}")]
    PayloadTypeMismatch {
        /// The rank that sent the message.
        peer: usize,

        /// Name of the type the receiver asked for.
        expected: &'static str,
    },

    /// The number of values or chunks supplied does not fit the operation.
    #[error("expected {expected} items but got {actual}")]
    CountMismatch {
        /// How many items the operation needs.
        expected: usize,

        /// How many items were supplied.
        actual: usize,
    },

    /// The root of a collective operation did not supply the value to distribute.
    #[error("root rank {root} did not supply a value to distribute")]
    MissingRootValue {
        /// The root rank of the operation.
        root: usize,
    },
}

/// A specialized `Result` type for message passing operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
