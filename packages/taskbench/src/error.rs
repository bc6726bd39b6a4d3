use std::time::Duration;

use thiserror::Error;

use crate::{Direction, ElementType, Phase};

/// Errors reported by the task harness.
///
/// Phases of a [`Task`](crate::Task) signal ordinary failure by returning `false`. These errors
/// cover the conditions the harness itself detects around the phases: malformed buffer access,
/// phases driven in the wrong order and results that blow through a time limit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A task asked for a buffer index that the task data does not have.
    #[error("task data has no {direction} buffer at index {index} ({available} available)")]
    MissingBuffer {
        /// Whether an input or an output buffer was requested.
        direction: Direction,

        /// The requested index.
        index: usize,

        /// How many buffers of that direction exist.
        available: usize,
    },

    /// A task asked for a buffer as an element type other than the one it holds.
    #[error("{direction} buffer {index} holds {actual} elements but was accessed as {expected}")]
    ElementTypeMismatch {
        /// Whether an input or an output buffer was requested.
        direction: Direction,

        /// The requested index.
        index: usize,

        /// The element type the caller asked for.
        expected: ElementType,

        /// The element type the buffer actually holds.
        actual: ElementType,
    },

    /// A phase was called when the lifecycle expected a different one.
    #[error("order of phases is not right: expected {expected}, got {actual}")]
    PhaseOrder {
        /// The phase that should have been called next.
        expected: Phase,

        /// The phase that was called.
        actual: Phase,
    },

    /// A phase returned `false`, which stops the scenario.
    #[error("phase {0} reported failure")]
    PhaseFailed(Phase),

    /// A functional run (pre-processing through post-processing) took too long.
    #[error("task execute time needs to be less than {limit:?}, took {elapsed:?}")]
    FunctionalTimeLimit {
        /// How long the run took.
        elapsed: Duration,

        /// The maximum permitted duration.
        limit: Duration,
    },

    /// A performance measurement exceeded [`PerfResults::MAX_TIME`](crate::PerfResults::MAX_TIME).
    #[error("task execute time needs to be less than {limit} s, measured {elapsed} s")]
    TooSlow {
        /// The measured time in seconds.
        elapsed: f64,

        /// The ceiling in seconds.
        limit: f64,
    },
}

/// A specialized `Result` type for harness operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
