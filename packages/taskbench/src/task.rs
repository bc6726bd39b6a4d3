use std::fmt;

use derive_more::Display;

use crate::SharedTaskData;

/// A unit of computation driven through four phases.
///
/// Every algorithm variant (sequential or distributed) implements this trait once. Drivers and
/// [`Perf`](crate::Perf) only see `dyn Task` and are oblivious to what a task computes.
///
/// # Lifecycle
///
/// For a given input the phases are called in the fixed order
/// `validation` → `pre_processing` → `run` → `post_processing`. `validation` may be called
/// repeatedly and before anything else; it cannot mutate the task. `run` may be called
/// repeatedly between `pre_processing` and `post_processing`, each call recomputing the result
/// from the prepared working state.
///
/// Each phase returns `false` to tell the driver to abort the scenario. Ordinary edge cases such
/// as empty input are rejected by `validation` rather than by panicking in a later phase. The
/// driver must not call later phases after `validation` returned `false`.
///
/// # Construction
///
/// By convention each implementation has a `new()` taking the [`SharedTaskData`] it works on.
/// Distributed variants additionally take the communicator of the participant they run on.
pub trait Task: fmt::Debug {
    /// Inspects the task data and reports whether this task can process it.
    fn validation(&self) -> bool;

    /// Converts the raw input buffers into the working representation of the task.
    fn pre_processing(&mut self) -> bool;

    /// Performs the computation over the working representation.
    fn run(&mut self) -> bool;

    /// Writes the result into the output buffers of the task data.
    fn post_processing(&mut self) -> bool;

    /// The task data this task was constructed with.
    fn task_data(&self) -> &SharedTaskData;
}

/// One of the four phases of a [`Task`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Phase {
    /// [`Task::validation`].
    #[display("validation")]
    Validation,

    /// [`Task::pre_processing`].
    #[display("pre_processing")]
    PreProcessing,

    /// [`Task::run`].
    #[display("run")]
    Run,

    /// [`Task::post_processing`].
    #[display("post_processing")]
    PostProcessing,
}

impl Phase {
    /// All phases in the order they are called.
    pub const PIPELINE: [Self; 4] = [
        Self::Validation,
        Self::PreProcessing,
        Self::Run,
        Self::PostProcessing,
    ];

    /// The phase that follows this one in a pipeline, wrapping around after post-processing.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Validation => Self::PreProcessing,
            Self::PreProcessing => Self::Run,
            Self::Run => Self::PostProcessing,
            Self::PostProcessing => Self::Validation,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn next_walks_pipeline() {
        for pair in Phase::PIPELINE.windows(2) {
            assert_eq!(pair[0].next(), pair[1]);
        }

        assert_eq!(Phase::PostProcessing.next(), Phase::Validation);
    }

    #[test]
    fn display_uses_method_names() {
        let names: Vec<String> = Phase::PIPELINE.iter().map(ToString::to_string).collect();

        assert_eq!(
            names,
            ["validation", "pre_processing", "run", "post_processing"]
        );
    }
}
