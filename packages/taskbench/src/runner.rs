use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::{Error, Phase, Result, Task, TestingMode};

/// Drives a [`Task`] through its phases while checking that they are called in the right order.
///
/// A task on its own trusts the driver to call its phases in order. The runner makes that
/// contract checkable: each phase method returns [`Error::PhaseOrder`] instead of calling into
/// the task when the call would break the lifecycle, and refuses to proceed past a
/// `validation()` that returned `false`.
///
/// The accepted call sequence is the pipeline `validation` → `pre_processing` → `run` →
/// `post_processing`, repeated any number of times. `validation` may be repeated before
/// `pre_processing` and `run` may be repeated before `post_processing`.
///
/// When the task data is in [`TestingMode::Functional`], the time from the start of
/// `pre_processing` to the end of `post_processing` must not exceed the functional time limit
/// (by default [`TaskRunner::MAX_FUNCTIONAL_TIME`]).
///
/// # Examples
///
/// ```ignore
/// let mut runner = TaskRunner::new(&mut task);
///
/// assert!(runner.validation()?);
/// assert!(runner.pre_processing()?);
/// assert!(runner.run()?);
/// assert!(runner.post_processing()?);
/// ```
#[derive(Debug)]
pub struct TaskRunner<'t> {
    task: &'t mut dyn Task,

    /// The most recently called phase, if any.
    last: Option<Phase>,

    /// Result of the most recent `validation()` call.
    validated: bool,

    functional_time_limit: Duration,
    started: Option<Instant>,
}

impl<'t> TaskRunner<'t> {
    /// The longest a functional run may take from `pre_processing` to `post_processing`.
    pub const MAX_FUNCTIONAL_TIME: Duration = Duration::from_secs(1);

    /// Creates a runner for a task whose phases have not been called yet.
    #[must_use]
    pub fn new(task: &'t mut dyn Task) -> Self {
        Self {
            task,
            last: None,
            validated: false,
            functional_time_limit: Self::MAX_FUNCTIONAL_TIME,
            started: None,
        }
    }

    /// Overrides the functional time limit.
    #[must_use]
    pub fn functional_time_limit(self, limit: Duration) -> Self {
        Self {
            functional_time_limit: limit,
            ..self
        }
    }

    /// Calls [`Task::validation`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::PhaseOrder`] if validation cannot be called at this point.
    pub fn validation(&mut self) -> Result<bool> {
        self.enter(Phase::Validation)?;

        let valid = self.task.validation();
        self.validated = valid;
        Ok(log_outcome(Phase::Validation, valid))
    }

    /// Calls [`Task::pre_processing`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::PhaseOrder`] if pre-processing cannot be called at this point and
    /// [`Error::PhaseFailed`] if the preceding validation returned `false`.
    pub fn pre_processing(&mut self) -> Result<bool> {
        self.enter(Phase::PreProcessing)?;

        self.started = Some(Instant::now());
        let ok = self.task.pre_processing();
        Ok(log_outcome(Phase::PreProcessing, ok))
    }

    /// Calls [`Task::run`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::PhaseOrder`] if run cannot be called at this point.
    pub fn run(&mut self) -> Result<bool> {
        self.enter(Phase::Run)?;

        let ok = self.task.run();
        Ok(log_outcome(Phase::Run, ok))
    }

    /// Calls [`Task::post_processing`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::PhaseOrder`] if post-processing cannot be called at this point and
    /// [`Error::FunctionalTimeLimit`] if a functional run took longer than permitted.
    pub fn post_processing(&mut self) -> Result<bool> {
        self.enter(Phase::PostProcessing)?;

        let ok = self.task.post_processing();
        let ok = log_outcome(Phase::PostProcessing, ok);

        if let Some(started) = self.started.take() {
            let elapsed = started.elapsed();
            let mode = self.task.task_data().lock().testing_mode();

            if mode == TestingMode::Functional && elapsed > self.functional_time_limit {
                return Err(Error::FunctionalTimeLimit {
                    elapsed,
                    limit: self.functional_time_limit,
                });
            }
        }

        Ok(ok)
    }

    /// Calls the given phase.
    ///
    /// # Errors
    ///
    /// See the method for the individual phase.
    pub fn call(&mut self, phase: Phase) -> Result<bool> {
        match phase {
            Phase::Validation => self.validation(),
            Phase::PreProcessing => self.pre_processing(),
            Phase::Run => self.run(),
            Phase::PostProcessing => self.post_processing(),
        }
    }

    /// Runs all four phases once, stopping at the first one that fails.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PhaseFailed`] naming the first phase that returned `false`, or any error
    /// from the individual phase methods.
    pub fn execute(&mut self) -> Result<()> {
        for phase in Phase::PIPELINE {
            if !self.call(phase)? {
                return Err(Error::PhaseFailed(phase));
            }
        }

        Ok(())
    }

    /// The most recently called phase, if any.
    #[must_use]
    pub fn last_phase(&self) -> Option<Phase> {
        self.last
    }

    fn enter(&mut self, phase: Phase) -> Result<()> {
        let permitted = match (self.last, phase) {
            (None | Some(Phase::PostProcessing), Phase::Validation)
            | (Some(Phase::Validation), Phase::Validation | Phase::PreProcessing)
            | (Some(Phase::PreProcessing), Phase::Run)
            | (Some(Phase::Run), Phase::Run | Phase::PostProcessing) => true,
            _ => false,
        };

        if !permitted {
            let expected = self.last.map_or(Phase::Validation, Phase::next);
            debug!(%expected, actual = %phase, "phase called out of order");
            return Err(Error::PhaseOrder {
                expected,
                actual: phase,
            });
        }

        if phase == Phase::PreProcessing && !self.validated {
            return Err(Error::PhaseFailed(Phase::Validation));
        }

        trace!(%phase, "entering phase");
        self.last = Some(phase);
        Ok(())
    }
}

#[cfg_attr(test, mutants::skip)] // Only logs.
fn log_outcome(phase: Phase, ok: bool) -> bool {
    if ok {
        trace!(%phase, "phase succeeded");
    } else {
        debug!(%phase, "phase reported failure");
    }

    ok
}
