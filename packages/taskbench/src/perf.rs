use std::num::NonZero;
use std::thread;

use tracing::{debug, warn};

use crate::{
    Phase, PerfAttr, PerfResults, Result, RunKind, SharedTaskData, Task, TaskRunner, TestingMode,
};

/// Measures how long a [`Task`] takes, averaged over repeated executions.
///
/// Two measurement policies are available:
///
/// * [`pipeline_run()`](Self::pipeline_run) times all four phases, repeated together.
/// * [`task_run()`](Self::task_run) times only `run()`, with the other phases called once
///   outside the timed region.
///
/// Either way the result is the mean time of one repetition, sampled with the timer probe of
/// the [`PerfAttr`]: once before the first repetition and once after the last.
///
/// A `Perf` measures exactly once. Both measurement methods consume it, so attempting a second
/// measurement with the same instance does not compile.
///
/// `Perf` does not assert that the phases succeed; that is for the driver to check separately.
/// Phases returning `false` are logged. Phases called in an order the lifecycle does not permit
/// (e.g. on a task whose phases were already partly driven) are reported as errors.
///
/// # Examples
///
/// ```ignore
/// let attr = PerfAttr::new().num_running(nz!(10));
///
/// let results = Perf::new(&mut task).pipeline_run(&attr)?;
/// Perf::print_perf_statistic(&results)?;
/// ```
#[derive(Debug)]
pub struct Perf<'t> {
    runner: TaskRunner<'t>,

    data: SharedTaskData,

    /// Restored on the task data when the analyzer is dropped.
    previous_mode: TestingMode,
}

impl<'t> Perf<'t> {
    /// Attaches the analyzer to a task whose phases have not been called yet.
    ///
    /// Switches the task data to [`TestingMode::Performance`], which lifts the functional time
    /// limit for the duration of the measurement. The previous mode is restored once the
    /// measurement has finished.
    #[must_use]
    pub fn new(task: &'t mut dyn Task) -> Self {
        let data = task.task_data().clone();
        let previous_mode = {
            let mut data = data.lock();
            let previous_mode = data.testing_mode();
            data.set_testing_mode(TestingMode::Performance);
            previous_mode
        };

        Self {
            runner: TaskRunner::new(task),
            data,
            previous_mode,
        }
    }

    /// Times all four phases, repeated `attr.run_count()` times.
    ///
    /// # Errors
    ///
    /// Returns an error if the phases cannot be driven in lifecycle order, including when
    /// `validation()` returned `false`.
    pub fn pipeline_run(mut self, attr: &PerfAttr<'_>) -> Result<PerfResults> {
        let runs = attr.run_count();

        let begin = attr.now();
        for _ in 0..runs.get() {
            for phase in Phase::PIPELINE {
                self.call(phase)?;
            }
        }
        let end = attr.now();

        Ok(conclude(begin, end, RunKind::Pipeline, runs))
    }

    /// Times only `run()`, repeated `attr.run_count()` times.
    ///
    /// `validation()` and `pre_processing()` are called once before the timed region and
    /// `post_processing()` once after it, so every repetition of `run()` starts from a legally
    /// prepared working state and the final result is written back.
    ///
    /// # Errors
    ///
    /// Returns an error if the phases cannot be driven in lifecycle order, including when
    /// `validation()` returned `false`.
    pub fn task_run(mut self, attr: &PerfAttr<'_>) -> Result<PerfResults> {
        let runs = attr.run_count();

        self.call(Phase::Validation)?;
        self.call(Phase::PreProcessing)?;

        let begin = attr.now();
        for _ in 0..runs.get() {
            self.call(Phase::Run)?;
        }
        let end = attr.now();

        self.call(Phase::PostProcessing)?;

        Ok(conclude(begin, end, RunKind::TaskRun, runs))
    }

    /// Formats the measured time for a human to read.
    ///
    /// The format is `<kind>:<seconds>` with ten decimals, e.g. `task_run:0.0012500000`.
    /// A result over [`PerfResults::MAX_TIME`] is reported as `-1`.
    #[must_use]
    pub fn format_perf_statistic(results: &PerfResults) -> String {
        results.to_string()
    }

    /// Prints the measured time to stdout and checks it against [`PerfResults::MAX_TIME`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::TooSlow`](crate::Error::TooSlow) if the measured time exceeds the
    /// ceiling. The line is printed either way.
    #[cfg_attr(test, mutants::skip)] // Output is not checked by tests.
    pub fn print_perf_statistic(results: &PerfResults) -> Result<()> {
        println!("{}", Self::format_perf_statistic(results));
        results.check()
    }

    fn call(&mut self, phase: Phase) -> Result<()> {
        if !self.runner.call(phase)? {
            warn!(%phase, "phase reported failure during performance measurement");
        }

        Ok(())
    }
}

impl Drop for Perf<'_> {
    fn drop(&mut self) {
        // A task that panicked may have poisoned the lock.
        if thread::panicking() {
            return;
        }

        self.data.lock().set_testing_mode(self.previous_mode);
    }
}

fn conclude(begin: f64, end: f64, kind: RunKind, runs: NonZero<u32>) -> PerfResults {
    let mut total = end - begin;

    if total < 0.0 {
        warn!(begin, end, "timer probe went backwards, treating elapsed time as zero");
        total = 0.0;
    } else if total.is_nan() {
        warn!(begin, end, "timer probe returned a value that is not a number");
    }

    let time_sec = total / f64::from(runs.get());
    debug!(%kind, runs = runs.get(), time_sec, "performance measurement complete");

    PerfResults::new(time_sec, kind, runs)
}
