use std::fmt;
use std::num::NonZero;

use derive_more::Display;

use crate::{Error, Result};

/// Which part of the task lifecycle a [`PerfResults`] measured.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum RunKind {
    /// All four phases, repeated together.
    #[display("pipeline")]
    Pipeline,

    /// Only `run()`, repeated between one untimed preparation and one untimed finalization.
    #[display("task_run")]
    TaskRun,
}

/// The outcome of a performance measurement performed by [`Perf`](crate::Perf).
///
/// Holds the mean elapsed time of one repetition of the measured work. A measurement whose time
/// exceeds [`PerfResults::MAX_TIME`] is a failure that the driver must surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerfResults {
    time_sec: f64,
    kind: RunKind,
    num_running: NonZero<u32>,
}

impl PerfResults {
    /// The ceiling, in seconds, that a measured time must not exceed.
    pub const MAX_TIME: f64 = 10.0;

    pub(crate) fn new(time_sec: f64, kind: RunKind, num_running: NonZero<u32>) -> Self {
        Self {
            time_sec,
            kind,
            num_running,
        }
    }

    /// Mean seconds taken by one repetition of the measured work.
    #[must_use]
    pub fn time_sec(&self) -> f64 {
        self.time_sec
    }

    /// Which part of the task lifecycle was measured.
    #[must_use]
    pub fn kind(&self) -> RunKind {
        self.kind
    }

    /// How many repetitions the mean was computed over.
    #[must_use]
    pub fn num_running(&self) -> NonZero<u32> {
        self.num_running
    }

    /// Whether the measured time is over [`PerfResults::MAX_TIME`].
    ///
    /// A time that is not a number counts as over the ceiling.
    #[must_use]
    pub fn exceeds_max_time(&self) -> bool {
        self.time_sec.is_nan() || self.time_sec > Self::MAX_TIME
    }

    /// Checks the measured time against [`PerfResults::MAX_TIME`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::TooSlow`] if the measured time exceeds the ceiling.
    pub fn check(&self) -> Result<()> {
        if self.exceeds_max_time() {
            return Err(Error::TooSlow {
                elapsed: self.time_sec,
                limit: Self::MAX_TIME,
            });
        }

        Ok(())
    }
}

impl fmt::Display for PerfResults {
    /// Formats as `<kind>:<seconds>` with ten decimals. A result over the ceiling reports `-1`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let time_sec = if self.exceeds_max_time() {
            -1.0
        } else {
            self.time_sec
        };

        write!(f, "{}:{time_sec:.10}", self.kind)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use new_zealand::nz;

    use super::*;

    #[test]
    fn within_ceiling_passes() {
        let results = PerfResults::new(0.25, RunKind::Pipeline, nz!(4));

        assert!(!results.exceeds_max_time());
        results.check().unwrap();
    }

    #[test]
    fn exactly_at_ceiling_passes() {
        let results = PerfResults::new(PerfResults::MAX_TIME, RunKind::TaskRun, nz!(1));

        results.check().unwrap();
    }

    #[test]
    fn over_ceiling_fails() {
        let results = PerfResults::new(12.5, RunKind::TaskRun, nz!(1));

        assert!(results.exceeds_max_time());
        assert!(matches!(results.check(), Err(Error::TooSlow { .. })));
    }

    #[test]
    fn nan_time_fails() {
        let results = PerfResults::new(f64::NAN, RunKind::Pipeline, nz!(3));

        assert!(results.exceeds_max_time());
        assert!(matches!(results.check(), Err(Error::TooSlow { .. })));
        assert_eq!(results.to_string(), "pipeline:-1.0000000000");
    }

    #[test]
    fn infinite_time_fails() {
        let results = PerfResults::new(f64::INFINITY, RunKind::TaskRun, nz!(1));

        assert!(results.exceeds_max_time());
        assert!(results.check().is_err());
    }

    #[test]
    fn display_has_kind_and_fixed_decimals() {
        let results = PerfResults::new(0.125, RunKind::TaskRun, nz!(8));

        assert_eq!(results.to_string(), "task_run:0.1250000000");
    }

    #[test]
    fn display_reports_minus_one_when_too_slow() {
        let results = PerfResults::new(11.0, RunKind::Pipeline, nz!(8));

        assert_eq!(results.to_string(), "pipeline:-1.0000000000");
    }
}
