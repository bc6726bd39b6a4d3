use std::num::NonZero;
use std::time::Instant;

use new_zealand::nz;

/// Configures a performance measurement performed by [`Perf`](crate::Perf).
///
/// Holds the number of times the measured work is repeated and the timer probe used to sample
/// elapsed time. The probe returns seconds since some fixed start instant and must never go
/// backwards. By default the probe counts from the moment the `PerfAttr` was created.
///
/// # Examples
///
/// ```
/// use std::time::Instant;
///
/// use new_zealand::nz;
/// use taskbench::PerfAttr;
///
/// let t0 = Instant::now();
///
/// let attr = PerfAttr::new()
///     .num_running(nz!(25))
///     .current_timer(move || t0.elapsed().as_secs_f64());
///
/// assert_eq!(attr.run_count().get(), 25);
/// assert!(attr.now() >= 0.0);
/// ```
#[derive(derive_more::Debug)]
#[must_use]
pub struct PerfAttr<'a> {
    num_running: NonZero<u32>,

    #[debug(ignore)]
    current_timer: Box<dyn Fn() -> f64 + 'a>,
}

impl<'a> PerfAttr<'a> {
    /// How many times the measured work is repeated unless configured otherwise.
    pub const DEFAULT_NUM_RUNNING: NonZero<u32> = nz!(10);

    /// Creates a configuration with the default repeat count and a monotonic timer starting now.
    pub fn new() -> Self {
        let start = Instant::now();

        Self {
            num_running: Self::DEFAULT_NUM_RUNNING,
            current_timer: Box::new(move || start.elapsed().as_secs_f64()),
        }
    }

    /// Sets how many times the measured work is repeated.
    #[cfg_attr(test, mutants::skip)] // All mutations are unviable - skip them to save time.
    pub fn num_running(self, n: NonZero<u32>) -> Self {
        Self {
            num_running: n,
            ..self
        }
    }

    /// Sets the timer probe, which returns elapsed seconds since a fixed start instant.
    pub fn current_timer<F>(self, f: F) -> Self
    where
        F: Fn() -> f64 + 'a,
    {
        Self {
            current_timer: Box::new(f),
            ..self
        }
    }

    /// How many times the measured work is repeated.
    #[must_use]
    pub fn run_count(&self) -> NonZero<u32> {
        self.num_running
    }

    /// Samples the timer probe.
    #[must_use]
    pub fn now(&self) -> f64 {
        (self.current_timer)()
    }
}

impl Default for PerfAttr<'_> {
    fn default() -> Self {
        Self::new()
    }
}
