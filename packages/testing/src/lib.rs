#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))] // This is all test code, no need to test it.

//! Private helpers for testing tasks and the harness in taskbench packages.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Runs a test with a timeout to prevent infinite hangs.
///
/// Distributed tasks block on their peers, so a task that forgets to post a matching receive
/// hangs forever instead of failing. Wrapping such tests in a watchdog turns the hang into a
/// test failure after 10 seconds (60 seconds under Miri).
///
/// When the `MUTATION_TESTING` environment variable is set to "1", the watchdog
/// is disabled and the test function is executed directly. This allows mutation
/// testing to properly detect hanging mutations.
///
/// # Panics
///
/// Panics if the test exceeds the timeout (when not in mutation testing mode).
///
/// # Example
///
/// ```rust
/// use testing::with_watchdog;
///
/// with_watchdog(|| {
///     assert_eq!(2 + 2, 4);
/// });
/// ```
pub fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if std::env::var("MUTATION_TESTING").as_deref() == Ok("1") {
        return test_fn();
    }

    let timeout = if cfg!(miri) {
        Duration::from_secs(60)
    } else {
        Duration::from_secs(10)
    };

    let (tx, rx) = mpsc::channel();

    let test_handle = thread::spawn(move || {
        let result = test_fn();
        // If this fails, the receiver has already timed out.
        drop(tx.send(result));
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            test_handle.join().expect("test thread should not panic");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!("test exceeded {timeout:?} timeout");
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => match test_handle.join() {
            Ok(()) => panic!("test thread disconnected unexpectedly"),
            Err(e) => std::panic::resume_unwind(e),
        },
    }
}

/// Whether two floating point values differ by no more than `tolerance`.
#[must_use]
pub fn within_tolerance(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

/// Asserts that two floating point slices have the same length and pairwise differ by no
/// more than `tolerance`.
///
/// # Panics
///
/// Panics with the first offending index if the slices are not close.
pub fn assert_all_close(actual: &[f64], expected: &[f64], tolerance: f64) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "length mismatch: {actual:?} vs {expected:?}"
    );

    for (index, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            within_tolerance(*a, *e, tolerance),
            "value at index {index} differs by more than {tolerance}: {a} vs {e}"
        );
    }
}

/// A fake timer probe that replays a fixed script of readings.
///
/// Each call to the probe returns the next scripted reading in seconds. Once the script is
/// exhausted the last reading is repeated, like a clock that stopped. Clones share the script.
///
/// # Example
///
/// ```rust
/// use testing::ScriptedTimer;
///
/// let timer = ScriptedTimer::new([1.0, 4.0]);
/// let probe = timer.probe();
///
/// assert_eq!(probe(), 1.0);
/// assert_eq!(probe(), 4.0);
/// assert_eq!(probe(), 4.0);
/// assert_eq!(timer.samples_taken(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct ScriptedTimer {
    state: Rc<RefCell<ScriptState>>,
}

#[derive(Debug)]
struct ScriptState {
    remaining: VecDeque<f64>,
    last: f64,
    samples_taken: usize,
}

impl ScriptedTimer {
    /// Creates a timer that replays `readings` in order.
    #[must_use]
    pub fn new(readings: impl IntoIterator<Item = f64>) -> Self {
        Self {
            state: Rc::new(RefCell::new(ScriptState {
                remaining: readings.into_iter().collect(),
                last: 0.0,
                samples_taken: 0,
            })),
        }
    }

    /// Returns a probe closure suitable for `PerfAttr::current_timer()`.
    pub fn probe(&self) -> impl Fn() -> f64 + 'static {
        let state = Rc::clone(&self.state);

        move || {
            let mut state = state.borrow_mut();
            state.samples_taken = state.samples_taken.wrapping_add(1);

            if let Some(next) = state.remaining.pop_front() {
                state.last = next;
            }

            state.last
        }
    }

    /// How many times any probe of this timer has been sampled.
    #[must_use]
    pub fn samples_taken(&self) -> usize {
        self.state.borrow().samples_taken
    }
}
