use rank_comm::{Communicator, ROOT, partition_counts, partition_offsets};
use taskbench::{ElementType, SharedTaskData, Task, TaskData};

use crate::exchanged;

/// The function being integrated.
#[must_use]
pub fn integrand(x: f64) -> f64 {
    x.mul_add(x, 1.0)
}

/// Integration bounds and resolution, as read from the task inputs.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Interval {
    lower: f64,
    upper: f64,
    segments: u64,
}

impl Interval {
    fn width(&self) -> f64 {
        (self.upper - self.lower) / to_f64(self.segments)
    }

    /// Sums the trapezoids of the segments `first..first + count`.
    fn integrate_segments(&self, first: u64, count: u64) -> f64 {
        let width = self.width();
        let at = |segment: u64| width.mul_add(to_f64(segment), self.lower);

        let end = first.saturating_add(count);
        (first..end)
            .map(|segment| {
                let left = integrand(at(segment));
                let right = integrand(at(segment.saturating_add(1)));
                (left + right) * 0.5 * width
            })
            .sum()
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "segment counts beyond 2^53 are far outside any practical resolution"
)]
fn to_f64(value: u64) -> f64 {
    value as f64
}

/// Integrates `f(x) = x * x + 1` over `[a, b]` with the composite trapezoid rule.
///
/// Inputs: an `f64` buffer holding `[a, b]` and a `u64` buffer holding the number of segments
/// (count 1). Outputs: one `f64` buffer with a count of 1.
///
/// # Examples
///
/// ```
/// use exercises::Trapezoid;
/// use taskbench::{SharedTaskData, TaskData, TaskRunner};
///
/// let data = SharedTaskData::new(
///     TaskData::new()
///         .with_input(vec![0.0_f64, 3.0])
///         .with_input(vec![3_000_u64])
///         .with_output(vec![0.0_f64]),
/// );
///
/// let mut task = Trapezoid::new(data.clone());
/// TaskRunner::new(&mut task).execute().unwrap();
///
/// // The exact value is 12.
/// let integral = data.lock().output::<f64>(0).unwrap()[0];
/// assert!((integral - 12.0).abs() < 1e-5);
/// ```
#[derive(Debug)]
pub struct Trapezoid {
    data: SharedTaskData,
    interval: Option<Interval>,
    integral: f64,
}

impl Trapezoid {
    /// Creates the task over the given inputs and outputs.
    #[must_use]
    pub fn new(data: SharedTaskData) -> Self {
        Self {
            data,
            interval: None,
            integral: 0.0,
        }
    }
}

impl Task for Trapezoid {
    fn validation(&self) -> bool {
        has_valid_shape(&self.data.lock())
    }

    fn pre_processing(&mut self) -> bool {
        self.interval = read_interval(&self.data.lock());
        self.interval.is_some()
    }

    fn run(&mut self) -> bool {
        let Some(interval) = self.interval else {
            return false;
        };

        self.integral = interval.integrate_segments(0, interval.segments);
        true
    }

    fn post_processing(&mut self) -> bool {
        write_integral(&self.data, self.integral)
    }

    fn task_data(&self) -> &SharedTaskData {
        &self.data
    }
}

/// [`Trapezoid`] split across all ranks of a world.
///
/// Only the root rank needs inputs and outputs. The root broadcasts the interval, every rank
/// integrates a contiguous range of segments, and the partial sums are added up on the root.
#[derive(Debug)]
pub struct DistributedTrapezoid<'c> {
    data: SharedTaskData,
    comm: &'c Communicator,
    interval: Option<Interval>,
    integral: f64,
}

impl<'c> DistributedTrapezoid<'c> {
    /// Creates the task for the rank represented by `comm`.
    #[must_use]
    pub fn new(data: SharedTaskData, comm: &'c Communicator) -> Self {
        Self {
            data,
            comm,
            interval: None,
            integral: 0.0,
        }
    }

    fn integrate_distributed(&self) -> rank_comm::Result<Option<f64>> {
        let comm = self.comm;

        let interval = comm.broadcast(self.interval.filter(|_| comm.is_root()), ROOT)?;

        // Segment counts that do not fit in memory addressing are split as if they did; the
        // remainder still lands on the first ranks.
        let segments = usize::try_from(interval.segments).unwrap_or(usize::MAX);
        let counts = partition_counts(segments, comm.size());
        let offsets = partition_offsets(&counts);

        let rank = comm.rank();
        let partial = match (offsets.get(rank), counts.get(rank)) {
            (Some(first), Some(count)) => {
                interval.integrate_segments(to_u64(*first), to_u64(*count))
            }
            _ => 0.0,
        };

        comm.reduce(partial, |a, b| a + b, ROOT)
    }
}

impl Task for DistributedTrapezoid<'_> {
    fn validation(&self) -> bool {
        !self.comm.is_root() || has_valid_shape(&self.data.lock())
    }

    fn pre_processing(&mut self) -> bool {
        if !self.comm.is_root() {
            return true;
        }

        self.interval = read_interval(&self.data.lock());
        self.interval.is_some()
    }

    fn run(&mut self) -> bool {
        match exchanged(self.comm, self.integrate_distributed()) {
            Some(Some(integral)) => {
                self.integral = integral;
                true
            }
            Some(None) => true,
            None => false,
        }
    }

    fn post_processing(&mut self) -> bool {
        !self.comm.is_root() || write_integral(&self.data, self.integral)
    }

    fn task_data(&self) -> &SharedTaskData {
        &self.data
    }
}

fn to_u64(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

fn has_valid_shape(data: &TaskData) -> bool {
    data.inputs().len() == 2
        && data.input_element_type(0) == Some(ElementType::F64)
        && data.input_count(0) == Some(2)
        && data.input_element_type(1) == Some(ElementType::U64)
        && data.input_count(1) == Some(1)
        && data.outputs().len() == 1
        && data.output_element_type(0) == Some(ElementType::F64)
        && data.output_count(0) == Some(1)
        && read_interval(data).is_some()
}

fn read_interval(data: &TaskData) -> Option<Interval> {
    let &[lower, upper, ..] = data.input::<f64>(0).ok()? else {
        return None;
    };
    let &[segments, ..] = data.input::<u64>(1).ok()? else {
        return None;
    };

    (lower.is_finite() && upper.is_finite() && segments > 0).then_some(Interval {
        lower,
        upper,
        segments,
    })
}

fn write_integral(data: &SharedTaskData, integral: f64) -> bool {
    match data.lock().output_mut::<f64>(0) {
        Ok([out, ..]) => {
            *out = integral;
            true
        }
        _ => false,
    }
}
