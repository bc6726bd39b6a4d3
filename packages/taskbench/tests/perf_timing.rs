//! Timing behavior of `Perf` against a real task and scripted timer probes.

use std::hint::black_box;

use new_zealand::nz;
use taskbench::{
    Error, Perf, PerfAttr, PerfResults, RunKind, SharedTaskData, Task, TaskData, TaskRunner,
};
use testing::{ScriptedTimer, within_tolerance};

/// Sums the squares of its `u64` input into a single `u64` output.
#[derive(Debug)]
struct SumOfSquares {
    data: SharedTaskData,
    values: Vec<u64>,
    total: u64,
}

impl SumOfSquares {
    fn new(data: SharedTaskData) -> Self {
        Self {
            data,
            values: Vec::new(),
            total: 0,
        }
    }
}

impl Task for SumOfSquares {
    fn validation(&self) -> bool {
        let data = self.data.lock();
        data.input::<u64>(0).is_ok_and(|values| !values.is_empty())
            && data.output::<u64>(0).is_ok_and(|out| out.len() == 1)
    }

    fn pre_processing(&mut self) -> bool {
        match self.data.lock().input::<u64>(0) {
            Ok(values) => {
                self.values = values.to_vec();
                true
            }
            Err(_) => false,
        }
    }

    fn run(&mut self) -> bool {
        self.total = self
            .values
            .iter()
            .fold(0_u64, |acc, v| acc.wrapping_add(black_box(v.wrapping_mul(*v))));
        true
    }

    fn post_processing(&mut self) -> bool {
        match self.data.lock().output_mut::<u64>(0) {
            Ok([out]) => {
                *out = self.total;
                true
            }
            _ => false,
        }
    }

    fn task_data(&self) -> &SharedTaskData {
        &self.data
    }
}

fn scenario(len: u64) -> SharedTaskData {
    SharedTaskData::new(
        TaskData::new()
            .with_input((1..=len).collect::<Vec<_>>())
            .with_output(vec![0_u64]),
    )
}

#[test]
fn functional_run_produces_result() {
    let data = scenario(4);
    let mut task = SumOfSquares::new(data.clone());

    let mut runner = TaskRunner::new(&mut task);
    assert!(runner.validation().unwrap());
    assert!(runner.validation().unwrap());
    assert!(runner.pre_processing().unwrap());
    assert!(runner.run().unwrap());
    assert!(runner.post_processing().unwrap());

    assert_eq!(data.lock().output::<u64>(0).unwrap(), [30]);
}

#[test]
fn pipeline_run_is_non_negative_and_within_ceiling() {
    let data = scenario(10_000);
    let mut task = SumOfSquares::new(data.clone());

    let results = Perf::new(&mut task)
        .pipeline_run(&PerfAttr::new().num_running(nz!(5)))
        .unwrap();

    assert!(results.time_sec() >= 0.0);
    assert!(results.time_sec() <= PerfResults::MAX_TIME);
    assert_eq!(results.kind(), RunKind::Pipeline);
    Perf::print_perf_statistic(&results).unwrap();

    // The pipeline also wrote the result back on every repetition.
    let expected: u64 = (1..=10_000_u64).map(|v| v * v).sum();
    assert_eq!(data.lock().output::<u64>(0).unwrap(), [expected]);
}

#[test]
fn task_run_writes_result_once_after_timing() {
    let data = scenario(100);
    let mut task = SumOfSquares::new(data.clone());

    let results = Perf::new(&mut task)
        .task_run(&PerfAttr::new().num_running(nz!(3)))
        .unwrap();

    assert_eq!(results.kind(), RunKind::TaskRun);
    assert!(results.time_sec() >= 0.0);

    let expected: u64 = (1..=100_u64).map(|v| v * v).sum();
    assert_eq!(data.lock().output::<u64>(0).unwrap(), [expected]);
}

#[test]
fn doubling_repeats_halves_reported_time() {
    let mut reported = Vec::new();

    for runs in [nz!(4_u32), nz!(8_u32)] {
        let timer = ScriptedTimer::new([2.0, 10.0]);
        let mut task = SumOfSquares::new(scenario(8));

        let results = Perf::new(&mut task)
            .pipeline_run(&PerfAttr::new().num_running(runs).current_timer(timer.probe()))
            .unwrap();

        assert_eq!(timer.samples_taken(), 2);
        reported.push(results.time_sec());
    }

    assert!(within_tolerance(reported[0], 2.0, 1e-12));
    assert!(within_tolerance(reported[1], 1.0, 1e-12));
}

#[test]
fn time_over_ceiling_fails_the_report() {
    let timer = ScriptedTimer::new([0.0, PerfResults::MAX_TIME * 3.0]);
    let mut task = SumOfSquares::new(scenario(8));

    let results = Perf::new(&mut task)
        .task_run(&PerfAttr::new().num_running(nz!(2)).current_timer(timer.probe()))
        .unwrap();

    assert!(results.exceeds_max_time());
    assert_eq!(
        Perf::format_perf_statistic(&results),
        "task_run:-1.0000000000"
    );
    assert!(matches!(
        Perf::print_perf_statistic(&results),
        Err(Error::TooSlow { .. })
    ));
}

#[test]
fn empty_input_is_rejected_before_measuring() {
    let data = SharedTaskData::new(
        TaskData::new()
            .with_input(Vec::<u64>::new())
            .with_output(vec![0_u64]),
    );
    let mut task = SumOfSquares::new(data);

    assert!(!task.validation());

    let error = Perf::new(&mut task)
        .pipeline_run(&PerfAttr::new())
        .unwrap_err();
    assert!(matches!(error, Error::PhaseFailed(_)));
}
