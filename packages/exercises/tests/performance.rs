//! Measuring the exercises with `Perf`, sequentially and on every rank of a world.

use exercises::{DistributedTrapezoid, Trapezoid};
use new_zealand::nz;
use rank_comm::World;
use taskbench::{Perf, PerfAttr, PerfResults, RunKind, SharedTaskData, TaskData};
use testing::{ScriptedTimer, with_watchdog, within_tolerance};

fn integration_input(segments: u64) -> TaskData {
    TaskData::new()
        .with_input(vec![0.0_f64, 10.0])
        .with_input(vec![segments])
        .with_output(vec![0.0_f64])
}

#[test]
fn task_run_does_not_exceed_pipeline_run() {
    let attr = || PerfAttr::new().num_running(nz!(20));

    let mut pipeline = Trapezoid::new(SharedTaskData::new(integration_input(200_000)));
    let pipeline = Perf::new(&mut pipeline).pipeline_run(&attr()).unwrap();

    let mut task_only = Trapezoid::new(SharedTaskData::new(integration_input(200_000)));
    let task_only = Perf::new(&mut task_only).task_run(&attr()).unwrap();

    assert_eq!(pipeline.kind(), RunKind::Pipeline);
    assert_eq!(task_only.kind(), RunKind::TaskRun);
    assert!(pipeline.time_sec() >= 0.0);
    assert!(pipeline.time_sec() <= PerfResults::MAX_TIME);

    // Both measurements are dominated by the same integration; allow for scheduling noise.
    assert!(task_only.time_sec() <= pipeline.time_sec() * 1.5);

    Perf::print_perf_statistic(&pipeline).unwrap();
    Perf::print_perf_statistic(&task_only).unwrap();
}

#[test]
fn measured_task_still_writes_its_result() {
    let data = SharedTaskData::new(integration_input(1_000));
    let mut task = Trapezoid::new(data.clone());

    Perf::new(&mut task)
        .pipeline_run(&PerfAttr::new().num_running(nz!(3)))
        .unwrap();

    let integral = data.lock().output::<f64>(0).unwrap()[0];
    // 1000 / 3 + 10.
    assert!(within_tolerance(integral, 1_000.0 / 3.0 + 10.0, 1e-3));
}

#[test]
fn average_uses_scripted_timer() {
    let timer = ScriptedTimer::new([1.0, 3.5]);
    let mut task = Trapezoid::new(SharedTaskData::new(integration_input(10)));

    let results = Perf::new(&mut task)
        .task_run(&PerfAttr::new().num_running(nz!(5)).current_timer(timer.probe()))
        .unwrap();

    assert!(within_tolerance(results.time_sec(), 0.5, 1e-12));
    assert_eq!(Perf::format_perf_statistic(&results), "task_run:0.5000000000");
}

#[test]
fn distributed_task_is_measured_on_every_rank() {
    with_watchdog(|| {
        let results = World::new(nz!(3)).run(|comm| {
            let data = if comm.is_root() {
                integration_input(30_000)
            } else {
                TaskData::new()
            };
            let data = SharedTaskData::new(data);

            let mut task = DistributedTrapezoid::new(data.clone(), comm);
            let results = Perf::new(&mut task)
                .pipeline_run(&PerfAttr::new().num_running(nz!(4)))
                .unwrap();

            (results.time_sec(), data.snapshot())
        });

        for (time_sec, _) in &results {
            assert!(*time_sec >= 0.0);
            assert!(*time_sec <= PerfResults::MAX_TIME);
        }

        let integral = results[0].1.output::<f64>(0).unwrap()[0];
        assert!(within_tolerance(integral, 1_000.0 / 3.0 + 10.0, 1e-3));
    });
}
