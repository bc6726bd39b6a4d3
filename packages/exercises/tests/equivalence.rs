//! Sequential and distributed variants produce the same outputs for the same inputs.

use std::num::NonZero;

use exercises::{
    BroadcastMax, DistributedBroadcastMax, DistributedMismatchCount, DistributedTrapezoid,
    MismatchCount, Trapezoid,
};
use rank_comm::{Communicator, World};
use taskbench::{SharedTaskData, Task, TaskData, TaskRunner};
use testing::{assert_all_close, with_watchdog};

const RANK_COUNTS: [usize; 4] = [2, 3, 4, 7];

/// Drives a task through all phases, checking that validation is repeatable on the way.
fn drive(task: &mut dyn Task) {
    let first = task.validation();
    assert_eq!(task.validation(), first);
    assert!(first, "validation failed for {task:?}");

    let mut runner = TaskRunner::new(task);
    assert!(runner.validation().unwrap());
    assert!(runner.pre_processing().unwrap());
    assert!(runner.run().unwrap());
    assert!(runner.post_processing().unwrap());
}

fn run_sequential(data: TaskData, make: impl FnOnce(SharedTaskData) -> Box<dyn Task>) -> TaskData {
    let data = SharedTaskData::new(data);
    let mut task = make(data.clone());
    drive(task.as_mut());
    data.snapshot()
}

/// Runs a distributed task on every rank; the root receives `root_data`, the rest `other_data`.
fn run_distributed<'d, F>(
    participants: usize,
    root_data: &'d TaskData,
    other_data: &'d TaskData,
    make: F,
) -> Vec<TaskData>
where
    F: for<'c> Fn(SharedTaskData, &'c Communicator) -> Box<dyn Task + 'c> + Sync,
{
    World::new(NonZero::new(participants).unwrap()).run(|comm| {
        let data = if comm.is_root() { root_data } else { other_data };
        let data = SharedTaskData::new(data.clone());

        let mut task = make(data.clone(), comm);
        drive(task.as_mut());

        data.snapshot()
    })
}

#[test]
fn mismatch_count_matches() {
    with_watchdog(|| {
        let pairs = [
            ("abc", "abd"),
            ("kitten", "sitting"),
            ("a", "a much longer string"),
            ("parallel", "parallel"),
        ];

        for (left, right) in pairs {
            let inputs = TaskData::new()
                .with_input(left.as_bytes().to_vec())
                .with_input(right.as_bytes().to_vec())
                .with_output(vec![0_i32]);

            let sequential = run_sequential(inputs.clone(), |data| {
                Box::new(MismatchCount::new(data))
            });
            let expected = sequential.output::<i32>(0).unwrap();

            for participants in RANK_COUNTS {
                let outputs =
                    run_distributed(participants, &inputs, &TaskData::new(), |data, comm| {
                        Box::new(DistributedMismatchCount::new(data, comm))
                    });

                assert_eq!(outputs[0].output::<i32>(0).unwrap(), expected);
            }
        }
    });
}

#[test]
fn broadcast_max_matches() {
    with_watchdog(|| {
        let values = vec![-10, 3, 7, -2];
        let shape = |source: i32, values: Vec<i32>| {
            TaskData::new()
                .with_input(vec![source])
                .with_input(values)
                .with_output(vec![0_i32; 4])
                .with_output(vec![0_i32])
        };

        let sequential = run_sequential(shape(0, values.clone()), |data| {
            Box::new(BroadcastMax::new(data))
        });
        assert_eq!(sequential.output::<i32>(0).unwrap(), values);
        assert_eq!(sequential.output::<i32>(1).unwrap(), [7]);

        for participants in RANK_COUNTS {
            let outputs = run_distributed(
                participants,
                &shape(0, values.clone()),
                &shape(0, Vec::new()),
                |data, comm| Box::new(DistributedBroadcastMax::new(data, comm)),
            );

            for output in &outputs {
                assert_eq!(output.output::<i32>(0).unwrap(), values);
            }
            assert_eq!(outputs[0].output::<i32>(1).unwrap(), [7]);
        }
    });
}

#[test]
fn trapezoid_matches_within_tolerance() {
    with_watchdog(|| {
        let inputs = TaskData::new()
            .with_input(vec![-3.5_f64, 2.25])
            .with_input(vec![12_345_u64])
            .with_output(vec![0.0_f64]);

        let sequential = run_sequential(inputs.clone(), |data| Box::new(Trapezoid::new(data)));
        let expected = sequential.output::<f64>(0).unwrap();

        for participants in RANK_COUNTS {
            let outputs = run_distributed(participants, &inputs, &TaskData::new(), |data, comm| {
                Box::new(DistributedTrapezoid::new(data, comm))
            });

            assert_all_close(outputs[0].output::<f64>(0).unwrap(), expected, 1e-9);
        }
    });
}
