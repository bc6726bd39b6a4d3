#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Lifecycle and performance measurement harness for self-contained numeric tasks.
//!
//! Every exercise built on this package is a [`Task`]: a unit of computation with four phases
//! that are always driven in the same order:
//!
//! 1. [`validation()`](Task::validation) checks that the [`TaskData`] has the shape the task expects.
//! 2. [`pre_processing()`](Task::pre_processing) copies the raw inputs into a working representation.
//! 3. [`run()`](Task::run) performs the computation.
//! 4. [`post_processing()`](Task::post_processing) writes the result back into the output buffers.
//!
//! The core functionality includes:
//! - [`TaskData`] - Carries typed input and output buffers plus their element counts
//! - [`SharedTaskData`] - Handle through which the driver and a task share one [`TaskData`]
//! - [`Task`] - The four-phase contract implemented once per algorithm variant
//! - [`TaskRunner`] - Drives a task while checking call order and the functional time limit
//! - [`Perf`] - Times a task over repeated executions, either the whole pipeline or `run()` alone
//!
//! This package is not meant for use in production, serving only as a development tool for
//! validating and benchmarking exercises.
//!
//! # Functional testing
//!
//! ```
//! use taskbench::{SharedTaskData, Task, TaskData, TaskRunner};
//!
//! #[derive(Debug)]
//! struct Sum {
//!     data: SharedTaskData,
//!     values: Vec<i32>,
//!     total: i32,
//! }
//!
//! impl Task for Sum {
//!     fn validation(&self) -> bool {
//!         let data = self.data.lock();
//!         data.inputs().len() == 1 && data.outputs_count() == [1]
//!     }
//!
//!     fn pre_processing(&mut self) -> bool {
//!         self.values = self.data.lock().input::<i32>(0).map(<[i32]>::to_vec).unwrap_or_default();
//!         true
//!     }
//!
//!     fn run(&mut self) -> bool {
//!         self.total = self.values.iter().sum();
//!         true
//!     }
//!
//!     fn post_processing(&mut self) -> bool {
//!         let mut data = self.data.lock();
//!         let Ok([out]) = data.output_mut::<i32>(0) else {
//!             return false;
//!         };
//!         *out = self.total;
//!         true
//!     }
//!
//!     fn task_data(&self) -> &SharedTaskData {
//!         &self.data
//!     }
//! }
//!
//! let data = SharedTaskData::new(
//!     TaskData::new()
//!         .with_input(vec![1, 2, 3_i32])
//!         .with_output(vec![0_i32]),
//! );
//!
//! let mut task = Sum { data: data.clone(), values: Vec::new(), total: 0 };
//! TaskRunner::new(&mut task).execute().unwrap();
//!
//! assert_eq!(data.lock().output::<i32>(0).unwrap(), [6]);
//! ```
//!
//! # Performance testing
//!
//! ```ignore
//! use new_zealand::nz;
//! use taskbench::{Perf, PerfAttr};
//!
//! let attr = PerfAttr::new().num_running(nz!(20));
//! let results = Perf::new(&mut task).task_run(&attr)?;
//!
//! // Fails if the measured time exceeds PerfResults::MAX_TIME.
//! Perf::print_perf_statistic(&results)?;
//! ```

mod constants;
mod data;
mod element;
mod error;
mod perf;
mod perf_attr;
mod perf_results;
mod runner;
mod shared_data;
mod task;

pub(crate) use constants::*;
pub use data::*;
pub use element::*;
pub use error::*;
pub use perf::*;
pub use perf_attr::*;
pub use perf_results::*;
pub use runner::*;
pub use shared_data::*;
pub use task::*;
