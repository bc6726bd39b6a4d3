use rank_comm::{Communicator, ROOT, partition_counts};
use taskbench::{ElementType, SharedTaskData, Task, TaskData};
use tracing::debug;

use crate::exchanged;

/// Copies a vector from a designated source rank into the result buffer and finds its maximum.
///
/// Inputs: an `i32` buffer holding the source rank (count 1) and an `i32` data buffer.
/// Outputs: an `i32` result buffer with the same count as the data and an `i32` maximum with a
/// count of 1.
///
/// Run sequentially there is only one rank, so the source rank must be 0.
#[derive(Debug)]
pub struct BroadcastMax {
    data: SharedTaskData,
    values: Vec<i32>,
    max: i32,
}

impl BroadcastMax {
    /// Creates the task over the given inputs and outputs.
    #[must_use]
    pub fn new(data: SharedTaskData) -> Self {
        Self {
            data,
            values: Vec::new(),
            max: i32::MIN,
        }
    }
}

impl Task for BroadcastMax {
    fn validation(&self) -> bool {
        let data = self.data.lock();
        source_rank(&data) == Some(ROOT) && has_valid_outputs(&data) && holds_source_data(&data)
    }

    fn pre_processing(&mut self) -> bool {
        match self.data.lock().input::<i32>(1) {
            Ok(values) => {
                self.values = values.to_vec();
                true
            }
            Err(_) => false,
        }
    }

    fn run(&mut self) -> bool {
        match self.values.iter().max() {
            Some(max) => {
                self.max = *max;
                true
            }
            None => false,
        }
    }

    fn post_processing(&mut self) -> bool {
        write_result(&self.data, &self.values) && write_max(&self.data, self.max)
    }

    fn task_data(&self) -> &SharedTaskData {
        &self.data
    }
}

/// [`BroadcastMax`] split across all ranks of a world.
///
/// Every rank supplies the source rank and both outputs; only the source rank supplies the data.
/// The source rank broadcasts the data so that every rank can write it to its result buffer.
/// The root then scatters the data, every rank finds the maximum of its chunk, and the partial
/// maxima are reduced to the root, which alone writes the maximum.
#[derive(Debug)]
pub struct DistributedBroadcastMax<'c> {
    data: SharedTaskData,
    comm: &'c Communicator,
    source: usize,
    values: Vec<i32>,
    max: Option<i32>,
}

impl<'c> DistributedBroadcastMax<'c> {
    /// Creates the task for the rank represented by `comm`.
    #[must_use]
    pub fn new(data: SharedTaskData, comm: &'c Communicator) -> Self {
        Self {
            data,
            comm,
            source: ROOT,
            values: Vec::new(),
            max: None,
        }
    }

    fn is_source(&self) -> bool {
        self.comm.rank() == self.source
    }

    fn broadcast_and_reduce(&self) -> rank_comm::Result<(Vec<i32>, Option<i32>)> {
        let comm = self.comm;

        let values = comm.broadcast(
            self.is_source().then(|| self.values.clone()),
            self.source,
        )?;

        let counts = partition_counts(values.len(), comm.size());
        let chunk = comm.scatterv(Some(values.as_slice()), &counts, ROOT)?;
        let local_max = chunk.iter().max().copied();

        // `None` sorts below every `Some`, so ranks with an empty chunk never win.
        let max = comm.reduce(local_max, Option::max, ROOT)?.flatten();

        debug!(rank = comm.rank(), chunk = chunk.len(), ?local_max, "reduced maximum");

        Ok((values, max))
    }
}

impl Task for DistributedBroadcastMax<'_> {
    fn validation(&self) -> bool {
        let data = self.data.lock();

        let Some(source) = source_rank(&data) else {
            return false;
        };

        source < self.comm.size().get()
            && has_valid_outputs(&data)
            && (self.comm.rank() != source || holds_source_data(&data))
    }

    fn pre_processing(&mut self) -> bool {
        let data = self.data.lock();

        let Some(source) = source_rank(&data) else {
            return false;
        };
        self.source = source;

        if self.comm.rank() != source {
            return true;
        }

        match data.input::<i32>(1) {
            Ok(values) => {
                self.values = values.to_vec();
                true
            }
            Err(_) => false,
        }
    }

    fn run(&mut self) -> bool {
        let Some((values, max)) = exchanged(self.comm, self.broadcast_and_reduce()) else {
            return false;
        };

        self.values = values;
        self.max = max;

        !self.comm.is_root() || self.max.is_some()
    }

    fn post_processing(&mut self) -> bool {
        if !write_result(&self.data, &self.values) {
            return false;
        }

        match (self.comm.is_root(), self.max) {
            (true, Some(max)) => write_max(&self.data, max),
            (true, None) => false,
            (false, _) => true,
        }
    }

    fn task_data(&self) -> &SharedTaskData {
        &self.data
    }
}

fn source_rank(data: &TaskData) -> Option<usize> {
    if data.input_count(0) != Some(1) {
        return None;
    }

    let [source] = data.input::<i32>(0).ok()? else {
        return None;
    };

    usize::try_from(*source).ok()
}

fn has_valid_outputs(data: &TaskData) -> bool {
    data.outputs().len() == 2
        && data.output_element_type(0) == Some(ElementType::I32)
        && data.output_element_type(1) == Some(ElementType::I32)
        && data.output_count(1) == Some(1)
}

fn holds_source_data(data: &TaskData) -> bool {
    data.inputs().len() == 2
        && data.input_element_type(1) == Some(ElementType::I32)
        && data.input_count(1).is_some_and(|count| count > 0)
        && data.input_count(1) == data.output_count(0)
}

fn write_result(data: &SharedTaskData, values: &[i32]) -> bool {
    match data.lock().output_mut::<i32>(0) {
        Ok(out) if out.len() == values.len() => {
            out.copy_from_slice(values);
            true
        }
        _ => false,
    }
}

fn write_max(data: &SharedTaskData, max: i32) -> bool {
    match data.lock().output_mut::<i32>(1) {
        Ok([out, ..]) => {
            *out = max;
            true
        }
        _ => false,
    }
}
