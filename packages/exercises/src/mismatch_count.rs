use rank_comm::{Communicator, ROOT, partition_counts};
use taskbench::{ElementType, SharedTaskData, Task, TaskData};

use crate::exchanged;

/// Weight of a position where both strings have a character but the characters differ.
const MISMATCH_WEIGHT: usize = 2;

/// Counts the positions at which two byte strings differ.
///
/// A position covered by both strings counts 2 if the characters differ. Every character past
/// the end of the shorter string counts 1.
///
/// Inputs: two `u8` buffers. Outputs: one `i32` buffer with a count of 1.
///
/// # Examples
///
/// ```
/// use exercises::MismatchCount;
/// use taskbench::{SharedTaskData, TaskData, TaskRunner};
///
/// let data = SharedTaskData::new(
///     TaskData::new()
///         .with_input(b"abc".to_vec())
///         .with_input(b"abd".to_vec())
///         .with_output(vec![0_i32]),
/// );
///
/// let mut task = MismatchCount::new(data.clone());
/// TaskRunner::new(&mut task).execute().unwrap();
///
/// assert_eq!(data.lock().output::<i32>(0).unwrap(), [2]);
/// ```
#[derive(Debug)]
pub struct MismatchCount {
    data: SharedTaskData,
    left: Vec<u8>,
    right: Vec<u8>,
    count: usize,
}

impl MismatchCount {
    /// Creates the task over the given inputs and outputs.
    #[must_use]
    pub fn new(data: SharedTaskData) -> Self {
        Self {
            data,
            left: Vec::new(),
            right: Vec::new(),
            count: 0,
        }
    }
}

impl Task for MismatchCount {
    fn validation(&self) -> bool {
        has_valid_shape(&self.data.lock())
    }

    fn pre_processing(&mut self) -> bool {
        match read_inputs(&self.data.lock()) {
            Some((left, right)) => {
                self.left = left;
                self.right = right;
                true
            }
            None => false,
        }
    }

    fn run(&mut self) -> bool {
        let common = self.left.len().min(self.right.len());

        self.count = weighted_mismatches(
            self.left.get(..common).unwrap_or_default(),
            self.right.get(..common).unwrap_or_default(),
        )
        .saturating_add(self.left.len().abs_diff(self.right.len()));

        true
    }

    fn post_processing(&mut self) -> bool {
        write_count(&self.data, self.count)
    }

    fn task_data(&self) -> &SharedTaskData {
        &self.data
    }
}

/// [`MismatchCount`] split across all ranks of a world.
///
/// Only the root rank needs inputs and outputs. The root broadcasts the length of the common
/// prefix, scatters that prefix of both strings, and sums the partial counts of every rank.
#[derive(Debug)]
pub struct DistributedMismatchCount<'c> {
    data: SharedTaskData,
    comm: &'c Communicator,
    left: Vec<u8>,
    right: Vec<u8>,
    count: usize,
}

impl<'c> DistributedMismatchCount<'c> {
    /// Creates the task for the rank represented by `comm`.
    #[must_use]
    pub fn new(data: SharedTaskData, comm: &'c Communicator) -> Self {
        Self {
            data,
            comm,
            left: Vec::new(),
            right: Vec::new(),
            count: 0,
        }
    }

    fn count_distributed(&self) -> rank_comm::Result<Option<usize>> {
        let comm = self.comm;

        let common = comm.broadcast(
            comm.is_root()
                .then(|| self.left.len().min(self.right.len())),
            ROOT,
        )?;
        let counts = partition_counts(common, comm.size());

        let left = comm.scatterv(self.left.get(..common), &counts, ROOT)?;
        let right = comm.scatterv(self.right.get(..common), &counts, ROOT)?;

        let partial = weighted_mismatches(&left, &right);

        Ok(comm
            .reduce(partial, usize::saturating_add, ROOT)?
            .map(|total| total.saturating_add(self.left.len().abs_diff(self.right.len()))))
    }
}

impl Task for DistributedMismatchCount<'_> {
    fn validation(&self) -> bool {
        !self.comm.is_root() || has_valid_shape(&self.data.lock())
    }

    fn pre_processing(&mut self) -> bool {
        if !self.comm.is_root() {
            return true;
        }

        match read_inputs(&self.data.lock()) {
            Some((left, right)) => {
                self.left = left;
                self.right = right;
                true
            }
            None => false,
        }
    }

    fn run(&mut self) -> bool {
        match exchanged(self.comm, self.count_distributed()) {
            Some(Some(count)) => {
                self.count = count;
                true
            }
            Some(None) => true,
            None => false,
        }
    }

    fn post_processing(&mut self) -> bool {
        !self.comm.is_root() || write_count(&self.data, self.count)
    }

    fn task_data(&self) -> &SharedTaskData {
        &self.data
    }
}

fn has_valid_shape(data: &TaskData) -> bool {
    data.inputs().len() == 2
        && data.input_element_type(0) == Some(ElementType::U8)
        && data.input_element_type(1) == Some(ElementType::U8)
        && data.inputs().iter().all(|input| !input.is_empty())
        && data.outputs().len() == 1
        && data.output_element_type(0) == Some(ElementType::I32)
        && data.output_count(0) == Some(1)
}

fn read_inputs(data: &TaskData) -> Option<(Vec<u8>, Vec<u8>)> {
    let left = data.input::<u8>(0).ok()?;
    let right = data.input::<u8>(1).ok()?;
    Some((left.to_vec(), right.to_vec()))
}

fn weighted_mismatches(left: &[u8], right: &[u8]) -> usize {
    left.iter()
        .zip(right)
        .filter(|(l, r)| l != r)
        .count()
        .saturating_mul(MISMATCH_WEIGHT)
}

fn write_count(data: &SharedTaskData, count: usize) -> bool {
    let Ok(count) = i32::try_from(count) else {
        return false;
    };

    match data.lock().output_mut::<i32>(0) {
        Ok([out, ..]) => {
            *out = count;
            true
        }
        _ => false,
    }
}
