use std::sync::{Arc, Mutex, MutexGuard};

use crate::{ERR_POISONED_LOCK, TaskData};

/// Shared handle to the [`TaskData`] of one scenario.
///
/// The driver keeps one clone to populate the inputs and inspect the outputs, the task keeps
/// another to access the buffers from its phases. The data lives as long as the longest holder.
///
/// # Examples
///
/// ```
/// use taskbench::{SharedTaskData, TaskData};
///
/// let driver_side = SharedTaskData::new(TaskData::new().with_output(vec![0_u64]));
/// let task_side = driver_side.clone();
///
/// task_side.lock().output_mut::<u64>(0).unwrap()[0] = 42;
///
/// assert_eq!(driver_side.lock().output::<u64>(0).unwrap(), [42]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct SharedTaskData {
    inner: Arc<Mutex<TaskData>>,
}

impl SharedTaskData {
    /// Wraps task data so it can be shared between a driver and a task.
    #[must_use]
    pub fn new(data: TaskData) -> Self {
        Self {
            inner: Arc::new(Mutex::new(data)),
        }
    }

    /// Locks the task data for access.
    ///
    /// Phases run one after another, so the lock is never contended in practice. Do not hold
    /// the guard across a call into another phase.
    ///
    /// # Panics
    ///
    /// Panics if a previous holder of the lock panicked.
    pub fn lock(&self) -> MutexGuard<'_, TaskData> {
        self.inner.lock().expect(ERR_POISONED_LOCK)
    }

    /// Returns a copy of the current contents of the task data.
    #[must_use]
    pub fn snapshot(&self) -> TaskData {
        self.lock().clone()
    }
}

impl From<TaskData> for SharedTaskData {
    fn from(data: TaskData) -> Self {
        Self::new(data)
    }
}
