use crate::{Buffer, Direction, Element, ElementType, Error, Result};

/// Whether task data is being used for a functional test or a performance measurement.
///
/// [`TaskRunner`](crate::TaskRunner) only enforces its functional time limit in
/// [`TestingMode::Functional`]. [`Perf`](crate::Perf) switches the data it measures to
/// [`TestingMode::Performance`] until the measurement has finished.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum TestingMode {
    /// Correctness testing, with each phase driven once.
    #[default]
    Functional,

    /// Performance measurement, with phases driven repeatedly.
    Performance,
}

/// Carries the inputs and outputs of a task between a driver and the task.
///
/// Inputs and outputs are kept as two independent lists of buffers, each accompanied by a
/// parallel list of element counts. The i-th count describes the i-th buffer of the same list.
/// Counts are supplied by the driver and are not required to equal the buffer length: some tasks
/// use them to carry dimensions (e.g. rows and columns of a matrix stored in one buffer).
///
/// The driver populates the data before constructing a task. The task may read any buffer and
/// write into output buffers but never adds, removes or resizes buffers.
///
/// # Examples
///
/// ```
/// use taskbench::{Buffer, TaskData};
///
/// let mut data = TaskData::new();
/// data.add_input(Buffer::from("abc"), 3);
/// data.add_input(Buffer::from("abd"), 3);
/// data.add_output(Buffer::zeroed::<i32>(1), 1);
///
/// assert_eq!(data.inputs_count(), [3, 3]);
/// assert_eq!(data.input::<u8>(1).unwrap(), b"abd");
///
/// // Asking for the wrong element type is an error, not a reinterpretation.
/// assert!(data.input::<i32>(0).is_err());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskData {
    inputs: Vec<Buffer>,
    inputs_count: Vec<usize>,
    outputs: Vec<Buffer>,
    outputs_count: Vec<usize>,
    testing_mode: TestingMode,
}

impl TaskData {
    /// Creates task data without any buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an input buffer together with its element count.
    pub fn add_input(&mut self, buffer: impl Into<Buffer>, count: usize) {
        self.inputs.push(buffer.into());
        self.inputs_count.push(count);
    }

    /// Appends an output buffer together with its element count.
    pub fn add_output(&mut self, buffer: impl Into<Buffer>, count: usize) {
        self.outputs.push(buffer.into());
        self.outputs_count.push(count);
    }

    /// Appends an input buffer whose count is its length.
    #[must_use]
    pub fn with_input<T: Element>(mut self, values: Vec<T>) -> Self {
        let count = values.len();
        self.add_input(T::into_buffer(values), count);
        self
    }

    /// Appends an output buffer whose count is its length.
    #[must_use]
    pub fn with_output<T: Element>(mut self, values: Vec<T>) -> Self {
        let count = values.len();
        self.add_output(T::into_buffer(values), count);
        self
    }

    /// The input buffers, in the order they were added.
    #[must_use]
    pub fn inputs(&self) -> &[Buffer] {
        &self.inputs
    }

    /// The output buffers, in the order they were added.
    #[must_use]
    pub fn outputs(&self) -> &[Buffer] {
        &self.outputs
    }

    /// The element counts of the input buffers.
    #[must_use]
    pub fn inputs_count(&self) -> &[usize] {
        &self.inputs_count
    }

    /// The element counts of the output buffers.
    #[must_use]
    pub fn outputs_count(&self) -> &[usize] {
        &self.outputs_count
    }

    /// The element count of input buffer `index`, if there is one.
    #[must_use]
    pub fn input_count(&self, index: usize) -> Option<usize> {
        self.inputs_count.get(index).copied()
    }

    /// The element count of output buffer `index`, if there is one.
    #[must_use]
    pub fn output_count(&self, index: usize) -> Option<usize> {
        self.outputs_count.get(index).copied()
    }

    /// The element type held by input buffer `index`, if there is one.
    #[must_use]
    pub fn input_element_type(&self, index: usize) -> Option<ElementType> {
        self.inputs.get(index).map(Buffer::element_type)
    }

    /// The element type held by output buffer `index`, if there is one.
    #[must_use]
    pub fn output_element_type(&self, index: usize) -> Option<ElementType> {
        self.outputs.get(index).map(Buffer::element_type)
    }

    /// Views input buffer `index` as a slice of `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingBuffer`] if there is no input buffer at `index` and
    /// [`Error::ElementTypeMismatch`] if the buffer does not hold elements of type `T`.
    pub fn input<T: Element>(&self, index: usize) -> Result<&[T]> {
        let buffer = self
            .inputs
            .get(index)
            .ok_or_else(|| missing(Direction::Input, index, self.inputs.len()))?;

        T::slice(buffer).ok_or_else(|| mismatch::<T>(Direction::Input, index, buffer))
    }

    /// Views output buffer `index` as a slice of `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingBuffer`] if there is no output buffer at `index` and
    /// [`Error::ElementTypeMismatch`] if the buffer does not hold elements of type `T`.
    pub fn output<T: Element>(&self, index: usize) -> Result<&[T]> {
        let buffer = self
            .outputs
            .get(index)
            .ok_or_else(|| missing(Direction::Output, index, self.outputs.len()))?;

        T::slice(buffer).ok_or_else(|| mismatch::<T>(Direction::Output, index, buffer))
    }

    /// Views output buffer `index` as a mutable slice of `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingBuffer`] if there is no output buffer at `index` and
    /// [`Error::ElementTypeMismatch`] if the buffer does not hold elements of type `T`.
    pub fn output_mut<T: Element>(&mut self, index: usize) -> Result<&mut [T]> {
        let available = self.outputs.len();
        let buffer = self
            .outputs
            .get_mut(index)
            .ok_or_else(|| missing(Direction::Output, index, available))?;

        let actual = buffer.element_type();
        T::slice_mut(buffer).ok_or(Error::ElementTypeMismatch {
            direction: Direction::Output,
            index,
            expected: T::ELEMENT_TYPE,
            actual,
        })
    }

    /// Whether the data is currently used for functional or performance testing.
    #[must_use]
    pub fn testing_mode(&self) -> TestingMode {
        self.testing_mode
    }

    /// Switches between functional and performance testing.
    pub fn set_testing_mode(&mut self, mode: TestingMode) {
        self.testing_mode = mode;
    }
}

fn missing(direction: Direction, index: usize, available: usize) -> Error {
    Error::MissingBuffer {
        direction,
        index,
        available,
    }
}

fn mismatch<T: Element>(direction: Direction, index: usize, buffer: &Buffer) -> Error {
    Error::ElementTypeMismatch {
        direction,
        index,
        expected: T::ELEMENT_TYPE,
        actual: buffer.element_type(),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn counts_are_independent_of_buffer_len() {
        let mut data = TaskData::new();
        // A 2x3 matrix in one buffer, described by its dimensions.
        data.add_input(vec![1.0_f64; 6], 2);
        data.add_input(vec![0_u8], 3);

        assert_eq!(data.inputs_count(), [2, 3]);
        assert_eq!(data.inputs().len(), 2);
        assert_eq!(data.input::<f64>(0).unwrap().len(), 6);
        assert!(data.outputs().is_empty());
        assert!(data.outputs_count().is_empty());
    }

    #[test]
    fn shape_is_inspectable_per_buffer() {
        let data = TaskData::new()
            .with_input(b"abc".to_vec())
            .with_input(vec![2.5_f32])
            .with_output(vec![0_i32]);

        assert_eq!(data.input_count(0), Some(3));
        assert_eq!(data.input_count(2), None);
        assert_eq!(data.output_count(0), Some(1));
        assert_eq!(data.input_element_type(0), Some(ElementType::U8));
        assert_eq!(data.input_element_type(1), Some(ElementType::F32));
        assert_eq!(data.output_element_type(0), Some(ElementType::I32));
        assert_eq!(data.output_element_type(1), None);
    }

    #[test]
    fn builder_appends_with_len_as_count() {
        let data = TaskData::new()
            .with_input(vec![1_i32, 2, 3])
            .with_output(vec![0_i64; 2]);

        assert_eq!(data.inputs_count(), [3]);
        assert_eq!(data.outputs_count(), [2]);
    }

    #[test]
    fn missing_input_is_reported() {
        let data = TaskData::new().with_input(vec![1_i32]);

        let error = data.input::<i32>(1).unwrap_err();
        assert!(matches!(
            error,
            Error::MissingBuffer {
                direction: Direction::Input,
                index: 1,
                available: 1,
            }
        ));
    }

    #[test]
    fn wrong_output_type_is_reported() {
        let mut data = TaskData::new().with_output(vec![0_u32]);

        let error = data.output_mut::<i32>(0).unwrap_err();
        assert!(matches!(
            error,
            Error::ElementTypeMismatch {
                direction: Direction::Output,
                index: 0,
                expected: ElementType::I32,
                actual: ElementType::U32,
            }
        ));

        assert!(data.output::<u64>(0).is_err());
        assert!(data.output_mut::<u32>(3).is_err());
    }

    #[test]
    fn output_writes_are_visible() {
        let mut data = TaskData::new().with_output(vec![0_i32; 3]);

        data.output_mut::<i32>(0).unwrap().copy_from_slice(&[4, 5, 6]);

        assert_eq!(data.output::<i32>(0).unwrap(), [4, 5, 6]);
    }

    #[test]
    fn testing_mode_defaults_to_functional() {
        let mut data = TaskData::new();
        assert_eq!(data.testing_mode(), TestingMode::Functional);

        data.set_testing_mode(TestingMode::Performance);
        assert_eq!(data.testing_mode(), TestingMode::Performance);
    }
}
