use derive_more::Display;

/// Identifies the element type held by a [`Buffer`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum ElementType {
    /// Unsigned bytes, also used for character data.
    #[display("u8")]
    U8,

    /// 32-bit signed integers.
    #[display("i32")]
    I32,

    /// 64-bit signed integers.
    #[display("i64")]
    I64,

    /// 32-bit unsigned integers.
    #[display("u32")]
    U32,

    /// 64-bit unsigned integers.
    #[display("u64")]
    U64,

    /// 32-bit floating point numbers.
    #[display("f32")]
    F32,

    /// 64-bit floating point numbers.
    #[display("f64")]
    F64,
}

/// Whether a buffer is one of the inputs or one of the outputs of a task.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Direction {
    /// A buffer the task reads from.
    #[display("input")]
    Input,

    /// A buffer the task writes its result into.
    #[display("output")]
    Output,
}

/// A contiguous run of elements of one type.
///
/// The element type is part of the value, so a task can check both the shape and the type of
/// its buffers during validation instead of reinterpreting raw memory.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Buffer {
    /// See [`ElementType::U8`].
    U8(Vec<u8>),

    /// See [`ElementType::I32`].
    I32(Vec<i32>),

    /// See [`ElementType::I64`].
    I64(Vec<i64>),

    /// See [`ElementType::U32`].
    U32(Vec<u32>),

    /// See [`ElementType::U64`].
    U64(Vec<u64>),

    /// See [`ElementType::F32`].
    F32(Vec<f32>),

    /// See [`ElementType::F64`].
    F64(Vec<f64>),
}

impl Buffer {
    /// Creates a buffer holding `len` default-valued elements of type `T`.
    ///
    /// Drivers typically use this to allocate output buffers.
    #[must_use]
    pub fn zeroed<T: Element>(len: usize) -> Self {
        T::into_buffer(vec![T::default(); len])
    }

    /// The type of the elements in the buffer.
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::U8(_) => ElementType::U8,
            Self::I32(_) => ElementType::I32,
            Self::I64(_) => ElementType::I64,
            Self::U32(_) => ElementType::U32,
            Self::U64(_) => ElementType::U64,
            Self::F32(_) => ElementType::F32,
            Self::F64(_) => ElementType::F64,
        }
    }

    /// The number of elements in the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::U8(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::I64(v) => v.len(),
            Self::U32(v) => v.len(),
            Self::U64(v) => v.len(),
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
        }
    }

    /// Whether the buffer holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Views the buffer as a slice of `T`, if it holds elements of that type.
    #[must_use]
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::slice(self)
    }

    /// Views the buffer as a mutable slice of `T`, if it holds elements of that type.
    #[must_use]
    pub fn as_mut_slice<T: Element>(&mut self) -> Option<&mut [T]> {
        T::slice_mut(self)
    }
}

/// An element type that can be stored in a [`Buffer`].
///
/// Implemented for every type named by [`ElementType`]. You generally do not need to implement
/// this yourself.
pub trait Element: Copy + Default + Send + Sync + 'static {
    /// The tag identifying this element type.
    const ELEMENT_TYPE: ElementType;

    /// Views a buffer as a slice of `Self`, if it holds elements of this type.
    fn slice(buffer: &Buffer) -> Option<&[Self]>;

    /// Views a buffer as a mutable slice of `Self`, if it holds elements of this type.
    fn slice_mut(buffer: &mut Buffer) -> Option<&mut [Self]>;

    /// Wraps a vector of elements into a buffer.
    fn into_buffer(values: Vec<Self>) -> Buffer;
}

macro_rules! impl_element {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const ELEMENT_TYPE: ElementType = ElementType::$variant;

                fn slice(buffer: &Buffer) -> Option<&[Self]> {
                    match buffer {
                        Buffer::$variant(values) => Some(values.as_slice()),
                        _ => None,
                    }
                }

                fn slice_mut(buffer: &mut Buffer) -> Option<&mut [Self]> {
                    match buffer {
                        Buffer::$variant(values) => Some(values.as_mut_slice()),
                        _ => None,
                    }
                }

                fn into_buffer(values: Vec<Self>) -> Buffer {
                    Buffer::$variant(values)
                }
            }

            impl From<Vec<$ty>> for Buffer {
                fn from(values: Vec<$ty>) -> Self {
                    Buffer::$variant(values)
                }
            }
        )*
    };
}

impl_element!(
    u8 => U8,
    i32 => I32,
    i64 => I64,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
);

impl From<&str> for Buffer {
    fn from(value: &str) -> Self {
        Self::U8(value.as_bytes().to_vec())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn element_type_follows_variant() {
        assert_eq!(Buffer::from(vec![1_u8]).element_type(), ElementType::U8);
        assert_eq!(Buffer::from(vec![1_i32]).element_type(), ElementType::I32);
        assert_eq!(Buffer::from(vec![1_i64]).element_type(), ElementType::I64);
        assert_eq!(Buffer::from(vec![1_u32]).element_type(), ElementType::U32);
        assert_eq!(Buffer::from(vec![1_u64]).element_type(), ElementType::U64);
        assert_eq!(Buffer::from(vec![1.0_f32]).element_type(), ElementType::F32);
        assert_eq!(Buffer::from(vec![1.0_f64]).element_type(), ElementType::F64);
    }

    #[test]
    fn slice_requires_matching_type() {
        let buffer = Buffer::from(vec![1_i32, 2, 3]);

        assert_eq!(buffer.as_slice::<i32>(), Some([1, 2, 3].as_slice()));
        assert_eq!(buffer.as_slice::<u32>(), None);
        assert_eq!(buffer.as_slice::<i64>(), None);
    }

    #[test]
    fn mutable_slice_writes_through() {
        let mut buffer = Buffer::zeroed::<u64>(2);

        if let Some(values) = buffer.as_mut_slice::<u64>() {
            values.copy_from_slice(&[7, 9]);
        }

        assert_eq!(buffer, Buffer::U64(vec![7, 9]));
    }

    #[test]
    fn zeroed_has_requested_len() {
        let buffer = Buffer::zeroed::<f64>(4);

        assert_eq!(buffer.len(), 4);
        assert!(!buffer.is_empty());
        assert!(Buffer::zeroed::<u8>(0).is_empty());
    }

    #[test]
    fn str_becomes_bytes() {
        assert_eq!(Buffer::from("abc"), Buffer::U8(b"abc".to_vec()));
    }
}
