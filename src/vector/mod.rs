//! Physical column buffers.
//!
//! Every schema node owns exactly one [`ColumnVector`] in a [`VectorStore`]
//! arena. Scalars hold values, repeated columns hold offsets into their entry
//! vector, and maps tie child vectors to a shared value count. Vectors check
//! their byte capacity before mutating and report exhaustion through
//! [`VectorError::Overflow`]; allocation policy is left to `Vec`.
//!
//! Buffers stay truncatable while a batch is written and are frozen into Arrow
//! arrays once the batch is sealed.

mod fixed;
mod nested;
mod variable;

use arrow::{
    array::ArrayRef,
    datatypes::{Float64Type, Int32Type, Int64Type},
    error::ArrowError,
};
pub use fixed::{BitVector, FixedWidthVector};
pub use nested::{MapVector, RepeatedVector};
pub use variable::VarWidthVector;

use crate::{schema::ValueType, value::ValueRef};

/// Index of a vector inside its [`VectorStore`].
pub type VectorId = usize;

/// Signal raised by a vector refusing a write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VectorError {
    /// The write would grow a buffer past its capacity.
    #[error("buffer overflow: {requested} bytes requested, capacity is {capacity}")]
    Overflow {
        /// Buffer size after the write.
        requested: usize,
        /// Capacity of the buffer.
        capacity: usize,
    },
    /// The value does not match the vector's value type.
    #[error("vector holds {expected:?} values, got {actual:?}")]
    TypeMismatch {
        /// Value type stored by the vector, `None` for repeated and map vectors.
        expected: Option<ValueType>,
        /// Value type of the rejected value.
        actual: ValueType,
    },
}

pub(crate) fn check_capacity(requested: usize, capacity: usize) -> Result<(), VectorError> {
    if requested > capacity {
        return Err(VectorError::Overflow {
            requested,
            capacity,
        });
    }
    Ok(())
}

/// Capability shared by every physical vector.
pub trait ValueVector {
    /// Number of values (or slots, for nested vectors) currently held.
    fn value_count(&self) -> usize;

    /// Size in bytes of the largest buffer backing the vector.
    fn buffer_bytes(&self) -> usize;

    /// Maximum size in bytes any one buffer may reach.
    fn byte_capacity(&self) -> usize;

    fn is_exhausted(&self) -> bool {
        self.buffer_bytes() >= self.byte_capacity()
    }

    /// Drops every value at or after `value_count`.
    fn truncate(&mut self, value_count: usize);

    /// Drops all values and releases the buffers.
    fn reset(&mut self);
}

#[derive(Debug)]
pub enum ColumnVector {
    Int(FixedWidthVector<Int32Type>),
    Long(FixedWidthVector<Int64Type>),
    Double(FixedWidthVector<Float64Type>),
    Bit(BitVector),
    VarChar(VarWidthVector),
    VarBinary(VarWidthVector),
    Repeated(RepeatedVector),
    Map(MapVector),
}

macro_rules! dispatch {
    ($self:expr, $vector:ident => $body:expr) => {
        match $self {
            ColumnVector::Int($vector) => $body,
            ColumnVector::Long($vector) => $body,
            ColumnVector::Double($vector) => $body,
            ColumnVector::Bit($vector) => $body,
            ColumnVector::VarChar($vector) => $body,
            ColumnVector::VarBinary($vector) => $body,
            ColumnVector::Repeated($vector) => $body,
            ColumnVector::Map($vector) => $body,
        }
    };
}

impl ColumnVector {
    /// Scalar vector for `value_type` with a per-buffer byte `capacity`.
    pub fn scalar(value_type: ValueType, capacity: usize) -> Self {
        match value_type {
            ValueType::Integer => ColumnVector::Int(FixedWidthVector::new(capacity)),
            ValueType::Long => ColumnVector::Long(FixedWidthVector::new(capacity)),
            ValueType::Double => ColumnVector::Double(FixedWidthVector::new(capacity)),
            ValueType::Boolean => ColumnVector::Bit(BitVector::new(capacity)),
            ValueType::String => ColumnVector::VarChar(VarWidthVector::utf8(capacity)),
            ValueType::Bytes => ColumnVector::VarBinary(VarWidthVector::binary(capacity)),
        }
    }

    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            ColumnVector::Int(_) => Some(ValueType::Integer),
            ColumnVector::Long(_) => Some(ValueType::Long),
            ColumnVector::Double(_) => Some(ValueType::Double),
            ColumnVector::Bit(_) => Some(ValueType::Boolean),
            ColumnVector::VarChar(_) => Some(ValueType::String),
            ColumnVector::VarBinary(_) => Some(ValueType::Bytes),
            ColumnVector::Repeated(_) | ColumnVector::Map(_) => None,
        }
    }

    /// Child vectors: the entry of a repeated vector, the members of a map.
    pub fn children(&self) -> &[VectorId] {
        match self {
            ColumnVector::Repeated(repeated) => std::slice::from_ref(&repeated.entry),
            ColumnVector::Map(map) => map.children(),
            _ => &[],
        }
    }

    pub fn set_value(&mut self, index: usize, value: ValueRef<'_>) -> Result<(), VectorError> {
        match (self, value) {
            (ColumnVector::Int(vector), ValueRef::Int(v)) => vector.set(index, v),
            (ColumnVector::Long(vector), ValueRef::Long(v)) => vector.set(index, v),
            (ColumnVector::Long(vector), ValueRef::Int(v)) => vector.set(index, i64::from(v)),
            (ColumnVector::Double(vector), ValueRef::Double(v)) => vector.set(index, v),
            (ColumnVector::Bit(vector), ValueRef::Bool(v)) => vector.set(index, v),
            (ColumnVector::VarChar(vector), ValueRef::String(v)) => vector.set(index, v.as_bytes()),
            (ColumnVector::VarBinary(vector), ValueRef::Bytes(v)) => vector.set(index, v),
            (vector, value) => Err(VectorError::TypeMismatch {
                expected: vector.value_type(),
                actual: value.value_type(),
            }),
        }
    }

    /// Pads the vector to `count` values with defaults (zero, false, empty).
    pub fn fill(&mut self, count: usize) -> Result<(), VectorError> {
        match self {
            ColumnVector::Int(vector) => vector.fill(count),
            ColumnVector::Long(vector) => vector.fill(count),
            ColumnVector::Double(vector) => vector.fill(count),
            ColumnVector::Bit(vector) => vector.fill(count),
            ColumnVector::VarChar(vector) | ColumnVector::VarBinary(vector) => vector.fill(count),
            ColumnVector::Repeated(vector) => vector.fill(count),
            ColumnVector::Map(vector) => {
                vector.fill(count);
                Ok(())
            }
        }
    }

    /// Hands the buffers to Arrow. `children` are the frozen child vectors,
    /// in [`children`](Self::children) order.
    pub fn freeze(&mut self, children: Vec<ArrayRef>) -> Result<ArrayRef, ArrowError> {
        match self {
            ColumnVector::Int(vector) => vector.freeze(),
            ColumnVector::Long(vector) => vector.freeze(),
            ColumnVector::Double(vector) => vector.freeze(),
            ColumnVector::Bit(vector) => vector.freeze(),
            ColumnVector::VarChar(vector) | ColumnVector::VarBinary(vector) => vector.freeze(),
            ColumnVector::Repeated(vector) => {
                let values = children.into_iter().next().ok_or_else(|| {
                    ArrowError::InvalidArgumentError("repeated vector without entry".into())
                })?;
                vector.freeze(values)
            }
            ColumnVector::Map(vector) => vector.freeze(children),
        }
    }
}

impl ValueVector for ColumnVector {
    fn value_count(&self) -> usize {
        dispatch!(self, vector => vector.value_count())
    }

    fn buffer_bytes(&self) -> usize {
        dispatch!(self, vector => vector.buffer_bytes())
    }

    fn byte_capacity(&self) -> usize {
        dispatch!(self, vector => vector.byte_capacity())
    }

    fn truncate(&mut self, value_count: usize) {
        dispatch!(self, vector => vector.truncate(value_count))
    }

    fn reset(&mut self) {
        dispatch!(self, vector => vector.reset())
    }
}

/// Arena of vectors addressed by [`VectorId`].
#[derive(Debug, Default)]
pub struct VectorStore {
    vectors: Vec<ColumnVector>,
}

impl VectorStore {
    pub fn push(&mut self, vector: ColumnVector) -> VectorId {
        self.vectors.push(vector);
        self.vectors.len() - 1
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn get(&self, id: VectorId) -> &ColumnVector {
        &self.vectors[id]
    }

    pub fn get_mut(&mut self, id: VectorId) -> &mut ColumnVector {
        &mut self.vectors[id]
    }

    /// True once any buffer reached its capacity.
    pub fn any_exhausted(&self) -> bool {
        self.vectors.iter().any(ValueVector::is_exhausted)
    }

    /// Freezes `id` and its descendants into one Arrow array.
    pub fn freeze(&mut self, id: VectorId) -> Result<ArrayRef, ArrowError> {
        let mut children = Vec::with_capacity(self.vectors[id].children().len());
        for position in 0..self.vectors[id].children().len() {
            let child = self.vectors[id].children()[position];
            children.push(self.freeze(child)?);
        }
        self.vectors[id].freeze(children)
    }

    pub fn reset(&mut self) {
        self.vectors.iter_mut().for_each(ValueVector::reset);
    }
}
