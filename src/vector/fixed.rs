use std::{marker::PhantomData, mem, sync::Arc};

use arrow::{
    array::{ArrayRef, BooleanArray, BooleanBufferBuilder, PrimitiveArray},
    buffer::ScalarBuffer,
    datatypes::ArrowPrimitiveType,
    error::ArrowError,
};

use super::{check_capacity, ValueVector, VectorError};

/// Fixed-width values addressed by index.
#[derive(Debug)]
pub struct FixedWidthVector<T: ArrowPrimitiveType> {
    values: Vec<T::Native>,
    capacity: usize,
    _marker: PhantomData<T>,
}

impl<T: ArrowPrimitiveType> FixedWidthVector<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: Vec::new(),
            capacity,
            _marker: PhantomData,
        }
    }

    fn bytes_for(count: usize) -> usize {
        count * mem::size_of::<T::Native>()
    }

    /// Writes `value` at `index`, padding any gap with defaults. Overwrites
    /// when `index` already holds a value.
    pub fn set(&mut self, index: usize, value: T::Native) -> Result<(), VectorError> {
        let count = self.values.len().max(index + 1);
        check_capacity(Self::bytes_for(count), self.capacity)?;
        if index >= self.values.len() {
            self.values.resize(index, T::Native::default());
            self.values.push(value);
        } else {
            self.values[index] = value;
        }
        Ok(())
    }

    /// Pads with defaults until the vector holds `count` values.
    pub fn fill(&mut self, count: usize) -> Result<(), VectorError> {
        if count > self.values.len() {
            check_capacity(Self::bytes_for(count), self.capacity)?;
            self.values.resize(count, T::Native::default());
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<T::Native> {
        self.values.get(index).copied()
    }

    pub fn freeze(&mut self) -> Result<ArrayRef, ArrowError> {
        let values = ScalarBuffer::from(mem::take(&mut self.values));
        Ok(Arc::new(PrimitiveArray::<T>::try_new(values, None)?))
    }
}

impl<T: ArrowPrimitiveType> ValueVector for FixedWidthVector<T> {
    fn value_count(&self) -> usize {
        self.values.len()
    }

    fn buffer_bytes(&self) -> usize {
        Self::bytes_for(self.values.len())
    }

    fn byte_capacity(&self) -> usize {
        self.capacity
    }

    fn truncate(&mut self, value_count: usize) {
        self.values.truncate(value_count);
    }

    fn reset(&mut self) {
        self.values = Vec::new();
    }
}

/// Booleans packed one bit per value, as in the sealed bitmap.
#[derive(Debug)]
pub struct BitVector {
    values: BooleanBufferBuilder,
    capacity: usize,
}

impl BitVector {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: BooleanBufferBuilder::new(0),
            capacity,
        }
    }

    fn bytes_for(count: usize) -> usize {
        count.div_ceil(8)
    }

    pub fn set(&mut self, index: usize, value: bool) -> Result<(), VectorError> {
        let count = self.values.len().max(index + 1);
        check_capacity(Self::bytes_for(count), self.capacity)?;
        if index >= self.values.len() {
            self.values.append_n(index - self.values.len(), false);
            self.values.append(value);
        } else {
            self.values.set_bit(index, value);
        }
        Ok(())
    }

    pub fn fill(&mut self, count: usize) -> Result<(), VectorError> {
        if count > self.values.len() {
            check_capacity(Self::bytes_for(count), self.capacity)?;
            self.values.append_n(count - self.values.len(), false);
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        (index < self.values.len()).then(|| self.values.get_bit(index))
    }

    pub fn freeze(&mut self) -> Result<ArrayRef, ArrowError> {
        Ok(Arc::new(BooleanArray::new(self.values.finish(), None)))
    }
}

impl ValueVector for BitVector {
    fn value_count(&self) -> usize {
        self.values.len()
    }

    fn buffer_bytes(&self) -> usize {
        Self::bytes_for(self.values.len())
    }

    fn byte_capacity(&self) -> usize {
        self.capacity
    }

    fn truncate(&mut self, value_count: usize) {
        if value_count < self.values.len() {
            self.values.truncate(value_count);
        }
    }

    fn reset(&mut self) {
        self.values = BooleanBufferBuilder::new(0);
    }
}
