use std::{mem, sync::Arc};

use arrow::{
    array::{ArrayRef, BinaryArray, StringArray},
    buffer::{Buffer, OffsetBuffer, ScalarBuffer},
    error::ArrowError,
};

use super::{check_capacity, ValueVector, VectorError};

const OFFSET_WIDTH: usize = mem::size_of::<i32>();

/// Variable-width values: one data buffer plus `value_count + 1` offsets.
///
/// Values are appended; writing at an index that already holds a value seeks
/// back to it and drops that value and everything after it.
#[derive(Debug)]
pub struct VarWidthVector {
    offsets: Vec<i32>,
    data: Vec<u8>,
    capacity: usize,
    utf8: bool,
}

impl VarWidthVector {
    pub fn utf8(capacity: usize) -> Self {
        Self::new(capacity, true)
    }

    pub fn binary(capacity: usize) -> Self {
        Self::new(capacity, false)
    }

    fn new(capacity: usize, utf8: bool) -> Self {
        Self {
            offsets: vec![0],
            data: Vec::new(),
            capacity,
            utf8,
        }
    }

    fn end(&self) -> usize {
        self.offsets.last().copied().unwrap_or_default() as usize
    }

    pub fn set(&mut self, index: usize, value: &[u8]) -> Result<(), VectorError> {
        let count = self.value_count();
        let base = if index < count {
            self.offsets[index] as usize
        } else {
            self.end()
        };
        let data_bytes = base + value.len();
        check_capacity(data_bytes, self.capacity)?;
        // Padding or seeking back, `index + 1` values remain after the write.
        check_capacity((index + 2) * OFFSET_WIDTH, self.capacity)?;
        let end = i32::try_from(data_bytes).map_err(|_| VectorError::Overflow {
            requested: data_bytes,
            capacity: i32::MAX as usize,
        })?;

        if index < count {
            self.truncate(index);
        } else {
            self.pad(index);
        }
        self.data.extend_from_slice(value);
        self.offsets.push(end);
        Ok(())
    }

    /// Pads with empty values until the vector holds `count` values.
    pub fn fill(&mut self, count: usize) -> Result<(), VectorError> {
        if count > self.value_count() {
            check_capacity((count + 1) * OFFSET_WIDTH, self.capacity)?;
            self.pad(count);
        }
        Ok(())
    }

    fn pad(&mut self, count: usize) {
        let end = self.offsets.last().copied().unwrap_or_default();
        self.offsets.resize(count + 1, end);
    }

    pub fn get(&self, index: usize) -> Option<&[u8]> {
        let start = *self.offsets.get(index)? as usize;
        let end = *self.offsets.get(index + 1)? as usize;
        Some(&self.data[start..end])
    }

    pub fn freeze(&mut self) -> Result<ArrayRef, ArrowError> {
        let offsets = OffsetBuffer::new(ScalarBuffer::from(mem::replace(
            &mut self.offsets,
            vec![0],
        )));
        let values = Buffer::from_vec(mem::take(&mut self.data));
        if self.utf8 {
            Ok(Arc::new(StringArray::try_new(offsets, values, None)?))
        } else {
            Ok(Arc::new(BinaryArray::try_new(offsets, values, None)?))
        }
    }
}

impl ValueVector for VarWidthVector {
    fn value_count(&self) -> usize {
        self.offsets.len() - 1
    }

    fn buffer_bytes(&self) -> usize {
        self.data.len().max(self.offsets.len() * OFFSET_WIDTH)
    }

    fn byte_capacity(&self) -> usize {
        self.capacity
    }

    fn truncate(&mut self, value_count: usize) {
        if value_count < self.value_count() {
            self.offsets.truncate(value_count + 1);
            let end = self.end();
            self.data.truncate(end);
        }
    }

    fn reset(&mut self) {
        self.offsets = vec![0];
        self.data = Vec::new();
    }
}
