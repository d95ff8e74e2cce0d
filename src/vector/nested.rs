use std::{mem, sync::Arc};

use arrow::{
    array::{Array, ArrayRef, ListArray, StructArray},
    buffer::{OffsetBuffer, ScalarBuffer},
    datatypes::{Field, Fields},
    error::ArrowError,
};

use super::{check_capacity, ValueVector, VectorError, VectorId};
use crate::schema::LIST_ITEM;

const OFFSET_WIDTH: usize = mem::size_of::<i32>();

/// Offsets of a repeated column. Slot `i` owns entries
/// `offsets[i]..offsets[i + 1]` of the entry vector.
#[derive(Debug)]
pub struct RepeatedVector {
    offsets: Vec<i32>,
    pub(super) entry: VectorId,
    capacity: usize,
}

impl RepeatedVector {
    pub fn new(entry: VectorId, capacity: usize) -> Self {
        Self {
            offsets: vec![0],
            entry,
            capacity,
        }
    }

    pub fn entry(&self) -> VectorId {
        self.entry
    }

    /// Entry index just past the last committed slot.
    pub fn end_offset(&self) -> usize {
        self.offsets.last().copied().unwrap_or_default() as usize
    }

    pub fn offset(&self, slot: usize) -> Option<usize> {
        self.offsets.get(slot).map(|offset| *offset as usize)
    }

    /// Closes `slot` so that it ends at entry index `end`. Skipped slots
    /// before it become empty.
    pub fn commit_slot(&mut self, slot: usize, end: usize) -> Result<(), VectorError> {
        check_capacity((slot + 2) * OFFSET_WIDTH, self.capacity)?;
        let end = i32::try_from(end).map_err(|_| VectorError::Overflow {
            requested: end,
            capacity: i32::MAX as usize,
        })?;
        self.fill(slot)?;
        self.offsets.truncate(slot + 1);
        self.offsets.push(end);
        Ok(())
    }

    /// Pads with empty slots until the vector holds `count` slots.
    pub fn fill(&mut self, count: usize) -> Result<(), VectorError> {
        if count > self.value_count() {
            check_capacity((count + 1) * OFFSET_WIDTH, self.capacity)?;
            let end = self.offsets.last().copied().unwrap_or_default();
            self.offsets.resize(count + 1, end);
        }
        Ok(())
    }

    pub fn freeze(&mut self, values: ArrayRef) -> Result<ArrayRef, ArrowError> {
        let offsets = OffsetBuffer::new(ScalarBuffer::from(mem::replace(
            &mut self.offsets,
            vec![0],
        )));
        let field = Arc::new(Field::new(LIST_ITEM, values.data_type().clone(), false));
        Ok(Arc::new(ListArray::try_new(field, offsets, values, None)?))
    }
}

impl ValueVector for RepeatedVector {
    fn value_count(&self) -> usize {
        self.offsets.len() - 1
    }

    fn buffer_bytes(&self) -> usize {
        self.offsets.len() * OFFSET_WIDTH
    }

    fn byte_capacity(&self) -> usize {
        self.capacity
    }

    fn truncate(&mut self, value_count: usize) {
        if value_count < self.value_count() {
            self.offsets.truncate(value_count + 1);
        }
    }

    fn reset(&mut self) {
        self.offsets = vec![0];
    }
}

/// Named child vectors sharing one value count.
///
/// Holds no buffer of its own; the count only moves when every child has a
/// value for the new slot.
#[derive(Debug)]
pub struct MapVector {
    names: Vec<String>,
    children: Vec<VectorId>,
    count: usize,
}

impl MapVector {
    pub fn new(names: Vec<String>, children: Vec<VectorId>) -> Self {
        debug_assert_eq!(names.len(), children.len());
        Self {
            names,
            children,
            count: 0,
        }
    }

    pub fn children(&self) -> &[VectorId] {
        &self.children
    }

    pub fn fill(&mut self, count: usize) {
        self.count = self.count.max(count);
    }

    pub fn freeze(&mut self, columns: Vec<ArrayRef>) -> Result<ArrayRef, ArrowError> {
        let fields = self
            .names
            .iter()
            .zip(columns.iter())
            .map(|(name, column)| Field::new(name, column.data_type().clone(), false))
            .collect::<Fields>();
        self.count = 0;
        Ok(Arc::new(StructArray::try_new(fields, columns, None)?))
    }
}

impl ValueVector for MapVector {
    fn value_count(&self) -> usize {
        self.count
    }

    fn buffer_bytes(&self) -> usize {
        0
    }

    fn byte_capacity(&self) -> usize {
        usize::MAX
    }

    fn truncate(&mut self, value_count: usize) {
        self.count = self.count.min(value_count);
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}
