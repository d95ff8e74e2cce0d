use std::{cell::Cell, rc::Rc};

use arrow::buffer::OffsetBuffer;

use crate::error::ProtocolMisuse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowState {
    BeforeFirst,
    At(usize),
    Exhausted,
}

/// Row position shared by every accessor of one reader.
#[derive(Debug)]
pub(crate) struct RowCursor {
    state: Cell<RowState>,
    rows: usize,
}

impl RowCursor {
    pub(crate) fn new(rows: usize) -> Self {
        Self {
            state: Cell::new(RowState::BeforeFirst),
            rows,
        }
    }

    pub(crate) fn rows(&self) -> usize {
        self.rows
    }

    pub(crate) fn next(&self) -> bool {
        let next = match self.state.get() {
            RowState::BeforeFirst => 0,
            RowState::At(row) => row + 1,
            RowState::Exhausted => return false,
        };
        if next < self.rows {
            self.state.set(RowState::At(next));
            true
        } else {
            self.state.set(RowState::Exhausted);
            false
        }
    }

    pub(crate) fn set_row(&self, row: usize) -> Result<(), ProtocolMisuse> {
        if row >= self.rows {
            return Err(ProtocolMisuse::RowOutOfRange {
                index: row,
                rows: self.rows,
            });
        }
        self.state.set(RowState::At(row));
        Ok(())
    }

    pub(crate) fn reset(&self) {
        self.state.set(RowState::BeforeFirst);
    }

    pub(crate) fn current(&self) -> Option<usize> {
        match self.state.get() {
            RowState::At(row) => Some(row),
            _ => None,
        }
    }
}

/// Where a reader node takes its value index from.
#[derive(Debug, Clone)]
pub(crate) enum Position {
    Row(Rc<RowCursor>),
    Element(Rc<ElementCursor>),
}

impl Position {
    pub(crate) fn index(&self) -> Result<usize, ProtocolMisuse> {
        match self {
            Position::Row(cursor) => cursor.current().ok_or(ProtocolMisuse::NoCurrentRow),
            Position::Element(cursor) => cursor.index(),
        }
    }
}

/// Element selected within the current slot of a list column.
///
/// The selection is tied to the parent slot it was made for; once the parent
/// moves, the cursor falls back to the first element.
#[derive(Debug)]
pub(crate) struct ElementCursor {
    parent: Position,
    offsets: OffsetBuffer<i32>,
    selected: Cell<Option<(usize, usize)>>,
}

impl ElementCursor {
    pub(crate) fn new(parent: Position, offsets: OffsetBuffer<i32>) -> Self {
        Self {
            parent,
            offsets,
            selected: Cell::new(None),
        }
    }

    fn bounds(&self) -> Result<(usize, usize, usize), ProtocolMisuse> {
        let slot = self.parent.index()?;
        let start = self.offsets[slot] as usize;
        let end = self.offsets[slot + 1] as usize;
        Ok((slot, start, end))
    }

    pub(crate) fn size(&self) -> Result<usize, ProtocolMisuse> {
        let (_, start, end) = self.bounds()?;
        Ok(end - start)
    }

    /// Absolute index of element `element` of the current slot.
    pub(crate) fn absolute(&self, element: usize) -> Result<usize, ProtocolMisuse> {
        let (_, start, end) = self.bounds()?;
        if start + element >= end {
            return Err(ProtocolMisuse::ElementOutOfRange {
                index: element,
                size: end - start,
            });
        }
        Ok(start + element)
    }

    pub(crate) fn select(&self, element: usize) -> Result<(), ProtocolMisuse> {
        let slot = self.parent.index()?;
        self.absolute(element)?;
        self.selected.set(Some((slot, element)));
        Ok(())
    }

    pub(crate) fn selected(&self) -> Option<(usize, usize)> {
        self.selected.get()
    }

    pub(crate) fn restore(&self, selected: Option<(usize, usize)>) {
        self.selected.set(selected);
    }

    pub(crate) fn index(&self) -> Result<usize, ProtocolMisuse> {
        let slot = self.parent.index()?;
        let element = match self.selected.get() {
            Some((selected_slot, element)) if selected_slot == slot => element,
            _ => 0,
        };
        self.absolute(element)
    }
}
