//! Shared write state behind every writer accessor.
//!
//! Accessors only hold an `Rc<WriterCore>` and the id of their vector, so a
//! cached accessor stays valid while rows are saved through the row set
//! writer. All mutation funnels through one `RefCell`.

use std::{
    cell::{Cell, RefCell},
    sync::Arc,
};

use arrow::{
    error::ArrowError,
    record_batch::{RecordBatch, RecordBatchOptions},
};

use crate::{
    error::{CapacityOverflow, ProtocolMisuse, RowSetError, SchemaMismatch},
    logging::rowset_log,
    option::RowSetOptions,
    schema::{StructureKind, TupleSchema},
    value::ValueRef,
    vector::{ColumnVector, ValueVector, VectorError, VectorId, VectorStore},
};

/// Index into [`WriteState::cursors`].
pub(crate) type CursorId = usize;

/// Cursor holding the index of the row being written.
pub(crate) const ROW_CURSOR: CursorId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Writing,
    Sealed,
    Released,
}

/// Write position of one vector.
#[derive(Debug)]
pub(crate) struct Placement {
    /// Column path used in error messages and logs.
    pub(crate) path: String,
    /// Cursor giving the slot this vector writes at.
    pub(crate) position: CursorId,
    /// Element cursor owned by a repeated vector.
    pub(crate) elements: Option<CursorId>,
    /// Scalar entry of an array: every write appends one element.
    pub(crate) append: bool,
}

#[derive(Debug)]
struct WriteState {
    vectors: VectorStore,
    placements: Vec<Placement>,
    cursors: Vec<usize>,
    top: Vec<VectorId>,
}

/// Failed vector write, before the column path is attached.
struct VectorFault {
    id: VectorId,
    error: VectorError,
}

#[derive(Debug)]
pub(crate) struct WriterCore {
    schema: Arc<TupleSchema>,
    options: RowSetOptions,
    lifecycle: Cell<Lifecycle>,
    state: RefCell<WriteState>,
}

impl WriterCore {
    pub(crate) fn new(schema: Arc<TupleSchema>, options: RowSetOptions) -> Self {
        Self {
            schema,
            options,
            lifecycle: Cell::new(Lifecycle::Writing),
            state: RefCell::new(WriteState {
                vectors: VectorStore::default(),
                placements: Vec::new(),
                cursors: vec![0],
                top: Vec::new(),
            }),
        }
    }

    pub(crate) fn schema(&self) -> &Arc<TupleSchema> {
        &self.schema
    }

    pub(crate) fn options(&self) -> &RowSetOptions {
        &self.options
    }

    pub(crate) fn new_cursor(&self) -> CursorId {
        let mut state = self.state.borrow_mut();
        state.cursors.push(0);
        state.cursors.len() - 1
    }

    pub(crate) fn register(&self, vector: ColumnVector, placement: Placement) -> VectorId {
        let mut state = self.state.borrow_mut();
        state.placements.push(placement);
        state.vectors.push(vector)
    }

    /// Marks the vectors of the top-level columns, in schema order.
    pub(crate) fn set_top(&self, top: Vec<VectorId>) {
        self.state.borrow_mut().top = top;
    }

    pub(crate) fn vector_count(&self) -> usize {
        self.state.borrow().vectors.len()
    }

    fn check_writable(&self) -> Result<(), RowSetError> {
        match self.lifecycle.get() {
            Lifecycle::Writing => Ok(()),
            Lifecycle::Sealed => Err(ProtocolMisuse::Sealed.into()),
            Lifecycle::Released => Err(ProtocolMisuse::Released.into()),
        }
    }

    fn check_row(&self, state: &WriteState) -> Result<(), RowSetError> {
        if state.cursors[ROW_CURSOR] >= self.options.row_limit() {
            return Err(CapacityOverflow::RowLimit {
                max_rows: self.options.row_limit(),
            }
            .into());
        }
        Ok(())
    }

    /// Writes a scalar at the vector's current position. The vector rejects
    /// values of another type, except an integer written into a long column.
    pub(crate) fn write(&self, id: VectorId, value: ValueRef<'_>) -> Result<(), RowSetError> {
        self.check_writable()?;
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        self.check_row(state)?;

        let (position, append) = {
            let placement = &state.placements[id];
            (placement.position, placement.append)
        };
        let index = state.cursors[position];
        match state.vectors.get_mut(id).set_value(index, value) {
            Ok(()) => {
                if append {
                    state.cursors[position] += 1;
                }
                Ok(())
            }
            Err(error) => Err(self.fail(state, VectorFault { id, error })),
        }
    }

    /// Commits the current row across every top-level column.
    pub(crate) fn save_row(&self) -> Result<(), RowSetError> {
        self.check_writable()?;
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        self.check_row(state)?;

        let row = state.cursors[ROW_CURSOR];
        for position in 0..state.top.len() {
            let id = state.top[position];
            if let Err(fault) = commit(state, id, row) {
                return Err(self.fail(state, fault));
            }
        }
        state.cursors[ROW_CURSOR] = row + 1;
        Ok(())
    }

    /// Commits the current element of the array backed by `array`. Arrays of
    /// scalars append on every write, so there is nothing left to commit.
    pub(crate) fn save_element(&self, array: VectorId) -> Result<(), RowSetError> {
        self.check_writable()?;
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        self.check_row(state)?;

        let (entry, elements) = match (state.vectors.get(array), state.placements[array].elements)
        {
            (ColumnVector::Repeated(repeated), Some(elements)) => (repeated.entry(), elements),
            _ => return Ok(()),
        };
        if state.placements[entry].append {
            return Ok(());
        }
        let slot = state.cursors[elements];
        if let Err(fault) = commit(state, entry, slot) {
            return Err(self.fail(state, fault));
        }
        state.cursors[elements] = slot + 1;
        Ok(())
    }

    /// Elements saved so far in the current slot of `array`.
    pub(crate) fn element_index(&self, array: VectorId) -> usize {
        let state = self.state.borrow();
        match (state.vectors.get(array), state.placements[array].elements) {
            (ColumnVector::Repeated(repeated), Some(elements)) => state.cursors[elements]
                .saturating_sub(repeated.end_offset()),
            _ => 0,
        }
    }

    pub(crate) fn row_index(&self) -> usize {
        self.state.borrow().cursors[ROW_CURSOR]
    }

    pub(crate) fn is_full(&self) -> bool {
        let state = self.state.borrow();
        state.cursors[ROW_CURSOR] >= self.options.row_limit() || state.vectors.any_exhausted()
    }

    /// Drops the unsaved row and freezes every column into one batch.
    pub(crate) fn seal(&self) -> Result<RecordBatch, RowSetError> {
        match self.lifecycle.get() {
            Lifecycle::Writing => {}
            Lifecycle::Sealed => return Err(ProtocolMisuse::AlreadyDone.into()),
            Lifecycle::Released => return Err(ProtocolMisuse::Released.into()),
        }
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        discard_row(state);

        let rows = state.cursors[ROW_CURSOR];
        match freeze_batch(&self.schema, state, rows) {
            Ok(batch) => {
                self.lifecycle.set(Lifecycle::Sealed);
                rowset_log!(
                    log::Level::Debug,
                    "rowset_sealed",
                    "rows={} columns={}",
                    rows,
                    batch.num_columns(),
                );
                Ok(batch)
            }
            Err(err) => {
                self.lifecycle.set(Lifecycle::Released);
                state.vectors.reset();
                Err(err.into())
            }
        }
    }

    /// Releases the buffers of an unsealed batch. Idempotent.
    pub(crate) fn release(&self) {
        if self.lifecycle.get() != Lifecycle::Writing {
            return;
        }
        self.lifecycle.set(Lifecycle::Released);
        let mut state = self.state.borrow_mut();
        state.vectors.reset();
        rowset_log!(
            log::Level::Debug,
            "rowset_released",
            "rows={}",
            state.cursors[ROW_CURSOR],
        );
    }

    /// Drops everything written since the last saved row.
    pub(crate) fn discard(&self) {
        if self.lifecycle.get() != Lifecycle::Writing {
            return;
        }
        let mut state = self.state.borrow_mut();
        discard_row(&mut state);
        rowset_log!(
            log::Level::Debug,
            "row_discarded",
            "row={}",
            state.cursors[ROW_CURSOR],
        );
    }

    /// Maps `fault` to a public error. Overflow also discards the row in
    /// progress; a rejected value type leaves it as is.
    fn fail(&self, state: &mut WriteState, fault: VectorFault) -> RowSetError {
        let column = state.placements[fault.id].path.clone();
        match fault.error {
            VectorError::Overflow {
                requested,
                capacity,
            } => {
                discard_row(state);
                rowset_log!(
                    log::Level::Warn,
                    "row_discarded",
                    "row={} column={} requested={} capacity={}",
                    state.cursors[ROW_CURSOR],
                    column,
                    requested,
                    capacity,
                );
                CapacityOverflow::Buffer {
                    column,
                    requested,
                    capacity,
                }
                .into()
            }
            VectorError::TypeMismatch {
                expected: Some(expected),
                actual,
            } => SchemaMismatch::WrongValueType {
                column,
                requested: actual,
                actual: expected,
            }
            .into(),
            VectorError::TypeMismatch { expected: None, .. } => {
                let actual = match state.vectors.get(fault.id) {
                    ColumnVector::Map(_) => StructureKind::Tuple,
                    _ => StructureKind::Array,
                };
                SchemaMismatch::WrongKind {
                    column,
                    requested: StructureKind::Scalar,
                    actual,
                }
                .into()
            }
        }
    }
}

/// Closes `slot` of vector `id`: pads untouched scalars with defaults and
/// ends repeated slots at their element cursor, dropping unsaved elements.
fn commit(state: &mut WriteState, id: VectorId, slot: usize) -> Result<(), VectorFault> {
    let fault = |error| VectorFault { id, error };
    match state.vectors.get(id) {
        ColumnVector::Repeated(repeated) => {
            let entry = repeated.entry();
            let end = state.placements[id]
                .elements
                .map(|elements| state.cursors[elements])
                .unwrap_or_else(|| repeated.end_offset());
            truncate(state, entry, end);
            if let ColumnVector::Repeated(repeated) = state.vectors.get_mut(id) {
                repeated.commit_slot(slot, end).map_err(fault)?;
            }
            Ok(())
        }
        ColumnVector::Map(_) => {
            for position in 0..state.vectors.get(id).children().len() {
                let child = state.vectors.get(id).children()[position];
                commit(state, child, slot)?;
            }
            state.vectors.get_mut(id).fill(slot + 1).map_err(fault)
        }
        _ => state.vectors.get_mut(id).fill(slot + 1).map_err(fault),
    }
}

/// Cuts vector `id` back to `count` values, its descendants with it.
fn truncate(state: &mut WriteState, id: VectorId, count: usize) {
    state.vectors.get_mut(id).truncate(count);
    let child_count = match state.vectors.get(id) {
        ColumnVector::Repeated(repeated) => {
            let end = repeated.end_offset();
            if let Some(elements) = state.placements[id].elements {
                state.cursors[elements] = end;
            }
            end
        }
        _ => count,
    };
    for position in 0..state.vectors.get(id).children().len() {
        let child = state.vectors.get(id).children()[position];
        truncate(state, child, child_count);
    }
}

/// Truncates every top-level column to the committed row count.
fn discard_row(state: &mut WriteState) {
    let row = state.cursors[ROW_CURSOR];
    for position in 0..state.top.len() {
        let id = state.top[position];
        truncate(state, id, row);
    }
}

fn freeze_batch(
    schema: &TupleSchema,
    state: &mut WriteState,
    rows: usize,
) -> Result<RecordBatch, ArrowError> {
    let mut columns = Vec::with_capacity(state.top.len());
    for position in 0..state.top.len() {
        let id = state.top[position];
        columns.push(state.vectors.freeze(id)?);
    }
    RecordBatch::try_new_with_options(
        schema.arrow_schema(),
        columns,
        &RecordBatchOptions::new().with_row_count(Some(rows)),
    )
}
