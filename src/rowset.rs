//! Row set lifecycle: an [`ExtendableRowSet`] is written through a
//! [`RowSetWriter`], sealed by [`RowSetWriter::done`] into a [`SingleRowSet`],
//! and read any number of times through [`RowSetReader`]s.

use std::{rc::Rc, sync::Arc};

use arrow::record_batch::RecordBatch;

use crate::{
    error::{ProtocolMisuse, RowSetError, SchemaMismatch},
    logging::rowset_log,
    option::RowSetOptions,
    reader::{self, ArrayReader, ObjectReader, RowCursor, ScalarReader, TupleReader},
    schema::{ColumnIndex, TupleSchema},
    value::Value,
    writer::{self, ArrayWriter, ObjectWriter, ScalarWriter, TupleWriter, WriterCore},
};

/// A batch being written.
///
/// Owns the column buffers and the writer tree; every writer handed out
/// shares them, so accessors obtained from one writer stay valid for all.
#[derive(Debug)]
pub struct ExtendableRowSet {
    core: Rc<WriterCore>,
    root: Rc<TupleWriter>,
}

impl ExtendableRowSet {
    pub fn new(schema: Arc<TupleSchema>, options: RowSetOptions) -> Self {
        let core = Rc::new(WriterCore::new(schema, options));
        let root = Rc::new(writer::bind(&core));
        rowset_log!(
            log::Level::Debug,
            "rowset_bind",
            "columns={} vectors={} max_rows={} max_buffer_bytes={}",
            root.len(),
            core.vector_count(),
            options.row_limit(),
            options.buffer_limit(),
        );
        Self { core, root }
    }

    pub fn schema(&self) -> &Arc<TupleSchema> {
        self.core.schema()
    }

    pub fn writer(&self) -> RowSetWriter {
        RowSetWriter {
            core: self.core.clone(),
            root: self.root.clone(),
        }
    }

    /// Rows committed so far.
    pub fn row_count(&self) -> usize {
        self.core.row_index()
    }

    /// Releases the buffers unless the batch was already sealed. Idempotent.
    pub fn clear(&self) {
        self.core.release();
    }
}

/// Writes rows into an [`ExtendableRowSet`].
#[derive(Debug)]
pub struct RowSetWriter {
    core: Rc<WriterCore>,
    root: Rc<TupleWriter>,
}

impl RowSetWriter {
    /// The row tuple.
    pub fn root(&self) -> &TupleWriter {
        &self.root
    }

    pub fn column<I: ColumnIndex>(&self, index: I) -> Result<&ObjectWriter, SchemaMismatch> {
        self.root.column(index)
    }

    pub fn scalar<I: ColumnIndex>(&self, index: I) -> Result<&ScalarWriter, SchemaMismatch> {
        self.root.scalar(index)
    }

    pub fn array<I: ColumnIndex>(&self, index: I) -> Result<&ArrayWriter, SchemaMismatch> {
        self.root.array(index)
    }

    pub fn tuple<I: ColumnIndex>(&self, index: I) -> Result<&TupleWriter, SchemaMismatch> {
        self.root.tuple(index)
    }

    /// Writes a whole row given as a [`Value::Tuple`] and saves it.
    ///
    /// On failure the row in progress is dropped, including values set
    /// through cached accessors before the call.
    pub fn add_row(&self, row: &Value) -> Result<(), RowSetError> {
        if let Err(err) = self.root.set_object(row) {
            self.core.discard();
            return Err(err);
        }
        self.save()
    }

    /// Commits the current row. Columns left unwritten take their default.
    pub fn save(&self) -> Result<(), RowSetError> {
        self.core.save_row()
    }

    /// True once the row limit or any buffer's byte capacity is reached.
    pub fn is_full(&self) -> bool {
        self.core.is_full()
    }

    /// Index of the row being written, equal to the rows saved so far.
    pub fn row_index(&self) -> usize {
        self.core.row_index()
    }

    /// Drops any unsaved row and seals the batch.
    pub fn done(&self) -> Result<SingleRowSet, RowSetError> {
        let batch = self.core.seal()?;
        Ok(SingleRowSet {
            schema: self.core.schema().clone(),
            batch: Some(batch),
        })
    }

    /// Abandons the batch and releases its buffers. Idempotent.
    pub fn clear(&self) {
        self.core.release();
    }
}

/// An immutable, sealed batch.
#[derive(Debug, Clone)]
pub struct SingleRowSet {
    schema: Arc<TupleSchema>,
    batch: Option<RecordBatch>,
}

impl SingleRowSet {
    /// Wraps an existing batch whose columns follow `schema`.
    pub fn try_new(schema: Arc<TupleSchema>, batch: RecordBatch) -> Result<Self, RowSetError> {
        let rows = Rc::new(RowCursor::new(batch.num_rows()));
        reader::bind(&schema, &batch, &rows)?;
        Ok(Self {
            schema,
            batch: Some(batch),
        })
    }

    pub fn schema(&self) -> &Arc<TupleSchema> {
        &self.schema
    }

    /// Rows in the batch; zero once cleared.
    pub fn row_count(&self) -> usize {
        self.batch.as_ref().map_or(0, RecordBatch::num_rows)
    }

    pub fn batch(&self) -> Option<&RecordBatch> {
        self.batch.as_ref()
    }

    /// A new reader positioned before the first row.
    pub fn reader(&self) -> Result<RowSetReader, RowSetError> {
        let batch = self.batch.as_ref().ok_or(ProtocolMisuse::Released)?;
        let cursor = Rc::new(RowCursor::new(batch.num_rows()));
        let root = reader::bind(&self.schema, batch, &cursor)?;
        Ok(RowSetReader { cursor, root })
    }

    /// Drops the batch. Idempotent.
    pub fn clear(&mut self) {
        if let Some(batch) = self.batch.take() {
            rowset_log!(
                log::Level::Debug,
                "rowset_released",
                "rows={}",
                batch.num_rows(),
            );
        }
    }
}

/// Reads the rows of a [`SingleRowSet`].
#[derive(Debug)]
pub struct RowSetReader {
    cursor: Rc<RowCursor>,
    root: TupleReader,
}

impl RowSetReader {
    /// Advances to the next row; false once every row was visited.
    pub fn next(&self) -> bool {
        self.cursor.next()
    }

    /// Jumps to `row`, whatever the current position.
    pub fn set_row(&self, row: usize) -> Result<(), RowSetError> {
        Ok(self.cursor.set_row(row)?)
    }

    /// Moves back before the first row.
    pub fn reset(&self) {
        self.cursor.reset();
    }

    /// Current row, `None` before the first `next()` and after the last.
    pub fn row_index(&self) -> Option<usize> {
        self.cursor.current()
    }

    pub fn row_count(&self) -> usize {
        self.cursor.rows()
    }

    pub fn root(&self) -> &TupleReader {
        &self.root
    }

    pub fn column<I: ColumnIndex>(&self, index: I) -> Result<&ObjectReader, SchemaMismatch> {
        self.root.column(index)
    }

    pub fn scalar<I: ColumnIndex>(&self, index: I) -> Result<&ScalarReader, SchemaMismatch> {
        self.root.scalar(index)
    }

    pub fn array<I: ColumnIndex>(&self, index: I) -> Result<&ArrayReader, SchemaMismatch> {
        self.root.array(index)
    }

    pub fn tuple<I: ColumnIndex>(&self, index: I) -> Result<&TupleReader, SchemaMismatch> {
        self.root.tuple(index)
    }

    /// The current row as a [`Value::Tuple`].
    pub fn get_row(&self) -> Result<Value, RowSetError> {
        self.root.get_object()
    }
}
