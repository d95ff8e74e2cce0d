use arrow::{datatypes::DataType, error::ArrowError};

use crate::schema::{StructureKind, ValueType};

/// Error returned by every writer, reader and row set operation.
#[derive(Debug, thiserror::Error)]
pub enum RowSetError {
    /// Wrong capability cast, wrong value type, unknown name or position.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(#[from] SchemaMismatch),
    /// A buffer's byte budget or the batch's row ceiling was exceeded.
    #[error(transparent)]
    CapacityOverflow(#[from] CapacityOverflow),
    /// Out-of-order lifecycle call.
    #[error("protocol misuse: {0}")]
    ProtocolMisuse(#[from] ProtocolMisuse),
    /// Arrow refused to assemble the sealed batch.
    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

/// Navigation or cast that does not agree with the schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaMismatch {
    /// Referenced column name is absent from the tuple.
    #[error("no such column: {name}")]
    NoSuchColumn {
        /// The missing column name.
        name: String,
    },
    /// Column position is outside the tuple's column range.
    #[error("column position {position} out of range (columns={columns})")]
    ColumnOutOfRange {
        /// Requested position.
        position: usize,
        /// Number of columns in the tuple.
        columns: usize,
    },
    /// Capability cast to a structural kind the node does not have.
    #[error("column `{column}` is {actual:?}, not {requested:?}")]
    WrongKind {
        /// Column path.
        column: String,
        /// Kind the caller asked for.
        requested: StructureKind,
        /// Kind declared by the schema.
        actual: StructureKind,
    },
    /// Scalar access through a value type the column does not hold.
    #[error("column `{column}` holds {actual:?} values, not {requested:?}")]
    WrongValueType {
        /// Column path.
        column: String,
        /// Value type the caller used.
        requested: ValueType,
        /// Value type declared by the schema.
        actual: ValueType,
    },
}

/// Capacity exhaustion detected during a write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapacityOverflow {
    /// The batch already holds its maximum number of rows.
    #[error("row overflow: batch is limited to {max_rows} rows")]
    RowLimit {
        /// Configured row ceiling.
        max_rows: usize,
    },
    /// A value buffer would grow past its byte capacity.
    #[error("buffer overflow on column `{column}`: {requested} bytes requested, capacity is {capacity}")]
    Buffer {
        /// Column path owning the buffer.
        column: String,
        /// Buffer size the write would have produced.
        requested: usize,
        /// Configured byte capacity.
        capacity: usize,
    },
}

/// Lifecycle call made in the wrong state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolMisuse {
    /// Write attempted after `done()`.
    #[error("row set is sealed; no further writes are accepted")]
    Sealed,
    /// `done()` called a second time.
    #[error("done() was already called")]
    AlreadyDone,
    /// Access after the buffers were released with `clear()`.
    #[error("row set buffers were released")]
    Released,
    /// Read before the first `next()` or after the reader was exhausted.
    #[error("reader is not positioned on a row")]
    NoCurrentRow,
    /// Explicit row position past the committed rows.
    #[error("row {index} out of range (rows={rows})")]
    RowOutOfRange {
        /// Requested row.
        index: usize,
        /// Committed rows.
        rows: usize,
    },
    /// Array element index past the current array's size.
    #[error("element {index} out of range (size={size})")]
    ElementOutOfRange {
        /// Requested element.
        index: usize,
        /// Elements in the current array.
        size: usize,
    },
}

/// Error raised while building a [`TupleSchema`](crate::schema::TupleSchema).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// Two columns at one tuple level share a name.
    #[error("duplicate column name: {name}")]
    DuplicateColumn {
        /// The repeated name.
        name: String,
    },
    /// A nested tuple declares no columns.
    #[error("tuple column `{name}` has no columns")]
    EmptyTuple {
        /// Name of the empty tuple column.
        name: String,
    },
    /// Arrow type with no counterpart in the value type model.
    #[error("unsupported data type for column `{name}`: {data_type:?}")]
    UnsupportedType {
        /// Column name.
        name: String,
        /// The offending Arrow type.
        data_type: DataType,
    },
}

impl RowSetError {
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, RowSetError::SchemaMismatch(_))
    }

    pub fn is_capacity_overflow(&self) -> bool {
        matches!(self, RowSetError::CapacityOverflow(_))
    }

    pub fn is_protocol_misuse(&self) -> bool {
        matches!(self, RowSetError::ProtocolMisuse(_))
    }
}
