//! Schema-driven row writers and readers over Arrow columnar batches.
//!
//! Callers describe rows with a [`TupleSchema`] of scalars, arrays and nested
//! tuples, write them one row at a time through a [`RowSetWriter`], seal the
//! batch into a [`SingleRowSet`] and read it back through a [`RowSetReader`].
//! Data is stored column by column; the accessor trees hide that layout and
//! keep row and element boundaries consistent at every nesting level.
//!
//! ```
//! use std::sync::Arc;
//!
//! use rowset::{
//!     ColumnMetadata, ColumnType, ExtendableRowSet, RowSetOptions, TupleSchema, ValueType,
//! };
//!
//! let schema = TupleSchema::new(vec![
//!     ColumnMetadata::scalar("id", ValueType::Integer),
//!     ColumnMetadata::array("tags", ColumnType::Scalar(ValueType::String)),
//! ])
//! .unwrap();
//! let rows = ExtendableRowSet::new(Arc::new(schema), RowSetOptions::default());
//! let writer = rows.writer();
//! let id = writer.scalar("id").unwrap();
//! let tags = writer.array("tags").unwrap().scalar().unwrap();
//! for row in 0..3 {
//!     id.set_int(row).unwrap();
//!     tags.set_string("a").unwrap();
//!     writer.save().unwrap();
//! }
//! let sealed = writer.done().unwrap();
//!
//! let reader = sealed.reader().unwrap();
//! let id = reader.scalar("id").unwrap();
//! while reader.next() {
//!     assert_eq!(reader.array("tags").unwrap().string_at(0).unwrap(), "a");
//!     assert!(id.get_int().unwrap() < 3);
//! }
//! ```

mod logging;

/// Error types shared by writers, readers and schemas.
pub mod error;
/// Capacity bounds of a row set.
pub mod option;
pub mod reader;
pub mod rowset;
pub mod schema;
/// Owned and borrowed cell values.
pub mod value;
pub mod vector;
pub mod writer;

pub use crate::{
    error::{CapacityOverflow, ProtocolMisuse, RowSetError, SchemaError, SchemaMismatch},
    option::{RowSetOptions, MAX_BUFFER_SIZE, MAX_ROW_COUNT},
    reader::{ArrayReader, ObjectReader, ScalarReader, TupleReader},
    rowset::{ExtendableRowSet, RowSetReader, RowSetWriter, SingleRowSet},
    schema::{ColumnIndex, ColumnMetadata, ColumnType, StructureKind, TupleSchema, ValueType},
    value::{Value, ValueRef},
    writer::{ArrayWriter, ObjectWriter, ScalarWriter, TupleWriter},
};
