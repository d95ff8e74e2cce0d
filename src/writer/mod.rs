//! Write-side accessor tree.
//!
//! The tree mirrors the schema and is built once when a row set is bound.
//! Every node is one of [`ScalarWriter`], [`ArrayWriter`] or [`TupleWriter`],
//! wrapped in an [`ObjectWriter`] for generic navigation. Nodes never change
//! identity, so a reference obtained before the first row may be reused for
//! every following row.

mod state;

use std::{rc::Rc, sync::Arc};

pub(crate) use self::state::WriterCore;
use self::state::{CursorId, Placement, ROW_CURSOR};
use crate::{
    error::{RowSetError, SchemaMismatch},
    schema::{ColumnIndex, ColumnType, StructureKind, TupleSchema, ValueType},
    value::{Value, ValueRef},
    vector::{ColumnVector, MapVector, RepeatedVector, VectorId},
};

/// Any node of the writer tree.
#[derive(Debug)]
pub enum ObjectWriter {
    Scalar(ScalarWriter),
    Array(ArrayWriter),
    Tuple(TupleWriter),
}

impl ObjectWriter {
    pub fn kind(&self) -> StructureKind {
        match self {
            ObjectWriter::Scalar(_) => StructureKind::Scalar,
            ObjectWriter::Array(_) => StructureKind::Array,
            ObjectWriter::Tuple(_) => StructureKind::Tuple,
        }
    }

    fn path(&self) -> &str {
        match self {
            ObjectWriter::Scalar(scalar) => &scalar.path,
            ObjectWriter::Array(array) => &array.path,
            ObjectWriter::Tuple(tuple) => &tuple.path,
        }
    }

    fn wrong_kind(&self, requested: StructureKind) -> SchemaMismatch {
        SchemaMismatch::WrongKind {
            column: self.path().to_string(),
            requested,
            actual: self.kind(),
        }
    }

    pub fn as_scalar(&self) -> Result<&ScalarWriter, SchemaMismatch> {
        match self {
            ObjectWriter::Scalar(scalar) => Ok(scalar),
            _ => Err(self.wrong_kind(StructureKind::Scalar)),
        }
    }

    pub fn as_array(&self) -> Result<&ArrayWriter, SchemaMismatch> {
        match self {
            ObjectWriter::Array(array) => Ok(array),
            _ => Err(self.wrong_kind(StructureKind::Array)),
        }
    }

    pub fn as_tuple(&self) -> Result<&TupleWriter, SchemaMismatch> {
        match self {
            ObjectWriter::Tuple(tuple) => Ok(tuple),
            _ => Err(self.wrong_kind(StructureKind::Tuple)),
        }
    }

    /// Writes a whole value at the node's current position. Arrays save every
    /// element they write.
    pub fn set_object(&self, value: &Value) -> Result<(), RowSetError> {
        match (self, value) {
            (ObjectWriter::Scalar(scalar), value) => match value.as_value_ref() {
                Some(value) => scalar.set_value(value),
                None => Err(self.wrong_kind(value.kind()).into()),
            },
            (ObjectWriter::Array(array), Value::Array(items)) => {
                for item in items {
                    array.entry.set_object(item)?;
                    array.save()?;
                }
                Ok(())
            }
            (ObjectWriter::Tuple(tuple), value) => tuple.set_object(value),
            (_, value) => Err(SchemaMismatch::WrongKind {
                column: self.path().to_string(),
                requested: value.kind(),
                actual: self.kind(),
            }
            .into()),
        }
    }
}

/// Writes one value type at the current row or element.
#[derive(Debug)]
pub struct ScalarWriter {
    core: Rc<WriterCore>,
    id: VectorId,
    path: String,
    value_type: ValueType,
}

impl ScalarWriter {
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Writes `value`, widening an integer into a long column.
    pub fn set_value(&self, value: ValueRef<'_>) -> Result<(), RowSetError> {
        self.core.write(self.id, value)
    }

    pub fn set_int(&self, value: i32) -> Result<(), RowSetError> {
        self.set_value(ValueRef::Int(value))
    }

    pub fn set_long(&self, value: i64) -> Result<(), RowSetError> {
        self.set_value(ValueRef::Long(value))
    }

    pub fn set_double(&self, value: f64) -> Result<(), RowSetError> {
        self.set_value(ValueRef::Double(value))
    }

    pub fn set_bool(&self, value: bool) -> Result<(), RowSetError> {
        self.set_value(ValueRef::Bool(value))
    }

    pub fn set_string(&self, value: &str) -> Result<(), RowSetError> {
        self.set_value(ValueRef::String(value))
    }

    pub fn set_bytes(&self, value: &[u8]) -> Result<(), RowSetError> {
        self.set_value(ValueRef::Bytes(value))
    }
}

/// Writes a repeated column, one element at a time.
///
/// For arrays of scalars every `set_*` on the entry appends an element. For
/// arrays of tuples or arrays, write the entry and call [`save`](Self::save)
/// to close the element; an element left unsaved is dropped when the row is
/// saved.
#[derive(Debug)]
pub struct ArrayWriter {
    core: Rc<WriterCore>,
    id: VectorId,
    path: String,
    entry: Box<ObjectWriter>,
}

impl ArrayWriter {
    /// The shared node writing the current element.
    pub fn entry(&self) -> &ObjectWriter {
        &self.entry
    }

    pub fn entry_type(&self) -> StructureKind {
        self.entry.kind()
    }

    pub fn scalar(&self) -> Result<&ScalarWriter, SchemaMismatch> {
        self.entry.as_scalar()
    }

    pub fn array(&self) -> Result<&ArrayWriter, SchemaMismatch> {
        self.entry.as_array()
    }

    pub fn tuple(&self) -> Result<&TupleWriter, SchemaMismatch> {
        self.entry.as_tuple()
    }

    /// Closes the current element and moves to the next one. The row
    /// boundary is left alone.
    pub fn save(&self) -> Result<(), RowSetError> {
        self.core.save_element(self.id)
    }

    /// Number of elements written to the current array so far.
    pub fn element_index(&self) -> usize {
        self.core.element_index(self.id)
    }
}

/// Ordered named columns, either a row or a nested tuple.
#[derive(Debug)]
pub struct TupleWriter {
    path: String,
    schema: Arc<TupleSchema>,
    columns: Vec<ObjectWriter>,
}

impl TupleWriter {
    pub fn schema(&self) -> &Arc<TupleSchema> {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column<I: ColumnIndex>(&self, index: I) -> Result<&ObjectWriter, SchemaMismatch> {
        let position = index.position_in(&self.schema)?;
        Ok(&self.columns[position])
    }

    pub fn scalar<I: ColumnIndex>(&self, index: I) -> Result<&ScalarWriter, SchemaMismatch> {
        self.column(index)?.as_scalar()
    }

    pub fn array<I: ColumnIndex>(&self, index: I) -> Result<&ArrayWriter, SchemaMismatch> {
        self.column(index)?.as_array()
    }

    pub fn tuple<I: ColumnIndex>(&self, index: I) -> Result<&TupleWriter, SchemaMismatch> {
        self.column(index)?.as_tuple()
    }

    /// Writes a [`Value::Tuple`] column by column, in schema order. Missing
    /// trailing columns keep their defaults.
    pub fn set_object(&self, value: &Value) -> Result<(), RowSetError> {
        let Value::Tuple(items) = value else {
            return Err(SchemaMismatch::WrongKind {
                column: self.path.clone(),
                requested: value.kind(),
                actual: StructureKind::Tuple,
            }
            .into());
        };
        if items.len() > self.columns.len() {
            return Err(SchemaMismatch::ColumnOutOfRange {
                position: self.columns.len(),
                columns: self.columns.len(),
            }
            .into());
        }
        for (column, item) in self.columns.iter().zip(items) {
            column.set_object(item)?;
        }
        Ok(())
    }
}

/// Builds the writer tree of `core`'s schema and registers every vector.
pub(crate) fn bind(core: &Rc<WriterCore>) -> TupleWriter {
    let schema = core.schema().clone();
    let (columns, top) = bind_columns(core, &schema, "", ROW_CURSOR);
    core.set_top(top);
    TupleWriter {
        path: String::new(),
        schema,
        columns,
    }
}

fn bind_columns(
    core: &Rc<WriterCore>,
    schema: &TupleSchema,
    prefix: &str,
    position: CursorId,
) -> (Vec<ObjectWriter>, Vec<VectorId>) {
    schema
        .columns()
        .iter()
        .map(|column| {
            let path = if prefix.is_empty() {
                column.name().to_string()
            } else {
                format!("{prefix}.{}", column.name())
            };
            bind_column(core, column.column_type(), path, position, false)
        })
        .unzip()
}

fn bind_column(
    core: &Rc<WriterCore>,
    column_type: &ColumnType,
    path: String,
    position: CursorId,
    append: bool,
) -> (ObjectWriter, VectorId) {
    let capacity = core.options().buffer_limit();
    match column_type {
        ColumnType::Scalar(value_type) => {
            let id = core.register(
                ColumnVector::scalar(*value_type, capacity),
                Placement {
                    path: path.clone(),
                    position,
                    elements: None,
                    append,
                },
            );
            let writer = ScalarWriter {
                core: core.clone(),
                id,
                path,
                value_type: *value_type,
            };
            (ObjectWriter::Scalar(writer), id)
        }
        ColumnType::Array(element) => {
            let elements = core.new_cursor();
            let entry_append = matches!(element.as_ref(), ColumnType::Scalar(_));
            let (entry, entry_id) =
                bind_column(core, element, path.clone(), elements, entry_append);
            let id = core.register(
                ColumnVector::Repeated(RepeatedVector::new(entry_id, capacity)),
                Placement {
                    path: path.clone(),
                    position,
                    elements: Some(elements),
                    append: false,
                },
            );
            let writer = ArrayWriter {
                core: core.clone(),
                id,
                path,
                entry: Box::new(entry),
            };
            (ObjectWriter::Array(writer), id)
        }
        ColumnType::Tuple(schema) => {
            let (columns, children) = bind_columns(core, schema, &path, position);
            let names = schema
                .columns()
                .iter()
                .map(|column| column.name().to_string())
                .collect();
            let id = core.register(
                ColumnVector::Map(MapVector::new(names, children)),
                Placement {
                    path: path.clone(),
                    position,
                    elements: None,
                    append: false,
                },
            );
            let writer = TupleWriter {
                path,
                schema: schema.clone(),
                columns,
            };
            (ObjectWriter::Tuple(writer), id)
        }
    }
}
