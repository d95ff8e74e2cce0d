//! Read-side accessor tree over a sealed batch.
//!
//! Mirrors the writer: one node per schema position, created once per reader
//! and positioned through shared cursors. Scalars read from the Arrow array of
//! their column at the index their cursor resolves to.

mod cursor;

use std::{rc::Rc, sync::Arc};

use arrow::{
    array::{Array, ArrayRef, AsArray},
    datatypes::{Float64Type, Int32Type, Int64Type},
    error::ArrowError,
    record_batch::RecordBatch,
};

pub(crate) use self::cursor::RowCursor;
use self::cursor::{ElementCursor, Position};
use crate::{
    error::{RowSetError, SchemaMismatch},
    schema::{ColumnIndex, ColumnType, StructureKind, TupleSchema, ValueType},
    value::Value,
};

/// Any node of the reader tree.
#[derive(Debug)]
pub enum ObjectReader {
    Scalar(ScalarReader),
    Array(ArrayReader),
    Tuple(TupleReader),
}

impl ObjectReader {
    pub fn kind(&self) -> StructureKind {
        match self {
            ObjectReader::Scalar(_) => StructureKind::Scalar,
            ObjectReader::Array(_) => StructureKind::Array,
            ObjectReader::Tuple(_) => StructureKind::Tuple,
        }
    }

    fn path(&self) -> &str {
        match self {
            ObjectReader::Scalar(scalar) => &scalar.path,
            ObjectReader::Array(array) => &array.path,
            ObjectReader::Tuple(tuple) => &tuple.path,
        }
    }

    fn wrong_kind(&self, requested: StructureKind) -> SchemaMismatch {
        SchemaMismatch::WrongKind {
            column: self.path().to_string(),
            requested,
            actual: self.kind(),
        }
    }

    pub fn as_scalar(&self) -> Result<&ScalarReader, SchemaMismatch> {
        match self {
            ObjectReader::Scalar(scalar) => Ok(scalar),
            _ => Err(self.wrong_kind(StructureKind::Scalar)),
        }
    }

    pub fn as_array(&self) -> Result<&ArrayReader, SchemaMismatch> {
        match self {
            ObjectReader::Array(array) => Ok(array),
            _ => Err(self.wrong_kind(StructureKind::Array)),
        }
    }

    pub fn as_tuple(&self) -> Result<&TupleReader, SchemaMismatch> {
        match self {
            ObjectReader::Tuple(tuple) => Ok(tuple),
            _ => Err(self.wrong_kind(StructureKind::Tuple)),
        }
    }

    /// Materialises the value at the node's current position.
    pub fn get_object(&self) -> Result<Value, RowSetError> {
        match self {
            ObjectReader::Scalar(scalar) => scalar.get_value(),
            ObjectReader::Array(array) => array.get_object(),
            ObjectReader::Tuple(tuple) => tuple.get_object(),
        }
    }
}

/// Reads one value type at the current row or element.
#[derive(Debug)]
pub struct ScalarReader {
    path: String,
    value_type: ValueType,
    array: ArrayRef,
    position: Position,
}

impl ScalarReader {
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    fn expect_type(&self, requested: ValueType) -> Result<(), SchemaMismatch> {
        if self.value_type != requested {
            return Err(SchemaMismatch::WrongValueType {
                column: self.path.clone(),
                requested,
                actual: self.value_type,
            });
        }
        Ok(())
    }

    fn index(&self) -> Result<usize, RowSetError> {
        Ok(self.position.index()?)
    }

    fn int_at(&self, index: usize) -> Result<i32, RowSetError> {
        self.expect_type(ValueType::Integer)?;
        Ok(self.array.as_primitive::<Int32Type>().value(index))
    }

    fn long_at(&self, index: usize) -> Result<i64, RowSetError> {
        if self.value_type == ValueType::Integer {
            return self.int_at(index).map(i64::from);
        }
        self.expect_type(ValueType::Long)?;
        Ok(self.array.as_primitive::<Int64Type>().value(index))
    }

    fn double_at(&self, index: usize) -> Result<f64, RowSetError> {
        self.expect_type(ValueType::Double)?;
        Ok(self.array.as_primitive::<Float64Type>().value(index))
    }

    fn bool_at(&self, index: usize) -> Result<bool, RowSetError> {
        self.expect_type(ValueType::Boolean)?;
        Ok(self.array.as_boolean().value(index))
    }

    fn string_at(&self, index: usize) -> Result<&str, RowSetError> {
        self.expect_type(ValueType::String)?;
        Ok(self.array.as_string::<i32>().value(index))
    }

    fn bytes_at(&self, index: usize) -> Result<&[u8], RowSetError> {
        self.expect_type(ValueType::Bytes)?;
        Ok(self.array.as_binary::<i32>().value(index))
    }

    fn value_at(&self, index: usize) -> Result<Value, RowSetError> {
        Ok(match self.value_type {
            ValueType::Integer => Value::Int(self.int_at(index)?),
            ValueType::Long => Value::Long(self.long_at(index)?),
            ValueType::Double => Value::Double(self.double_at(index)?),
            ValueType::Boolean => Value::Bool(self.bool_at(index)?),
            ValueType::String => Value::String(self.string_at(index)?.to_string()),
            ValueType::Bytes => Value::Bytes(self.bytes_at(index)?.to_vec()),
        })
    }

    pub fn get_int(&self) -> Result<i32, RowSetError> {
        self.int_at(self.index()?)
    }

    /// Reads a long column, or widens an integer one.
    pub fn get_long(&self) -> Result<i64, RowSetError> {
        self.long_at(self.index()?)
    }

    pub fn get_double(&self) -> Result<f64, RowSetError> {
        self.double_at(self.index()?)
    }

    pub fn get_bool(&self) -> Result<bool, RowSetError> {
        self.bool_at(self.index()?)
    }

    pub fn get_string(&self) -> Result<&str, RowSetError> {
        self.string_at(self.index()?)
    }

    pub fn get_bytes(&self) -> Result<&[u8], RowSetError> {
        self.bytes_at(self.index()?)
    }

    pub fn get_value(&self) -> Result<Value, RowSetError> {
        self.value_at(self.index()?)
    }
}

/// Reads a list column.
///
/// Elements can be visited by index through the `*_at` getters, or by moving
/// the shared entry node with [`set_position`](Self::set_position); both see
/// the same values.
#[derive(Debug)]
pub struct ArrayReader {
    path: String,
    cursor: Rc<ElementCursor>,
    entry: Box<ObjectReader>,
}

impl ArrayReader {
    pub fn size(&self) -> Result<usize, RowSetError> {
        Ok(self.cursor.size()?)
    }

    /// Moves the entry node to element `index` of the current array.
    pub fn set_position(&self, index: usize) -> Result<(), RowSetError> {
        Ok(self.cursor.select(index)?)
    }

    pub fn entry(&self) -> &ObjectReader {
        &self.entry
    }

    pub fn entry_type(&self) -> StructureKind {
        self.entry.kind()
    }

    pub fn scalar(&self) -> Result<&ScalarReader, SchemaMismatch> {
        self.entry.as_scalar()
    }

    pub fn array(&self) -> Result<&ArrayReader, SchemaMismatch> {
        self.entry.as_array()
    }

    pub fn tuple(&self) -> Result<&TupleReader, SchemaMismatch> {
        self.entry.as_tuple()
    }

    /// Value type of the elements; fails unless they are scalars.
    pub fn value_type(&self) -> Result<ValueType, SchemaMismatch> {
        self.scalar().map(ScalarReader::value_type)
    }

    pub fn int_at(&self, index: usize) -> Result<i32, RowSetError> {
        self.scalar()?.int_at(self.cursor.absolute(index)?)
    }

    pub fn long_at(&self, index: usize) -> Result<i64, RowSetError> {
        self.scalar()?.long_at(self.cursor.absolute(index)?)
    }

    pub fn double_at(&self, index: usize) -> Result<f64, RowSetError> {
        self.scalar()?.double_at(self.cursor.absolute(index)?)
    }

    pub fn bool_at(&self, index: usize) -> Result<bool, RowSetError> {
        self.scalar()?.bool_at(self.cursor.absolute(index)?)
    }

    pub fn string_at(&self, index: usize) -> Result<&str, RowSetError> {
        self.scalar()?.string_at(self.cursor.absolute(index)?)
    }

    pub fn bytes_at(&self, index: usize) -> Result<&[u8], RowSetError> {
        self.scalar()?.bytes_at(self.cursor.absolute(index)?)
    }

    /// Element `index` as a value, whatever the entry kind.
    pub fn get_at(&self, index: usize) -> Result<Value, RowSetError> {
        if let ObjectReader::Scalar(scalar) = self.entry.as_ref() {
            return scalar.value_at(self.cursor.absolute(index)?);
        }
        let selected = self.cursor.selected();
        let value = self
            .set_position(index)
            .and_then(|()| self.entry.get_object());
        self.cursor.restore(selected);
        value
    }

    /// Positions the entry on element `index` and returns it as a tuple.
    pub fn tuple_at(&self, index: usize) -> Result<&TupleReader, RowSetError> {
        let tuple = self.tuple()?;
        self.set_position(index)?;
        Ok(tuple)
    }

    fn get_object(&self) -> Result<Value, RowSetError> {
        let size = self.size()?;
        let mut items = Vec::with_capacity(size);
        for index in 0..size {
            items.push(self.get_at(index)?);
        }
        Ok(Value::Array(items))
    }
}

/// Ordered named columns, either a row or a nested tuple.
#[derive(Debug)]
pub struct TupleReader {
    path: String,
    schema: Arc<TupleSchema>,
    columns: Vec<ObjectReader>,
}

impl TupleReader {
    pub fn schema(&self) -> &Arc<TupleSchema> {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column<I: ColumnIndex>(&self, index: I) -> Result<&ObjectReader, SchemaMismatch> {
        let position = index.position_in(&self.schema)?;
        Ok(&self.columns[position])
    }

    pub fn scalar<I: ColumnIndex>(&self, index: I) -> Result<&ScalarReader, SchemaMismatch> {
        self.column(index)?.as_scalar()
    }

    pub fn array<I: ColumnIndex>(&self, index: I) -> Result<&ArrayReader, SchemaMismatch> {
        self.column(index)?.as_array()
    }

    pub fn tuple<I: ColumnIndex>(&self, index: I) -> Result<&TupleReader, SchemaMismatch> {
        self.column(index)?.as_tuple()
    }

    pub fn get_object(&self) -> Result<Value, RowSetError> {
        self.columns
            .iter()
            .map(ObjectReader::get_object)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Tuple)
    }
}

/// Builds the reader tree of `schema` over `batch`, positioned by `rows`.
pub(crate) fn bind(
    schema: &Arc<TupleSchema>,
    batch: &RecordBatch,
    rows: &Rc<RowCursor>,
) -> Result<TupleReader, ArrowError> {
    let columns = bind_columns(schema, batch.columns(), "", &Position::Row(rows.clone()))?;
    Ok(TupleReader {
        path: String::new(),
        schema: schema.clone(),
        columns,
    })
}

fn bind_columns(
    schema: &TupleSchema,
    arrays: &[ArrayRef],
    prefix: &str,
    position: &Position,
) -> Result<Vec<ObjectReader>, ArrowError> {
    if arrays.len() != schema.len() {
        return Err(ArrowError::SchemaError(format!(
            "expected {} columns under `{prefix}`, found {}",
            schema.len(),
            arrays.len()
        )));
    }
    schema
        .columns()
        .iter()
        .zip(arrays)
        .map(|(column, array)| {
            let path = if prefix.is_empty() {
                column.name().to_string()
            } else {
                format!("{prefix}.{}", column.name())
            };
            bind_column(column.column_type(), array, path, position.clone())
        })
        .collect()
}

fn bind_column(
    column_type: &ColumnType,
    array: &ArrayRef,
    path: String,
    position: Position,
) -> Result<ObjectReader, ArrowError> {
    match column_type {
        ColumnType::Scalar(value_type) => {
            if array.data_type() != &value_type.arrow_type() {
                return Err(ArrowError::SchemaError(format!(
                    "column `{path}` has type {}, expected {}",
                    array.data_type(),
                    value_type.arrow_type()
                )));
            }
            Ok(ObjectReader::Scalar(ScalarReader {
                path,
                value_type: *value_type,
                array: array.clone(),
                position,
            }))
        }
        ColumnType::Array(element) => {
            let list = array.as_list_opt::<i32>().ok_or_else(|| {
                ArrowError::SchemaError(format!("column `{path}` is not a list"))
            })?;
            let cursor = Rc::new(ElementCursor::new(position, list.offsets().clone()));
            let entry = bind_column(
                element,
                list.values(),
                path.clone(),
                Position::Element(cursor.clone()),
            )?;
            Ok(ObjectReader::Array(ArrayReader {
                path,
                cursor,
                entry: Box::new(entry),
            }))
        }
        ColumnType::Tuple(schema) => {
            let tuple = array.as_struct_opt().ok_or_else(|| {
                ArrowError::SchemaError(format!("column `{path}` is not a struct"))
            })?;
            let columns = bind_columns(schema, tuple.columns(), &path, &position)?;
            Ok(ObjectReader::Tuple(TupleReader {
                path,
                schema: schema.clone(),
                columns,
            }))
        }
    }
}
