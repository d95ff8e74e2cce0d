//! Ordered, named, nested column descriptions.
//!
//! A [`TupleSchema`] is an ordered list of [`ColumnMetadata`]; every column is
//! either a scalar leaf, an array of some element type, or a nested tuple.
//! Names are pre-indexed so both name and position lookups are O(1).

use std::{collections::HashMap, sync::Arc};

use arrow::datatypes::{DataType, Field, Fields, Schema as ArrowSchema, SchemaRef};

use crate::error::{SchemaError, SchemaMismatch};

/// Field name Arrow list types use for their element.
pub(crate) const LIST_ITEM: &str = "item";

/// Shape of a column node. Governs which accessor capability it exposes.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum StructureKind {
    Scalar,
    Array,
    Tuple,
}

/// Primitive representation of a scalar leaf.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum ValueType {
    /// 32-bit signed integer.
    Integer,
    /// 64-bit signed integer.
    Long,
    /// 64-bit float.
    Double,
    Boolean,
    /// UTF-8 string.
    String,
    /// Opaque byte string.
    Bytes,
}

impl ValueType {
    /// Arrow type backing the value type in a sealed batch.
    pub fn arrow_type(&self) -> DataType {
        match self {
            ValueType::Integer => DataType::Int32,
            ValueType::Long => DataType::Int64,
            ValueType::Double => DataType::Float64,
            ValueType::Boolean => DataType::Boolean,
            ValueType::String => DataType::Utf8,
            ValueType::Bytes => DataType::Binary,
        }
    }

    fn from_arrow(data_type: &DataType) -> Option<Self> {
        match data_type {
            DataType::Int32 => Some(ValueType::Integer),
            DataType::Int64 => Some(ValueType::Long),
            DataType::Float64 => Some(ValueType::Double),
            DataType::Boolean => Some(ValueType::Boolean),
            DataType::Utf8 => Some(ValueType::String),
            DataType::Binary => Some(ValueType::Bytes),
            _ => None,
        }
    }
}

/// Full type of a column, recursively.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnType {
    Scalar(ValueType),
    /// Repeated column; the box holds the element type.
    Array(Box<ColumnType>),
    Tuple(Arc<TupleSchema>),
}

impl ColumnType {
    pub fn kind(&self) -> StructureKind {
        match self {
            ColumnType::Scalar(_) => StructureKind::Scalar,
            ColumnType::Array(_) => StructureKind::Array,
            ColumnType::Tuple(_) => StructureKind::Tuple,
        }
    }

    pub fn arrow_type(&self) -> DataType {
        match self {
            ColumnType::Scalar(value_type) => value_type.arrow_type(),
            ColumnType::Array(element) => DataType::List(Arc::new(Field::new(
                LIST_ITEM,
                element.arrow_type(),
                false,
            ))),
            ColumnType::Tuple(schema) => DataType::Struct(schema.arrow_fields()),
        }
    }

    fn from_arrow(name: &str, data_type: &DataType) -> Result<Self, SchemaError> {
        if let Some(value_type) = ValueType::from_arrow(data_type) {
            return Ok(ColumnType::Scalar(value_type));
        }
        match data_type {
            DataType::List(item) => Ok(ColumnType::Array(Box::new(Self::from_arrow(
                name,
                item.data_type(),
            )?))),
            DataType::Struct(fields) => {
                let columns = fields
                    .iter()
                    .map(|field| ColumnMetadata::from_arrow_field(field))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ColumnType::Tuple(Arc::new(TupleSchema::nested(name, columns)?)))
            }
            other => Err(SchemaError::UnsupportedType {
                name: name.to_string(),
                data_type: other.clone(),
            }),
        }
    }

    fn validate(&self, name: &str) -> Result<(), SchemaError> {
        match self {
            ColumnType::Scalar(_) => Ok(()),
            ColumnType::Array(element) => element.validate(name),
            ColumnType::Tuple(schema) if schema.is_empty() => Err(SchemaError::EmptyTuple {
                name: name.to_string(),
            }),
            ColumnType::Tuple(_) => Ok(()),
        }
    }
}

/// One named column within a tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMetadata {
    name: String,
    column_type: ColumnType,
}

impl ColumnMetadata {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }

    pub fn scalar(name: impl Into<String>, value_type: ValueType) -> Self {
        Self::new(name, ColumnType::Scalar(value_type))
    }

    /// Repeated column whose elements have `element` type.
    pub fn array(name: impl Into<String>, element: ColumnType) -> Self {
        Self::new(name, ColumnType::Array(Box::new(element)))
    }

    pub fn tuple(name: impl Into<String>, schema: TupleSchema) -> Self {
        Self::new(name, ColumnType::Tuple(Arc::new(schema)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> &ColumnType {
        &self.column_type
    }

    pub fn kind(&self) -> StructureKind {
        self.column_type.kind()
    }

    /// Value type of a scalar column, `None` for arrays and tuples.
    pub fn value_type(&self) -> Option<ValueType> {
        match &self.column_type {
            ColumnType::Scalar(value_type) => Some(*value_type),
            _ => None,
        }
    }

    /// Element type of an array column.
    pub fn element_type(&self) -> Option<&ColumnType> {
        match &self.column_type {
            ColumnType::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Child schema of a tuple column, or of an array whose elements are tuples.
    pub fn tuple_schema(&self) -> Option<&Arc<TupleSchema>> {
        match &self.column_type {
            ColumnType::Tuple(schema) => Some(schema),
            ColumnType::Array(element) => match element.as_ref() {
                ColumnType::Tuple(schema) => Some(schema),
                _ => None,
            },
            ColumnType::Scalar(_) => None,
        }
    }

    pub fn arrow_field(&self) -> Field {
        Field::new(&self.name, self.column_type.arrow_type(), false)
    }

    fn from_arrow_field(field: &Field) -> Result<Self, SchemaError> {
        Ok(Self::new(
            field.name().clone(),
            ColumnType::from_arrow(field.name(), field.data_type())?,
        ))
    }
}

/// Ordered set of uniquely named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TupleSchema {
    columns: Vec<ColumnMetadata>,
    index: HashMap<String, usize>,
}

impl TupleSchema {
    /// Builds a schema, rejecting duplicate names and empty nested tuples.
    pub fn new(columns: Vec<ColumnMetadata>) -> Result<Self, SchemaError> {
        let mut index = HashMap::with_capacity(columns.len());
        for (position, column) in columns.iter().enumerate() {
            column.column_type.validate(&column.name)?;
            if index.insert(column.name.clone(), position).is_some() {
                return Err(SchemaError::DuplicateColumn {
                    name: column.name.clone(),
                });
            }
        }
        Ok(Self { columns, index })
    }

    fn nested(name: &str, columns: Vec<ColumnMetadata>) -> Result<Self, SchemaError> {
        if columns.is_empty() {
            return Err(SchemaError::EmptyTuple {
                name: name.to_string(),
            });
        }
        Self::new(columns)
    }

    /// Converts an Arrow schema. Nullability and metadata are ignored.
    pub fn from_arrow_schema(schema: &ArrowSchema) -> Result<Self, SchemaError> {
        let columns = schema
            .fields()
            .iter()
            .map(|field| ColumnMetadata::from_arrow_field(field))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(columns)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    /// Position of the column called `name`.
    pub fn resolve(&self, name: &str) -> Result<usize, SchemaMismatch> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| SchemaMismatch::NoSuchColumn {
                name: name.to_string(),
            })
    }

    pub fn column(&self, position: usize) -> Result<&ColumnMetadata, SchemaMismatch> {
        self.columns
            .get(position)
            .ok_or(SchemaMismatch::ColumnOutOfRange {
                position,
                columns: self.columns.len(),
            })
    }

    pub fn kind(&self, position: usize) -> Result<StructureKind, SchemaMismatch> {
        self.column(position).map(ColumnMetadata::kind)
    }

    pub fn arrow_schema(&self) -> SchemaRef {
        Arc::new(ArrowSchema::new(self.arrow_fields()))
    }

    pub(crate) fn arrow_fields(&self) -> Fields {
        self.columns
            .iter()
            .map(ColumnMetadata::arrow_field)
            .collect()
    }
}

/// Anything that addresses a column of a tuple: a name or a position.
pub trait ColumnIndex {
    fn position_in(&self, schema: &TupleSchema) -> Result<usize, SchemaMismatch>;
}

impl ColumnIndex for usize {
    fn position_in(&self, schema: &TupleSchema) -> Result<usize, SchemaMismatch> {
        schema.column(*self).map(|_| *self)
    }
}

impl ColumnIndex for &str {
    fn position_in(&self, schema: &TupleSchema) -> Result<usize, SchemaMismatch> {
        schema.resolve(self)
    }
}

impl ColumnIndex for &String {
    fn position_in(&self, schema: &TupleSchema) -> Result<usize, SchemaMismatch> {
        schema.resolve(self)
    }
}

impl ColumnIndex for String {
    fn position_in(&self, schema: &TupleSchema) -> Result<usize, SchemaMismatch> {
        schema.resolve(self)
    }
}
