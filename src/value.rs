use crate::schema::{StructureKind, ValueType};

/// Borrowed scalar handed to a writer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRef<'a> {
    Int(i32),
    Long(i64),
    Double(f64),
    Bool(bool),
    String(&'a str),
    Bytes(&'a [u8]),
}

impl ValueRef<'_> {
    pub fn value_type(&self) -> ValueType {
        match self {
            ValueRef::Int(_) => ValueType::Integer,
            ValueRef::Long(_) => ValueType::Long,
            ValueRef::Double(_) => ValueType::Double,
            ValueRef::Bool(_) => ValueType::Boolean,
            ValueRef::String(_) => ValueType::String,
            ValueRef::Bytes(_) => ValueType::Bytes,
        }
    }

    pub fn to_owned_value(&self) -> Value {
        match *self {
            ValueRef::Int(v) => Value::Int(v),
            ValueRef::Long(v) => Value::Long(v),
            ValueRef::Double(v) => Value::Double(v),
            ValueRef::Bool(v) => Value::Bool(v),
            ValueRef::String(v) => Value::String(v.to_string()),
            ValueRef::Bytes(v) => Value::Bytes(v.to_vec()),
        }
    }
}

/// Owned value of any column, nested ones included.
///
/// Arrays and tuples hold their elements and columns in schema order, which
/// makes `Value` suitable for whole-row comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Long(i64),
    Double(f64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Tuple(Vec<Value>),
}

impl Value {
    pub fn kind(&self) -> StructureKind {
        match self {
            Value::Array(_) => StructureKind::Array,
            Value::Tuple(_) => StructureKind::Tuple,
            _ => StructureKind::Scalar,
        }
    }

    /// Scalar view of the value; `None` for arrays and tuples.
    pub fn as_value_ref(&self) -> Option<ValueRef<'_>> {
        match self {
            Value::Int(v) => Some(ValueRef::Int(*v)),
            Value::Long(v) => Some(ValueRef::Long(*v)),
            Value::Double(v) => Some(ValueRef::Double(*v)),
            Value::Bool(v) => Some(ValueRef::Bool(*v)),
            Value::String(v) => Some(ValueRef::String(v)),
            Value::Bytes(v) => Some(ValueRef::Bytes(v)),
            Value::Array(_) | Value::Tuple(_) => None,
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::Array(values.into_iter().map(Into::into).collect())
    }
}
