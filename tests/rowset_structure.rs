use std::{ptr, sync::Arc};

use arrow::array::{Array, AsArray};
use rowset::{
    ColumnMetadata, ColumnType, ExtendableRowSet, RowSetOptions, SchemaMismatch, StructureKind,
    TupleSchema, Value, ValueType,
};

fn row_set(columns: Vec<ColumnMetadata>) -> ExtendableRowSet {
    let schema = TupleSchema::new(columns).expect("valid schema");
    ExtendableRowSet::new(Arc::new(schema), RowSetOptions::default())
}

fn tuple(columns: Vec<ColumnMetadata>) -> ColumnType {
    ColumnType::Tuple(Arc::new(TupleSchema::new(columns).expect("valid tuple")))
}

#[test]
fn scalar_structure() {
    let rows = row_set(vec![ColumnMetadata::scalar("a", ValueType::Integer)]);
    let writer = rows.writer();

    assert_eq!(writer.column("a").unwrap().kind(), StructureKind::Scalar);
    assert!(ptr::eq(writer.column("a").unwrap(), writer.column(0usize).unwrap()));
    assert!(ptr::eq(writer.scalar("a").unwrap(), writer.scalar(0usize).unwrap()));
    assert!(ptr::eq(
        writer.column("a").unwrap().as_scalar().unwrap(),
        writer.scalar("a").unwrap()
    ));
    assert_eq!(writer.scalar(0usize).unwrap().value_type(), ValueType::Integer);
    assert!(matches!(
        writer.column(0usize).unwrap().as_array(),
        Err(SchemaMismatch::WrongKind { .. })
    ));
    assert!(writer.column(0usize).unwrap().as_tuple().is_err());

    writer.column("a").unwrap().as_scalar().unwrap().set_int(10).unwrap();
    writer.save().unwrap();
    writer.scalar("a").unwrap().set_int(20).unwrap();
    writer.save().unwrap();
    writer.column(0usize).unwrap().as_scalar().unwrap().set_int(30).unwrap();
    writer.save().unwrap();
    writer.scalar(0usize).unwrap().set_int(40).unwrap();
    writer.save().unwrap();

    let sealed = writer.done().unwrap();
    let reader = sealed.reader().unwrap();
    assert_eq!(reader.column(0usize).unwrap().kind(), StructureKind::Scalar);
    assert!(ptr::eq(reader.column("a").unwrap(), reader.column(0usize).unwrap()));
    assert!(ptr::eq(reader.scalar("a").unwrap(), reader.scalar(0usize).unwrap()));
    assert_eq!(reader.scalar(0usize).unwrap().value_type(), ValueType::Integer);

    assert!(reader.next());
    assert_eq!(reader.column("a").unwrap().as_scalar().unwrap().get_int().unwrap(), 10);
    assert!(reader.next());
    assert_eq!(reader.scalar("a").unwrap().get_int().unwrap(), 20);
    assert!(reader.next());
    assert_eq!(reader.scalar(0usize).unwrap().get_int().unwrap(), 30);
    assert!(reader.next());
    assert_eq!(reader.scalar(0usize).unwrap().get_value().unwrap(), Value::Int(40));
    assert!(!reader.next());
    assert!(reader.scalar("a").unwrap().get_int().is_err());
}

#[test]
fn scalar_array_structure() {
    let rows = row_set(vec![ColumnMetadata::array(
        "a",
        ColumnType::Scalar(ValueType::Integer),
    )]);
    let writer = rows.writer();

    let column = writer.column("a").unwrap();
    assert_eq!(column.kind(), StructureKind::Array);
    assert!(ptr::eq(writer.array("a").unwrap(), writer.array(0usize).unwrap()));
    assert_eq!(column.as_array().unwrap().entry().kind(), StructureKind::Scalar);
    assert_eq!(column.as_array().unwrap().entry_type(), StructureKind::Scalar);
    assert!(ptr::eq(
        writer.array(0usize).unwrap().entry().as_scalar().unwrap(),
        writer.array(0usize).unwrap().scalar().unwrap()
    ));
    assert!(column.as_scalar().is_err());
    assert!(column.as_tuple().is_err());

    let ints = writer.array("a").unwrap().scalar().unwrap();
    for row in [&[10, 11][..], &[20, 21, 22], &[30], &[40, 41]] {
        for value in row {
            ints.set_int(*value).unwrap();
        }
        writer.save().unwrap();
    }

    let sealed = writer.done().unwrap();
    let reader = sealed.reader().unwrap();
    assert!(ptr::eq(reader.array("a").unwrap(), reader.array(0usize).unwrap()));
    let array = reader.array(0usize).unwrap();
    assert_eq!(array.entry_type(), StructureKind::Scalar);
    assert_eq!(array.value_type().unwrap(), ValueType::Integer);

    let mut seen = Vec::new();
    while reader.next() {
        let size = array.size().unwrap();
        seen.push((0..size).map(|i| array.int_at(i).unwrap()).collect::<Vec<_>>());
    }
    assert_eq!(
        seen,
        vec![vec![10, 11], vec![20, 21, 22], vec![30], vec![40, 41]]
    );
}

#[test]
fn map_structure() {
    let rows = row_set(vec![
        ColumnMetadata::scalar("a", ValueType::Integer),
        ColumnMetadata::new(
            "m",
            tuple(vec![ColumnMetadata::array(
                "b",
                ColumnType::Scalar(ValueType::Integer),
            )]),
        ),
    ]);
    let writer = rows.writer();

    assert_eq!(writer.column(1usize).unwrap().kind(), StructureKind::Tuple);
    assert!(ptr::eq(
        writer.column(1usize).unwrap().as_tuple().unwrap(),
        writer.tuple(1usize).unwrap()
    ));
    let map = writer.tuple("m").unwrap();
    assert_eq!(map.array("b").unwrap().entry_type(), StructureKind::Scalar);
    let a = writer.scalar("a").unwrap();
    let b = map.array("b").unwrap().entry().as_scalar().unwrap();
    assert!(ptr::eq(b, writer.tuple(1usize).unwrap().array(0usize).unwrap().scalar().unwrap()));
    assert!(writer.column(1usize).unwrap().as_scalar().is_err());
    assert!(writer.column(1usize).unwrap().as_array().is_err());

    for row in 1..=3 {
        a.set_int(row * 10).unwrap();
        b.set_int(row * 10 + 1).unwrap();
        b.set_int(row * 10 + 2).unwrap();
        writer.save().unwrap();
    }

    let sealed = writer.done().unwrap();
    let reader = sealed.reader().unwrap();
    assert!(ptr::eq(
        reader.column(1usize).unwrap().as_tuple().unwrap(),
        reader.tuple(1usize).unwrap()
    ));
    let a = reader.column(0usize).unwrap().as_scalar().unwrap();
    let b = reader.tuple(1usize).unwrap().array(0usize).unwrap();
    assert_eq!(b.value_type().unwrap(), ValueType::Integer);
    for row in 1..=3 {
        assert!(reader.next());
        assert_eq!(a.get_int().unwrap(), row * 10);
        assert_eq!(b.int_at(0).unwrap(), row * 10 + 1);
        assert_eq!(b.int_at(1).unwrap(), row * 10 + 2);
    }
    assert!(!reader.next());

    let batch = sealed.batch().unwrap();
    let inner = batch.column(1).as_struct().column(0).as_list::<i32>();
    assert_eq!(inner.len(), 3);
    assert_eq!(inner.values().len(), 6);
    assert_eq!(inner.value_offsets(), &[0, 2, 4, 6]);
}

#[test]
fn repeated_map_structure() {
    let rows = row_set(vec![
        ColumnMetadata::scalar("a", ValueType::Integer),
        ColumnMetadata::array(
            "m",
            tuple(vec![
                ColumnMetadata::scalar("b", ValueType::Integer),
                ColumnMetadata::scalar("c", ValueType::Integer),
            ]),
        ),
    ]);
    let writer = rows.writer();

    assert_eq!(writer.column("m").unwrap().kind(), StructureKind::Array);
    let elements = writer.column(1usize).unwrap().as_array().unwrap();
    assert_eq!(elements.entry_type(), StructureKind::Tuple);
    let map = elements.tuple().unwrap();
    assert_eq!(map.column("b").unwrap().kind(), StructureKind::Scalar);
    let a = writer.scalar("a").unwrap();
    let b = map.scalar("b").unwrap();
    let c = map.scalar("c").unwrap();
    assert_eq!(c.value_type(), ValueType::Integer);

    for row in 1..=3 {
        a.set_int(row * 10).unwrap();
        for element in 0..2 {
            b.set_int(row * 100 + element * 10 + 1).unwrap();
            c.set_int(row * 100 + element * 10 + 2).unwrap();
            elements.save().unwrap();
        }
        assert_eq!(elements.element_index(), 2);
        writer.save().unwrap();
    }

    let sealed = writer.done().unwrap();
    let reader = sealed.reader().unwrap();
    let elements = reader.column(1usize).unwrap().as_array().unwrap();
    assert_eq!(elements.entry_type(), StructureKind::Tuple);
    let map = elements.tuple().unwrap();
    let a = reader.scalar("a").unwrap();
    let b = map.scalar("b").unwrap();
    let c = map.scalar("c").unwrap();

    // Index accessors.
    assert!(reader.next());
    assert_eq!(a.get_int().unwrap(), 10);
    let element = elements.tuple_at(0).unwrap();
    assert_eq!(element.scalar(0usize).unwrap().get_int().unwrap(), 101);
    assert_eq!(element.scalar(1usize).unwrap().get_int().unwrap(), 102);
    let element = elements.tuple_at(1).unwrap();
    assert_eq!(element.scalar(0usize).unwrap().get_int().unwrap(), 111);
    assert_eq!(element.scalar(1usize).unwrap().get_int().unwrap(), 112);

    // Explicit positioning through the map reader.
    assert!(reader.next());
    assert_eq!(a.get_int().unwrap(), 20);
    elements.set_position(0).unwrap();
    assert_eq!(map.scalar(0usize).unwrap().get_int().unwrap(), 201);
    assert_eq!(map.scalar(1usize).unwrap().get_int().unwrap(), 202);
    elements.set_position(1).unwrap();
    assert_eq!(map.scalar(0usize).unwrap().get_int().unwrap(), 211);
    assert_eq!(map.scalar(1usize).unwrap().get_int().unwrap(), 212);

    // Cached scalar readers.
    assert!(reader.next());
    assert_eq!(a.get_int().unwrap(), 30);
    elements.set_position(0).unwrap();
    assert_eq!(b.get_int().unwrap(), 301);
    assert_eq!(c.get_int().unwrap(), 302);
    elements.set_position(1).unwrap();
    assert_eq!(b.get_int().unwrap(), 311);
    assert_eq!(c.get_int().unwrap(), 312);
    assert!(elements.set_position(2).is_err());
    assert!(!reader.next());

    let batch = sealed.batch().unwrap();
    assert_eq!(batch.column(1).len(), 3);
}

#[test]
fn top_fixed_width_array() {
    let rows = row_set(vec![
        ColumnMetadata::scalar("c", ValueType::Integer),
        ColumnMetadata::array("a", ColumnType::Scalar(ValueType::Integer)),
    ]);
    let writer = rows.writer();
    let array = writer.array(1usize).unwrap().scalar().unwrap();

    writer.scalar(0usize).unwrap().set_int(10).unwrap();
    array.set_int(100).unwrap();
    array.set_int(110).unwrap();
    writer.save().unwrap();
    writer.scalar(0usize).unwrap().set_int(20).unwrap();
    array.set_int(200).unwrap();
    array.set_int(120).unwrap();
    array.set_int(220).unwrap();
    writer.save().unwrap();
    writer.scalar(0usize).unwrap().set_int(30).unwrap();
    writer.save().unwrap();

    let sealed = writer.done().unwrap();
    let reader = sealed.reader().unwrap();
    let array = reader.array(1usize).unwrap();

    assert!(reader.next());
    assert_eq!(reader.scalar(0usize).unwrap().get_int().unwrap(), 10);
    assert_eq!(array.size().unwrap(), 2);
    assert_eq!(array.int_at(1).unwrap(), 110);
    assert!(reader.next());
    assert_eq!(array.size().unwrap(), 3);
    assert_eq!(array.get_at(2).unwrap(), Value::Int(220));
    assert!(reader.next());
    assert_eq!(reader.scalar(0usize).unwrap().get_int().unwrap(), 30);
    assert_eq!(array.size().unwrap(), 0);
    assert!(array.int_at(0).is_err());
    assert!(!reader.next());
}

#[test]
fn omitted_columns_take_defaults() {
    let rows = row_set(vec![
        ColumnMetadata::scalar("i", ValueType::Integer),
        ColumnMetadata::scalar("l", ValueType::Long),
        ColumnMetadata::scalar("d", ValueType::Double),
        ColumnMetadata::scalar("f", ValueType::Boolean),
        ColumnMetadata::scalar("s", ValueType::String),
        ColumnMetadata::scalar("y", ValueType::Bytes),
        ColumnMetadata::array("t", ColumnType::Scalar(ValueType::String)),
    ]);
    let writer = rows.writer();
    writer.scalar("i").unwrap().set_int(7).unwrap();
    writer.scalar("l").unwrap().set_long(8).unwrap();
    writer.scalar("d").unwrap().set_double(1.5).unwrap();
    writer.scalar("f").unwrap().set_bool(true).unwrap();
    writer.scalar("s").unwrap().set_string("seven").unwrap();
    writer.scalar("y").unwrap().set_bytes(b"\x07").unwrap();
    writer.array("t").unwrap().scalar().unwrap().set_string("x").unwrap();
    writer.save().unwrap();
    writer.save().unwrap();

    let sealed = writer.done().unwrap();
    let reader = sealed.reader().unwrap();
    assert!(reader.next());
    assert_eq!(
        reader.get_row().unwrap(),
        Value::Tuple(vec![
            Value::Int(7),
            Value::Long(8),
            Value::Double(1.5),
            Value::Bool(true),
            Value::from("seven"),
            Value::Bytes(vec![7]),
            Value::Array(vec![Value::from("x")]),
        ])
    );
    assert!(reader.next());
    assert_eq!(
        reader.get_row().unwrap(),
        Value::Tuple(vec![
            Value::Int(0),
            Value::Long(0),
            Value::Double(0.0),
            Value::Bool(false),
            Value::from(""),
            Value::Bytes(vec![]),
            Value::Array(vec![]),
        ])
    );
}

#[test]
fn unsaved_elements_are_dropped() {
    let rows = row_set(vec![ColumnMetadata::array(
        "m",
        tuple(vec![ColumnMetadata::scalar("b", ValueType::Integer)]),
    )]);
    let writer = rows.writer();
    let elements = writer.array("m").unwrap();
    let b = elements.tuple().unwrap().scalar("b").unwrap();
    b.set_int(1).unwrap();
    elements.save().unwrap();
    b.set_int(2).unwrap();
    writer.save().unwrap();
    b.set_int(3).unwrap();
    elements.save().unwrap();
    writer.save().unwrap();

    let sealed = writer.done().unwrap();
    let reader = sealed.reader().unwrap();
    let elements = reader.array("m").unwrap();
    let mut values = Vec::new();
    while reader.next() {
        values.push(reader.column("m").unwrap().get_object().unwrap());
    }
    assert_eq!(
        values,
        vec![
            Value::Array(vec![Value::Tuple(vec![Value::Int(1)])]),
            Value::Array(vec![Value::Tuple(vec![Value::Int(3)])]),
        ]
    );
    reader.set_row(1).unwrap();
    assert_eq!(elements.size().unwrap(), 1);
}

#[test]
fn nested_arrays_round_trip() {
    let rows = row_set(vec![
        ColumnMetadata::array(
            "grid",
            ColumnType::Array(Box::new(ColumnType::Scalar(ValueType::Long))),
        ),
        ColumnMetadata::array(
            "orders",
            tuple(vec![
                ColumnMetadata::scalar("id", ValueType::Long),
                ColumnMetadata::array("items", ColumnType::Scalar(ValueType::String)),
                ColumnMetadata::new(
                    "ship",
                    tuple(vec![ColumnMetadata::scalar("zip", ValueType::String)]),
                ),
            ]),
        ),
    ]);
    let writer = rows.writer();
    let expected = vec![
        Value::Tuple(vec![
            Value::Array(vec![
                Value::Array(vec![Value::Long(1), Value::Long(2)]),
                Value::Array(vec![]),
                Value::Array(vec![Value::Long(3)]),
            ]),
            Value::Array(vec![
                Value::Tuple(vec![
                    Value::Long(7),
                    Value::Array(vec![Value::from("pen"), Value::from("ink")]),
                    Value::Tuple(vec![Value::from("10115")]),
                ]),
                Value::Tuple(vec![
                    Value::Long(8),
                    Value::Array(vec![]),
                    Value::Tuple(vec![Value::from("")]),
                ]),
            ]),
        ]),
        Value::Tuple(vec![Value::Array(vec![]), Value::Array(vec![])]),
    ];

    // First row through typed writers, second through set_object.
    let grid = writer.array("grid").unwrap();
    let cells = grid.array().unwrap().scalar().unwrap();
    cells.set_long(1).unwrap();
    cells.set_int(2).unwrap();
    grid.save().unwrap();
    grid.save().unwrap();
    cells.set_long(3).unwrap();
    grid.save().unwrap();

    let orders = writer.array("orders").unwrap();
    let order = orders.tuple().unwrap();
    order.scalar("id").unwrap().set_long(7).unwrap();
    let items = order.array("items").unwrap().scalar().unwrap();
    items.set_string("pen").unwrap();
    items.set_string("ink").unwrap();
    order.tuple("ship").unwrap().scalar("zip").unwrap().set_string("10115").unwrap();
    orders.save().unwrap();
    order.scalar("id").unwrap().set_long(8).unwrap();
    orders.save().unwrap();
    writer.save().unwrap();

    writer.add_row(&expected[1]).unwrap();

    let sealed = writer.done().unwrap();
    assert_eq!(sealed.row_count(), 2);
    let reader = sealed.reader().unwrap();
    let mut actual = Vec::new();
    while reader.next() {
        actual.push(reader.get_row().unwrap());
    }
    assert_eq!(actual, expected);

    reader.set_row(0).unwrap();
    let orders = reader.array("orders").unwrap();
    let items = orders.tuple().unwrap().array("items").unwrap();
    assert_eq!(items.string_at(1).unwrap(), "ink");
    orders.set_position(1).unwrap();
    assert_eq!(items.size().unwrap(), 0);
    let grid = reader.array("grid").unwrap();
    grid.set_position(2).unwrap();
    assert_eq!(grid.array().unwrap().long_at(0).unwrap(), 3);
}

#[test]
fn failed_add_row_leaves_no_trace() {
    let rows = row_set(vec![
        ColumnMetadata::scalar("a", ValueType::Integer),
        ColumnMetadata::array("tags", ColumnType::Scalar(ValueType::Integer)),
    ]);
    let writer = rows.writer();

    let err = writer
        .add_row(&Value::Tuple(vec![
            Value::Int(1),
            Value::Array(vec![Value::Int(1), Value::from("x")]),
        ]))
        .unwrap_err();
    assert!(err.is_schema_mismatch());
    assert_eq!(writer.row_index(), 0);
    assert_eq!(writer.array("tags").unwrap().element_index(), 0);

    writer
        .add_row(&Value::Tuple(vec![Value::Int(2), Value::Array(vec![Value::Int(5)])]))
        .unwrap();
    // Values set before a failed add_row go with it.
    writer.scalar("a").unwrap().set_int(3).unwrap();
    assert!(writer.add_row(&Value::Tuple(vec![Value::from("y")])).is_err());
    writer.save().unwrap();

    let sealed = writer.done().unwrap();
    let reader = sealed.reader().unwrap();
    assert!(reader.next());
    assert_eq!(
        reader.get_row().unwrap(),
        Value::Tuple(vec![Value::Int(2), Value::Array(vec![Value::Int(5)])])
    );
    assert!(reader.next());
    assert_eq!(
        reader.get_row().unwrap(),
        Value::Tuple(vec![Value::Int(0), Value::Array(vec![])])
    );
    assert!(!reader.next());
}
