use std::{iter::repeat_with, sync::Arc};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rowset::{
    ColumnMetadata, ColumnType, ExtendableRowSet, RowSetOptions, TupleSchema, ValueType,
};

fn kv_schema() -> Arc<TupleSchema> {
    let attribute = TupleSchema::new(vec![
        ColumnMetadata::scalar("name", ValueType::String),
        ColumnMetadata::scalar("weight", ValueType::Double),
    ])
    .unwrap();
    Arc::new(
        TupleSchema::new(vec![
            ColumnMetadata::scalar("key", ValueType::String),
            ColumnMetadata::scalar("value", ValueType::String),
            ColumnMetadata::scalar("version", ValueType::Long),
            ColumnMetadata::array("tags", ColumnType::Scalar(ValueType::Integer)),
            ColumnMetadata::array("attributes", ColumnType::Tuple(Arc::new(attribute))),
        ])
        .unwrap(),
    )
}

#[inline(never)]
fn write_rows(schema: &Arc<TupleSchema>, keys: &[String], values: &[String]) -> usize {
    let rows = ExtendableRowSet::new(schema.clone(), RowSetOptions::default());
    let writer = rows.writer();
    let key = writer.scalar("key").unwrap();
    let value = writer.scalar("value").unwrap();
    let version = writer.scalar("version").unwrap();
    let tags = writer.array("tags").unwrap().scalar().unwrap();
    let attributes = writer.array("attributes").unwrap();
    let name = attributes.tuple().unwrap().scalar("name").unwrap();
    let weight = attributes.tuple().unwrap().scalar("weight").unwrap();

    for (row, (k, v)) in keys.iter().zip(values).enumerate() {
        key.set_string(k).unwrap();
        value.set_string(v).unwrap();
        version.set_long(row as i64).unwrap();
        for tag in 0..(row % 4) as i32 {
            tags.set_int(tag).unwrap();
        }
        for attribute in 0..row % 3 {
            name.set_string(&k[..8]).unwrap();
            weight.set_double(attribute as f64).unwrap();
            attributes.save().unwrap();
        }
        writer.save().unwrap();
    }
    writer.done().unwrap().row_count()
}

#[inline(never)]
fn read_rows(schema: &Arc<TupleSchema>, keys: &[String], values: &[String]) -> usize {
    let rows = ExtendableRowSet::new(schema.clone(), RowSetOptions::default());
    let writer = rows.writer();
    for (k, v) in keys.iter().zip(values) {
        writer.scalar("key").unwrap().set_string(k).unwrap();
        writer.scalar("value").unwrap().set_string(v).unwrap();
        writer.save().unwrap();
    }
    let sealed = writer.done().unwrap();

    let reader = sealed.reader().unwrap();
    let key = reader.scalar("key").unwrap();
    let value = reader.scalar("value").unwrap();
    let mut bytes = 0;
    while reader.next() {
        bytes += key.get_string().unwrap().len() + value.get_string().unwrap().len();
    }
    bytes
}

fn row_set_write(c: &mut Criterion) {
    let schema = kv_schema();
    let mut group = c.benchmark_group("write");

    for batch in [1, 128, 4096] {
        let keys = repeat_with(|| repeat_with(fastrand::alphanumeric).take(64).collect())
            .take(batch)
            .collect::<Vec<String>>();
        let values = repeat_with(|| repeat_with(fastrand::alphanumeric).take(256).collect())
            .take(batch)
            .collect::<Vec<String>>();

        group.bench_with_input(BenchmarkId::new("rows", batch), &batch, |b, _| {
            b.iter(|| write_rows(&schema, &keys, &values));
        });
        group.bench_with_input(BenchmarkId::new("read_back", batch), &batch, |b, _| {
            b.iter(|| read_rows(&schema, &keys, &values));
        });
    }
    group.finish();
}

criterion_group!(benches, row_set_write);
criterion_main!(benches);
