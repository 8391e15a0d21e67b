#![forbid(unsafe_code)]

use std::hint::black_box;

use arrow::array::{Float64Array, StringArray};
use criterion::{Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use sydata_storage::StoreFile;
use sydata_table::{RowSelection, TableStore};

const ROW_COUNT: usize = 200_000;
const SAMPLE_ROWS: usize = 1024;
const SEED: u64 = 0x9E37_79B9_F701_3CAB;

fn build_fixture() -> (StoreFile, TableStore, Vec<usize>) {
    let file = StoreFile::in_memory("indexed-read-bench").expect("mem file");
    let group = file.root().expect("root").create_group("t").expect("group");
    let mut table = TableStore::create(group, true).expect("table");

    let mut rng = StdRng::seed_from_u64(SEED);
    let values: Vec<f64> = (0..ROW_COUNT).map(|_| rng.random::<f64>()).collect();
    table
        .write_column("value", &Float64Array::from(values))
        .expect("write value");
    let labels: Vec<String> = (0..ROW_COUNT).map(|i| format!("sample-{i:06}")).collect();
    table
        .write_column("label", &StringArray::from(labels))
        .expect("write label");

    let mut rows: Vec<usize> = (0..ROW_COUNT).collect();
    rows.shuffle(&mut rng);
    rows.truncate(SAMPLE_ROWS);
    (file, table, rows)
}

fn bench_indexed_reads(c: &mut Criterion) {
    let (_file, table, rows) = build_fixture();
    let mut sorted = rows.clone();
    sorted.sort_unstable();

    let mut group = c.benchmark_group("indexed_read");
    group.bench_function("random_order", |b| {
        let selection = RowSelection::Indices(rows.clone());
        b.iter(|| {
            let out = table.read_column_rows("value", &selection).expect("read");
            black_box(out);
        })
    });
    group.bench_function("ascending", |b| {
        let selection = RowSelection::Indices(sorted.clone());
        b.iter(|| {
            let out = table.read_column_rows("value", &selection).expect("read");
            black_box(out);
        })
    });
    group.bench_function("reverse_slice_text", |b| {
        let selection = RowSelection::Slice {
            start: None,
            stop: None,
            step: -97,
        };
        b.iter(|| {
            let out = table.read_column_rows("label", &selection).expect("read");
            black_box(out);
        })
    });
    group.finish();
}

criterion_group!(benches, bench_indexed_reads);
criterion_main!(benches);
