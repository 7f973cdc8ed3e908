//! Criterion benchmark untuk Builder dan Table reader
//!
//! Run dengan: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use zerotab::protocol::{root, Builder, Offset};

fn build_record(b: &mut Builder, id: u64, name: Offset) -> Offset {
    b.start_object(4);
    b.prepend_slot::<u64>(0, id, 0);
    b.prepend_offset_slot(1, name);
    b.prepend_slot::<u32>(2, (id % 1000) as u32, 0);
    b.prepend_slot::<u8>(3, (id % 7) as u8, 0);
    b.end_object()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("builder");
    group.throughput(Throughput::Elements(1));

    // Satu table kecil per buffer, builder di-reuse
    group.bench_function("single_table", |bench| {
        let mut b = Builder::new();
        let mut i = 0u64;
        bench.iter(|| {
            b.reset();
            let name = b.create_string("record");
            let t = build_record(&mut b, black_box(i), name);
            b.finish(t);
            black_box(b.finished_data().len());
            i = i.wrapping_add(1);
        });
    });

    group.bench_function("string", |bench| {
        let mut b = Builder::new();
        bench.iter(|| {
            b.reset();
            black_box(b.create_string(black_box("zero-copy table encoding")));
        });
    });

    group.finish();
}

fn bench_build_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("builder_batch");

    // Banyak table dengan vtable yang sama (dedup hit)
    for batch_size in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*batch_size as u64));
        group.bench_function(format!("batch_{}", batch_size), |bench| {
            let mut b = Builder::with_capacity(64 * 1024);
            let mut records = Vec::with_capacity(*batch_size);
            bench.iter(|| {
                b.reset();
                records.clear();
                let name = b.create_string("shared");
                for i in 0..*batch_size {
                    records.push(build_record(&mut b, black_box(i as u64 + 1), name));
                }
                let list = b.create_vector_of_offsets(&records);
                b.start_object(1);
                b.prepend_offset_slot(0, list);
                let r = b.end_object();
                b.finish(r);
                black_box(b.finished_data().len());
            });
        });
    }

    group.finish();
}

fn bench_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("reader");

    let mut b = Builder::new();
    let name = b.create_string("record");
    let t = build_record(&mut b, 42, name);
    b.finish(t);
    let single = b.take_finished();

    group.throughput(Throughput::Elements(1));
    group.bench_function("scalar_field", |bench| {
        bench.iter(|| {
            let table = root(black_box(&single)).unwrap();
            black_box(table.get::<u64>(0, 0).unwrap());
        });
    });

    group.bench_function("string_field", |bench| {
        bench.iter(|| {
            let table = root(black_box(&single)).unwrap();
            black_box(table.get_str(1).unwrap());
        });
    });

    // Scan vector of tables
    let mut b = Builder::new();
    let name = b.create_string("shared");
    let records: Vec<Offset> = (0..10_000u64)
        .map(|i| build_record(&mut b, i + 1, name))
        .collect();
    let list = b.create_vector_of_offsets(&records);
    b.start_object(1);
    b.prepend_offset_slot(0, list);
    let r = b.end_object();
    b.finish(r);
    let batch = b.take_finished();

    group.throughput(Throughput::Elements(10_000));
    group.bench_function("scan_10000", |bench| {
        bench.iter(|| {
            let v = root(&batch).unwrap().get_vector(0).unwrap().unwrap();
            let mut sum = 0u64;
            for i in 0..v.len() {
                sum = sum.wrapping_add(v.get_table(i).unwrap().get::<u64>(0, 0).unwrap());
            }
            black_box(sum);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_build, bench_build_batch, bench_read);
criterion_main!(benches);
