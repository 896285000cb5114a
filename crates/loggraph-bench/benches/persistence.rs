use criterion::{Criterion, black_box, criterion_group, criterion_main};
use loggraph_bench::util::generate_synthetic_log;
use loggraph_storage::{
    GraphFormat, JsonStringizer, decode, encode, load_from_path, save_to_path,
};

fn bench_round_trip(c: &mut Criterion) {
    let graph = generate_synthetic_log(10, 100).unwrap();

    for format in GraphFormat::ALL {
        let text = encode(&graph, format, &JsonStringizer).unwrap();
        c.bench_function(&format!("encode_{format}_1000_nodes"), |b| {
            b.iter(|| black_box(encode(black_box(&graph), format, &JsonStringizer).unwrap()))
        });
        c.bench_function(&format!("decode_{format}_1000_nodes"), |b| {
            b.iter(|| black_box(decode(black_box(&text), format, &JsonStringizer).unwrap()))
        });
    }
}

fn bench_save_and_load(c: &mut Criterion) {
    let graph = generate_synthetic_log(10, 100).unwrap();
    let dir = tempfile::tempdir().unwrap();

    for format in GraphFormat::ALL {
        let path = dir.path().join(format!("log.{format}"));
        c.bench_function(&format!("save_load_{format}_1000_nodes"), |b| {
            b.iter(|| {
                save_to_path(&graph, &path, &JsonStringizer).unwrap();
                black_box(load_from_path(&path, &JsonStringizer).unwrap());
            })
        });
    }
}

criterion_group!(benches, bench_round_trip, bench_save_and_load);
criterion_main!(benches);
