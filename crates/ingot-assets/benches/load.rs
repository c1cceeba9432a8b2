//! Benchmarks for the import paths (hot path, rebuild, embedded)

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use ingot_assets::{AssetManager, ContentHash, EmbeddedModule};
use ingot_test_utils::{MockAsset, MockLoader, TestStore};

fn setup(count: usize, size: usize) -> (TestStore, AssetManager, Vec<String>) {
    let store = TestStore::new();
    let mut manager = AssetManager::new(store.config());
    manager.register_loader(MockLoader::new());

    let payload = vec![0x5a; size];
    let paths: Vec<String> = (0..count).map(|i| format!("Bench/asset_{i}.mock")).collect();
    for path in &paths {
        store.write_source(path, &payload);
        manager.load::<MockAsset>(path);
    }
    (store, manager, paths)
}

fn bench_hot_path_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_unchanged");

    for size in [1024, 64 * 1024, 1024 * 1024] {
        group.throughput(Throughput::Bytes(size as u64));
        let (_store, manager, paths) = setup(1, size);

        group.bench_with_input(BenchmarkId::from_parameter(size), &paths[0], |b, path| {
            b.iter(|| {
                let loaded = manager.load::<MockAsset>(black_box(path));
                manager.drain_events();
                loaded
            });
        });
    }

    group.finish();
}

fn bench_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_rebuild");

    for size in [1024, 64 * 1024] {
        group.throughput(Throughput::Bytes(size as u64));
        let (store, manager, paths) = setup(1, size);
        let path = &paths[0];
        let mut flip = 0u8;

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                flip = flip.wrapping_add(1);
                store.write_source(path, &vec![flip; size]);
                let loaded = manager.load::<MockAsset>(black_box(path));
                manager.drain_events();
                loaded
            });
        });
    }

    group.finish();
}

fn bench_registry_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry_get");

    for count in [10, 100, 1000] {
        group.throughput(Throughput::Elements(count as u64));
        let (_store, manager, paths) = setup(count, 16);

        group.bench_with_input(BenchmarkId::from_parameter(count), &paths, |b, paths| {
            b.iter(|| {
                paths
                    .iter()
                    .filter(|p| manager.get::<MockAsset>(black_box(p)).is_valid())
                    .count()
            });
        });
    }

    group.finish();
}

fn bench_embedded(c: &mut Criterion) {
    static WHITE: [u8; 4096] = [0xff; 4096];

    let store = TestStore::new();
    let mut manager = AssetManager::new(store.config());
    manager.register_loader(MockLoader::new());
    let mut module = EmbeddedModule::new("engine");
    for i in 0..256 {
        module.add_resource(format!("textures/tile_{i}.mock"), &WHITE);
    }
    manager.register_embedded(module);

    c.bench_function("load_embedded_suffix", |b| {
        b.iter(|| {
            let loaded = manager.load_embedded::<MockAsset>(black_box("tile_128.mock"));
            manager.drain_events();
            loaded
        });
    });
}

fn bench_content_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("content_hash");

    for size in [1024, 1024 * 1024] {
        let data = vec![0x42u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| ContentHash::from_bytes(black_box(data)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_hot_path_load,
    bench_rebuild,
    bench_registry_lookup,
    bench_embedded,
    bench_content_hash
);
criterion_main!(benches);
