use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use quill_index::config::{BPlusTreeConfig, ExtendibleHashConfig};
use quill_index::{
    BPlusTreeIndex, BitmapIndex, ExtendibleHashIndex, Index, IndexCatalog, QueryEvaluator,
    QueryNode, RowId,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

const ROWS: u32 = 20_000;
const POINT_SAMPLES: usize = 1_000;

fn shuffled_keys() -> Vec<i64> {
    let mut keys: Vec<i64> = (0..ROWS as i64).collect();
    keys.shuffle(&mut StdRng::seed_from_u64(17));
    keys
}

fn build_tree(keys: &[i64]) -> BPlusTreeIndex {
    let mut tree =
        BPlusTreeIndex::try_new("k", BPlusTreeConfig::default().with_order(64usize)).unwrap();
    for (row_id, key) in keys.iter().enumerate() {
        tree.insert((*key).into(), row_id as RowId).unwrap();
    }
    tree
}

fn build_hash(keys: &[i64]) -> ExtendibleHashIndex {
    let mut index =
        ExtendibleHashIndex::try_new("k", ExtendibleHashConfig::new(4, 16, 24)).unwrap();
    for (row_id, key) in keys.iter().enumerate() {
        index.insert((*key).into(), row_id as RowId).unwrap();
    }
    index
}

fn bench_insert(c: &mut Criterion) {
    let keys = shuffled_keys();
    let mut group = c.benchmark_group("insert_20k");
    group.throughput(Throughput::Elements(ROWS as u64));
    group.bench_function("btree", |b| {
        b.iter_batched(|| keys.clone(), |keys| black_box(build_tree(&keys)), BatchSize::LargeInput)
    });
    group.bench_function("hash", |b| {
        b.iter_batched(|| keys.clone(), |keys| black_box(build_hash(&keys)), BatchSize::LargeInput)
    });
    group.bench_function("bitmap", |b| {
        b.iter(|| {
            let mut index = BitmapIndex::new("k", ROWS - 1);
            for (row_id, key) in keys.iter().enumerate() {
                index.insert((key % 100).into(), row_id as RowId).unwrap();
            }
            black_box(index)
        })
    });
    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let keys = shuffled_keys();
    let tree = build_tree(&keys);
    let hash = build_hash(&keys);
    let lookups = &keys[..POINT_SAMPLES];

    let mut group = c.benchmark_group("point_lookup");
    group.throughput(Throughput::Elements(POINT_SAMPLES as u64));
    group.bench_function("btree", |b| {
        b.iter(|| {
            for key in lookups {
                black_box(tree.search(&(*key).into()).unwrap());
            }
        })
    });
    group.bench_function("hash", |b| {
        b.iter(|| {
            for key in lookups {
                black_box(hash.search(&(*key).into()).unwrap());
            }
        })
    });
    group.bench_function("btree_range_1k", |b| {
        b.iter(|| black_box(tree.range_query(&5_000.into(), true, &6_000.into(), false).unwrap()))
    });
    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let keys = shuffled_keys();
    let mut catalog = IndexCatalog::new();
    catalog.register(Box::new(build_tree(&keys)));
    let mut bitmap = BitmapIndex::new("bucket", ROWS - 1);
    for row_id in 0..ROWS {
        bitmap.insert((row_id % 16).into(), row_id).unwrap();
    }
    catalog.register(Box::new(bitmap));

    let query = QueryNode::and(
        QueryNode::range("k", "1000", "9000"),
        QueryNode::not(QueryNode::equals("bucket", "3")),
    );
    c.bench_function("evaluate_and_not", |b| {
        let evaluator = QueryEvaluator::new(&catalog);
        b.iter(|| black_box(evaluator.evaluate_query(Some(&query), ROWS - 1).unwrap()))
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = bench_insert, bench_lookup, bench_evaluate
);
criterion_main!(benches);
