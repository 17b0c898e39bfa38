//! Benchmarks for thread assembly and the transformation pipeline.
//!
//! Run with: `cargo bench`
//! Run specific group: `cargo bench --bench threading -- assembly`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use slack2mm::config::TransformConfig;
use slack2mm::core::models::{ChannelType, IntermediateChannel, IntermediatePost};
use slack2mm::core::{TimestampLedger, Transformer, add_post_to_threads, to_bulk_import};
use slack2mm::parsing::{SlackChannel, SlackExport, SlackPost, SlackUser};
use slack2mm::store::{CachedStore, MapBackend, MemoryStore, MemoryStoreFactory, ThreadStore};

// =============================================================================
// Test Data Generators
// =============================================================================

/// Every fourth message starts a thread; the others reply to the latest root.
/// Every tenth message falls in the same millisecond as its predecessor.
fn generate_posts(count: usize) -> Vec<SlackPost> {
    let mut posts = Vec::with_capacity(count);
    let mut root_ts = String::new();
    let mut secs = 1_705_314_600i64;
    for i in 0..count {
        let ts = if i % 10 == 0 && i > 0 {
            format!("{}.000500", secs)
        } else {
            secs = 1_705_314_600 + i as i64;
            format!("{}.000100", secs)
        };
        let thread_ts = if i % 4 == 0 {
            root_ts = ts.clone();
            String::new()
        } else {
            root_ts.clone()
        };
        posts.push(SlackPost {
            user: if i % 2 == 0 { "U1".into() } else { "U2".into() },
            text: format!("Message number {}", i),
            timestamp: ts,
            thread_ts,
            post_type: "message".into(),
            ..SlackPost::default()
        });
    }
    posts
}

fn generate_export(count: usize) -> SlackExport {
    let user = |id: &str, name: &str| SlackUser {
        id: id.into(),
        username: name.into(),
        ..SlackUser::default()
    };
    let mut export = SlackExport {
        users: vec![user("U1", "alice"), user("U2", "bob")],
        public_channels: vec![SlackChannel {
            id: "C1".into(),
            name: "general".into(),
            members: vec!["U1".into(), "U2".into()],
            ..SlackChannel::default()
        }],
        ..SlackExport::default()
    };
    export.posts.insert("general".into(), generate_posts(count));
    export
}

fn assemble(posts: &[SlackPost], store: &mut dyn ThreadStore) -> usize {
    let channel = IntermediateChannel {
        name: "general".into(),
        channel_type: ChannelType::Open,
        ..IntermediateChannel::default()
    };
    let mut ledger = TimestampLedger::new();
    for original in posts {
        let post = IntermediatePost::new("alice", "general", &original.text, original.create_at());
        add_post_to_threads(original, post, store, &channel, &mut ledger, false).unwrap();
    }
    store.changed_threads().len()
}

// =============================================================================
// Thread Assembly Benchmarks
// =============================================================================

fn bench_assembly_memory(c: &mut Criterion) {
    let mut group = c.benchmark_group("assembly_memory");

    for size in [100_usize, 1_000, 10_000, 100_000] {
        let posts = generate_posts(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &posts, |b, posts| {
            b.iter(|| {
                let mut store = MemoryStore::new();
                black_box(assemble(black_box(posts), &mut store))
            });
        });
    }
    group.finish();
}

fn bench_assembly_cached(c: &mut Criterion) {
    let mut group = c.benchmark_group("assembly_cached");

    for size in [100_usize, 1_000, 10_000] {
        let posts = generate_posts(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &posts, |b, posts| {
            b.iter(|| {
                let mut store = CachedStore::new(MapBackend::new(), "general");
                let changed = assemble(black_box(posts), &mut store);
                store.flush().unwrap();
                black_box(changed)
            });
        });
    }
    group.finish();
}

// =============================================================================
// Pipeline Benchmarks
// =============================================================================

fn bench_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform");
    let config = TransformConfig::new().with_skip_attachments(true);

    for size in [1_000_usize, 10_000] {
        let export = generate_export(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &export, |b, export| {
            b.iter(|| {
                let mut transformer = Transformer::new("team");
                transformer
                    .transform_with(&config, black_box(export), &mut MemoryStoreFactory)
                    .unwrap();
                black_box(to_bulk_import(&transformer.intermediate, "team").unwrap())
            });
        });
    }
    group.finish();
}

criterion_group!(assembly, bench_assembly_memory, bench_assembly_cached);
criterion_group!(pipeline, bench_transform);
criterion_main!(assembly, pipeline);
