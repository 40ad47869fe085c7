//! Benchmarks for registry and forum operations.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use forum_registry::registry::{ForumId, PostId};
use forum_registry::{hash_name, ContentHash, Identity, Registry};

fn populated(users: usize) -> (Registry, ForumId) {
    let mut registry = Registry::with_admin(Identity::derive("admin"));
    for i in 0..users {
        let name = format!("user-{}", i);
        registry
            .register_user(&Identity::derive(&name), &name)
            .unwrap();
    }
    let forum = registry
        .register_forum(&Identity::derive("forum-owner"), "bench", 0)
        .unwrap();
    (registry, forum)
}

fn bench_hashing(c: &mut Criterion) {
    let mut group = c.benchmark_group("hashing");
    group.bench_function("hash_name", |b| {
        b.iter(|| hash_name(black_box("Moody's super cool forum!")))
    });

    let body = vec![0u8; 4096];
    group.throughput(Throughput::Bytes(4096));
    group.bench_function("content_hash_4kb", |b| {
        b.iter(|| ContentHash::compute(black_box(&body)))
    });

    group.finish();
}

fn bench_registration(c: &mut Criterion) {
    let mut group = c.benchmark_group("registration");
    for count in [100usize, 1000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("register_users", count), &count, |b, &n| {
            b.iter(|| populated(black_box(n)))
        });
    }

    let (registry, _) = populated(1000);
    let target = hash_name("user-500");
    group.bench_function("lookup_user", |b| {
        b.iter(|| registry.lookup_user(black_box(&target)))
    });

    group.finish();
}

fn bench_posting(c: &mut Criterion) {
    let mut group = c.benchmark_group("posting");
    let owner = Identity::derive("user-0");
    let poster = hash_name("user-0");

    group.bench_function("create_thread", |b| {
        let (mut registry, forum) = populated(1);
        b.iter(|| {
            registry
                .forum_mut(forum)
                .unwrap()
                .create_thread(
                    &owner,
                    &poster,
                    black_box("a great discussion"),
                    ContentHash::compute(b"body"),
                    Vec::new(),
                )
                .unwrap()
        })
    });

    group.bench_function("reply", |b| {
        let (mut registry, forum) = populated(1);
        let root = registry
            .forum_mut(forum)
            .unwrap()
            .create_thread(&owner, &poster, "root", ContentHash::compute(b"r"), Vec::new())
            .unwrap();
        b.iter(|| {
            registry
                .forum_mut(forum)
                .unwrap()
                .reply(
                    &owner,
                    black_box(root),
                    &poster,
                    ContentHash::compute(b"reply"),
                    Vec::new(),
                )
                .unwrap()
        })
    });

    group.bench_function("is_post", |b| {
        let (mut registry, forum) = populated(1);
        for _ in 0..1000 {
            registry
                .forum_mut(forum)
                .unwrap()
                .create_thread(&owner, &poster, "t", ContentHash::compute(b"t"), Vec::new())
                .unwrap();
        }
        let forum = registry.forum(forum).unwrap();
        b.iter(|| forum.is_post(black_box(PostId::new(777))))
    });

    group.finish();
}

criterion_group!(benches, bench_hashing, bench_registration, bench_posting);
criterion_main!(benches);
