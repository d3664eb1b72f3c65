//! Traversal benchmarks for the tree query engine
//!
//! Run with: `cargo bench -p orgunits-core`
//!
//! Measures closure computation on:
//! - A deep chain (ancestors of the bottom, descendants of the top)
//! - A wide three-level tree
//!
//! for both the SQLite store and the in-memory store.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use orgunits_core::db::{DatabaseService, MemoryStore, OrganizationStore, TursoStore};
use orgunits_core::models::NewOrganization;
use orgunits_core::services::TreeQueryEngine;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::runtime::Runtime;

const CHAIN_DEPTH: usize = 500;
const FAN_OUT: usize = 30;

async fn setup_turso() -> (Arc<dyn OrganizationStore>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db = Arc::new(
        DatabaseService::new(temp_dir.path().join("bench.db"))
            .await
            .unwrap(),
    );
    (Arc::new(TursoStore::new(db)), temp_dir)
}

/// Build a chain and return (top, bottom)
async fn build_chain(store: &Arc<dyn OrganizationStore>) -> (i64, i64) {
    let top = store
        .create_organization(NewOrganization::new("chain-0", "CHAIN-0"))
        .await
        .unwrap()
        .id;
    let mut bottom = top;
    for level in 1..CHAIN_DEPTH {
        bottom = store
            .create_organization(
                NewOrganization::new(format!("chain-{}", level), format!("CHAIN-{}", level))
                    .with_parent(bottom),
            )
            .await
            .unwrap()
            .id;
    }
    (top, bottom)
}

/// Build root -> FAN_OUT children -> FAN_OUT grandchildren each
async fn build_wide(store: &Arc<dyn OrganizationStore>) -> i64 {
    let root = store
        .create_organization(NewOrganization::new("wide", "WIDE"))
        .await
        .unwrap()
        .id;
    for i in 0..FAN_OUT {
        let child = store
            .create_organization(
                NewOrganization::new(format!("w-{}", i), format!("W-{}", i)).with_parent(root),
            )
            .await
            .unwrap()
            .id;
        for j in 0..FAN_OUT {
            store
                .create_organization(
                    NewOrganization::new(format!("w-{}-{}", i, j), format!("W-{}-{}", i, j))
                        .with_parent(child),
                )
                .await
                .unwrap();
        }
    }
    root
}

fn bench_backend(c: &mut Criterion, label: &str, store: Arc<dyn OrganizationStore>, rt: &Runtime) {
    let (top, bottom) = rt.block_on(build_chain(&store));
    let wide_root = rt.block_on(build_wide(&store));
    let engine = TreeQueryEngine::new(store);

    c.bench_function(&format!("{}/ancestors_deep_chain", label), |b| {
        b.iter(|| rt.block_on(engine.ancestors(black_box(bottom))).unwrap())
    });

    c.bench_function(&format!("{}/descendants_deep_chain", label), |b| {
        b.iter(|| rt.block_on(engine.descendants(black_box(top))).unwrap())
    });

    c.bench_function(&format!("{}/strict_descendants_wide_tree", label), |b| {
        b.iter(|| {
            rt.block_on(engine.strict_descendants(black_box(wide_root)))
                .unwrap()
        })
    });
}

fn bench_traversal(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let (turso, _temp) = rt.block_on(setup_turso());
    bench_backend(c, "turso", turso, &rt);

    bench_backend(c, "memory", Arc::new(MemoryStore::new()), &rt);
}

criterion_group!(benches, bench_traversal);
criterion_main!(benches);
