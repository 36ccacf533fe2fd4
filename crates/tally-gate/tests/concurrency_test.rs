//! Concurrency: for one (user, resource) pair, N concurrent reservations
//! with limit L admit exactly L, regardless of interleaving.

use std::sync::{Arc, Barrier};
use std::thread;

use tally_core::config::TallyConfig;
use tally_core::models::gate::{DenialReason, GateDecision};
use tally_core::models::plan::Entitlements;
use tally_core::models::usage::ResourceType;
use tally_core::traits::ITallyStorage;
use tally_gate::QuotaGate;
use tally_storage::StorageEngine;

fn gate_over(engine: Arc<StorageEngine>) -> Arc<QuotaGate> {
    Arc::new(QuotaGate::new(
        engine as Arc<dyn ITallyStorage>,
        Entitlements::baseline(),
    ))
}

fn run_concurrent(gate: Arc<QuotaGate>, threads: usize, user: &str) -> Vec<GateDecision> {
    let barrier = Arc::new(Barrier::new(threads));
    let mut handles = Vec::with_capacity(threads);
    for _ in 0..threads {
        let gate = Arc::clone(&gate);
        let barrier = Arc::clone(&barrier);
        let user = user.to_string();
        handles.push(thread::spawn(move || {
            barrier.wait();
            gate.check_and_reserve(&user, ResourceType::TemplateCreation)
                .unwrap()
        }));
    }
    handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect()
}

#[test]
fn concurrency_exactly_limit_reservations_succeed() {
    // Free tier: limit 20. 32 threads race from count 0.
    let engine = Arc::new(StorageEngine::open_in_memory().unwrap());
    let gate = gate_over(Arc::clone(&engine));

    let decisions = run_concurrent(Arc::clone(&gate), 32, "u1");

    let allowed = decisions.iter().filter(|d| d.is_allowed()).count();
    assert_eq!(allowed, 20, "exactly the limit must be admitted");
    assert_eq!(decisions.len() - allowed, 12);

    for decision in &decisions {
        if let Some(reason) = decision.denial() {
            assert_eq!(reason, DenialReason::LimitReached(20));
        }
    }

    // Every admitted reservation got a distinct count in 1..=20.
    let mut counts: Vec<u32> = decisions
        .iter()
        .filter_map(|d| match d {
            GateDecision::Allowed { new_count } => Some(*new_count),
            GateDecision::Denied(_) => None,
        })
        .collect();
    counts.sort_unstable();
    assert_eq!(counts, (1..=20).collect::<Vec<u32>>());

    let stats = gate
        .get_usage("u1", ResourceType::TemplateCreation)
        .unwrap();
    assert_eq!(stats.current, 20);
}

#[test]
fn concurrency_file_backed_engine_holds_the_limit() {
    // Same property through a file-backed pool with real reader
    // connections and WAL.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tally.db");
    let engine = Arc::new(StorageEngine::open(&path, 2).unwrap());
    let gate = gate_over(Arc::clone(&engine));

    let decisions = run_concurrent(Arc::clone(&gate), 24, "u1");
    let allowed = decisions.iter().filter(|d| d.is_allowed()).count();
    assert_eq!(allowed, 20);

    let stats = gate
        .get_usage("u1", ResourceType::TemplateCreation)
        .unwrap();
    assert_eq!(stats.current, 20);
}

#[test]
fn concurrency_users_do_not_share_buckets() {
    let engine = Arc::new(StorageEngine::open_in_memory().unwrap());
    let gate = gate_over(Arc::clone(&engine));

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads * 2));
    let mut handles = Vec::new();
    for user in ["alice", "bob"] {
        for _ in 0..threads {
            let gate = Arc::clone(&gate);
            let barrier = Arc::clone(&barrier);
            let user = user.to_string();
            handles.push(thread::spawn(move || {
                barrier.wait();
                gate.check_and_reserve(&user, ResourceType::TemplateCreation)
                    .unwrap()
            }));
        }
    }
    for handle in handles {
        assert!(handle.join().unwrap().is_allowed());
    }

    for user in ["alice", "bob"] {
        let stats = gate
            .get_usage(user, ResourceType::TemplateCreation)
            .unwrap();
        assert_eq!(stats.current, threads as u32);
    }
}

#[test]
fn concurrency_low_limit_from_config() {
    let config = TallyConfig::from_toml(
        r#"
        [quota.limits.free]
        template_creation = 3
        "#,
    )
    .unwrap();
    let engine = Arc::new(StorageEngine::open_in_memory().unwrap());
    let gate = Arc::new(QuotaGate::new(
        engine as Arc<dyn ITallyStorage>,
        Entitlements::from_config(&config.quota),
    ));

    let decisions = run_concurrent(Arc::clone(&gate), 10, "u1");
    let allowed = decisions.iter().filter(|d| d.is_allowed()).count();
    assert_eq!(allowed, 3);
}
