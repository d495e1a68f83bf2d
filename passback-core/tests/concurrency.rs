//! Concurrency tests for the reconciliation core
//!
//! These tests validate the key-scoped locking discipline:
//! - Concurrent events for the same key serialize without lost updates
//! - Events for distinct keys proceed fully in parallel

use std::sync::Arc;
use std::time::{Duration, Instant};

use passback_core::{
    LaunchContext, MockAgsClient, Orchestrator, PassbackConfig, UpdateEvent,
};

fn launch(session: &str, learner: &str) -> LaunchContext {
    LaunchContext::new(session, learner, "https://lms.example.edu")
        .with_course("course-1")
        .with_activity("quiz-1")
}

fn event(score: f64) -> UpdateEvent {
    UpdateEvent {
        score_delta: score,
        attempts_delta: 1.0,
        is_exit: false,
    }
}

#[tokio::test]
async fn concurrent_same_key_events_lose_no_updates() {
    let client = Arc::new(MockAgsClient::new());
    let orch = Arc::new(Orchestrator::new(PassbackConfig::default(), client.clone()));
    orch.handle_launch(launch("sess-1", "learner-1")).await;

    let mut handles = vec![];
    for _ in 0..25 {
        let orch = Arc::clone(&orch);
        handles.push(tokio::spawn(async move {
            orch.handle_update("sess-1", event(1.0)).await
        }));
    }

    let mut max_seen: f64 = 0.0;
    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        max_seen = max_seen.max(result.cumulative_score);
    }

    // Same total as applying the 25 events sequentially.
    assert_eq!(max_seen, 25.0);
    let snapshots = orch.snapshots().await;
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].1.cumulative_score, 25.0);
    assert_eq!(snapshots[0].1.cumulative_attempts, 25);
}

#[tokio::test]
async fn concurrent_same_key_events_submit_in_aggregation_order() {
    let client = Arc::new(MockAgsClient::new());
    let orch = Arc::new(Orchestrator::new(
        PassbackConfig {
            report_attempts: false,
            ..Default::default()
        },
        client.clone(),
    ));
    orch.handle_launch(launch("sess-1", "learner-1").with_hint("li-1")).await;

    let mut handles = vec![];
    for _ in 0..10 {
        let orch = Arc::clone(&orch);
        handles.push(tokio::spawn(async move {
            orch.handle_update("sess-1", event(1.0)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Submitted score_given values are non-decreasing: each request held
    // the per-key lock through its own submission.
    let submitted: Vec<f64> = client
        .submissions()
        .iter()
        .map(|(_, payload)| payload.score_given)
        .collect();
    assert_eq!(submitted.len(), 10);
    assert!(submitted.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(*submitted.last().unwrap(), 10.0);
}

#[tokio::test]
async fn distinct_keys_reconcile_in_parallel() {
    // 40ms of platform latency per call; two learners submitting at the
    // same time must overlap rather than queue behind one another.
    let client = Arc::new(MockAgsClient::with_latency(Duration::from_millis(40)));
    let orch = Arc::new(Orchestrator::new(
        PassbackConfig {
            report_attempts: false,
            ..Default::default()
        },
        client,
    ));
    orch.handle_launch(launch("sess-a", "learner-a").with_hint("li-a")).await;
    orch.handle_launch(launch("sess-b", "learner-b").with_hint("li-b")).await;

    let start = Instant::now();
    let a = {
        let orch = Arc::clone(&orch);
        tokio::spawn(async move { orch.handle_update("sess-a", event(1.0)).await })
    };
    let b = {
        let orch = Arc::clone(&orch);
        tokio::spawn(async move { orch.handle_update("sess-b", event(1.0)).await })
    };

    assert!(a.await.unwrap().is_ok());
    assert!(b.await.unwrap().is_ok());

    // Each request spends ~40ms submitting; serialized they would need
    // ~80ms. Allow margin for scheduler jitter.
    let elapsed = start.elapsed();
    assert!(
        elapsed < Duration::from_millis(70),
        "distinct keys should not serialize: took {:?}",
        elapsed
    );
}

#[tokio::test]
async fn distinct_keys_never_corrupt_each_other() {
    let client = Arc::new(MockAgsClient::new());
    let orch = Arc::new(Orchestrator::new(PassbackConfig::default(), client));

    for i in 0..5 {
        orch.handle_launch(launch(&format!("sess-{i}"), &format!("learner-{i}"))).await;
    }

    let mut handles = vec![];
    for i in 0..5 {
        for _ in 0..10 {
            let orch = Arc::clone(&orch);
            let session = format!("sess-{i}");
            // Learner i scores i+1 points per event.
            let delta = (i + 1) as f64;
            handles.push(tokio::spawn(async move {
                orch.handle_update(&session, event(delta)).await
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let mut snapshots = orch.snapshots().await;
    snapshots.sort_by(|a, b| a.0.learner_id.cmp(&b.0.learner_id));
    assert_eq!(snapshots.len(), 5);
    for (i, (key, state)) in snapshots.iter().enumerate() {
        assert_eq!(key.learner_id, format!("learner-{i}"));
        assert_eq!(state.cumulative_score, ((i + 1) * 10) as f64);
        assert_eq!(state.cumulative_attempts, 10);
    }
}
