// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scanner Pipeline Tests
 * Stubbed-prober pipeline behavior: routing, stats, cancellation
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use chrono::Utc;
use sanko::errors::ScanError;
use sanko::inspector::Inspect;
use sanko::prober::Probe;
use sanko::scanner::{Scanner, ScannerConfig};
use sanko::types::{AclState, InspectOutcome, ProbeClass, ProbeOutcome, ScanResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Prober stub that answers from a fixed status table.
struct StubProber {
    statuses: HashMap<String, u16>,
    delay: Option<Duration>,
}

impl StubProber {
    fn new(statuses: &[(&str, u16)]) -> Self {
        Self {
            statuses: statuses
                .iter()
                .map(|(bucket, status)| (bucket.to_string(), *status))
                .collect(),
            delay: None,
        }
    }

    fn slow(statuses: &[(&str, u16)], delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(statuses)
        }
    }
}

#[async_trait]
impl Probe for StubProber {
    async fn check(&self, bucket: &str, cancel: &CancellationToken) -> ProbeOutcome {
        if let Some(delay) = self.delay {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return ProbeOutcome {
                        bucket: bucket.to_string(),
                        class: ProbeClass::Error,
                        status: 0,
                        error: Some("scan cancelled".to_string()),
                    };
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        let status = *self.statuses.get(bucket).unwrap_or(&404);
        let class = match status {
            200 => ProbeClass::Exists,
            403 => ProbeClass::Forbidden,
            404 => ProbeClass::NotFound,
            301 | 307 => ProbeClass::Forbidden,
            _ => ProbeClass::Error,
        };

        ProbeOutcome {
            bucket: bucket.to_string(),
            class,
            status,
            error: None,
        }
    }
}

/// Inspector stub that tags every bucket as public in a fixed region.
struct StubInspector;

#[async_trait]
impl Inspect for StubInspector {
    async fn inspect(&self, bucket: &str) -> InspectOutcome {
        InspectOutcome {
            bucket: bucket.to_string(),
            exists: true,
            is_public: true,
            acl: AclState::PublicRead,
            region: "eu-west-1".to_string(),
            object_count: 3,
            sample_keys: vec!["index.html".to_string()],
            error: None,
            timestamp: Utc::now(),
        }
    }
}

fn test_config(workers: usize, deep_inspect: bool) -> ScannerConfig {
    ScannerConfig {
        workers,
        inspect_workers: 4,
        deep_inspect,
        ..Default::default()
    }
}

async fn run_scan(scanner: &Scanner, names: Vec<String>) -> Vec<ScanResult> {
    let mut rx = scanner
        .scan(names, CancellationToken::new())
        .expect("scan should start");

    let mut results = Vec::new();
    while let Some(result) = rx.recv().await {
        results.push(result);
    }
    results
}

#[tokio::test]
async fn classifier_mapping_drops_not_found() {
    let prober = StubProber::new(&[
        ("n1", 200),
        ("n2", 403),
        ("n3", 404),
        ("n4", 301),
        ("n5", 500),
    ]);
    let scanner = Scanner::from_parts(
        Arc::new(prober),
        Arc::new(StubInspector),
        &test_config(4, false),
    );

    let names = vec!["n1", "n2", "n3", "n4", "n5"]
        .into_iter()
        .map(String::from)
        .collect();
    let results = run_scan(&scanner, names).await;

    assert_eq!(results.len(), 4, "not_found must never surface");

    let class_of = |bucket: &str| {
        results
            .iter()
            .find(|result| result.bucket == bucket)
            .map(|result| result.probe)
    };
    assert_eq!(class_of("n1"), Some(ProbeClass::Exists));
    assert_eq!(class_of("n2"), Some(ProbeClass::Forbidden));
    assert_eq!(class_of("n3"), None);
    assert_eq!(class_of("n4"), Some(ProbeClass::Forbidden));
    assert_eq!(class_of("n5"), Some(ProbeClass::Error));
}

#[tokio::test]
async fn classification_multiset_is_worker_count_independent() {
    let statuses: Vec<(String, u16)> = (0..60)
        .map(|i| (format!("bucket-{i:02}"), [200u16, 403, 404, 500][i % 4]))
        .collect();
    let table: Vec<(&str, u16)> = statuses
        .iter()
        .map(|(bucket, status)| (bucket.as_str(), *status))
        .collect();
    let names: Vec<String> = statuses.iter().map(|(bucket, _)| bucket.clone()).collect();

    let mut outcomes = Vec::new();
    for workers in [1usize, 8] {
        let scanner = Scanner::from_parts(
            Arc::new(StubProber::new(&table)),
            Arc::new(StubInspector),
            &test_config(workers, false),
        );
        let mut classified: Vec<(String, ProbeClass)> = run_scan(&scanner, names.clone())
            .await
            .into_iter()
            .map(|result| (result.bucket, result.probe))
            .collect();
        classified.sort_by(|a, b| a.0.cmp(&b.0));
        outcomes.push(classified);
    }

    assert_eq!(outcomes[0], outcomes[1]);
}

#[tokio::test]
async fn stats_are_consistent_at_completion() {
    let statuses: Vec<(String, u16)> = (0..100)
        .map(|i| (format!("bucket-{i:03}"), [200u16, 403, 404, 500][i % 4]))
        .collect();
    let table: Vec<(&str, u16)> = statuses
        .iter()
        .map(|(bucket, status)| (bucket.as_str(), *status))
        .collect();
    let names: Vec<String> = statuses.iter().map(|(bucket, _)| bucket.clone()).collect();

    let scanner = Scanner::from_parts(
        Arc::new(StubProber::new(&table)),
        Arc::new(StubInspector),
        &test_config(8, false),
    );
    let results = run_scan(&scanner, names).await;

    let stats = scanner.stats();
    assert_eq!(stats.total, 100);
    assert_eq!(stats.scanned, 100);
    assert_eq!(stats.found, stats.public + stats.private);
    assert_eq!(stats.scanned, stats.found + stats.errors + stats.not_found);
    assert_eq!(results.len() as u64, stats.scanned - stats.not_found);
    assert_eq!(stats.public, 25);
    assert_eq!(stats.private, 25);
    assert_eq!(stats.errors, 25);
    assert_eq!(stats.not_found, 25);
}

#[tokio::test]
async fn empty_input_refuses_to_start() {
    let scanner = Scanner::from_parts(
        Arc::new(StubProber::new(&[])),
        Arc::new(StubInspector),
        &test_config(2, false),
    );

    let err = scanner
        .scan(Vec::new(), CancellationToken::new())
        .err()
        .expect("empty input must refuse to start");
    assert!(matches!(err, ScanError::NoCandidates));
}

#[tokio::test]
async fn deep_mode_attaches_inspection_to_hits_only() {
    let prober = StubProber::new(&[("hit-public", 200), ("hit-private", 403), ("broken", 500)]);
    let scanner = Scanner::from_parts(
        Arc::new(prober),
        Arc::new(StubInspector),
        &test_config(2, true),
    );

    let names = vec!["hit-public", "hit-private", "broken"]
        .into_iter()
        .map(String::from)
        .collect();
    let results = run_scan(&scanner, names).await;

    assert_eq!(results.len(), 3);
    for result in &results {
        match result.probe {
            ProbeClass::Exists | ProbeClass::Forbidden => {
                let inspect = result.inspect.as_ref().expect("hits must be inspected");
                assert_eq!(inspect.acl, AclState::PublicRead);
                assert_eq!(inspect.region, "eu-west-1");
            }
            _ => assert!(result.inspect.is_none(), "errors are never inspected"),
        }
    }
}

#[tokio::test]
async fn shallow_mode_emits_hits_directly() {
    let prober = StubProber::new(&[("hit-public", 200)]);
    let scanner = Scanner::from_parts(
        Arc::new(prober),
        Arc::new(StubInspector),
        &test_config(2, false),
    );

    let results = run_scan(&scanner, vec!["hit-public".to_string()]).await;
    assert_eq!(results.len(), 1);
    assert!(results[0].inspect.is_none());
}

#[tokio::test]
async fn cancellation_closes_the_pipeline_promptly() {
    let names: Vec<String> = (0..1000).map(|i| format!("bucket-{i:04}")).collect();
    let prober = StubProber::slow(&[], Duration::from_secs(5));
    let scanner = Scanner::from_parts(
        Arc::new(prober),
        Arc::new(StubInspector),
        &test_config(5, true),
    );

    let cancel = CancellationToken::new();
    let mut rx = scanner.scan(names, cancel.clone()).expect("scan should start");

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let drained = tokio::time::timeout(Duration::from_secs(2), async {
        while rx.recv().await.is_some() {}
    })
    .await;

    assert!(
        drained.is_ok(),
        "result channel must close shortly after cancellation"
    );
}
