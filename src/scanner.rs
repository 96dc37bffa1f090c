// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Orchestrator
 * Two-stage probe/inspect pipeline over bounded channels
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::Result;
use chrono::Utc;
use parking_lot::Mutex as SyncMutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::errors::ScanError;
use crate::inspector::{Inspect, Inspector};
use crate::prober::{Probe, Prober, ProberConfig};
use crate::rate_limiter::AdaptiveRateLimiter;
use crate::types::{ProbeClass, ScanResult, StatsSnapshot};

const NAMES_CHANNEL_CAP: usize = 1000;
/// Bounded on purpose: when inspection falls behind, probe workers block
/// here, which keeps memory flat during hit-dense scans.
const INSPECT_CHANNEL_CAP: usize = 500;
const RESULTS_CHANNEL_CAP: usize = 1000;

/// Scanner configuration.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Probe worker count.
    pub workers: usize,
    /// Deep-inspection worker count; sized independently so slow
    /// anonymous S3 calls never stall probing.
    pub inspect_workers: usize,
    /// RPS ceiling handed to the adaptive rate limiter.
    pub max_rps: f64,
    /// Per-probe request timeout.
    pub timeout: Duration,
    /// Whether Exists/Forbidden hits go through deep inspection.
    pub deep_inspect: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            workers: 50,
            inspect_workers: 10,
            max_rps: 150.0,
            timeout: Duration::from_secs(15),
            deep_inspect: true,
        }
    }
}

/// Shared scan counters. Incremented with relaxed atomics; snapshots are
/// eventually consistent and returned by value only.
#[derive(Debug, Default)]
pub struct ScanStats {
    total: AtomicU64,
    scanned: AtomicU64,
    found: AtomicU64,
    public: AtomicU64,
    private: AtomicU64,
    errors: AtomicU64,
    not_found: AtomicU64,
    started_at: SyncMutex<Option<Instant>>,
}

impl ScanStats {
    fn begin(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
        self.scanned.store(0, Ordering::Relaxed);
        self.found.store(0, Ordering::Relaxed);
        self.public.store(0, Ordering::Relaxed);
        self.private.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        self.not_found.store(0, Ordering::Relaxed);
        *self.started_at.lock() = Some(Instant::now());
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total: self.total.load(Ordering::Relaxed),
            scanned: self.scanned.load(Ordering::Relaxed),
            found: self.found.load(Ordering::Relaxed),
            public: self.public.load(Ordering::Relaxed),
            private: self.private.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            elapsed: self
                .started_at
                .lock()
                .map(|start| start.elapsed())
                .unwrap_or_default(),
        }
    }
}

/// Orchestrates the bucket enumeration pipeline:
///
/// ```text
/// names -> [probe workers] -> (hits) -> [inspect workers] -> results
/// ```
///
/// All channels are bounded, every send is raced against the scan-wide
/// cancellation token, and channels close in dependency order as the
/// stages drain.
pub struct Scanner {
    prober: Arc<dyn Probe>,
    inspector: Arc<dyn Inspect>,
    limiter: Option<Arc<AdaptiveRateLimiter>>,
    workers: usize,
    inspect_workers: usize,
    deep_inspect: bool,
    stats: Arc<ScanStats>,
}

impl Scanner {
    /// Builds a scanner with the real prober and inspector.
    pub fn new(config: &ScannerConfig) -> Result<Self> {
        let limiter = Arc::new(AdaptiveRateLimiter::new(config.max_rps));
        let prober = Prober::new(
            &ProberConfig {
                timeout: config.timeout,
                pool_idle_per_host: config.workers,
            },
            Arc::clone(&limiter),
        )?;
        let inspector = Inspector::new(Duration::from_secs(30))?;

        Ok(Self {
            prober: Arc::new(prober),
            inspector: Arc::new(inspector),
            limiter: Some(limiter),
            workers: config.workers.max(1),
            inspect_workers: config.inspect_workers.max(1),
            deep_inspect: config.deep_inspect,
            stats: Arc::new(ScanStats::default()),
        })
    }

    /// Builds a scanner around caller-provided stages. This is the test
    /// seam; production code goes through `new`.
    pub fn from_parts(
        prober: Arc<dyn Probe>,
        inspector: Arc<dyn Inspect>,
        config: &ScannerConfig,
    ) -> Self {
        Self {
            prober,
            inspector,
            limiter: None,
            workers: config.workers.max(1),
            inspect_workers: config.inspect_workers.max(1),
            deep_inspect: config.deep_inspect,
            stats: Arc::new(ScanStats::default()),
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Current adaptive rate, when this scanner owns a real prober.
    pub fn current_rps(&self) -> f64 {
        self.limiter
            .as_ref()
            .map(|limiter| limiter.current_rps())
            .unwrap_or_default()
    }

    /// Starts scanning the provided names and returns the result stream.
    ///
    /// Results arrive in completion order. The channel closes once every
    /// stage has drained, or promptly after cancellation.
    pub fn scan(
        &self,
        names: Vec<String>,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<ScanResult>, ScanError> {
        if names.is_empty() {
            return Err(ScanError::NoCandidates);
        }

        self.stats.begin(names.len() as u64);
        info!("scanning {} bucket names with {} workers", names.len(), self.workers);

        let (names_tx, names_rx) = mpsc::channel::<String>(NAMES_CHANNEL_CAP);
        let names_rx = Arc::new(Mutex::new(names_rx));
        let (results_tx, results_rx) = mpsc::channel::<ScanResult>(RESULTS_CHANNEL_CAP);

        // Producer feeds the probe stage and closes it when done
        let producer_cancel = cancel.clone();
        tokio::spawn(async move {
            for name in names {
                tokio::select! {
                    _ = producer_cancel.cancelled() => return,
                    sent = names_tx.send(name) => {
                        if sent.is_err() {
                            return;
                        }
                    }
                }
            }
        });

        // Inspection stage (deep mode only)
        let (inspect_tx, inspect_handles) = if self.deep_inspect {
            let (tx, rx) = mpsc::channel::<ScanResult>(INSPECT_CHANNEL_CAP);
            let rx = Arc::new(Mutex::new(rx));

            let handles: Vec<JoinHandle<()>> = (0..self.inspect_workers)
                .map(|_| {
                    tokio::spawn(inspect_worker(
                        Arc::clone(&self.inspector),
                        Arc::clone(&rx),
                        results_tx.clone(),
                        cancel.clone(),
                    ))
                })
                .collect();

            (Some(tx), handles)
        } else {
            (None, Vec::new())
        };

        // Probe stage
        let probe_handles: Vec<JoinHandle<()>> = (0..self.workers)
            .map(|_| {
                tokio::spawn(probe_worker(
                    Arc::clone(&self.prober),
                    Arc::clone(&names_rx),
                    inspect_tx.clone(),
                    results_tx.clone(),
                    Arc::clone(&self.stats),
                    cancel.clone(),
                ))
            })
            .collect();

        // Only the workers hold senders from here on, so each channel
        // closes as its stage finishes: probers drain names and drop the
        // inspect senders, inspectors drain and drop the result senders.
        drop(inspect_tx);
        drop(results_tx);

        tokio::spawn(async move {
            for handle in probe_handles {
                let _ = handle.await;
            }
            debug!("probe workers finished");
            for handle in inspect_handles {
                let _ = handle.await;
            }
            debug!("inspect workers finished");
        });

        Ok(results_rx)
    }
}

/// Sends a value unless the scan is cancelled first. Returns false when
/// the pipeline is shutting down.
async fn send_guarded<T>(
    tx: &mpsc::Sender<T>,
    value: T,
    cancel: &CancellationToken,
) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        sent = tx.send(value) => sent.is_ok(),
    }
}

async fn probe_worker(
    prober: Arc<dyn Probe>,
    names_rx: Arc<Mutex<mpsc::Receiver<String>>>,
    inspect_tx: Option<mpsc::Sender<ScanResult>>,
    results_tx: mpsc::Sender<ScanResult>,
    stats: Arc<ScanStats>,
    cancel: CancellationToken,
) {
    loop {
        let name = {
            let mut rx = names_rx.lock().await;
            tokio::select! {
                _ = cancel.cancelled() => None,
                name = rx.recv() => name,
            }
        };

        let Some(name) = name else { return };

        process_name(
            prober.as_ref(),
            name,
            inspect_tx.as_ref(),
            &results_tx,
            &stats,
            &cancel,
        )
        .await;
    }
}

/// Probes one name and routes the result: drop NotFound, hand hits to
/// the inspection stage (deep mode), emit everything else directly.
async fn process_name(
    prober: &dyn Probe,
    name: String,
    inspect_tx: Option<&mpsc::Sender<ScanResult>>,
    results_tx: &mpsc::Sender<ScanResult>,
    stats: &ScanStats,
    cancel: &CancellationToken,
) {
    stats.scanned.fetch_add(1, Ordering::Relaxed);

    let probe = prober.check(&name, cancel).await;

    let result = ScanResult {
        bucket: name,
        probe: probe.class,
        inspect: None,
        error: probe.error,
        timestamp: Utc::now(),
    };

    match probe.class {
        ProbeClass::NotFound => {
            stats.not_found.fetch_add(1, Ordering::Relaxed);
            // Misses never surface
            return;
        }
        ProbeClass::Exists => {
            stats.found.fetch_add(1, Ordering::Relaxed);
            stats.public.fetch_add(1, Ordering::Relaxed);
            if let Some(tx) = inspect_tx {
                send_guarded(tx, result, cancel).await;
                return;
            }
        }
        ProbeClass::Forbidden => {
            stats.found.fetch_add(1, Ordering::Relaxed);
            stats.private.fetch_add(1, Ordering::Relaxed);
            if let Some(tx) = inspect_tx {
                send_guarded(tx, result, cancel).await;
                return;
            }
        }
        ProbeClass::Error => {
            stats.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    send_guarded(results_tx, result, cancel).await;
}

async fn inspect_worker(
    inspector: Arc<dyn Inspect>,
    inspect_rx: Arc<Mutex<mpsc::Receiver<ScanResult>>>,
    results_tx: mpsc::Sender<ScanResult>,
    cancel: CancellationToken,
) {
    loop {
        let result = {
            let mut rx = inspect_rx.lock().await;
            tokio::select! {
                _ = cancel.cancelled() => None,
                result = rx.recv() => result,
            }
        };

        let Some(mut result) = result else { return };

        result.inspect = Some(inspector.inspect(&result.bucket).await);

        if !send_guarded(&results_tx, result, &cancel).await {
            return;
        }
    }
}
