// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Adaptive Rate Limiter
 * AIMD token bucket driven by upstream response codes
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorRateLimiter,
};
use nonzero_ext::*;
use parking_lot::Mutex;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::errors::ScanError;

type DirectLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Multiplicative decrease applied after sustained throttling (429/503).
const THROTTLE_DECREASE: f64 = 0.5;
/// Consecutive throttle responses required before decreasing.
const THROTTLE_THRESHOLD: u32 = 3;
/// RPS floor for the throttle profile.
const THROTTLE_FLOOR_RPS: f64 = 10.0;

/// Multiplicative decrease applied immediately on a network failure.
const NETWORK_DECREASE: f64 = 0.3;
/// RPS floor for the network-failure profile.
const NETWORK_FLOOR_RPS: f64 = 5.0;

/// Additive-increase factor after sustained success.
const RECOVERY_INCREASE: f64 = 1.1;
/// Consecutive successes required before increasing.
const SUCCESS_THRESHOLD: u32 = 100;

struct AimdState {
    bucket: Arc<DirectLimiter>,
    consecutive_failures: u32,
    consecutive_successes: u32,
}

/// AIMD (Additive Increase / Multiplicative Decrease) rate limiter.
///
/// A single gate shared by all probe workers. `acquire` waits on the
/// current token bucket; `record_response` feeds back the observed HTTP
/// status and adjusts the rate: throttle signals (429/503) halve it after
/// three in a row, a network failure (status 0) cuts it to 30%
/// immediately, and 100 consecutive successes claw back 10% up to the
/// ceiling. The bucket's refill rate and burst always track
/// `current_rps`.
pub struct AdaptiveRateLimiter {
    ceiling_rps: f64,
    /// f64 bits of the current rate; written under the state lock, read
    /// with relaxed loads.
    current_rps_bits: AtomicU64,
    state: Mutex<AimdState>,
}

impl AdaptiveRateLimiter {
    /// Creates a limiter opened up to the given RPS ceiling.
    pub fn new(ceiling_rps: f64) -> Self {
        let ceiling = if ceiling_rps > 0.0 { ceiling_rps } else { 100.0 };

        Self {
            ceiling_rps: ceiling,
            current_rps_bits: AtomicU64::new(ceiling.to_bits()),
            state: Mutex::new(AimdState {
                bucket: Self::build_bucket(ceiling),
                consecutive_failures: 0,
                consecutive_successes: 0,
            }),
        }
    }

    fn build_bucket(rps: f64) -> Arc<DirectLimiter> {
        let cells = NonZeroU32::new(rps as u32).unwrap_or(nonzero!(1u32));
        Arc::new(GovernorRateLimiter::direct(
            Quota::per_second(cells).allow_burst(cells),
        ))
    }

    /// Blocks until a token is available or the scan is cancelled.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), ScanError> {
        let bucket = self.state.lock().bucket.clone();

        tokio::select! {
            _ = cancel.cancelled() => Err(ScanError::Cancelled),
            _ = bucket.until_ready() => Ok(()),
        }
    }

    /// Feeds back the final status of a probe. Status 0 means the request
    /// never completed (network failure).
    pub fn record_response(&self, status: u16) {
        let mut state = self.state.lock();
        let current = self.current_rps();

        match status {
            0 => {
                state.consecutive_successes = 0;
                let next = (current * NETWORK_DECREASE).max(NETWORK_FLOOR_RPS);
                if next < current {
                    warn!(
                        "network failure: reducing rate {:.1} -> {:.1} req/s",
                        current, next
                    );
                    self.apply_rate(&mut state, next);
                }
                state.consecutive_failures = 0;
            }
            429 | 503 => {
                state.consecutive_failures += 1;
                state.consecutive_successes = 0;

                if state.consecutive_failures >= THROTTLE_THRESHOLD {
                    let next = (current * THROTTLE_DECREASE).max(THROTTLE_FLOOR_RPS);
                    if next < current {
                        warn!(
                            "throttled (HTTP {}): reducing rate {:.1} -> {:.1} req/s",
                            status, current, next
                        );
                        self.apply_rate(&mut state, next);
                    }
                    state.consecutive_failures = 0;
                }
            }
            _ => {
                state.consecutive_failures = 0;
                state.consecutive_successes += 1;

                if state.consecutive_successes >= SUCCESS_THRESHOLD && current < self.ceiling_rps {
                    let next = (current * RECOVERY_INCREASE).min(self.ceiling_rps);
                    debug!("sustained success: raising rate {:.1} -> {:.1} req/s", current, next);
                    self.apply_rate(&mut state, next);
                    state.consecutive_successes = 0;
                }
            }
        }
    }

    fn apply_rate(&self, state: &mut AimdState, rps: f64) {
        state.bucket = Self::build_bucket(rps);
        self.current_rps_bits.store(rps.to_bits(), Ordering::Relaxed);
    }

    /// Current rate limit in requests per second.
    pub fn current_rps(&self) -> f64 {
        f64::from_bits(self.current_rps_bits.load(Ordering::Relaxed))
    }

    /// Configured RPS ceiling.
    pub fn ceiling_rps(&self) -> f64 {
        self.ceiling_rps
    }
}
