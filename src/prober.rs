// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - S3 Bucket Prober
 * HEAD probing with adaptive rate control and bounded retries
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::dns::RandomizedResolver;
use crate::rate_limiter::AdaptiveRateLimiter;
use crate::types::{ProbeClass, ProbeOutcome};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(30);
const TCP_KEEPALIVE: Duration = Duration::from_secs(30);
const RETRY_BACKOFF: Duration = Duration::from_millis(200);
const MAX_RETRIES: u32 = 2;

/// Anything that can classify a bucket name. The scanner only sees this
/// trait, so tests can drive the pipeline with a stub.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn check(&self, bucket: &str, cancel: &CancellationToken) -> ProbeOutcome;
}

/// Prober configuration.
#[derive(Debug, Clone)]
pub struct ProberConfig {
    /// Overall per-request timeout.
    pub timeout: Duration,
    /// Idle connections kept per host; sized to the probe worker count.
    pub pool_idle_per_host: usize,
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            pool_idle_per_host: 50,
        }
    }
}

/// Probes bucket names with anonymous HEAD requests against the S3
/// virtual-hosted endpoint.
pub struct Prober {
    client: reqwest::Client,
    limiter: Arc<AdaptiveRateLimiter>,
    /// S3-compatible endpoint override (path-style); `None` probes AWS.
    endpoint_url: Option<String>,
}

impl Prober {
    pub fn new(config: &ProberConfig, limiter: Arc<AdaptiveRateLimiter>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .tcp_keepalive(TCP_KEEPALIVE)
            .tcp_nodelay(true)
            // Redirects carry the signal (301/307 = exists elsewhere);
            // the status must come back as-is
            .redirect(reqwest::redirect::Policy::none())
            .dns_resolver(Arc::new(RandomizedResolver::new()))
            .build()
            .context("failed to build probe HTTP client")?;

        Ok(Self {
            client,
            limiter,
            endpoint_url: None,
        })
    }

    /// Points the prober at an S3-compatible endpoint using path-style
    /// addressing instead of `{bucket}.s3.amazonaws.com`.
    pub fn with_endpoint(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    pub fn current_rps(&self) -> f64 {
        self.limiter.current_rps()
    }

    fn bucket_url(&self, bucket: &str) -> String {
        match &self.endpoint_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), bucket),
            None => format!("https://{bucket}.s3.amazonaws.com"),
        }
    }

    fn classify(status: u16) -> ProbeClass {
        match status {
            200 => ProbeClass::Exists,
            403 => ProbeClass::Forbidden,
            404 => ProbeClass::NotFound,
            // Redirect means the bucket exists in another region; treat
            // it as private for probe purposes
            301 | 307 => ProbeClass::Forbidden,
            _ => ProbeClass::Error,
        }
    }
}

#[async_trait]
impl Probe for Prober {
    async fn check(&self, bucket: &str, cancel: &CancellationToken) -> ProbeOutcome {
        let mut outcome = ProbeOutcome {
            bucket: bucket.to_string(),
            class: ProbeClass::Error,
            status: 0,
            error: None,
        };

        let url = self.bucket_url(bucket);

        for attempt in 0..=MAX_RETRIES {
            if let Err(err) = self.limiter.acquire(cancel).await {
                outcome.error = Some(err.to_string());
                return outcome;
            }

            let response = tokio::select! {
                _ = cancel.cancelled() => {
                    outcome.error = Some("scan cancelled".to_string());
                    return outcome;
                }
                resp = self.client.head(&url).send() => resp,
            };

            match response {
                Err(err) => {
                    if attempt < MAX_RETRIES {
                        debug!("probe {} attempt {} failed: {}", bucket, attempt + 1, err);
                        tokio::time::sleep(RETRY_BACKOFF * (attempt + 1)).await;
                        continue;
                    }
                    self.limiter.record_response(0);
                    outcome.error = Some(format!("network error: {err}"));
                    return outcome;
                }
                Ok(resp) => {
                    let status = resp.status().as_u16();

                    // 5xx is worth another attempt before surfacing
                    if status >= 500 && attempt < MAX_RETRIES {
                        self.limiter.record_response(status);
                        tokio::time::sleep(RETRY_BACKOFF * (attempt + 1)).await;
                        continue;
                    }

                    outcome.status = status;
                    self.limiter.record_response(status);
                    outcome.class = Self::classify(status);
                    if outcome.class == ProbeClass::Error {
                        outcome.error = Some(format!("unexpected status code: {status}"));
                    }
                    return outcome;
                }
            }
        }

        outcome
    }
}
