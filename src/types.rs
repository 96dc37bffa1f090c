// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Result Types
 * Probe classifications and result records shared across the pipeline
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Outcome classification for a single bucket probe.
///
/// The wire names match what report consumers already parse:
/// `public` for a readable bucket, `private` for one that exists but
/// denies access (403 or a cross-region redirect), `not_found` and
/// `error` for the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProbeClass {
    #[serde(rename = "not_found")]
    NotFound,
    #[serde(rename = "public")]
    Exists,
    #[serde(rename = "private")]
    Forbidden,
    #[serde(rename = "error")]
    Error,
}

impl ProbeClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeClass::NotFound => "not_found",
            ProbeClass::Exists => "public",
            ProbeClass::Forbidden => "private",
            ProbeClass::Error => "error",
        }
    }
}

impl fmt::Display for ProbeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of probing a single bucket name.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub bucket: String,
    pub class: ProbeClass,
    /// Final HTTP status; 0 when the request never completed (network error).
    pub status: u16,
    pub error: Option<String>,
}

/// Access-control classification derived from the anonymous list attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AclState {
    #[serde(rename = "public-read")]
    PublicRead,
    #[serde(rename = "private")]
    Private,
    #[serde(rename = "disabled")]
    Disabled,
    #[serde(rename = "unknown")]
    Unknown,
}

impl AclState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AclState::PublicRead => "public-read",
            AclState::Private => "private",
            AclState::Disabled => "disabled",
            AclState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AclState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Object count when the listing could not be performed.
pub const OBJECT_COUNT_UNKNOWN: i64 = -1;
/// Object count when the listing was truncated (more than the listed max).
pub const OBJECT_COUNT_TRUNCATED: i64 = -2;

/// Deep-inspection findings for a discovered bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectOutcome {
    pub bucket: String,
    pub exists: bool,
    pub is_public: bool,
    pub acl: AclState,
    pub region: String,
    /// Number of objects returned by the anonymous listing, or one of the
    /// sentinels `OBJECT_COUNT_UNKNOWN` / `OBJECT_COUNT_TRUNCATED`.
    pub object_count: i64,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub sample_keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Final record emitted for a surfaced bucket name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub bucket: String,
    #[serde(rename = "probe_result")]
    pub probe: ProbeClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspect: Option<InspectOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// By-value snapshot of scan counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatsSnapshot {
    pub total: u64,
    pub scanned: u64,
    pub found: u64,
    pub public: u64,
    pub private: u64,
    pub errors: u64,
    pub not_found: u64,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl StatsSnapshot {
    /// Average probe throughput since the scan started.
    pub fn scan_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.scanned as f64 / secs
        } else {
            0.0
        }
    }
}
