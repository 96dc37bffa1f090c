// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Certificate Transparency Recon
 * Harvests subdomain hints from public CT logs (crt.sh)
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::info;

const DEFAULT_CT_ENDPOINT: &str = "https://crt.sh";
const USER_AGENT: &str = "sanko/1.0";

/// One certificate entry as returned by crt.sh. Only the SAN list
/// matters here; a single entry can carry several names separated by
/// newlines.
#[derive(Debug, Deserialize)]
struct CtEntry {
    name_value: String,
}

/// Queries Certificate Transparency logs for subdomains of a target
/// domain. The results are plain hostnames for the name generator.
pub struct CtClient {
    http: reqwest::Client,
    max_results: usize,
    endpoint: String,
}

impl CtClient {
    pub fn new(timeout: Duration, max_results: usize) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build CT log HTTP client")?;

        Ok(Self {
            http,
            max_results,
            endpoint: DEFAULT_CT_ENDPOINT.to_string(),
        })
    }

    /// Overrides the crt.sh endpoint (test harnesses, mirrors).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Fetches deduplicated subdomains of `domain` from crt.sh, capped at
    /// the configured limit.
    pub async fn fetch_subdomains(&self, domain: &str) -> Result<Vec<String>> {
        let domain = clean_domain(domain);
        if domain.is_empty() {
            bail!("invalid domain");
        }

        let response = self
            .http
            .get(format!("{}/", self.endpoint.trim_end_matches('/')))
            .query(&[("q", format!("%.{domain}")), ("output", "json".to_string())])
            .send()
            .await
            .context("crt.sh request failed")?;

        if !response.status().is_success() {
            bail!("crt.sh returned status {}", response.status().as_u16());
        }

        let entries: Vec<CtEntry> = response
            .json()
            .await
            .context("failed to parse crt.sh response")?;

        let subdomains = extract_subdomains(&entries, &domain, self.max_results);
        info!(
            "CT logs: {} unique subdomains for {}",
            subdomains.len(),
            domain
        );

        Ok(subdomains)
    }
}

fn extract_subdomains(entries: &[CtEntry], base_domain: &str, max_results: usize) -> Vec<String> {
    let suffix = format!(".{base_domain}");
    let mut seen = HashSet::new();
    let mut subdomains = Vec::new();

    for entry in entries {
        for name in entry.name_value.lines() {
            let name = name.trim().to_lowercase();
            let name = name.strip_prefix("*.").unwrap_or(&name).to_string();

            if name.is_empty() || name == base_domain || name.contains('*') {
                continue;
            }
            if !name.ends_with(&suffix) {
                continue;
            }
            if !seen.insert(name.clone()) {
                continue;
            }

            subdomains.push(name);
            if subdomains.len() >= max_results {
                return subdomains;
            }
        }
    }

    subdomains
}

/// Strips protocol, `www.` and trailing slashes from an operator-supplied
/// domain.
pub fn clean_domain(domain: &str) -> String {
    let mut domain = domain.trim().to_lowercase();
    for prefix in ["http://", "https://"] {
        if let Some(rest) = domain.strip_prefix(prefix) {
            domain = rest.to_string();
        }
    }
    let domain = domain.trim_end_matches('/');
    domain.strip_prefix("www.").unwrap_or(domain).to_string()
}
