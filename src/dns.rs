// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Randomized Public DNS Resolution
 * Spreads ephemeral hostname lookups across public resolvers
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use hickory_resolver::config::{NameServerConfig, ResolverConfig};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::xfer::Protocol;
use hickory_resolver::TokioResolver;
use rand::Rng;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

/// Public resolvers the prober rotates through. Bucket hostnames are
/// ephemeral (most names are probed exactly once), so hammering the
/// local stub resolver would saturate it; these absorb the load instead.
pub const PUBLIC_RESOLVERS: [IpAddr; 4] = [
    IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)),   // Google
    IpAddr::V4(Ipv4Addr::new(8, 8, 4, 4)),   // Google
    IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1)),   // Cloudflare
    IpAddr::V4(Ipv4Addr::new(1, 0, 0, 1)),   // Cloudflare
];

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// DNS resolver that picks one of the public providers uniformly at
/// random for every lookup, over UDP/53. There is no fallback to the
/// system resolver. All resolved addresses are handed to the connector
/// so it can try each until one accepts.
pub struct RandomizedResolver {
    resolvers: Vec<Arc<TokioResolver>>,
}

impl RandomizedResolver {
    pub fn new() -> Self {
        let resolvers = PUBLIC_RESOLVERS
            .iter()
            .map(|ip| {
                let mut config = ResolverConfig::new();
                config.add_name_server(NameServerConfig::new(
                    SocketAddr::new(*ip, 53),
                    Protocol::Udp,
                ));

                let mut builder = TokioResolver::builder_with_config(
                    config,
                    TokioConnectionProvider::default(),
                );
                builder.options_mut().timeout = LOOKUP_TIMEOUT;
                builder.options_mut().attempts = 1;

                Arc::new(builder.build())
            })
            .collect();

        Self { resolvers }
    }

    fn pick(&self) -> Arc<TokioResolver> {
        let idx = rand::rng().random_range(0..self.resolvers.len());
        Arc::clone(&self.resolvers[idx])
    }
}

impl Default for RandomizedResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolve for RandomizedResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = self.pick();
        Box::pin(async move {
            let lookup = resolver.lookup_ip(name.as_str()).await?;
            let addrs: Addrs = Box::new(
                lookup
                    .into_iter()
                    .map(|ip| SocketAddr::new(ip, 0)),
            );
            Ok(addrs)
        })
    }
}
