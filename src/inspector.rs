// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Anonymous Bucket Inspector
 * Region resolution and credential-less listing for discovered buckets
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use chrono::Utc;
use std::time::Duration;
use tracing::debug;

use crate::types::{
    AclState, InspectOutcome, OBJECT_COUNT_TRUNCATED, OBJECT_COUNT_UNKNOWN,
};

const DEFAULT_REGION: &str = "us-east-1";
const REGION_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_LIST_KEYS: i32 = 100;
const MAX_SAMPLE_KEYS: usize = 10;

/// Regions recognized when parsing a region hint out of an S3 error.
const KNOWN_REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "eu-central-1",
    "ap-south-1",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "sa-east-1",
    "ca-central-1",
];

/// Deep inspection behind a trait so the scanner can run against a stub.
#[async_trait]
pub trait Inspect: Send + Sync {
    async fn inspect(&self, bucket: &str) -> InspectOutcome;
}

/// Performs deep inspection on discovered buckets: resolves the hosting
/// region from the `x-amz-bucket-region` header, then attempts an
/// anonymous ListObjectsV2 to classify public readability.
pub struct Inspector {
    timeout: Duration,
    http: reqwest::Client,
    /// S3-compatible endpoint override (path-style); `None` targets AWS.
    endpoint_url: Option<String>,
}

struct ListingOutcome {
    is_public: bool,
    acl: AclState,
    object_count: i64,
    sample_keys: Vec<String>,
    region: String,
    error: Option<String>,
}

impl Inspector {
    pub fn new(timeout: Duration) -> Result<Self> {
        let timeout = if timeout.is_zero() {
            Duration::from_secs(30)
        } else {
            timeout
        };

        let http = reqwest::Client::builder()
            .timeout(REGION_LOOKUP_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("failed to build inspector HTTP client")?;

        Ok(Self {
            timeout,
            http,
            endpoint_url: None,
        })
    }

    /// Points the inspector at an S3-compatible endpoint using path-style
    /// addressing.
    pub fn with_endpoint(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    fn bucket_url(&self, bucket: &str) -> String {
        match &self.endpoint_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), bucket),
            None => format!("https://{bucket}.s3.amazonaws.com"),
        }
    }

    /// Determines which region hosts the bucket. The
    /// `x-amz-bucket-region` header comes back regardless of access
    /// permissions, unlike GetBucketLocation.
    async fn bucket_region(&self, bucket: &str) -> String {
        let url = self.bucket_url(bucket);

        match self.http.head(&url).send().await {
            Ok(resp) => resp
                .headers()
                .get("x-amz-bucket-region")
                .and_then(|value| value.to_str().ok())
                .filter(|region| !region.is_empty())
                .map(str::to_owned)
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            Err(err) => {
                debug!("region lookup for {} failed: {}", bucket, err);
                DEFAULT_REGION.to_string()
            }
        }
    }

    async fn s3_client(&self, region: &str) -> aws_sdk_s3::Client {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_owned()))
            .no_credentials();

        if let Some(endpoint) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if self.endpoint_url.is_some() {
            builder = builder.force_path_style(true);
        }

        aws_sdk_s3::Client::from_conf(builder.build())
    }

    /// Attempts an anonymous listing, correcting the region once if S3
    /// points elsewhere.
    async fn try_anonymous_list(&self, bucket: &str, initial_region: &str) -> ListingOutcome {
        let mut region = if initial_region.is_empty() || initial_region == "unknown" {
            DEFAULT_REGION.to_string()
        } else {
            initial_region.to_string()
        };
        let mut retried = false;

        loop {
            let client = self.s3_client(&region).await;
            let attempt = client
                .list_objects_v2()
                .bucket(bucket)
                .max_keys(MAX_LIST_KEYS)
                .send()
                .await;

            match attempt {
                Ok(output) => {
                    let contents = output.contents();
                    let sample_keys: Vec<String> = contents
                        .iter()
                        .filter_map(|obj| obj.key().map(str::to_owned))
                        .take(MAX_SAMPLE_KEYS)
                        .collect();

                    let object_count = if output.is_truncated() == Some(true) {
                        OBJECT_COUNT_TRUNCATED
                    } else {
                        contents.len() as i64
                    };

                    return ListingOutcome {
                        is_public: true,
                        acl: AclState::PublicRead,
                        object_count,
                        sample_keys,
                        region,
                        error: None,
                    };
                }
                Err(err) => {
                    let code = err.code().map(str::to_owned);
                    // Parsed <Message> first; the rendered chain is the
                    // fallback when the body carried no structured error
                    let rendered = match err.message() {
                        Some(message) => {
                            format!("{message}; {}", DisplayErrorContext(&err))
                        }
                        None => format!("{}", DisplayErrorContext(&err)),
                    };

                    if !retried && is_region_mismatch(code.as_deref(), &rendered) {
                        if let Some(correct) = parse_region_from_error(&rendered) {
                            if correct != region {
                                debug!(
                                    "{}: region mismatch, retrying in {}",
                                    bucket, correct
                                );
                                region = correct;
                                retried = true;
                                continue;
                            }
                        }
                    }

                    let acl = match code.as_deref() {
                        Some("AccessDenied") => AclState::Private,
                        Some("AllAccessDisabled") => AclState::Disabled,
                        // Structured code missing; fall back to the
                        // rendered message
                        _ if rendered.contains("AccessDenied") => AclState::Private,
                        _ if rendered.contains("AllAccessDisabled") => AclState::Disabled,
                        _ => AclState::Unknown,
                    };

                    let error = match acl {
                        AclState::Unknown => Some(format!("anonymous list failed: {rendered}")),
                        _ => None,
                    };

                    return ListingOutcome {
                        is_public: false,
                        acl,
                        object_count: OBJECT_COUNT_UNKNOWN,
                        sample_keys: Vec::new(),
                        region,
                        error,
                    };
                }
            }
        }
    }

    async fn inspect_inner(&self, bucket: &str) -> InspectOutcome {
        let region = self.bucket_region(bucket).await;
        let listing = self.try_anonymous_list(bucket, &region).await;

        InspectOutcome {
            bucket: bucket.to_string(),
            exists: true,
            is_public: listing.is_public,
            acl: listing.acl,
            region: listing.region,
            object_count: listing.object_count,
            sample_keys: listing.sample_keys,
            error: listing.error,
            timestamp: Utc::now(),
        }
    }
}

#[async_trait]
impl Inspect for Inspector {
    async fn inspect(&self, bucket: &str) -> InspectOutcome {
        match tokio::time::timeout(self.timeout, self.inspect_inner(bucket)).await {
            Ok(outcome) => outcome,
            Err(_) => InspectOutcome {
                bucket: bucket.to_string(),
                exists: true,
                is_public: false,
                acl: AclState::Unknown,
                region: DEFAULT_REGION.to_string(),
                object_count: OBJECT_COUNT_UNKNOWN,
                sample_keys: Vec::new(),
                error: Some("inspection timed out".to_string()),
                timestamp: Utc::now(),
            },
        }
    }
}

fn is_region_mismatch(code: Option<&str>, rendered: &str) -> bool {
    code == Some("PermanentRedirect")
        || rendered.contains("BucketRegionError")
        || rendered.contains("PermanentRedirect")
        || rendered.contains("please use the correct region")
}

/// Pulls a region hint out of an S3 error message by matching against
/// the known-region list.
fn parse_region_from_error(message: &str) -> Option<String> {
    KNOWN_REGIONS
        .iter()
        .find(|region| message.contains(*region))
        .map(|region| region.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_region_from_error_messages() {
        assert_eq!(
            parse_region_from_error(
                "api error PermanentRedirect: please use the correct region: eu-west-1"
            ),
            Some("eu-west-1".to_string())
        );
        assert_eq!(
            parse_region_from_error("expecting 'ap-northeast-2'"),
            Some("ap-northeast-2".to_string())
        );
        assert_eq!(parse_region_from_error("Access Denied"), None);
    }

    #[test]
    fn detects_region_mismatch_signals() {
        assert!(is_region_mismatch(Some("PermanentRedirect"), ""));
        assert!(is_region_mismatch(
            None,
            "BucketRegionError: incorrect region"
        ));
        assert!(is_region_mismatch(
            None,
            "please use the correct region: eu-west-1"
        ));
        assert!(!is_region_mismatch(Some("AccessDenied"), "Access Denied"));
    }

    #[test]
    fn zero_timeout_falls_back_to_default() {
        let inspector = Inspector::new(Duration::ZERO).unwrap();
        assert_eq!(inspector.timeout, Duration::from_secs(30));
    }
}
