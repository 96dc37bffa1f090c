// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Inspector Tests
 * Region resolution and anonymous listing against a mock S3 endpoint
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use sanko::inspector::{Inspect, Inspector};
use sanko::types::{AclState, OBJECT_COUNT_TRUNCATED, OBJECT_COUNT_UNKNOWN};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LIST_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>acme-assets</Name>
  <Prefix></Prefix>
  <KeyCount>2</KeyCount>
  <MaxKeys>100</MaxKeys>
  <IsTruncated>false</IsTruncated>
  <Contents>
    <Key>index.html</Key>
    <LastModified>2025-01-01T00:00:00.000Z</LastModified>
    <Size>1024</Size>
    <StorageClass>STANDARD</StorageClass>
  </Contents>
  <Contents>
    <Key>logo.png</Key>
    <LastModified>2025-01-01T00:00:00.000Z</LastModified>
    <Size>2048</Size>
    <StorageClass>STANDARD</StorageClass>
  </Contents>
</ListBucketResult>"#;

const TRUNCATED_LIST_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>acme-data</Name>
  <Prefix></Prefix>
  <KeyCount>100</KeyCount>
  <MaxKeys>100</MaxKeys>
  <IsTruncated>true</IsTruncated>
  <Contents>
    <Key>dump-0001.sql</Key>
    <LastModified>2025-01-01T00:00:00.000Z</LastModified>
    <Size>4096</Size>
    <StorageClass>STANDARD</StorageClass>
  </Contents>
</ListBucketResult>"#;

const ACCESS_DENIED_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error>
  <Code>AccessDenied</Code>
  <Message>Access Denied</Message>
  <RequestId>4442587FB7D0A2F9</RequestId>
</Error>"#;

const ALL_ACCESS_DISABLED_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error>
  <Code>AllAccessDisabled</Code>
  <Message>All access to this object has been disabled</Message>
  <RequestId>4442587FB7D0A2F9</RequestId>
</Error>"#;

const WRONG_REGION_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error>
  <Code>PermanentRedirect</Code>
  <Message>The bucket is in this region: eu-west-1. Please use the correct region to retry the request.</Message>
  <RequestId>4442587FB7D0A2F9</RequestId>
</Error>"#;

fn inspector_for(server: &MockServer) -> Inspector {
    Inspector::new(Duration::from_secs(10))
        .unwrap()
        .with_endpoint(server.uri())
}

#[tokio::test]
async fn resolves_region_from_header_and_lists_public_bucket() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/acme-assets"))
        .respond_with(ResponseTemplate::new(403).insert_header("x-amz-bucket-region", "eu-west-2"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/acme-assets"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(LIST_XML, "application/xml"))
        .mount(&server)
        .await;

    let outcome = inspector_for(&server).inspect("acme-assets").await;

    assert!(outcome.exists);
    assert!(outcome.is_public);
    assert_eq!(outcome.acl, AclState::PublicRead);
    assert_eq!(outcome.region, "eu-west-2");
    assert_eq!(outcome.object_count, 2);
    assert_eq!(
        outcome.sample_keys,
        vec!["index.html".to_string(), "logo.png".to_string()]
    );
    assert!(outcome.error.is_none());
}

#[tokio::test]
async fn missing_region_header_defaults_to_us_east_1() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/acme-assets"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/acme-assets"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(LIST_XML, "application/xml"))
        .mount(&server)
        .await;

    let outcome = inspector_for(&server).inspect("acme-assets").await;
    assert_eq!(outcome.region, "us-east-1");
}

#[tokio::test]
async fn truncated_listing_uses_the_sentinel_count() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/acme-data"))
        .respond_with(ResponseTemplate::new(200).insert_header("x-amz-bucket-region", "us-east-1"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/acme-data"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(TRUNCATED_LIST_XML, "application/xml"),
        )
        .mount(&server)
        .await;

    let outcome = inspector_for(&server).inspect("acme-data").await;

    assert!(outcome.is_public);
    assert_eq!(outcome.object_count, OBJECT_COUNT_TRUNCATED);
}

#[tokio::test]
async fn access_denied_classifies_as_private() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/acme-internal"))
        .respond_with(ResponseTemplate::new(403).insert_header("x-amz-bucket-region", "us-west-2"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/acme-internal"))
        .respond_with(
            ResponseTemplate::new(403).set_body_raw(ACCESS_DENIED_XML, "application/xml"),
        )
        .mount(&server)
        .await;

    let outcome = inspector_for(&server).inspect("acme-internal").await;

    assert!(!outcome.is_public);
    assert_eq!(outcome.acl, AclState::Private);
    assert_eq!(outcome.region, "us-west-2");
    assert_eq!(outcome.object_count, OBJECT_COUNT_UNKNOWN);
    assert!(outcome.sample_keys.is_empty());
    assert!(outcome.error.is_none());
}

#[tokio::test]
async fn disabled_access_classifies_as_disabled() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/acme-frozen"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/acme-frozen"))
        .respond_with(
            ResponseTemplate::new(403).set_body_raw(ALL_ACCESS_DISABLED_XML, "application/xml"),
        )
        .mount(&server)
        .await;

    let outcome = inspector_for(&server).inspect("acme-frozen").await;

    assert!(!outcome.is_public);
    assert_eq!(outcome.acl, AclState::Disabled);
}

#[tokio::test]
async fn region_mismatch_retries_once_with_the_corrected_region() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/acme-eu"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    // First attempt: redirected with a region hint in the message
    Mock::given(method("GET"))
        .and(path("/acme-eu"))
        .respond_with(ResponseTemplate::new(301).set_body_raw(WRONG_REGION_XML, "application/xml"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    // Second attempt succeeds against the corrected region
    Mock::given(method("GET"))
        .and(path("/acme-eu"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(LIST_XML, "application/xml"))
        .mount(&server)
        .await;

    let outcome = inspector_for(&server).inspect("acme-eu").await;

    assert!(outcome.is_public);
    assert_eq!(outcome.acl, AclState::PublicRead);
    assert_eq!(outcome.region, "eu-west-1");
    assert!(outcome.error.is_none());
}

#[tokio::test]
async fn unrecognized_failure_reports_unknown_acl() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/acme-odd"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/acme-odd"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let outcome = inspector_for(&server).inspect("acme-odd").await;

    assert!(!outcome.is_public);
    assert_eq!(outcome.acl, AclState::Unknown);
    assert_eq!(outcome.object_count, OBJECT_COUNT_UNKNOWN);
    assert!(outcome.error.is_some());
}
