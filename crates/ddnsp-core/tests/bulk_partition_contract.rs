//! Architectural Contract Test: Bulk Partial Success
//!
//! Constraints verified:
//! - Over-cap batches are rejected before any item is processed
//! - One failing item never blocks or rolls back the others
//! - Results mirror input order and the summary partitions the input
//! - Partial success is its own outcome class (status 207)

mod common;

use common::*;
use ddnsp_core::engine::{BulkOutcome, BulkUpdateRequest, UpdateRequest};
use ddnsp_core::{ApiResponse, EngineEvent};
use std::net::Ipv4Addr;

fn item(hostname: &str) -> UpdateRequest {
    UpdateRequest::new(hostname).with_ipv4("93.184.216.34")
}

#[tokio::test]
async fn one_bad_item_is_partial_success() {
    let mut t = test_engine();
    let request = BulkUpdateRequest::new(vec![
        item("a.example.com"),
        item("bad host"),
        item("c.example.com"),
    ]);

    let response = t.engine.bulk_update(&bearer(), &request).await.unwrap();

    assert_eq!(response.summary.total, 3);
    assert_eq!(response.summary.successful, 2);
    assert_eq!(response.summary.failed, 1);
    assert!(response.results[0].success);
    assert!(!response.results[1].success);
    assert_eq!(response.results[1].hostname.as_deref(), Some("bad host"));
    assert_eq!(response.results[1].error.as_deref(), Some("invalid_hostname"));
    assert!(response.results[2].success);
    assert_eq!(response.results[2].ipv4, Some(Ipv4Addr::new(93, 184, 216, 34)));
    assert_eq!(response.outcome(), BulkOutcome::PartialSuccess);

    // Items after the failure were still written.
    assert!(t.engine.status(&bearer(), "c.example.com").await.is_ok());

    assert!(t.drain_events().contains(&EngineEvent::BulkCompleted {
        total: 3,
        successful: 2,
        failed: 1
    }));

    let envelope = ApiResponse::bulk(Ok(response));
    assert_eq!(envelope.http_status(), 207);
    assert!(!envelope.is_success());
}

#[tokio::test]
async fn over_cap_batch_is_rejected_untouched() {
    let t = test_engine();
    let updates = (0..101).map(|i| item(&format!("h{}.example.com", i))).collect();

    let err = t
        .engine
        .bulk_update(&bearer(), &BulkUpdateRequest::new(updates))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "bulk_limit_exceeded");
    assert_eq!(t.records.upsert_count(), 0);
    assert_eq!(t.records.len(), 0);
}

#[tokio::test]
async fn batch_at_cap_is_admitted() {
    let t = test_engine();
    let updates = (0..100).map(|i| item(&format!("h{}.example.com", i))).collect();

    let response = t
        .engine
        .bulk_update(&bearer(), &BulkUpdateRequest::new(updates))
        .await
        .unwrap();

    assert_eq!(response.summary.successful, 100);
    assert_eq!(response.outcome(), BulkOutcome::Success);
    assert_eq!(t.records.len(), 100);
}

#[tokio::test]
async fn all_items_failing_is_failure() {
    let t = test_engine();
    let request = BulkUpdateRequest::new(vec![
        UpdateRequest::new("a.example.com").with_ipv4("10.0.0.1"),
        UpdateRequest::default(),
    ]);

    let response = t.engine.bulk_update(&bearer(), &request).await.unwrap();

    assert_eq!(response.outcome(), BulkOutcome::Failure);
    assert_eq!(response.results[0].error.as_deref(), Some("invalid_ip"));
    assert_eq!(response.results[1].hostname, None);
    assert_eq!(response.results[1].error.as_deref(), Some("validation_error"));
    assert_eq!(ApiResponse::bulk(Ok(response)).http_status(), 400);
}

#[tokio::test]
async fn missing_updates_array_is_validation_error() {
    let t = test_engine();
    let request: BulkUpdateRequest = serde_json::from_str("{}").unwrap();

    let err = t.engine.bulk_update(&bearer(), &request).await.unwrap_err();
    assert_eq!(err.code(), "validation_error");
}

#[tokio::test]
async fn bulk_envelope_serializes_summary() {
    let t = test_engine();
    let request = BulkUpdateRequest::new(vec![item("a.example.com")]);

    let envelope = ApiResponse::bulk(t.engine.bulk_update(&bearer(), &request).await);
    let value: serde_json::Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();

    assert_eq!(envelope.http_status(), 200);
    assert_eq!(value["success"], true);
    assert_eq!(
        value["data"]["summary"],
        serde_json::json!({"total": 1, "successful": 1, "failed": 0})
    );
    assert_eq!(value["data"]["results"][0]["ipv4"], "93.184.216.34");
}

#[tokio::test]
async fn mistyped_item_fails_alone() {
    let t = test_engine();
    let request: BulkUpdateRequest = serde_json::from_str(
        r#"{"updates": [
            {"hostname": "a.example.com", "ipv4": "93.184.216.34"},
            {"hostname": 123},
            {"hostname": "b.example.com", "ipv4": "93.184.216.34", "ttl": "300"},
            {"hostname": "c.example.com", "ipv4": "93.184.216.35"}
        ]}"#,
    )
    .expect("mistyped entries do not reject the batch");

    let response = t.engine.bulk_update(&bearer(), &request).await.unwrap();

    assert_eq!(response.summary.total, 4);
    assert_eq!(response.summary.successful, 2);
    assert_eq!(response.summary.failed, 2);
    assert!(response.results[0].success);
    assert_eq!(response.results[1].hostname, None);
    assert_eq!(response.results[1].error.as_deref(), Some("validation_error"));
    assert_eq!(response.results[2].hostname.as_deref(), Some("b.example.com"));
    assert_eq!(response.results[2].error.as_deref(), Some("validation_error"));
    assert!(response.results[3].success);
    assert_eq!(response.outcome(), BulkOutcome::PartialSuccess);

    // Only the well-formed entries reached the store.
    assert_eq!(t.records.upsert_count(), 2);
    assert!(t.engine.status(&bearer(), "b.example.com").await.is_err());
}
