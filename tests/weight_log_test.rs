// ABOUTME: Integration tests for at-most-once daily weight records
// ABOUTME: Covers first-write success, duplicate rejection, and input validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{create_test_store, read_doc};
use macrolog::errors::ErrorCode;
use macrolog::store::DocKey;
use macrolog::weight::WeightLog;

const USER: &str = "user-1";
const DATE: &str = "2024-03-15";

#[tokio::test]
async fn test_first_weight_write_succeeds() {
    let store = create_test_store();
    let log = WeightLog::new(store.clone());

    log.record_weight(USER, DATE, 82.4).await.unwrap();

    let doc = read_doc(&store, &DocKey::weight_log(USER, DATE)).await;
    assert_eq!(doc["weight"], 82.4);
    let stored_date = doc["date"].as_str().unwrap();
    assert!(stored_date.starts_with("2024-03-15T00:00:00"));
}

#[tokio::test]
async fn test_duplicate_weight_rejected_regardless_of_value() {
    let store = create_test_store();
    let log = WeightLog::new(store.clone());

    log.record_weight(USER, DATE, 82.4).await.unwrap();

    let err = log.record_weight(USER, DATE, 81.0).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::AlreadyExists);
    assert!(err.message.contains(DATE));

    // Same value is rejected too; there is no idempotent re-write
    let err = log.record_weight(USER, DATE, 82.4).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::AlreadyExists);

    let doc = read_doc(&store, &DocKey::weight_log(USER, DATE)).await;
    assert_eq!(doc["weight"], 82.4);
}

#[tokio::test]
async fn test_different_dates_are_independent() {
    let store = create_test_store();
    let log = WeightLog::new(store.clone());

    log.record_weight(USER, "2024-03-15", 82.4).await.unwrap();
    log.record_weight(USER, "2024-03-16", 82.1).await.unwrap();
    log.record_weight("user-2", "2024-03-15", 70.0).await.unwrap();
}

#[tokio::test]
async fn test_invalid_weight_rejected() {
    let store = create_test_store();
    let log = WeightLog::new(store.clone());

    for bad in [0.0, -5.0, f64::NAN, f64::INFINITY] {
        let err = log.record_weight(USER, DATE, bad).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArgument);
    }

    let err = log.record_weight(USER, "not-a-date", 82.4).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidArgument);

    let err = log.record_weight("", DATE, 82.4).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidArgument);
}
