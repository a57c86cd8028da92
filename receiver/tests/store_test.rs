mod common;

use std::sync::Arc;

use serde_json::json;

use common::TestApp;
use strz::{extract, InvoiceFields, StoreOutcome};

#[tokio::test]
async fn test_second_insert_is_duplicate_and_keeps_first_body() {
    let app = TestApp::new(&[]).await;
    let store = &app.state.store;

    let first = r#"{"event":"invoice.paid","invoice":{"id":7,"status":"paid"}}"#;
    let second = r#"{"event":"invoice.paid","invoice":{"id":7,"status":"refunded"}}"#;

    let fields = extract(&serde_json::from_str(first).unwrap());
    let outcome = store
        .store_inbox("abc123", Some("invoice.paid"), first, &fields)
        .await
        .unwrap();
    assert_eq!(outcome, StoreOutcome::Inserted);

    let fields = extract(&serde_json::from_str(second).unwrap());
    let outcome = store
        .store_inbox("abc123", Some("invoice.paid"), second, &fields)
        .await
        .unwrap();
    assert_eq!(outcome, StoreOutcome::Duplicate);

    assert_eq!(app.count_rows("abc123").await, 1);

    let last = store.fetch_last_inbox().await.unwrap().unwrap();
    assert_eq!(last.delivery_uid, "abc123");
    assert_eq!(last.payload_json, first);
    assert_eq!(last.status.as_deref(), Some("paid"));
    assert_eq!(last.invoice_id.as_deref(), Some("7"));
}

#[tokio::test]
async fn test_raw_body_is_stored_byte_for_byte() {
    let app = TestApp::new(&[]).await;
    let body = "{ \"event\" : \"invoice.paid\",\n  \"amount\": 1.50 }";

    app.state
        .store
        .store_inbox("raw-1", None, body, &InvoiceFields::default())
        .await
        .unwrap();

    let last = app.state.store.fetch_last_inbox().await.unwrap().unwrap();
    assert_eq!(last.payload_json, body);
    assert!(last.event.is_none());
    assert!(last.received_at.is_some());
}

#[tokio::test]
async fn test_blank_delivery_id_is_never_deduplicated() {
    let app = TestApp::new(&[]).await;
    let fields = InvoiceFields::default();

    for uid in ["", "   "] {
        let outcome = app
            .state
            .store
            .store_inbox(uid, None, "{}", &fields)
            .await
            .unwrap();
        assert_eq!(outcome, StoreOutcome::Inserted);
    }

    assert_eq!(app.total_rows().await, 2);
    let last = app.state.store.fetch_last_inbox().await.unwrap().unwrap();
    assert!(last.delivery_uid.starts_with("missing_"));
}

#[tokio::test]
async fn test_fetch_last_on_empty_table() {
    let app = TestApp::new(&[]).await;
    assert!(app.state.store.fetch_last_inbox().await.unwrap().is_none());
}

#[tokio::test]
async fn test_fetch_last_follows_insertion_order() {
    let app = TestApp::new(&[]).await;
    let fields = InvoiceFields::default();

    for uid in ["b", "a", "c"] {
        app.state.store.store_inbox(uid, None, "{}", &fields).await.unwrap();
    }
    // A duplicate of an older id does not move it to the top
    app.state.store.store_inbox("b", None, "{}", &fields).await.unwrap();

    let last = app.state.store.fetch_last_inbox().await.unwrap().unwrap();
    assert_eq!(last.delivery_uid, "c");
}

#[tokio::test]
async fn test_concurrent_duplicates_insert_exactly_once() {
    let app = TestApp::new(&[]).await;
    let store = Arc::clone(&app.state.store);
    let body = json!({"event": "invoice.paid", "invoice": {"id": 9}}).to_string();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        let body = body.clone();
        handles.push(tokio::spawn(async move {
            let fields = extract(&serde_json::from_str(&body).unwrap());
            store
                .store_inbox("race-1", Some("invoice.paid"), &body, &fields)
                .await
                .unwrap()
        }));
    }

    let mut inserted = 0;
    let mut duplicate = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StoreOutcome::Inserted => inserted += 1,
            StoreOutcome::Duplicate => duplicate += 1,
        }
    }

    assert_eq!(inserted, 1);
    assert_eq!(duplicate, 7);
    assert_eq!(app.count_rows("race-1").await, 1);
}

#[tokio::test]
async fn test_reopening_existing_database_is_idempotent() {
    let app = TestApp::new(&[]).await;
    app.state
        .store
        .store_inbox("keep-1", None, "{}", &InvoiceFields::default())
        .await
        .unwrap();
    app.state.store.close().await;

    let config = app.state.config.as_ref().clone();
    let reopened = strz::InboxStore::connect(&config.db).await.unwrap();
    let last = reopened.fetch_last_inbox().await.unwrap().unwrap();
    assert_eq!(last.delivery_uid, "keep-1");
}
