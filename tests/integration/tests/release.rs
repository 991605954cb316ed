//! Directory sessions are released on every exit path.

use crate::common::{self, MULTI_ROW_CONFIG, SINGLE_ROW_CONFIG};

#[tokio::test]
async fn connect_failure_propagates() {
    let dir = common::people().failing_connect("connection refused");
    let element = common::element(&dir, SINGLE_ROW_CONFIG);

    let err = element.perform(&mut common::process_data()).await.unwrap_err();

    assert!(err.is_connection_error());
    assert!(err.to_string().contains("connection refused"));
    assert_eq!(dir.connects(), 0);
    assert_eq!(dir.clients_closed(), 0);
}

#[tokio::test]
async fn search_failure_closes_client() {
    let dir = common::people().failing_search("noSuchObject");
    let element = common::element(&dir, MULTI_ROW_CONFIG);

    let mut data = common::process_data();
    let before = data.clone();
    let err = element.perform(&mut data).await.unwrap_err();

    assert!(err.is_directory_error());
    assert_eq!(dir.cursors_closed(), 0);
    assert_eq!(dir.clients_closed(), 1);
    assert_eq!(data, before);
}

#[tokio::test]
async fn broken_stream_closes_cursor_then_client() {
    let dir = common::people().failing_at_entry(1);
    let element = common::element(&dir, MULTI_ROW_CONFIG);

    let mut data = common::process_data();
    let err = element.perform(&mut data).await.unwrap_err();

    assert!(err.is_directory_error());
    assert_eq!(dir.entries_pulled(), 1);
    assert_eq!(dir.cursors_closed(), 1);
    assert_eq!(dir.clients_closed(), 1);
    assert!(data.get("people").is_none());
}

#[tokio::test]
async fn single_row_stops_before_broken_entry() {
    let dir = common::people().failing_at_entry(1);
    let element = common::element(&dir, SINGLE_ROW_CONFIG);

    let mut data = common::process_data();
    element.perform(&mut data).await.unwrap();

    assert_eq!(dir.entries_pulled(), 1);
    assert_eq!(dir.cursors_closed(), 1);
}

#[tokio::test]
async fn successful_runs_release_everything() {
    let dir = common::people();
    let element = common::element(&dir, MULTI_ROW_CONFIG);

    for _ in 0..3 {
        element.perform(&mut common::process_data()).await.unwrap();
    }

    assert_eq!(dir.connects(), 3);
    assert_eq!(dir.cursors_closed(), 3);
    assert_eq!(dir.clients_closed(), 3);
}
