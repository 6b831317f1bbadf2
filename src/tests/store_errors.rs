use axum::http::StatusCode;

use crate::storage::Memory;
use crate::tests::helper;

#[tokio::test]
async fn test_qr_redirect_with_unavailable_storage() {
    let mut app = helper::setup_unavailable_app();

    let (status_code, location, error) = helper::maybe_qr_redirect(&mut app, "?id=abc-123").await;
    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, status_code);
    assert_eq!(None, location);
    assert!(error.unwrap().starts_with("Storage error"));
}

#[tokio::test]
async fn test_qr_redirect_validates_before_storage() {
    let mut app = helper::setup_unavailable_app();

    // the storage is never asked for an empty identifier
    let (status_code, location) = helper::qr_redirect(&mut app, "?id=").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(None, location);
}

#[tokio::test]
async fn test_qr_redirect_with_invalid_destination() {
    let memory = Memory::new();
    helper::insert_qr_code(&memory, "relative", "/table/5", true).await;
    helper::insert_qr_code(&memory, "ftp", "ftp://files.example.com/menu.pdf", true).await;

    let mut app = helper::setup_test_app(&memory).await;

    for id in ["relative", "ftp"] {
        let (status_code, location) = helper::qr_redirect(&mut app, &format!("?id={id}")).await;
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, status_code);
        assert_eq!(None, location);
    }

    assert!(memory.scans().await.is_empty());
}
