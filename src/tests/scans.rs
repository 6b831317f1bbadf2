use std::net::IpAddr;

use axum::http::StatusCode;

use crate::config::Settings;
use crate::qr_codes::QrCode;
use crate::storage::Error as StorageError;
use crate::storage::Memory;
use crate::storage::Result as StorageResult;
use crate::storage::Storage;
use crate::tests::helper;

/// Memory storage that can not save scans
#[derive(Clone)]
struct ReadOnly(Memory);

impl Storage for ReadOnly {
    async fn find_single_active_qr_code_by_id(&self, id: &str) -> StorageResult<Option<QrCode>> {
        self.0.find_single_active_qr_code_by_id(id).await
    }

    async fn save_scan(
        &self,
        _qr_code: &QrCode,
        _ip_address: Option<&IpAddr>,
        _user_agent: Option<&str>,
    ) -> StorageResult<()> {
        Err(StorageError::Connection("read-only transaction".to_string()))
    }

    async fn check_health(&self) -> StorageResult<()> {
        self.0.check_health().await
    }
}

#[tokio::test]
async fn test_scan_is_saved() {
    let memory = Memory::new();
    helper::insert_qr_code(&memory, "abc-123", "https://menu.example.com/", true).await;

    let mut app = helper::setup_test_app(&memory).await;

    let (status_code, _) =
        helper::qr_redirect_with_user_agent(&mut app, "?id=abc-123", "scanner/1.0").await;
    assert_eq!(StatusCode::FOUND, status_code);

    let scans = memory.scans().await;
    assert_eq!(1, scans.len());
    assert_eq!("abc-123", scans[0].qr_code_id);
    assert_eq!(Some("scanner/1.0".to_string()), scans[0].user_agent);

    // no connect info when calling the router directly
    assert_eq!(None, scans[0].ip_address);
}

#[tokio::test]
async fn test_scan_is_not_saved_without_redirect() {
    let memory = Memory::new();
    helper::insert_qr_code(&memory, "abc-123", "https://menu.example.com/", false).await;

    let mut app = helper::setup_test_app(&memory).await;

    let (status_code, _) = helper::qr_redirect(&mut app, "").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);

    let (status_code, _) = helper::qr_redirect(&mut app, "?id=abc-123").await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);

    assert!(memory.scans().await.is_empty());
}

#[tokio::test]
async fn test_scan_recording_disabled() {
    let memory = Memory::new();
    helper::insert_qr_code(&memory, "abc-123", "https://menu.example.com/", true).await;

    let settings = Settings {
        record_scans: false,
        ..Settings::default()
    };

    let mut app = helper::setup_test_app_with_settings(&memory, settings).await;

    let (status_code, _) = helper::qr_redirect(&mut app, "?id=abc-123").await;
    assert_eq!(StatusCode::FOUND, status_code);

    assert!(memory.scans().await.is_empty());
}

#[tokio::test]
async fn test_failed_scan_still_redirects() {
    let memory = Memory::new();
    helper::insert_qr_code(&memory, "abc-123", "https://menu.example.com/table/5", true).await;

    let mut app = helper::setup_test_app_with_storage(ReadOnly(memory.clone()));

    let (status_code, location) = helper::qr_redirect(&mut app, "?id=abc-123").await;
    assert_eq!(StatusCode::FOUND, status_code);
    assert_eq!(
        Some("https://menu.example.com/table/5".to_string()),
        location
    );

    assert!(memory.scans().await.is_empty());
}
