use axum::http::StatusCode;

use crate::config::Settings;
use crate::setup_app;
use crate::storage::Config as StorageConfig;
use crate::tests::helper;

async fn setup_test_app(pool: sqlx::PgPool) -> axum::Router {
    setup_app(StorageConfig::ExistingConnection(pool), &Settings::default())
        .await
        .unwrap()
}

#[sqlx::test(migrations = false)]
#[ignore = "needs a Postgres database in `DATABASE_URL`"]
async fn test_qr_redirect_with_postgres(pool: sqlx::PgPool) {
    let mut app = setup_test_app(pool.clone()).await;

    sqlx::query("INSERT INTO qr_codes (id, destination_url, is_active) VALUES ($1, $2, TRUE)")
        .bind("abc-123")
        .bind("https://menu.example.com/table/5")
        .execute(&pool)
        .await
        .unwrap();

    let (status_code, location) = helper::qr_redirect(&mut app, "?id=abc-123").await;
    assert_eq!(StatusCode::FOUND, status_code);
    assert_eq!(
        Some("https://menu.example.com/table/5".to_string()),
        location
    );

    let scans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM qr_scans WHERE qr_code_id = $1")
        .bind("abc-123")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(1, scans);

    sqlx::query("UPDATE qr_codes SET is_active = FALSE WHERE id = $1")
        .bind("abc-123")
        .execute(&pool)
        .await
        .unwrap();

    let (status_code, location) = helper::qr_redirect(&mut app, "?id=abc-123").await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!(None, location);

    let (status_code, _) = helper::health(&mut app).await;
    assert_eq!(StatusCode::OK, status_code);
}
