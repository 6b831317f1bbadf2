//! Health API endpoint

use axum::Extension;
use serde::Serialize;

use crate::storage::Storage;

use super::Error;
use super::Success;

/// Health response going to the user
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `ok`, failures are an error response
    pub status: &'static str,
}

/// Check if the service can reach its storage
///
/// Request:
/// ```sh
/// curl -v http://localhost:6000/health
/// ```
///
/// Response:
/// ```json
/// { "data": { "status": "ok" } }
/// ```
pub async fn health<S: Storage>(
    Extension(storage): Extension<S>,
) -> Result<Success<HealthResponse>, Error> {
    storage.check_health().await.map_err(|err| {
        tracing::error!("Storage is not healthy: {err}");

        Error::service_unavailable("Storage unavailable")
    })?;

    Ok(Success::ok(HealthResponse { status: "ok" }))
}
