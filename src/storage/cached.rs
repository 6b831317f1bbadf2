//! Lookup cache in front of any storage
//!
//! Found and not-found lookups are both cached until they expire, errors are
//! never cached

use std::net::IpAddr;
use std::time::Duration;

use moka::future::Cache;

use crate::qr_codes::QrCode;

use super::Result;
use super::Storage;

/// Upper bound of cached identifiers
const MAX_CAPACITY: u64 = 10_000;

/// Storage with an optional time-based lookup cache
#[derive(Clone, Debug)]
pub struct Cached<S: Storage> {
    /// The storage doing the actual work
    storage: S,

    /// Cached lookups by identifier, `None` when caching is disabled
    lookups: Option<Cache<String, Option<QrCode>>>,
}

impl<S: Storage> Cached<S> {
    /// Wrap a storage, caching lookups for `time_to_live`
    ///
    /// Without a time to live every lookup goes to the storage
    pub fn new(storage: S, time_to_live: Option<Duration>) -> Self {
        let lookups = time_to_live
            .filter(|time_to_live| !time_to_live.is_zero())
            .map(|time_to_live| {
                Cache::builder()
                    .max_capacity(MAX_CAPACITY)
                    .time_to_live(time_to_live)
                    .build()
            });

        Self { storage, lookups }
    }
}

impl<S: Storage> Storage for Cached<S> {
    async fn find_single_active_qr_code_by_id(&self, id: &str) -> Result<Option<QrCode>> {
        let Some(lookups) = &self.lookups else {
            return self.storage.find_single_active_qr_code_by_id(id).await;
        };

        if let Some(qr_code) = lookups.get(id).await {
            tracing::trace!(r#"Cache hit for "{id}""#);

            return Ok(qr_code);
        }

        let qr_code = self.storage.find_single_active_qr_code_by_id(id).await?;

        lookups.insert(id.to_string(), qr_code.clone()).await;

        Ok(qr_code)
    }

    async fn save_scan(
        &self,
        qr_code: &QrCode,
        ip_address: Option<&IpAddr>,
        user_agent: Option<&str>,
    ) -> Result<()> {
        self.storage
            .save_scan(qr_code, ip_address, user_agent)
            .await
    }

    async fn check_health(&self) -> Result<()> {
        self.storage.check_health().await
    }
}
