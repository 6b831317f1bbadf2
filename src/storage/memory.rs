//! Memory storage
//!
//! Will be destroyed on system shutdown

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::qr_codes::QrCode;
use crate::qr_codes::Scan;
use crate::qr_codes::parse_destination_url;

use super::CreateQrCodeValues;
use super::Error;
use super::Result;
use super::Storage;

/// A single QR code in a seed file
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedQrCode {
    /// Identifier of the QR code
    id: String,

    /// Where the QR code redirects to
    destination_url: String,

    /// Defaults to active when not present
    #[serde(default = "default_is_active")]
    is_active: bool,
}

fn default_is_active() -> bool {
    true
}

/// An in-memory storage
///
/// Will be destroyed on system shutdown
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// All QR codes in storage, by identifier
    qr_codes: Arc<Mutex<HashMap<String, QrCode>>>,

    /// All recorded scans
    scans: Arc<Mutex<Vec<Scan>>>,
}

impl Memory {
    /// Create a new empty Memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a Memory storage from a JSON seed file
    ///
    /// See [`Memory::from_seed_json`] for the format
    pub async fn from_seed_file<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();

        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| Error::InvalidSeed(format!("{}: {err}", path.display())))?;

        let memory = Self::from_seed_json(&json).await?;

        tracing::info!(
            "Seeded memory storage with {} QR codes from {}",
            memory.qr_codes.lock().await.len(),
            path.display()
        );

        Ok(memory)
    }

    /// Create a Memory storage from JSON seed data
    ///
    /// ```json
    /// [ { "id": "abc-123", "destinationUrl": "https://menu.example.com/table/5", "isActive": true } ]
    /// ```
    ///
    /// Every destination must be an absolute `http` or `https` URL
    pub async fn from_seed_json(json: &str) -> Result<Self> {
        let seed: Vec<SeedQrCode> =
            serde_json::from_str(json).map_err(|err| Error::InvalidSeed(err.to_string()))?;

        let memory = Self::new();

        for qr_code in &seed {
            parse_destination_url(&qr_code.destination_url)
                .map_err(|err| Error::InvalidSeed(format!(r#""{}": {err}"#, qr_code.id)))?;

            memory
                .insert_qr_code(&CreateQrCodeValues {
                    id: &qr_code.id,
                    destination_url: &qr_code.destination_url,
                    is_active: qr_code.is_active,
                })
                .await;
        }

        Ok(memory)
    }

    /// Insert a QR code, replacing any existing one with the same identifier
    pub async fn insert_qr_code(&self, values: &CreateQrCodeValues<'_>) -> QrCode {
        let now = Utc::now().naive_utc();

        let mut qr_codes = self.qr_codes.lock().await;

        let created_at = qr_codes
            .get(values.id)
            .map_or(now, |existing| existing.created_at);

        let qr_code = QrCode {
            id: values.id.to_string(),
            destination_url: values.destination_url.to_string(),
            is_active: values.is_active,
            created_at,
            updated_at: now,
        };

        qr_codes.insert(qr_code.id.clone(), qr_code.clone());

        qr_code
    }

    /// (De)activate a QR code, returns `false` when it does not exist
    #[cfg(test)]
    pub async fn set_active(&self, id: &str, is_active: bool) -> bool {
        if let Some(qr_code) = self.qr_codes.lock().await.get_mut(id) {
            qr_code.is_active = is_active;
            qr_code.updated_at = Utc::now().naive_utc();

            true
        } else {
            false
        }
    }

    /// All scans recorded so far
    #[cfg(test)]
    pub async fn scans(&self) -> Vec<Scan> {
        self.scans.lock().await.clone()
    }
}

impl Storage for Memory {
    async fn find_single_active_qr_code_by_id(&self, id: &str) -> Result<Option<QrCode>> {
        Ok(self
            .qr_codes
            .lock()
            .await
            .get(id)
            .filter(|qr_code| qr_code.is_active)
            .cloned())
    }

    async fn save_scan(
        &self,
        qr_code: &QrCode,
        ip_address: Option<&IpAddr>,
        user_agent: Option<&str>,
    ) -> Result<()> {
        let scan = Scan::new(qr_code, ip_address, user_agent);

        self.scans.lock().await.push(scan);

        Ok(())
    }

    async fn check_health(&self) -> Result<()> {
        Ok(())
    }
}
