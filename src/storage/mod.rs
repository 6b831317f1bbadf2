//! All things related to the storage of QR codes and their scans

use core::fmt;
use std::future::Future;
use std::net::IpAddr;

use sqlx::PgPool;

pub use cached::Cached;
pub use memory::Memory;
pub use postgres::Postgres;

use crate::qr_codes::QrCode;

mod cached;
mod memory;
mod postgres;

/// Storage errors
#[derive(Debug)]
pub enum Error {
    /// A connection error with the storage
    Connection(String),

    /// Seed data for the storage could not be used
    InvalidSeed(String),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Connection(error) => write!(f, "Connection error: {error}"),
            Error::InvalidSeed(error) => write!(f, "Invalid seed: {error}"),
        }
    }
}

/// Result type for all storage interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Storage configuration
pub enum Config {
    /// Detect configuration from the settings: Postgres when a database URL is
    /// known, memory otherwise
    DetectConfig,

    /// Use an existing memory storage
    ExistingMemory(Memory),

    /// Use existing Postgres connection
    ExistingConnection(PgPool),
}

/// Values to create a QR code with
pub struct CreateQrCodeValues<'a> {
    /// Identifier of the QR code
    pub id: &'a str,

    /// Where the QR code redirects to
    pub destination_url: &'a str,

    /// Should the QR code be resolved
    pub is_active: bool,
}

/// Storage with all supported operations
pub trait Storage: Clone + Send + Sync + 'static {
    /// Find a single QR code by its identifier
    ///
    /// Only active QR codes are returned, an inactive QR code is the same as a
    /// missing one
    fn find_single_active_qr_code_by_id(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<QrCode>>> + Send;

    /// Save a scan of a QR code
    fn save_scan(
        &self,
        qr_code: &QrCode,
        ip_address: Option<&IpAddr>,
        user_agent: Option<&str>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Check if the storage can be reached
    fn check_health(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Convert any error to a storage connection error
fn connection_error<E>(err: E) -> Error
where
    E: std::error::Error,
{
    Error::Connection(err.to_string())
}
