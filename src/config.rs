//! Configuration from the environment
//!
//! Empty environment variables are treated as not set

use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;

const DEFAULT_ADDRESS: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 6000);

/// Settings of the service
#[derive(Clone, Debug)]
pub struct Settings {
    /// Address to listen on
    pub address: SocketAddr,

    /// Postgres connection string, memory storage is used without it
    pub database_url: Option<String>,

    /// JSON file to seed the memory storage with
    pub seed_file: Option<PathBuf>,

    /// How long lookups are cached, no caching without it
    pub cache_ttl: Option<Duration>,

    /// Save a scan for every successful redirect
    pub record_scans: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            database_url: None,
            seed_file: None,
            cache_ttl: None,
            record_scans: true,
        }
    }
}

impl Settings {
    /// Read the settings from the environment
    ///
    /// # Errors
    ///
    /// Will return `Err` when a variable is set with an invalid value
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var_name| std::env::var(var_name).ok())
    }

    /// Read the settings with a custom variable lookup
    fn from_lookup<L>(lookup: L) -> Result<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let var = |var_name: &str| lookup(var_name).filter(|value| !value.is_empty());

        let mut address = var("ADDRESS")
            .map(|address| address.parse::<SocketAddr>().context("Invalid `ADDRESS`"))
            .transpose()?
            .unwrap_or(DEFAULT_ADDRESS);

        // optional override of just the port
        if let Some(port) = var("PORT") {
            address.set_port(port.parse::<u16>().context("Invalid `PORT`")?);
        }

        let cache_ttl = var("QR_CACHE_TTL")
            .map(|seconds| seconds.parse::<u64>().context("Invalid `QR_CACHE_TTL`"))
            .transpose()?
            .filter(|seconds| *seconds > 0)
            .map(Duration::from_secs);

        let record_scans = var("QR_RECORD_SCANS")
            .map(|value| parse_bool(&value).context("Invalid `QR_RECORD_SCANS`"))
            .transpose()?
            .unwrap_or(true);

        Ok(Self {
            address,
            database_url: var("DATABASE_URL"),
            seed_file: var("QR_SEED_FILE").map(PathBuf::from),
            cache_ttl,
            record_scans,
        })
    }
}

/// Parse a boolean the way people tend to write them in `.env` files
fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!(r#""{value}" is not a boolean"#),
    }
}
