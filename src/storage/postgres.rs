//! Postgres storage

use std::net::IpAddr;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::ipnetwork::IpNetwork;

use crate::qr_codes::QrCode;
use crate::qr_codes::Scan;

use super::Result;
use super::Storage;
use super::connection_error;

/// Migrator to run migrations on startup
static MIGRATOR: Migrator = sqlx::migrate!();

/// Postgres storage
#[derive(Clone, Debug)]
pub struct Postgres {
    /// Pool of connections
    connection_pool: PgPool,
}

impl Postgres {
    /// Create Postgres storage from a connection string
    ///
    /// Migrations will be run
    pub async fn connect(database_url: &str) -> Result<Self> {
        let connection_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await
            .map_err(connection_error)?;

        Self::new_with_pool(connection_pool).await
    }

    /// Create Postgres storage with existing pool
    ///
    /// Migrations will be run
    pub async fn new_with_pool(connection_pool: PgPool) -> Result<Self> {
        MIGRATOR
            .run(&connection_pool)
            .await
            .map_err(connection_error)?;

        Ok(Self { connection_pool })
    }
}

impl Storage for Postgres {
    async fn find_single_active_qr_code_by_id(&self, id: &str) -> Result<Option<QrCode>> {
        let qr_code = sqlx::query_as::<_, QrCode>(
            r"
            SELECT
                id,
                destination_url,
                is_active,
                created_at,
                updated_at
            FROM qr_codes
            WHERE id = $1
                AND is_active
            LIMIT 1
            ",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(qr_code)
    }

    async fn save_scan(
        &self,
        qr_code: &QrCode,
        ip_address: Option<&IpAddr>,
        user_agent: Option<&str>,
    ) -> Result<()> {
        let scan = Scan::new(qr_code, ip_address, user_agent);

        sqlx::query(
            r"
            INSERT INTO qr_scans (id, qr_code_id, ip_address, user_agent, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(scan.id)
        .bind(&scan.qr_code_id)
        .bind(scan.ip_address.map(IpNetwork::from))
        .bind(&scan.user_agent)
        .bind(scan.created_at)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(())
    }

    async fn check_health(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.connection_pool)
            .await
            .map_err(connection_error)?;

        Ok(())
    }
}
