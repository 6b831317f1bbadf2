#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
// easier to use when using the functions as callback of foreign functions
#![allow(clippy::needless_pass_by_value)]

use std::net::SocketAddr;

use anyhow::Result;
use axum::Extension;
use axum::Router;
use axum::routing::get;
use axum_client_ip::ClientIpSource;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::prelude::*;

use crate::config::Settings;
use crate::redirect::RedirectOptions;
use crate::storage::Cached;
use crate::storage::Config as StorageConfig;
use crate::storage::Memory;
use crate::storage::Postgres;
use crate::storage::Storage;

mod api;
mod client_ip;
mod config;
mod graceful_shutdown;
mod qr_codes;
mod redirect;
mod storage;
#[cfg(test)]
mod tests;

const DEFAULT_RUST_LOG: &str = "qr_redirect=debug,tower_http=debug";

#[tokio::main]
async fn main() -> Result<()> {
    setup_environment();
    setup_tracing();

    let settings = Settings::from_env()?;

    let app = setup_app(StorageConfig::DetectConfig, &settings).await?;

    let listener = TcpListener::bind(settings.address).await?;
    tracing::info!("Listening on {}", settings.address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(graceful_shutdown::handler())
    .await?;

    Ok(())
}

/// Create and setup the app with its storage
///
/// # Errors
///
/// Will return `Err` if the storage fails to load:
/// - Database connection or migrations
/// - Seed file of the memory storage
pub async fn setup_app(config: StorageConfig, settings: &Settings) -> Result<Router> {
    let router = match config {
        StorageConfig::DetectConfig => {
            if let Some(database_url) = &settings.database_url {
                tracing::info!("Using Postgres storage");

                create_router(Postgres::connect(database_url).await?, settings)
            } else if let Some(seed_file) = &settings.seed_file {
                create_router(Memory::from_seed_file(seed_file).await?, settings)
            } else {
                tracing::info!("`DATABASE_URL` is not set, using empty memory storage");

                create_router(Memory::new(), settings)
            }
        }
        StorageConfig::ExistingMemory(memory) => create_router(memory, settings),
        StorageConfig::ExistingConnection(pool) => {
            create_router(Postgres::new_with_pool(pool).await?, settings)
        }
    };

    Ok(router)
}

/// Create the router for the redirect service
fn create_router<S: Storage>(storage: S, settings: &Settings) -> Router {
    if let Some(cache_ttl) = settings.cache_ttl {
        tracing::info!("Caching lookups for {}s", cache_ttl.as_secs());
    }

    let storage = Cached::new(storage, settings.cache_ttl);

    let options = RedirectOptions {
        record_scans: settings.record_scans,
    };

    Router::new()
        .route("/qr-redirect", get(redirect::qr_redirect::<Cached<S>>))
        .route("/qr-redirect/", get(redirect::qr_redirect::<Cached<S>>))
        .route(
            "/qr-redirect/{id}",
            get(redirect::qr_redirect_by_path::<Cached<S>>),
        )
        .route("/health", get(api::health::<Cached<S>>))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(storage))
        .layer(Extension(options))
        .layer(ClientIpSource::ConnectInfo.into_extension())
}

/// Everything that is not a known route
async fn fallback() -> api::Error {
    api::Error::not_found("Not found")
}

fn setup_environment() {
    dotenvy::dotenv().ok();
}

fn setup_tracing() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::registry;

    registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_RUST_LOG.into()),
        ))
        .with(fmt::layer())
        .init();
}
