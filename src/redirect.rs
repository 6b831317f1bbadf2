//! The redirect!
//!
//! Resolves a QR identifier to its destination and answers with a `302 Found`

use core::fmt;

use axum::Extension;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header::LOCATION;
use axum_extra::TypedHeader;
use axum_extra::headers::UserAgent;
use serde::Deserialize;

use crate::api::Error;
use crate::api::PathParameters;
use crate::api::QueryParameters;
use crate::client_ip::ClientIp;
use crate::qr_codes::InvalidDestination;
use crate::qr_codes::QrCode;
use crate::storage;
use crate::storage::Storage;

/// Options for the redirect handlers
#[derive(Clone, Copy, Debug)]
pub struct RedirectOptions {
    /// Save a scan for every successful redirect
    pub record_scans: bool,
}

/// Query parameters of the redirect
#[derive(Debug, Deserialize)]
pub struct RedirectParameters {
    /// Identifier of the QR code
    id: Option<String>,
}

/// Why a QR identifier could not be resolved
#[derive(Debug)]
pub enum ResolveError {
    /// The identifier is missing or empty
    Validation,

    /// No active QR code has this identifier
    NotFound,

    /// The storage could not be reached
    Store(storage::Error),

    /// The stored destination can not be redirected to
    InvalidDestination(InvalidDestination),
}

impl std::error::Error for ResolveError {}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResolveError::Validation => write!(f, "Missing QR identifier"),
            ResolveError::NotFound => write!(f, "QR code not found"),
            ResolveError::Store(err) => write!(f, "Storage error: {err}"),
            ResolveError::InvalidDestination(err) => write!(f, "{err}"),
        }
    }
}

impl From<ResolveError> for Error {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Validation => Error::bad_request(err),
            ResolveError::NotFound => Error::not_found(err),
            ResolveError::Store(_) | ResolveError::InvalidDestination(_) => {
                Error::internal_server_error(err)
            }
        }
    }
}

/// Parse a raw QR identifier
///
/// Whitespace only counts as no identifier, anything else is matched as is
///
/// ```rust
/// assert_eq!(parse_identifier(Some("abc-123")).unwrap(), "abc-123");
/// ```
pub fn parse_identifier(id: Option<&str>) -> Result<&str, ResolveError> {
    match id {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => Err(ResolveError::Validation),
    }
}

/// Resolve a raw QR identifier to an active QR code with a valid destination
///
/// The storage is only asked when the identifier is valid
pub async fn resolve<S: Storage>(storage: &S, id: Option<&str>) -> Result<QrCode, ResolveError> {
    let id = parse_identifier(id)?;

    tracing::debug!(r#"Looking for QR code: "{id}""#);

    let qr_code = storage
        .find_single_active_qr_code_by_id(id)
        .await
        .map_err(ResolveError::Store)?
        .ok_or(ResolveError::NotFound)?;

    qr_code
        .destination()
        .map_err(ResolveError::InvalidDestination)?;

    Ok(qr_code)
}

/// Redirect with the identifier in the query string
///
/// Request:
/// ```sh
/// curl -v http://localhost:6000/qr-redirect?id=abc-123
/// ```
pub async fn qr_redirect<S: Storage>(
    ip_address: Option<ClientIp>,
    user_agent: Option<TypedHeader<UserAgent>>,
    Extension(storage): Extension<S>,
    Extension(options): Extension<RedirectOptions>,
    QueryParameters(parameters): QueryParameters<RedirectParameters>,
) -> Result<(StatusCode, HeaderMap), Error> {
    redirect(
        &storage,
        options,
        parameters.id.as_deref(),
        ip_address,
        user_agent,
    )
    .await
}

/// Redirect with the identifier as path segment
///
/// Request:
/// ```sh
/// curl -v http://localhost:6000/qr-redirect/abc-123
/// ```
pub async fn qr_redirect_by_path<S: Storage>(
    ip_address: Option<ClientIp>,
    user_agent: Option<TypedHeader<UserAgent>>,
    Extension(storage): Extension<S>,
    Extension(options): Extension<RedirectOptions>,
    PathParameters(id): PathParameters<String>,
) -> Result<(StatusCode, HeaderMap), Error> {
    redirect(&storage, options, Some(&id), ip_address, user_agent).await
}

/// Resolve, record the scan and build the response
async fn redirect<S: Storage>(
    storage: &S,
    options: RedirectOptions,
    id: Option<&str>,
    ip_address: Option<ClientIp>,
    user_agent: Option<TypedHeader<UserAgent>>,
) -> Result<(StatusCode, HeaderMap), Error> {
    let qr_code = resolve(storage, id).await.map_err(|err| {
        let message = err.to_string();
        let err = Error::from(err);

        if err.status_code().is_server_error() {
            tracing::error!("Could not redirect {id:?}: {message}");
        } else {
            tracing::debug!("Not redirecting {id:?}: {message}");
        }

        err
    })?;

    if options.record_scans {
        let result = storage
            .save_scan(
                &qr_code,
                ip_address.map(|i| i.ip_address).as_ref(),
                user_agent.as_ref().map(|i| i.0.as_str()),
            )
            .await;

        if let Err(err) = result {
            tracing::error!(r#"Could not save scan of "{}": {err}"#, qr_code.id);
        }
    }

    tracing::debug!(
        r#"QR code "{}" redirecting to: {}"#,
        qr_code.id,
        qr_code.destination_url
    );

    // the stored destination as is, validation does not rewrite it
    let location = HeaderValue::from_str(&qr_code.destination_url).map_err(|err| {
        tracing::error!(r#"Destination of "{}" is no valid header: {err}"#, qr_code.id);

        Error::internal_server_error("Invalid destination")
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(LOCATION, location);

    Ok((StatusCode::FOUND, headers))
}
