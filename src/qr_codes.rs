//! QR codes

use core::fmt;
use std::net::IpAddr;

use chrono::Utc;
use chrono::naive::NaiveDateTime;
use url::Url;
use uuid::Uuid;

/// A QR code as stored, pointing at its destination
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct QrCode {
    /// Opaque identifier encoded in the QR code
    pub id: String,

    /// Absolute URL the QR code redirects to
    pub destination_url: String,

    /// Inactive QR codes are never resolved
    pub is_active: bool,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Last updated at
    pub updated_at: NaiveDateTime,
}

/// A single successful resolution of a QR code
#[derive(Clone, Debug)]
pub struct Scan {
    /// Scan ID
    pub id: Uuid,

    /// The QR code that was scanned
    pub qr_code_id: String,

    /// IP address of the client, when known
    pub ip_address: Option<IpAddr>,

    /// User agent of the client, when known
    pub user_agent: Option<String>,

    /// Moment of the scan
    pub created_at: NaiveDateTime,
}

/// Reasons a destination URL can not be used for a redirect
#[derive(Debug, PartialEq, Eq)]
pub enum InvalidDestination {
    /// Not a URL, or not an absolute one
    Unparsable(url::ParseError),

    /// Only `http` and `https` are followed by browsers scanning a code
    UnsupportedScheme(String),
}

impl std::error::Error for InvalidDestination {}

impl fmt::Display for InvalidDestination {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InvalidDestination::Unparsable(err) => write!(f, "Invalid destination URL: {err}"),
            InvalidDestination::UnsupportedScheme(scheme) => {
                write!(f, r#"Unsupported destination scheme "{scheme}""#)
            }
        }
    }
}

/// Parse and validate a destination URL
///
/// ```rust
/// let url = "https://menu.example.com/table/5";
/// assert!(parse_destination_url(url).is_ok())
/// ```
pub fn parse_destination_url(url: &str) -> Result<Url, InvalidDestination> {
    let url = Url::parse(url).map_err(InvalidDestination::Unparsable)?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(InvalidDestination::UnsupportedScheme(scheme.to_string())),
    }
}

impl Scan {
    /// Create a scan of a QR code happening right now
    pub fn new(qr_code: &QrCode, ip_address: Option<&IpAddr>, user_agent: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            qr_code_id: qr_code.id.clone(),
            ip_address: ip_address.copied(),
            user_agent: user_agent.map(ToString::to_string),
            created_at: Utc::now().naive_utc(),
        }
    }
}

impl QrCode {
    /// The validated destination of this QR code
    pub fn destination(&self) -> Result<Url, InvalidDestination> {
        parse_destination_url(&self.destination_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_destination_url() {
        let url = "https://menu.example.com/table/5";
        assert_eq!(parse_destination_url(url).unwrap().as_str(), url);

        let url = "http://menu.example.com/";
        assert!(parse_destination_url(url).is_ok());
    }

    #[test]
    fn test_parse_destination_url_relative() {
        assert_eq!(
            parse_destination_url("/table/5"),
            Err(InvalidDestination::Unparsable(
                url::ParseError::RelativeUrlWithoutBase
            ))
        );
        assert!(parse_destination_url("").is_err());
    }

    #[test]
    fn test_parse_destination_url_scheme() {
        assert_eq!(
            parse_destination_url("ftp://files.example.com/menu.pdf"),
            Err(InvalidDestination::UnsupportedScheme("ftp".to_string()))
        );
        assert!(parse_destination_url("javascript:alert(1)").is_err());
    }
}
