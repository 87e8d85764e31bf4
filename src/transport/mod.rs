//! HTTP transport: one request in, one classified response out.
//!
//! [`Transport`] is the raw exchange seam (implemented by [`HttpTransport`] on top of
//! `reqwest::blocking`); [`Requester`] sits above it and owns body construction,
//! authentication, response decoding and fail-on-error handling.

mod http;
pub mod multipart;
mod requester;

pub use http::{HttpSettings, HttpTransport};
pub use requester::{ApiRequest, FilePart, FileSource, Requester};

use bytes::Bytes;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully built request handed to a [`Transport`].
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    /// `application/json` encoded fields.
    Json(Vec<u8>),
    /// Pre-encoded `multipart/form-data` body.
    Multipart { boundary: String, bytes: Vec<u8> },
    /// A single file on disk uploaded as the only multipart part.
    File { name: String, part: FilePart },
}

impl RequestBody {
    pub fn kind(&self) -> &'static str {
        match self {
            RequestBody::Empty => "empty",
            RequestBody::Json(_) => "json",
            RequestBody::Multipart { .. } => "multipart",
            RequestBody::File { .. } => "file",
        }
    }
}

/// Raw response: status, headers and the body with the header block already split off.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

/// One blocking HTTP exchange.
///
/// Implementations must not retry; every call is a single attempt.
pub trait Transport: Send + Sync {
    fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;

    /// Toggle TLS peer verification for subsequent requests.
    fn set_verify_peer(&self, _enabled: bool) -> Result<(), TransportError> {
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
