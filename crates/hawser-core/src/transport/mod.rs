//! HTTP transport seam.
//!
//! The resolver only depends on [`Transport`]: a GET that follows redirects
//! on its own and hands back the terminal response with a lazily-read body.
//! [`CurlTransport`] is the libcurl-backed implementation.

mod libcurl;
mod headers;

pub use libcurl::CurlTransport;
pub use headers::{parse_http_status, ResponseHeaders};

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Read};

/// Connection-level failure, distinct from any HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// libcurl reported an error (timeout, refused, DNS, too many redirects).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// The transfer worker thread could not be started.
    #[error("spawn transfer thread: {0}")]
    Spawn(#[source] io::Error),
    /// The connection failed while the body was being read.
    #[error("read response body: {0}")]
    Body(#[source] io::Error),
    /// The transfer worker exited without reporting a response.
    #[error("transfer ended without a response")]
    WorkerGone,
}

/// Terminal response of a GET: status, headers, and the live body.
pub struct Response {
    pub status: u32,
    pub headers: ResponseHeaders,
    pub body: Body,
}

impl Response {
    /// True for 200..=299.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type")
    }

    /// `Content-Length` parsed as u64; `None` when absent or unparsable.
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get("content-length")
            .and_then(|v| v.trim().parse::<u64>().ok())
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Lazily-readable response body. Dropping it releases the connection.
pub struct Body(Box<dyn Read + Send>);

impl Body {
    pub fn new(reader: impl Read + Send + 'static) -> Self {
        Self(Box::new(reader))
    }

    /// Body with no bytes.
    pub fn empty() -> Self {
        Self::new(io::empty())
    }

    /// Reads at most `limit` bytes; returns the bytes and whether more remained.
    pub fn read_capped(&mut self, limit: usize) -> io::Result<(Vec<u8>, bool)> {
        let mut buf = Vec::new();
        (&mut self.0).take(limit as u64 + 1).read_to_end(&mut buf)?;
        let truncated = buf.len() > limit;
        buf.truncate(limit);
        Ok((buf, truncated))
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Body { .. }")
    }
}

/// A GET that transparently follows redirects.
///
/// `headers` are extra request headers (name → value). Implementations must
/// return only the terminal response and must not buffer the body.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, headers: &HashMap<String, String>) -> Result<Response, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str, headers: &HashMap<String, String>) -> Result<Response, TransportError> {
        (**self).get(url, headers)
    }
}
