//! Object resolver: turns an object identifier into a byte stream and size.
//!
//! One GET against `<base>/objects/<oid>` is classified once:
//! - raw bytes (`application/octet-stream` + `Content-Length`): returned as is;
//! - a metadata document (`application/vnd.git-media+json`): its `download`
//!   link is fetched with a second GET and the document's size is reported.
//!
//! Redirects never reach this module; the transport follows them.

use crate::config::HawserConfig;
use crate::error::DownloadError;
use crate::metadata::{is_metadata_media_type, ObjectMetadata, METADATA_MEDIA_TYPE, OCTET_STREAM_MEDIA_TYPE};
use crate::transport::{Body, CurlTransport, Response, Transport, TransportError};
use crate::url_model::object_url;
use std::collections::HashMap;
use std::io::{self, Read};

/// Upper bound on a metadata document body.
const MAX_METADATA_BYTES: usize = 1024 * 1024;

/// Upper bound on the diagnostic text kept from a failed response.
const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

/// A fetched object: live body stream plus its declared size.
///
/// Reads come straight from the network. Dropping it releases the connection.
#[derive(Debug)]
pub struct Download {
    body: Body,
    size: u64,
}

impl Download {
    /// Declared object size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }
}

impl Read for Download {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.body.read(buf)
    }
}

/// How a successful terminal response is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Body is the object; size from `Content-Length`.
    RawBytes { size: u64 },
    /// Body is an [`ObjectMetadata`] document to follow.
    Metadata,
}

/// Classifies a 2xx response by `Content-Type`, then `Content-Length`.
pub fn classify(response: &Response) -> Result<Classification, DownloadError> {
    if response.content_type().is_some_and(is_metadata_media_type) {
        return Ok(Classification::Metadata);
    }
    response
        .content_length()
        .map(|size| Classification::RawBytes { size })
        .ok_or_else(|| DownloadError::protocol("object response has no usable Content-Length"))
}

/// Resolves object identifiers against one media store.
///
/// Holds only immutable configuration and the transport, so one resolver can
/// serve concurrent fetches from several threads.
#[derive(Debug, Clone)]
pub struct Resolver<T = CurlTransport> {
    config: HawserConfig,
    transport: T,
}

impl Resolver<CurlTransport> {
    /// Resolver over libcurl, with timeouts taken from `config`.
    pub fn new(config: HawserConfig) -> Self {
        let transport = CurlTransport::from_config(&config);
        Self { config, transport }
    }
}

impl<T: Transport> Resolver<T> {
    pub fn with_transport(config: HawserConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// Fetches object `id`. Performs at most two GETs.
    pub fn fetch(&self, id: &str) -> Result<Download, DownloadError> {
        let url = object_url(&self.config.url, id)?;
        let mut headers = HashMap::new();
        headers.insert(
            "Accept".to_string(),
            format!("{}, {}", METADATA_MEDIA_TYPE, OCTET_STREAM_MEDIA_TYPE),
        );

        let response = self.get_checked(url.as_str(), &headers)?;
        let classification = classify(&response).map_err(|e| {
            tracing::warn!(%url, "unusable object response: {}", e);
            e
        })?;
        tracing::debug!(%url, ?classification, "classified object response");

        match classification {
            Classification::RawBytes { size } => {
                tracing::info!(id, size, "object download started");
                Ok(Download {
                    body: response.body,
                    size,
                })
            }
            Classification::Metadata => self.follow_metadata(id, response.body),
        }
    }

    fn follow_metadata(&self, id: &str, mut body: Body) -> Result<Download, DownloadError> {
        let (bytes, truncated) = body
            .read_capped(MAX_METADATA_BYTES)
            .map_err(|e| {
                tracing::warn!(id, "metadata body read failed: {}", e);
                DownloadError::Transport(TransportError::Body(e))
            })?;
        drop(body);
        if truncated {
            return Err(DownloadError::decode(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("metadata document exceeds {} bytes", MAX_METADATA_BYTES),
            )));
        }

        let meta = ObjectMetadata::from_slice(&bytes)?;
        let link = meta.download_link().map_err(|e| {
            tracing::warn!(id, "metadata without usable download link: {}", e);
            e
        })?;
        if crate::url_model::object_id(id) != Some(meta.oid.as_str()) {
            tracing::debug!(id, oid = %meta.oid, "metadata oid differs from requested id");
        }
        tracing::debug!(id, href = %link.href, size = meta.size, "following download link");

        let response = self.get_checked(&link.href, &link.header)?;
        tracing::info!(id, size = meta.size, "object download started via metadata");
        Ok(Download {
            body: response.body,
            size: meta.size,
        })
    }

    /// GET that turns non-2xx terminal responses into [`DownloadError::Remote`].
    fn get_checked(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<Response, DownloadError> {
        let response = self.transport.get(url, headers).map_err(|e| {
            tracing::warn!(url, "GET failed: {}", e);
            DownloadError::from(e)
        })?;
        if response.is_success() {
            return Ok(response);
        }

        let status = response.status;
        let body = error_body(response.body);
        tracing::warn!(url, status, "GET returned HTTP {}", status);
        Err(DownloadError::Remote { status, body })
    }
}

/// Diagnostic text from a failed response; read errors yield what was read so far.
fn error_body(body: Body) -> String {
    let mut reader = body.take(MAX_ERROR_BODY_BYTES as u64);
    let mut bytes = Vec::new();
    let mut buf = [0u8; 8192];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => bytes.extend_from_slice(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
    String::from_utf8_lossy(&bytes).trim().to_string()
}

/// Fetches object `id` from the store named by `config`.
pub fn download(config: &HawserConfig, id: &str) -> Result<Download, DownloadError> {
    Resolver::new(config.clone()).fetch(id)
}
