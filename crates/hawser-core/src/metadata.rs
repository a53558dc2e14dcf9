//! Media object metadata documents (`application/vnd.git-media+json`).
//!
//! Older media servers answer every object GET with this document instead of
//! the bytes; the `download` link points at the real content.

use crate::error::DownloadError;
use crate::url_model::parse_http_url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Media type identifying a metadata document response.
pub const METADATA_MEDIA_TYPE: &str = "application/vnd.git-media+json";

/// Media type of a raw object response.
pub const OCTET_STREAM_MEDIA_TYPE: &str = "application/octet-stream";

/// Relation name of the link that serves the object bytes.
pub const DOWNLOAD_REL: &str = "download";

/// Object description without its bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub oid: String,
    pub size: u64,
    /// Read from `_links` or `links`; a document carrying both is rejected.
    #[serde(rename = "_links", alias = "links", default)]
    pub links: HashMap<String, LinkRelation>,
}

/// A followable reference inside a metadata document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRelation {
    pub href: String,
    /// Headers to attach to the follow-up request.
    #[serde(alias = "headers", default, skip_serializing_if = "HashMap::is_empty")]
    pub header: HashMap<String, String>,
}

impl ObjectMetadata {
    /// Decodes a metadata document body.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DownloadError> {
        serde_json::from_slice(bytes).map_err(DownloadError::decode)
    }

    /// Returns the `download` relation, checked for a usable absolute `href`.
    pub fn download_link(&self) -> Result<&LinkRelation, DownloadError> {
        let link = self.links.get(DOWNLOAD_REL).ok_or_else(|| {
            DownloadError::protocol(format!("metadata for {} has no download link", self.oid))
        })?;
        if link.href.trim().is_empty() {
            return Err(DownloadError::protocol(format!(
                "metadata for {} has an empty download href",
                self.oid
            )));
        }
        parse_http_url(&link.href).map_err(|e| {
            DownloadError::protocol(format!("download href {:?} is not usable: {}", link.href, e))
        })?;
        Ok(link)
    }
}

/// True if a `Content-Type` value names the metadata document media type.
/// Parameters (`; charset=...`) are ignored and the comparison is case-insensitive.
pub fn is_metadata_media_type(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or("").trim();
    essence.eq_ignore_ascii_case(METADATA_MEDIA_TYPE)
}
