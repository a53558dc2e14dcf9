//! Request URL construction for media objects.
//!
//! Maps an object identifier onto `<base>/objects/<oid>`, where `oid` is the
//! last `/`-separated segment of the identifier.

use crate::error::DownloadError;
use url::Url;

/// Path segment under the base URL that holds objects.
const OBJECTS_SEGMENT: &str = "objects";

/// Returns the object id carried by an identifier (`"whatever/oid"` → `"oid"`).
pub fn object_id(id: &str) -> Option<&str> {
    let oid = id.trim().rsplit('/').next()?;
    if oid.is_empty() {
        None
    } else {
        Some(oid)
    }
}

/// Parses and checks a base or link URL: absolute, http(s), usable as a base.
pub fn parse_http_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" if !url.cannot_be_a_base() => Ok(url),
        scheme => Err(format!("unsupported scheme {:?}", scheme)),
    }
}

/// Builds the GET URL for `id` under `base`.
///
/// Pure and deterministic. Fails with [`DownloadError::Configuration`] when
/// the base URL is not an absolute http(s) URL or the identifier carries no
/// object id.
pub fn object_url(base: &str, id: &str) -> Result<Url, DownloadError> {
    let oid = object_id(id)
        .ok_or_else(|| DownloadError::configuration(format!("invalid object identifier {:?}", id)))?;
    let mut url = parse_http_url(base)
        .map_err(|e| DownloadError::configuration(format!("invalid base URL {:?}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| DownloadError::configuration(format!("base URL {:?} cannot hold a path", base)))?
        .pop_if_empty()
        .push(OBJECTS_SEGMENT)
        .push(oid);
    Ok(url)
}
