use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use base64::Engine as _;
use tracing::debug;

use crate::assets::decode::{PreparedImage, decode_image};
use crate::foundation::error::{BadgeError, BadgeResult};

/// Largest image body accepted from any source.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Where logo references are resolved.
///
/// Implementations return the encoded bytes; decoding happens in [`fetch_image`]. Every error is
/// treated by the compositor as a skipped layer.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetch the encoded bytes behind `reference`.
    async fn fetch(&self, reference: &str) -> BadgeResult<Vec<u8>>;
}

/// Fetch and decode one image reference.
pub async fn fetch_image(source: &dyn ImageSource, reference: &str) -> BadgeResult<PreparedImage> {
    let bytes = source.fetch(reference).await?;
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(BadgeError::fetch(format!(
            "image '{}' is {} bytes (max {MAX_IMAGE_BYTES})",
            short_ref(reference),
            bytes.len()
        )));
    }
    decode_image(&bytes)
}

/// HTTP(S) image source.
///
/// Accepts absolute URLs, `data:` URLs, and origin-relative paths (`/uploads/logo.png`) when an
/// origin is configured.
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    client: reqwest::Client,
    origin: Option<String>,
}

impl HttpImageSource {
    /// Build a source with its own client and the given request timeout.
    pub fn new(timeout: Duration) -> BadgeResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BadgeError::fetch(format!("build http client: {e}")))?;
        Ok(Self::with_client(client))
    }

    /// Build a source around an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            origin: None,
        }
    }

    /// Resolve origin-relative references against `origin`.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into().trim_end_matches('/').to_owned());
        self
    }

    fn resolve(&self, reference: &str) -> BadgeResult<String> {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return Ok(reference.to_owned());
        }
        match (&self.origin, reference.starts_with('/')) {
            (Some(origin), true) => Ok(format!("{origin}{reference}")),
            _ => Err(BadgeError::fetch(format!(
                "cannot resolve image reference '{}'",
                short_ref(reference)
            ))),
        }
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, reference: &str) -> BadgeResult<Vec<u8>> {
        if reference.starts_with("data:") {
            return decode_data_url(reference);
        }

        let url = self.resolve(reference)?;
        debug!(url = %url, "fetching image");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BadgeError::fetch(format!("GET {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BadgeError::fetch(format!("GET {url}: status {status}")));
        }
        if let Some(len) = response.content_length()
            && len > MAX_IMAGE_BYTES as u64
        {
            return Err(BadgeError::fetch(format!(
                "GET {url}: body too large ({len} bytes)"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BadgeError::fetch(format!("GET {url}: read body: {e}")))?;
        Ok(bytes.to_vec())
    }
}

/// Filesystem image source rooted at an assets directory.
///
/// References are composition-relative paths; `data:` URLs are accepted as well.
#[derive(Debug, Clone)]
pub struct FsImageSource {
    root: PathBuf,
}

impl FsImageSource {
    /// Source reading below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The assets root.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ImageSource for FsImageSource {
    async fn fetch(&self, reference: &str) -> BadgeResult<Vec<u8>> {
        if reference.starts_with("data:") {
            return decode_data_url(reference);
        }
        let rel = normalize_rel_path(reference)?;
        let path = self.root.join(Path::new(&rel));
        tokio::fs::read(&path)
            .await
            .map_err(|e| BadgeError::fetch(format!("read '{}': {e}", path.display())))
    }
}

/// In-memory source keyed by reference string. Unknown references fail.
#[derive(Debug, Clone, Default)]
pub struct MemoryImageSource {
    images: BTreeMap<String, Vec<u8>>,
}

impl MemoryImageSource {
    /// Empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register encoded bytes under `reference`.
    pub fn insert(&mut self, reference: impl Into<String>, bytes: Vec<u8>) -> &mut Self {
        self.images.insert(reference.into(), bytes);
        self
    }
}

#[async_trait]
impl ImageSource for MemoryImageSource {
    async fn fetch(&self, reference: &str) -> BadgeResult<Vec<u8>> {
        if reference.starts_with("data:") {
            return decode_data_url(reference);
        }
        self.images
            .get(reference)
            .cloned()
            .ok_or_else(|| BadgeError::fetch(format!("no image registered for '{reference}'")))
    }
}

/// Decode a base64 `data:` URL into its bytes.
pub fn decode_data_url(url: &str) -> BadgeResult<Vec<u8>> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| BadgeError::fetch("not a data: URL"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| BadgeError::fetch("data: URL has no payload separator"))?;
    if !meta.split(';').any(|p| p.eq_ignore_ascii_case("base64")) {
        return Err(BadgeError::fetch("only base64 data: URLs are supported"));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| BadgeError::fetch(format!("data: URL payload: {e}")))
}

/// Normalize and validate assets-root-relative paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> BadgeResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(BadgeError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(BadgeError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(BadgeError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(BadgeError::validation(
            "asset path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

/// Reference trimmed for logs (data URLs can be megabytes long).
pub(crate) fn short_ref(reference: &str) -> &str {
    match reference.char_indices().nth(64) {
        Some((idx, _)) => &reference[..idx],
        None => reference,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
