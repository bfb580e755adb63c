//! Image resource fetching
//!
//! Snapshot extraction and rasterization fetch images through the
//! [`ResourceFetcher`] trait so hosts can choose between network access
//! ([`HttpFetcher`]) and pre-registered bytes ([`MapFetcher`]).

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};

use crate::error::{FetchError, Result};

/// Bytes of a fetched resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedResource {
    /// Response body
    pub bytes: Vec<u8>,
    /// Declared content type, if the source reported one
    pub content_type: Option<String>,
}

impl FetchedResource {
    /// Create a resource from bytes and an optional content type
    pub fn new(bytes: impl Into<Vec<u8>>, content_type: Option<&str>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.map(str::to_string),
        }
    }
}

/// Fetches the resource an image `src` refers to
pub trait ResourceFetcher: Send + Sync {
    /// Fetch `src`, which may be absolute, relative or a `data:` URI
    fn fetch(&self, src: &str) -> impl Future<Output = Result<FetchedResource>> + Send;
}

impl<T: ResourceFetcher> ResourceFetcher for Arc<T> {
    fn fetch(&self, src: &str) -> impl Future<Output = Result<FetchedResource>> + Send {
        (**self).fetch(src)
    }
}

impl<T: ResourceFetcher> ResourceFetcher for &T {
    fn fetch(&self, src: &str) -> impl Future<Output = Result<FetchedResource>> + Send {
        (**self).fetch(src)
    }
}

/// Where relative references are resolved
#[derive(Debug, Clone)]
enum Base {
    Url(Url),
    Dir(PathBuf),
}

/// Fetches over HTTP(S) and from the local filesystem.
///
/// Requests carry no timeout and are never retried.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    base: Option<Base>,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    /// Create a fetcher that resolves relative paths against the working
    /// directory
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base: None,
        }
    }

    /// Resolve relative references against a page URL
    pub fn with_base_url(mut self, base: &str) -> Result<Self> {
        let url = Url::parse(base)
            .map_err(|e| FetchError::InvalidReference(format!("{base}: {e}")))?;
        self.base = Some(Base::Url(url));
        Ok(self)
    }

    /// Resolve relative references against a directory
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base = Some(Base::Dir(dir.into()));
        self
    }

    async fn get(&self, url: Url) -> Result<FetchedResource> {
        match url.scheme() {
            "http" | "https" => {}
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| FetchError::InvalidReference(url.to_string()))?;
                return read_file(&path).await;
            }
            "data" => return decode_data_uri(url.as_str()),
            other => return Err(FetchError::UnsupportedScheme(other.to_string())),
        }

        tracing::debug!(%url, "fetching image");
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();
        Ok(FetchedResource {
            bytes,
            content_type,
        })
    }
}

impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, src: &str) -> Result<FetchedResource> {
        let src = src.trim();
        if src.starts_with("data:") {
            return decode_data_uri(src);
        }
        if let Ok(url) = Url::parse(src) {
            return self.get(url).await;
        }
        match &self.base {
            Some(Base::Url(base)) => {
                let url = base
                    .join(src)
                    .map_err(|e| FetchError::InvalidReference(format!("{src}: {e}")))?;
                self.get(url).await
            }
            Some(Base::Dir(dir)) => read_file(&dir.join(strip_query(src))).await,
            None => read_file(Path::new(strip_query(src))).await,
        }
    }
}

fn strip_query(src: &str) -> &str {
    src.split(['?', '#']).next().unwrap_or(src)
}

async fn read_file(path: &Path) -> Result<FetchedResource> {
    let bytes = tokio::fs::read(path).await.map_err(|source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(FetchedResource {
        bytes,
        content_type: mime_from_extension(path).map(str::to_string),
    })
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        _ => return None,
    };
    Some(mime)
}

/// Decode a `data:` URI into its bytes and declared media type
pub fn decode_data_uri(uri: &str) -> Result<FetchedResource> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| FetchError::InvalidDataUri(truncate(uri)))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| FetchError::InvalidDataUri(truncate(uri)))?;

    let (media_type, is_base64) = match meta.strip_suffix(";base64") {
        Some(media) => (media, true),
        None => (meta, false),
    };

    let bytes = if is_base64 {
        let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| FetchError::InvalidDataUri(e.to_string()))?
    } else {
        urlencoding::decode_binary(payload.as_bytes()).into_owned()
    };

    let content_type = if media_type.is_empty() {
        "text/plain;charset=US-ASCII".to_string()
    } else {
        media_type.to_string()
    };

    Ok(FetchedResource {
        bytes,
        content_type: Some(content_type),
    })
}

fn truncate(uri: &str) -> String {
    uri.chars().take(48).collect()
}

/// Serves resources registered in memory
#[derive(Debug, Clone, Default)]
pub struct MapFetcher {
    resources: HashMap<String, FetchedResource>,
}

impl MapFetcher {
    /// Create an empty fetcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource for an exact `src`
    pub fn insert(&mut self, src: impl Into<String>, resource: FetchedResource) {
        self.resources.insert(src.into(), resource);
    }

    /// Builder form of [`MapFetcher::insert`]
    pub fn with(
        mut self,
        src: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
        content_type: Option<&str>,
    ) -> Self {
        self.insert(src, FetchedResource::new(bytes, content_type));
        self
    }

    /// Number of registered resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether no resources are registered
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl ResourceFetcher for MapFetcher {
    async fn fetch(&self, src: &str) -> Result<FetchedResource> {
        if src.starts_with("data:") {
            return decode_data_uri(src);
        }
        self.resources
            .get(src)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(src.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_base64_data_uri() {
        let resource = decode_data_uri("data:image/png;base64,iVBORw0K").unwrap();
        assert_eq!(resource.content_type.as_deref(), Some("image/png"));
        assert_eq!(&resource.bytes[1..4], b"PNG");
    }

    #[test]
    fn test_decode_plain_data_uri() {
        let resource = decode_data_uri("data:,Hello%2C%20World").unwrap();
        assert_eq!(resource.bytes, b"Hello, World");
        assert_eq!(
            resource.content_type.as_deref(),
            Some("text/plain;charset=US-ASCII")
        );
    }

    #[test]
    fn test_plain_data_uri_keeps_broken_escapes() {
        let resource = decode_data_uri("data:text/plain,%41b%zz%2").unwrap();
        assert_eq!(resource.bytes, b"Ab%zz%2");
        assert_eq!(resource.content_type.as_deref(), Some("text/plain"));

        let resource = decode_data_uri("data:,%C3%A9%FF").unwrap();
        assert_eq!(resource.bytes, [0xC3, 0xA9, 0xFF]);
    }

    #[test]
    fn test_invalid_data_uri() {
        assert!(matches!(
            decode_data_uri("data:image/png;base64"),
            Err(FetchError::InvalidDataUri(_))
        ));
        assert!(decode_data_uri("data:image/png;base64,***").is_err());
    }

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(mime_from_extension(Path::new("a/b.PNG")), Some("image/png"));
        assert_eq!(mime_from_extension(Path::new("chart.svg")), Some("image/svg+xml"));
        assert_eq!(mime_from_extension(Path::new("notes.txt")), None);
    }

    #[tokio::test]
    async fn test_map_fetcher_serves_registered_sources() {
        let fetcher = MapFetcher::new().with("logo.png", vec![1, 2, 3], Some("image/png"));
        let found = fetcher.fetch("logo.png").await.unwrap();
        assert_eq!(found.bytes, vec![1, 2, 3]);
        assert!(matches!(
            fetcher.fetch("missing.png").await,
            Err(FetchError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_http_fetcher_reads_relative_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pic.gif"), b"GIF89a").unwrap();

        let fetcher = HttpFetcher::new().with_base_dir(dir.path());
        let resource = fetcher.fetch("pic.gif?v=2").await.unwrap();
        assert_eq!(resource.bytes, b"GIF89a");
        assert_eq!(resource.content_type.as_deref(), Some("image/gif"));

        assert!(matches!(
            fetcher.fetch("absent.png").await,
            Err(FetchError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn test_http_fetcher_rejects_unknown_schemes() {
        let fetcher = HttpFetcher::new();
        assert!(matches!(
            fetcher.fetch("ftp://example.com/a.png").await,
            Err(FetchError::UnsupportedScheme(_))
        ));
    }
}
