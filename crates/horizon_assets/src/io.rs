use std::path::{Path, PathBuf};
use std::sync::Arc;

use horizon_core::AssetError;

/// Asset reader trait.
/// Fetches the raw bytes behind an asset URL, from local files or the network.
///
/// Readers classify their failures: a missing asset is reported as
/// [`AssetError::NotFound`] or [`AssetError::HttpStatus`], a broken transfer
/// as [`AssetError::Transport`]. The cache uses that classification to decide
/// whether to retry.
pub trait AssetReader: Send + Sync + 'static {
    fn read_bytes(
        &self,
        uri: &str,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, AssetError>> + Send;
}

impl<R: AssetReader> AssetReader for Arc<R> {
    fn read_bytes(
        &self,
        uri: &str,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, AssetError>> + Send {
        (**self).read_bytes(uri)
    }
}

/// Local file reader rooted at the site's static asset directory.
pub struct FileAssetReader {
    root_path: PathBuf,
}

impl FileAssetReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let root_path = if path.is_file() {
            path.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };
        Self { root_path }
    }

    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

impl AssetReader for FileAssetReader {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>, AssetError> {
        let path = self.root_path.join(uri.trim_start_matches('/'));
        tokio::fs::read(&path).await.map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => AssetError::NotFound(uri.to_string()),
            _ => AssetError::Transport {
                url: uri.to_string(),
                reason: err.to_string(),
            },
        })
    }
}

/// HTTP reader resolving asset paths against a base URL.
#[cfg(feature = "http")]
pub struct HttpAssetReader {
    root_url: url::Url,
}

#[cfg(feature = "http")]
impl HttpAssetReader {
    pub fn new(url_str: &str) -> Result<Self, AssetError> {
        let mut root_url =
            url::Url::parse(url_str).map_err(|_| AssetError::InvalidUrl(url_str.to_string()))?;
        if !root_url.path().ends_with('/') {
            let path = format!("{}/", root_url.path());
            root_url.set_path(&path);
        }
        Ok(Self { root_url })
    }

    #[inline]
    #[must_use]
    pub fn root_url(&self) -> &url::Url {
        &self.root_url
    }
}

#[cfg(feature = "http")]
impl AssetReader for HttpAssetReader {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>, AssetError> {
        let url = self
            .root_url
            .join(uri.trim_start_matches('/'))
            .map_err(|_| AssetError::InvalidUrl(uri.to_string()))?;

        let response = ehttp::fetch_async(ehttp::Request::get(url.as_str()))
            .await
            .map_err(|reason| AssetError::Transport {
                url: uri.to_string(),
                reason,
            })?;

        if !response.ok {
            return Err(match response.status {
                404 | 410 => AssetError::NotFound(uri.to_string()),
                status => AssetError::HttpStatus {
                    url: uri.to_string(),
                    status,
                },
            });
        }
        Ok(response.bytes)
    }
}

/// Reader variants selected from configuration.
/// Avoids a trait object at the composition root.
#[derive(Clone)]
pub enum AssetReaderVariant {
    File(Arc<FileAssetReader>),
    #[cfg(feature = "http")]
    Http(Arc<HttpAssetReader>),
}

impl AssetReaderVariant {
    /// Picks the reader from an asset root: `http(s)://` roots use HTTP,
    /// anything else is a local directory.
    pub fn from_source(source: &str) -> Result<Self, AssetError> {
        if source.starts_with("http://") || source.starts_with("https://") {
            #[cfg(feature = "http")]
            {
                Ok(Self::Http(Arc::new(HttpAssetReader::new(source)?)))
            }
            #[cfg(not(feature = "http"))]
            {
                Err(AssetError::InvalidUrl(format!(
                    "{source} (HTTP support is disabled; enable the `http` feature)"
                )))
            }
        } else {
            Ok(Self::File(Arc::new(FileAssetReader::new(source))))
        }
    }
}

impl AssetReader for AssetReaderVariant {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>, AssetError> {
        match self {
            Self::File(r) => r.read_bytes(uri).await,
            #[cfg(feature = "http")]
            Self::Http(r) => r.read_bytes(uri).await,
        }
    }
}
