use std::path::PathBuf;
use std::time::Duration;

use log::debug;
use thiserror::Error;

pub const DEFAULT_CATALOG: &str = "./games.json";

const USER_AGENT: &str = concat!("kloopik/", env!("CARGO_PKG_VERSION"));

/// Where the catalog document comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogSource {
    Url(String),
    FilePath(PathBuf),
    Inline(String),
}

impl CatalogSource {
    /// `http(s)://` values become [`CatalogSource::Url`], anything else a file path.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else {
            Self::FilePath(crate::config::expand_tilde(trimmed))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::FilePath(path) => path.display().to_string(),
            Self::Inline(_) => "<inline>".to_string(),
        }
    }
}

impl Default for CatalogSource {
    fn default() -> Self {
        Self::FilePath(PathBuf::from(DEFAULT_CATALOG))
    }
}

#[derive(Clone, Debug)]
pub struct FetchOptions {
    pub timeout_seconds: u64,
    pub proxy: Option<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            proxy: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request for catalog failed: {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("catalog request returned status {status}: {url}")]
    Status { url: String, status: u16 },

    #[error("failed to read catalog file: {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog document: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },
}

pub(crate) async fn fetch(source: &CatalogSource, options: &FetchOptions) -> Result<String, LoadError> {
    match source {
        CatalogSource::Inline(text) => Ok(text.clone()),
        CatalogSource::FilePath(path) => {
            debug!("reading catalog from {}", path.display());
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| LoadError::Io {
                    path: path.display().to_string(),
                    source: e,
                })
        }
        CatalogSource::Url(url) => {
            debug!("fetching catalog from {url}");
            let client = build_client(options, is_loopback(url))?;
            let response = client.get(url).send().await.map_err(|e| LoadError::Http {
                url: url.clone(),
                source: e,
            })?;
            let status = response.status();
            if !status.is_success() {
                return Err(LoadError::Status {
                    url: url.clone(),
                    status: status.as_u16(),
                });
            }
            response.text().await.map_err(|e| LoadError::Http {
                url: url.clone(),
                source: e,
            })
        }
    }
}

fn is_loopback(url: &str) -> bool {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| matches!(h, "localhost" | "127.0.0.1" | "[::1]")))
        .unwrap_or(false)
}

/// Environment proxies are skipped for loopback hosts; an explicit proxy
/// always applies.
fn build_client(options: &FetchOptions, loopback: bool) -> Result<reqwest::Client, LoadError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_static(USER_AGENT),
    );
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );

    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .timeout(Duration::from_secs(options.timeout_seconds.max(1)));

    if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| LoadError::ProxySetup {
            proxy: proxy.to_string(),
            source: e,
        })?;
        builder = builder.proxy(proxy);
    } else if loopback {
        builder = builder.no_proxy();
    }

    builder
        .build()
        .map_err(|e| LoadError::HttpClientBuild { source: e })
}
