//! Requests, responses and origin-relative path resolution
//!
//! Cache keys are canonical absolute URLs (`{origin}/{path}`); the logical
//! path is what the manifest is keyed by. The root document uses the
//! reserved path `/`.

use crate::error::{AssetSyncError, AssetSyncResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Reserved manifest path for the application's root document
pub const ROOT_PATH: &str = "/";

/// Query marker used by deployments to bust intermediate HTTP caches
const CACHE_BUST_MARKER: &str = "?v=";

/// The origin all managed resources are served from (scheme + host + port)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin(String);

impl Origin {
    /// Parse an origin, dropping any trailing slash
    pub fn new(url: impl AsRef<str>) -> AssetSyncResult<Self> {
        let url = url.as_ref().trim().trim_end_matches('/');

        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .ok_or_else(|| {
                AssetSyncError::ManifestInvalid(format!(
                    "origin '{}' must start with http:// or https://",
                    url
                ))
            })?;

        if rest.is_empty() || rest.contains(['/', '?', '#']) {
            return Err(AssetSyncError::ManifestInvalid(format!(
                "origin '{}' must be scheme and host only",
                url
            )));
        }

        Ok(Self(url.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical cache key for a logical path
    pub fn url_for(&self, path: &str) -> String {
        if path == ROOT_PATH {
            format!("{}/", self.0)
        } else {
            format!("{}/{}", self.0, path.trim_start_matches('/'))
        }
    }

    /// Logical path of a stored cache key.
    ///
    /// Returns `None` when the key does not belong to this origin.
    pub fn path_of(&self, key: &str) -> Option<String> {
        let rest = key.strip_prefix(self.0.as_str())?;
        if rest.is_empty() {
            return Some(ROOT_PATH.to_string());
        }
        let path = rest.strip_prefix('/')?;
        if path.is_empty() {
            Some(ROOT_PATH.to_string())
        } else {
            Some(path.to_string())
        }
    }

    /// Resolve an inbound request URL to its logical path.
    ///
    /// Strips the origin and a trailing `?v=` cache-buster. The bare origin,
    /// fragment-only URLs and empty paths all resolve to [`ROOT_PATH`].
    pub fn resolve(&self, url: &str) -> Option<String> {
        if url == self.0 || url.starts_with(&format!("{}/#", self.0)) {
            return Some(ROOT_PATH.to_string());
        }

        let mut path = self.path_of(url)?;
        if let Some(idx) = path.find(CACHE_BUST_MARKER) {
            path.truncate(idx);
        }
        if path.is_empty() {
            path = ROOT_PATH.to_string();
        }
        Some(path)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// HTTP request method
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Other(String),
}

impl FromStr for Method {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "HEAD" => Self::Head,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "PATCH" => Self::Patch,
            "DELETE" => Self::Delete,
            "OPTIONS" => Self::Options,
            other => Self::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Head => write!(f, "HEAD"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Patch => write!(f, "PATCH"),
            Self::Delete => write!(f, "DELETE"),
            Self::Options => write!(f, "OPTIONS"),
            Self::Other(m) => write!(f, "{}", m),
        }
    }
}

/// An outbound resource request intercepted by the router
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
        }
    }

    /// Shorthand for a `GET` request
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }
}

/// A response as returned by the network and stored in a cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// HTTP status code
    pub status: u16,

    /// Response headers (lower-cased names)
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Response payload
    #[serde(skip)]
    pub body: Vec<u8>,
}

impl Response {
    /// Create a response with no headers
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Attach a header
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Whether the status is in the 2xx range, i.e. cacheable
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
