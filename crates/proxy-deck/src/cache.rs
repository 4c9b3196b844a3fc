//! Persistent, content-addressed cache of card-database responses.
//!
//! Each request URL (with its query parameters encoded in a fixed order) is
//! hashed into a key. Entries are written once and the whole map is flushed
//! to disk after every insert, so an interrupted run only loses the request
//! that was in flight. There is no expiry.

use crate::card::DEFAULT_BORDER_COLOR;
use crate::fetch::{Fetcher, HttpResponse};
use crate::types::{DeckError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the cache inside the cache directory
pub const CACHE_FILE_NAME: &str = "cards_fetched.cache";

/// One cached HTTP response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Full request URL including the encoded query string
    pub url: String,
    #[serde(default)]
    pub params: Option<BTreeMap<String, String>>,
    pub status_code: u16,
    #[serde(default)]
    pub content: Value,
    #[serde(default = "default_border_color")]
    pub border_color: [u8; 3],
    #[serde(default = "default_quality_score")]
    pub image_quality_score: i32,
    #[serde(default = "default_quality")]
    pub image_quality: String,
}

fn default_border_color() -> [u8; 3] {
    DEFAULT_BORDER_COLOR
}

fn default_quality_score() -> i32 {
    -1
}

fn default_quality() -> String {
    "unknown".to_string()
}

impl CacheEntry {
    fn from_response(url: String, params: Option<BTreeMap<String, String>>, response: HttpResponse) -> Self {
        let content = match serde_json::from_slice(&response.body) {
            Ok(value) => value,
            Err(e) => {
                log::debug!("Response from {url} is not JSON ({e}), caching as null");
                Value::Null
            }
        };

        Self {
            url,
            params,
            status_code: response.status,
            content,
            border_color: default_border_color(),
            image_quality_score: default_quality_score(),
            image_quality: default_quality(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }

    /// Read a string field from the JSON content
    pub fn field(&self, key: &str) -> Option<&str> {
        self.content.get(key).and_then(Value::as_str)
    }
}

/// Access to database responses. Implemented by [`ResponseCache`]; kept as a
/// seam so the lookup logic does not depend on how responses are stored.
pub trait ResponseStore {
    /// Cached GET: identical `(url, params)` never reach the network twice.
    fn get(&mut self, url: &str, params: &[(&str, &str)]) -> Result<CacheEntry>;

    /// Uncached GET, for endpoints whose answer must differ per call.
    fn get_uncached(&mut self, url: &str) -> Result<HttpResponse>;
}

/// Build the canonical request URL: parameters are sorted by key, then
/// form-urlencoded onto `url`.
pub fn request_url(url: &str, params: &[(&str, &str)]) -> Result<String> {
    if params.is_empty() {
        return Ok(url.to_string());
    }

    let mut sorted = params.to_vec();
    sorted.sort();

    let parsed = reqwest::Url::parse_with_params(url, sorted).map_err(|e| DeckError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    Ok(parsed.to_string())
}

/// Stable key for a canonical request URL
pub fn cache_key(request_url: &str) -> String {
    let digest = Sha256::digest(request_url.as_bytes());
    format!("{digest:x}")
}

/// Write-through response cache persisted as a single JSON object
pub struct ResponseCache<F> {
    path: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
    fetcher: F,
    network_requests: usize,
}

impl<F: Fetcher> ResponseCache<F> {
    /// Load the cache from `path`, starting empty if the file does not exist.
    ///
    /// A file that exists but cannot be parsed is a `CacheCorrupt` error.
    pub fn open(path: impl Into<PathBuf>, fetcher: F) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            serde_json::from_str(&contents).map_err(|source| DeckError::CacheCorrupt {
                path: path.clone(),
                source,
            })?
        } else {
            BTreeMap::new()
        };

        log::debug!("Loaded {} cached responses from {}", entries.len(), path.display());

        Ok(Self {
            path,
            entries,
            fetcher,
            network_requests: 0,
        })
    }

    /// Open `<dir>/cards_fetched.cache`
    pub fn open_in_dir(dir: impl AsRef<Path>, fetcher: F) -> Result<Self> {
        Self::open(dir.as_ref().join(CACHE_FILE_NAME), fetcher)
    }

    /// Look up an entry without touching the network
    pub fn lookup(&self, url: &str, params: &[(&str, &str)]) -> Option<&CacheEntry> {
        let request = request_url(url, params).ok()?;
        self.entries.get(&cache_key(&request))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Number of requests this instance sent to the network
    pub fn network_requests(&self) -> usize {
        self.network_requests
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("cache.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl<F: Fetcher> ResponseStore for ResponseCache<F> {
    fn get(&mut self, url: &str, params: &[(&str, &str)]) -> Result<CacheEntry> {
        let request = request_url(url, params)?;
        let key = cache_key(&request);

        if let Some(entry) = self.entries.get(&key) {
            log::debug!("Cache hit: {request}");
            return Ok(entry.clone());
        }

        log::debug!("Cache miss, fetching: {request}");
        let response = self.fetcher.get(&request)?;
        self.network_requests += 1;

        let params: Option<BTreeMap<String, String>> = (!params.is_empty()).then(|| {
            params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        });
        let entry = CacheEntry::from_response(request, params, response);

        self.entries.insert(key, entry.clone());
        self.persist()?;
        Ok(entry)
    }

    fn get_uncached(&mut self, url: &str) -> Result<HttpResponse> {
        self.network_requests += 1;
        self.fetcher.get(url)
    }
}
