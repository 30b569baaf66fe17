//! HTTP-backed filesystem façade.
//!
//! Translates path-addressed reads into autoindex GETs and range GETs,
//! caching directory snapshots with a TTL. Entries in the second half of
//! their TTL window are refreshed in the background so steady traffic
//! rarely pays a synchronous fetch.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use httpfs_cache::SharedLruCache;
use httpfs_client::{ClientConfig, HttpClient};
use httpfs_core::{epoch_secs, parse_autoindex, percent_encode, DirEntry};

use crate::FsError;

/// Soft limit on cached directory snapshots.
const META_CACHE_SIZE: usize = 4096;

/// Slack above the soft limit before eviction runs.
const META_CACHE_ELASTICITY: usize = 512;

/// Default directory metadata TTL in seconds.
pub const DEFAULT_META_TTL: u64 = 60;

/// Façade configuration.
#[derive(Debug, Clone)]
pub struct FsConfig {
    /// Base URL of the remote server
    pub url: String,
    /// Directory metadata TTL in seconds
    pub meta_cache_ttl: u64,
    /// HTTP client tuning
    pub client: ClientConfig,
}

impl FsConfig {
    /// Creates a configuration with default TTL and client settings.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            meta_cache_ttl: DEFAULT_META_TTL,
            client: ClientConfig::default(),
        }
    }
}

/// The HTTP-backed filesystem.
///
/// Owns one HTTP client and one directory metadata cache for its whole
/// lifetime. Safe to drive from many threads at once.
pub struct HttpFs {
    url: String,
    ttl: i64,
    client: HttpClient,
    metacache: Arc<SharedLruCache<String, DirEntry>>,
}

impl HttpFs {
    /// Creates a façade over `config.url`.
    pub fn new(config: FsConfig) -> Result<Self, FsError> {
        Ok(Self {
            url: config.url,
            ttl: config.meta_cache_ttl as i64,
            client: HttpClient::new(config.client)?,
            metacache: Arc::new(SharedLruCache::new(
                META_CACHE_SIZE,
                META_CACHE_ELASTICITY,
            )),
        })
    }

    /// The request target for a filesystem path.
    fn target(&self, path: &str) -> String {
        format!("{}{}", self.url, percent_encode(path))
    }

    /// Returns the directory snapshot for `path`.
    ///
    /// A fresh cache hit is served as-is; a hit in the second half of
    /// its TTL window additionally schedules one background refresh. An
    /// expired hit is dropped and re-fetched synchronously.
    pub fn read_dir(&self, path: &str) -> Result<DirEntry, FsError> {
        let key = path.to_string();
        let now = epoch_secs();

        if let Some(entry) = self.metacache.try_get(&key) {
            if entry.fetch_time > now - self.ttl {
                if entry.fetch_time < now - self.ttl / 2 {
                    self.spawn_refresh(path);
                }
                trace!(path = path, "Directory cache hit");
                return Ok(entry);
            }
            self.metacache.remove(&key);
        }

        debug!(path = path, "Fetching directory listing");
        let body = self.client.get(&self.target(path), 0, 0)?;
        let entry = parse_autoindex(&body)?;
        self.metacache.insert(key, entry.clone());
        Ok(entry)
    }

    /// Schedules a fire-and-forget refresh of one directory snapshot.
    ///
    /// Failures are silent: a stale-but-present snapshot beats evicting
    /// it on a flaky server. Overlapping refreshes for the same path are
    /// tolerated; the last one to finish wins.
    fn spawn_refresh(&self, path: &str) {
        let accumulator = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&accumulator);
        let cache = Arc::clone(&self.metacache);
        let key = path.to_string();

        trace!(path = path, "Scheduling directory refresh");
        self.client.submit(
            &self.target(path),
            0,
            0,
            Box::new(move |chunk: &[u8]| {
                sink.lock().extend_from_slice(chunk);
                true
            }),
            Box::new(move |ok| {
                if !ok {
                    return;
                }
                if let Ok(entry) = parse_autoindex(&accumulator.lock()) {
                    cache.insert(key, entry);
                }
            }),
        );
    }

    /// Reads up to `size` bytes of `path` starting at `offset`.
    ///
    /// Short reads are valid at end of file; a body longer than the
    /// requested window means the server ignored the range and is
    /// rejected.
    pub fn read_block(&self, path: &str, offset: u64, size: u64) -> Result<Vec<u8>, FsError> {
        let body = self.client.get(&self.target(path), offset, size)?;
        if body.len() as u64 > size {
            return Err(FsError::OversizeResponse {
                got: body.len(),
                want: size,
            });
        }
        Ok(body)
    }
}
