//! The on-disk build cache.
//!
//! Layout under the cache root:
//!
//! ```text
//! data/<xx>/<content hash>   raw payload bytes
//! entries/<xx>/<key>         bincode EntryRecord pointing at a payload
//! trim.txt                   unix time of the last trim
//! ```
//!
//! Every file is written to a temporary file in its final directory and
//! renamed into place, so concurrent writers of the same key are safe and a
//! reader never observes a partial write.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use prism_common::{ActionId, ContentHash};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::entry::{CacheEntry, EntryRecord};
use crate::error::CacheError;
use crate::keys::{artifact_key, metadata_key};
use crate::metadata::DimensionMetadata;

const DATA_DIR: &str = "data";
const ENTRIES_DIR: &str = "entries";
const TRIM_FILE: &str = "trim.txt";

/// How stale an entry's modification time may get before a read refreshes it.
const MTIME_REFRESH: Duration = Duration::from_secs(60 * 60);
/// Minimum time between two trims.
const TRIM_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
/// Entries unused for this long are removed by a trim.
const TRIM_LIMIT: Duration = Duration::from_secs(5 * 24 * 60 * 60);

/// Result of a [`BuildCache::trim`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrimStats {
    /// The trim did not run because the last one was too recent.
    pub skipped: bool,
    /// Entry records removed.
    pub entries_removed: usize,
    /// Payload files removed.
    pub data_removed: usize,
}

/// Content-addressed store of dimension artifacts and metadata.
///
/// Safe to share between processes; not meant to be shared between threads
/// of one process (the engine is single-threaded).
pub struct BuildCache {
    root: PathBuf,
    engine_version: String,
}

impl BuildCache {
    /// Opens (creating if needed) the cache rooted at `root`.
    pub fn open(root: &Path, engine_version: &str) -> Result<Self, CacheError> {
        for dir in [root.join(DATA_DIR), root.join(ENTRIES_DIR)] {
            fs::create_dir_all(&dir).map_err(|e| CacheError::io(&dir, e))?;
        }
        Ok(Self {
            root: root.to_path_buf(),
            engine_version: engine_version.to_string(),
        })
    }

    /// Returns the cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &ActionId) -> PathBuf {
        let name = key.to_string();
        self.root.join(ENTRIES_DIR).join(&name[..2]).join(name)
    }

    fn data_path(&self, hash: &ContentHash) -> PathBuf {
        let name = hash.to_string();
        self.root.join(DATA_DIR).join(&name[..2]).join(name)
    }

    /// Looks up `key`, reporting exactly why an entry is unusable.
    pub fn lookup(&self, key: &ActionId) -> Result<CacheEntry, CacheError> {
        let entry_path = self.entry_path(key);
        let raw = match fs::read(&entry_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CacheError::Missing {
                    key: key.to_string(),
                })
            }
            Err(e) => return Err(CacheError::io(entry_path, e)),
        };
        let record = EntryRecord::decode(&raw, &entry_path, &self.engine_version)?;
        let path = self.data_path(&record.output);
        let size = fs::metadata(&path)
            .map_err(|e| CacheError::io(&path, e))?
            .len();
        if size != record.size {
            return Err(CacheError::ChecksumMismatch {
                path,
                expected: format!("{} bytes", record.size),
                actual: format!("{size} bytes"),
            });
        }
        Ok(CacheEntry {
            key: *key,
            path,
            output: record.output,
            size,
        })
    }

    /// Returns the entry for `key`, or `None` on any kind of miss.
    pub fn get(&self, key: &ActionId) -> Option<CacheEntry> {
        match self.lookup(key) {
            Ok(entry) => {
                self.refresh(key, &entry.path);
                Some(entry)
            }
            Err(CacheError::Missing { .. }) => None,
            Err(e) => {
                debug!(key = %key, error = %e, "ignoring unusable cache entry");
                None
            }
        }
    }

    /// Returns the payload bytes for `key`, verifying their hash.
    pub fn get_bytes(&self, key: &ActionId) -> Option<Vec<u8>> {
        let entry = self.get(key)?;
        let data = fs::read(&entry.path).ok()?;
        if ContentHash::from_bytes(&data) != entry.output {
            debug!(key = %key, path = %entry.path.display(), "cached payload hash mismatch");
            return None;
        }
        Some(data)
    }

    /// Stores `data` under `key`, replacing any previous entry.
    pub fn put(&self, key: &ActionId, data: &[u8]) -> Result<CacheEntry, CacheError> {
        let record = EntryRecord::new(data, &self.engine_version);
        let path = self.data_path(&record.output);
        let present = fs::metadata(&path).is_ok_and(|m| m.len() == record.size);
        if present {
            touch(&path);
        } else {
            write_atomic(&path, data)?;
        }
        write_atomic(&self.entry_path(key), &record.encode()?)?;
        Ok(CacheEntry {
            key: *key,
            path,
            output: record.output,
            size: record.size,
        })
    }

    /// Returns the cached artifact of the dimension action `id`.
    pub fn get_artifact(&self, id: &ActionId) -> Option<CacheEntry> {
        self.get(&artifact_key(id))
    }

    /// Stores the compiled artifact of the dimension action `id`.
    pub fn put_artifact(&self, id: &ActionId, data: &[u8]) -> Result<CacheEntry, CacheError> {
        self.put(&artifact_key(id), data)
    }

    /// Returns the side metadata of the dimension action `id`.
    pub fn get_metadata(&self, id: &ActionId) -> Option<DimensionMetadata> {
        let key = metadata_key(id);
        let bytes = self.get_bytes(&key)?;
        match serde_json::from_slice(&bytes) {
            Ok(meta) => Some(meta),
            Err(e) => {
                debug!(key = %key, error = %e, "ignoring undecodable dimension metadata");
                None
            }
        }
    }

    /// Stores the side metadata of the dimension action `id`.
    pub fn put_metadata(&self, id: &ActionId, meta: &DimensionMetadata) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(meta).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        self.put(&metadata_key(id), &bytes).map(|_| ())
    }

    /// Removes entries unused for five days, at most once a day.
    pub fn trim(&self) -> Result<TrimStats, CacheError> {
        self.trim_at(SystemTime::now(), false)
    }

    /// Trims as of `now`; `force` ignores the once-a-day limit.
    pub fn trim_at(&self, now: SystemTime, force: bool) -> Result<TrimStats, CacheError> {
        let trim_file = self.root.join(TRIM_FILE);
        if !force {
            if let Some(last) = read_trim_time(&trim_file) {
                if now.duration_since(last).is_ok_and(|d| d < TRIM_INTERVAL) {
                    return Ok(TrimStats {
                        skipped: true,
                        ..TrimStats::default()
                    });
                }
            }
        }

        let cutoff = now.checked_sub(TRIM_LIMIT).unwrap_or(UNIX_EPOCH);
        let stats = TrimStats {
            skipped: false,
            entries_removed: remove_older_than(&self.root.join(ENTRIES_DIR), cutoff)?,
            data_removed: remove_older_than(&self.root.join(DATA_DIR), cutoff)?,
        };

        let secs = now.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
        write_atomic(&trim_file, secs.to_string().as_bytes())?;
        debug!(
            entries = stats.entries_removed,
            data = stats.data_removed,
            "trimmed build cache"
        );
        Ok(stats)
    }

    /// Bumps the modification times of a hit when they are over an hour old.
    fn refresh(&self, key: &ActionId, data_path: &Path) {
        let entry_path = self.entry_path(key);
        let stale = fs::metadata(&entry_path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| SystemTime::now().duration_since(t).ok())
            .is_some_and(|age| age > MTIME_REFRESH);
        if stale {
            touch(&entry_path);
            touch(data_path);
        }
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<(), CacheError> {
    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(|e| CacheError::io(dir, e))?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| CacheError::io(dir, e))?;
    tmp.write_all(data)
        .map_err(|e| CacheError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| CacheError::io(path, e.error))?;
    Ok(())
}

fn touch(path: &Path) {
    let result = fs::File::options()
        .write(true)
        .open(path)
        .and_then(|f| f.set_modified(SystemTime::now()));
    if let Err(e) = result {
        debug!(path = %path.display(), error = %e, "failed to refresh modification time");
    }
}

fn read_trim_time(path: &Path) -> Option<SystemTime> {
    let text = fs::read_to_string(path).ok()?;
    let secs: u64 = text.trim().parse().ok()?;
    UNIX_EPOCH.checked_add(Duration::from_secs(secs))
}

/// Removes files in the two-level fan-out under `dir` last modified before
/// `cutoff`. Returns the number removed.
fn remove_older_than(dir: &Path, cutoff: SystemTime) -> Result<usize, CacheError> {
    let shards = match fs::read_dir(dir) {
        Ok(shards) => shards,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(CacheError::io(dir, e)),
    };
    let mut removed = 0;
    for shard in shards.flatten() {
        let Ok(files) = fs::read_dir(shard.path()) else {
            continue;
        };
        for file in files.flatten() {
            let old = file
                .metadata()
                .and_then(|m| m.modified())
                .is_ok_and(|t| t < cutoff);
            if old && fs::remove_file(file.path()).is_ok() {
                removed += 1;
            }
        }
    }
    Ok(removed)
}
