//! Cache for incremental runs.
//!
//! A file that came out of a run clean (no rule matched, or it was just
//! rewritten to its fixpoint) is recorded here; the next run skips it as
//! long as the bytes are unchanged and the same transformation plan is in
//! effect. Changed plans invalidate everything, so the cache can never hide
//! a newly enabled rule.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Freshness record for one clean file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub content_hash: String,
    /// Last modified time as a Unix timestamp.
    pub mtime: u64,
    pub size: u64,
}

impl CacheEntry {
    /// Captures the current on-disk state of `path`. Returns `None` when the
    /// file cannot be read, in which case nothing is cached.
    pub fn capture(path: &Path) -> Option<CacheEntry> {
        let metadata = fs::metadata(path).ok()?;
        Some(CacheEntry {
            content_hash: hash_file(path).ok()?,
            mtime: unix_mtime(&metadata),
            size: metadata.len(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunCache {
    /// Cache format version; a mismatch discards the file wholesale.
    pub version: u32,
    /// Signature of the transformation plan the entries were recorded under.
    #[serde(default)]
    pub plan_signature: String,
    /// Entries keyed by file path.
    pub entries: HashMap<String, CacheEntry>,
}

impl RunCache {
    const CACHE_VERSION: u32 = 1;

    pub fn new() -> RunCache {
        RunCache {
            version: Self::CACHE_VERSION,
            plan_signature: String::new(),
            entries: HashMap::new(),
        }
    }

    /// Loads the cache, falling back to an empty one on a format version
    /// mismatch. IO and parse errors surface to the caller.
    pub fn load(path: &Path) -> Result<RunCache, std::io::Error> {
        let raw = fs::read(path)?;
        let cache: RunCache = serde_json::from_slice(&raw)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        if cache.version != Self::CACHE_VERSION {
            return Ok(RunCache::new());
        }
        Ok(cache)
    }

    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_vec(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(path, raw)
    }

    /// Binds the cache to a transformation plan. Entries recorded under a
    /// different plan are dropped.
    pub fn set_plan_signature(&mut self, signature: &str) {
        if self.plan_signature != signature {
            self.entries.clear();
            self.plan_signature = signature.to_string();
        }
    }

    /// Whether `path` is known clean: metadata fast path first, content hash
    /// as the slower fallback when only the timestamp moved.
    pub fn is_clean(&self, path: &Path) -> bool {
        let key = path.to_string_lossy();
        let Some(entry) = self.entries.get(key.as_ref()) else {
            return false;
        };
        if let Ok(metadata) = fs::metadata(path) {
            if entry.mtime == unix_mtime(&metadata) && entry.size == metadata.len() {
                return true;
            }
            if let Ok(content_hash) = hash_file(path) {
                return entry.content_hash == content_hash;
            }
        }
        false
    }

    pub fn store(&mut self, path: &Path, entry: CacheEntry) {
        self.entries.insert(path.to_string_lossy().to_string(), entry);
    }

    /// Drops entries for files that no longer exist.
    pub fn prune(&mut self) {
        self.entries.retain(|path, _| Path::new(path).exists());
    }
}

fn unix_mtime(metadata: &fs::Metadata) -> u64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn hash_file(path: &Path) -> Result<String, std::io::Error> {
    let content = fs::read(path)?;
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    Ok(format!("{:x}", hasher.finish()))
}

/// Stable-ish hash of any serializable value, used for plan signatures.
pub fn signature_of(value: &impl Serialize) -> String {
    let json = serde_json::to_string(value).unwrap_or_default();
    let mut hasher = DefaultHasher::new();
    json.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}
