use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// On-disk cache of resolved template sources.
///
/// Entries are keyed by template name within the folder list the owning
/// engine was built with, and validated against the source file's
/// modification time on every lookup. The directory is purely a performance
/// cache: deleting it at any time is safe, entries are rewritten on demand.
#[derive(Debug, Clone)]
pub struct SourceCache {
    dir: PathBuf,
    namespace: String,
}

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    source_path: PathBuf,
    modified: DateTime<Utc>,
    cached_at: DateTime<Utc>,
    source: String,
}

impl SourceCache {
    /// Creates the cache directory and a cache scoped to `folders`.
    ///
    /// Engines with different search folders sharing one directory never
    /// serve each other's entries.
    pub fn new(dir: impl Into<PathBuf>, folders: &[PathBuf]) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let mut hasher = Sha256::new();
        for folder in folders {
            hasher.update(folder.display().to_string().as_bytes());
            hasher.update([0]);
        }
        let namespace = hex::encode(hasher.finalize());

        Ok(Self { dir, namespace })
    }

    /// Returns the cached source for `name` if the backing file is unchanged.
    pub fn load(&self, name: &str) -> Option<String> {
        let raw = fs::read_to_string(self.entry_path(name)).ok()?;
        let entry: CacheEntry = serde_json::from_str(&raw).ok()?;

        let modified = file_mtime(&entry.source_path)?;
        if modified != entry.modified {
            debug!("Cache entry for '{name}' is stale.");
            return None;
        }

        Some(entry.source)
    }

    /// Writes an entry for `name`. Failures degrade to a log line; the
    /// resolver falls back to direct reads.
    pub fn store(&self, name: &str, source_path: &Path, source: &str) {
        let Some(modified) = file_mtime(source_path) else {
            return;
        };
        let entry = CacheEntry {
            source_path: source_path.to_path_buf(),
            modified,
            cached_at: Utc::now(),
            source: source.to_string(),
        };
        let serialized = match serde_json::to_string(&entry) {
            Ok(serialized) => serialized,
            Err(err) => {
                debug!("Could not serialize cache entry for '{name}': {err}");
                return;
            }
        };
        if let Err(err) = fs::write(self.entry_path(name), serialized) {
            debug!("Could not write cache entry for '{name}': {err}");
        }
    }

    fn entry_path(&self, name: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(self.namespace.as_bytes());
        hasher.update([0]);
        hasher.update(name.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(hasher.finalize())))
    }
}

fn file_mtime(path: &Path) -> Option<DateTime<Utc>> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn cache_with_source(content: &str) -> (TempDir, SourceCache, PathBuf) {
        let root = TempDir::new().unwrap();
        let source_path = root.path().join("page.twig");
        let mut file = fs::File::create(&source_path).unwrap();
        file.write_all(content.as_bytes()).unwrap();

        let cache = SourceCache::new(
            root.path().join("twig_cache"),
            &[root.path().to_path_buf()],
        )
        .unwrap();
        (root, cache, source_path)
    }

    #[test]
    fn store_then_load() {
        let (_root, cache, source_path) = cache_with_source("Hello {{ name }}");

        cache.store("page.twig", &source_path, "Hello {{ name }}");
        assert_eq!(cache.load("page.twig"), Some("Hello {{ name }}".to_string()));
    }

    #[test]
    fn load_unknown_name() {
        let (_root, cache, _source_path) = cache_with_source("Hello");

        assert_eq!(cache.load("missing.twig"), None);
    }

    #[test]
    fn load_after_source_removed() {
        let (_root, cache, source_path) = cache_with_source("Hello");

        cache.store("page.twig", &source_path, "Hello");
        fs::remove_file(&source_path).unwrap();

        assert_eq!(cache.load("page.twig"), None);
    }

    #[test]
    fn folder_lists_are_isolated() {
        let (root, cache, source_path) = cache_with_source("Hello");
        cache.store("page.twig", &source_path, "Hello");

        let other = SourceCache::new(
            root.path().join("twig_cache"),
            &[root.path().join("elsewhere")],
        )
        .unwrap();
        assert_eq!(other.load("page.twig"), None);
    }
}
