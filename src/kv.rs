// Key-value persistence backends

use eyre::{Context, Result, eyre};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

const CURRENT_VERSION: u32 = 1;

/// A string-valued key-value store
///
/// The task store keeps its whole collection under a single key.
pub trait KvStore {
    /// Read the value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}

impl<K: KvStore + ?Sized> KvStore for Box<K> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Volatile in-process store
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    entries: HashMap<String, String>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// One JSON file per key inside a directory
///
/// Writes go to a temporary sibling that is synced and renamed over the
/// target while an exclusive lock is held, so readers never see a torn value.
#[derive(Debug)]
pub struct FileKv {
    base_path: PathBuf,
}

impl FileKv {
    /// Open or create a file store rooted at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        fs::create_dir_all(&base_path).context("Failed to create store directory")?;

        let store = Self { base_path };
        store.write_version()?;
        Ok(store)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn write_version(&self) -> Result<()> {
        let version_path = self.base_path.join(".version");
        if !version_path.exists() {
            fs::write(version_path, CURRENT_VERSION.to_string())?;
        }
        Ok(())
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        Self::validate_key(key)?;
        Ok(self.base_path.join(format!("{}.json", key)))
    }

    fn validate_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(eyre!("Key cannot be empty"));
        }
        if key.len() > 64 {
            return Err(eyre!("Key too long: {} (max 64 chars)", key));
        }
        if !key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
            return Err(eyre!("Invalid key: {} (must be alphanumeric with _/-)", key));
        }
        Ok(())
    }

    fn write_replace(tmp_path: &Path, path: &Path, value: &str) -> Result<()> {
        let mut file = File::create(tmp_path).context("Failed to create temporary file")?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(tmp_path, path).with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }

    fn lock(&self) -> Result<File> {
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.base_path.join(".lock"))
            .context("Failed to open lock file")?;
        lock_file.lock_exclusive().context("Failed to acquire file lock")?;
        Ok(lock_file)
    }
}

impl KvStore for FileKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(content))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        let tmp_path = self.base_path.join(format!(".{}.json.tmp", key));

        // Lock is released when the guard is dropped
        let _guard = self.lock()?;

        let written = Self::write_replace(&tmp_path, &path, value);
        if written.is_err() && tmp_path.exists() {
            let _ = fs::remove_file(&tmp_path);
        }
        written?;
        debug!(key, bytes = value.len(), "FileKv::set: wrote value");

        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// Stand-in for a backend that failed to open
///
/// Reads and writes both fail with the original open error, so a task store
/// over it starts empty and reports every mutation as a persistence failure.
#[derive(Debug)]
pub struct UnavailableKv {
    backend: &'static str,
    reason: String,
}

impl UnavailableKv {
    pub fn new(backend: &'static str, error: &eyre::Report) -> Self {
        Self {
            backend,
            reason: format!("{:#}", error),
        }
    }
}

impl KvStore for UnavailableKv {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(eyre!("{} store unavailable: {}", self.backend, self.reason))
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
        Err(eyre!("{} store unavailable: {}", self.backend, self.reason))
    }

    fn name(&self) -> &'static str {
        self.backend
    }
}
