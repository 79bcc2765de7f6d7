//! JSON file storage for `tutorgate`. One file holds every subject's window.
//! Bring your own path.
//!
//! The operator override for the window limit lives in a sibling file
//! (`<path>.limit`) containing a single integer.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tutorgate::rate_limit::{LimitSnapshot, LimitStorage, MemoryStorage, NAMESPACE};
use tutorgate::{GateConfig, StorageError};

#[derive(Clone, Debug)]
pub struct FileStorage {
    path: PathBuf,
    override_path: PathBuf,
}

impl FileStorage {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let override_path = sibling(&path, "limit");
        Self { path, override_path }
    }

    /// File storage at `config.storage_path`, or `None` when the config has no path.
    pub fn from_config(config: &GateConfig) -> Option<Self> {
        config.storage_path.as_ref().map(|path| Self::new(path.clone()))
    }

    /// `<dir>/chat-limits.json`.
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self::new(dir.as_ref().join(format!("{}.json", NAMESPACE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn override_path(&self) -> &Path {
        &self.override_path
    }

    /// Write the operator override, or remove it with `None`.
    pub fn set_limit_override(&self, limit: Option<u32>) -> Result<(), StorageError> {
        match limit {
            Some(limit) => write_atomically(&self.override_path, limit.to_string().as_bytes())?,
            None => match fs::remove_file(&self.override_path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e.into()),
                _ => {}
            },
        }
        Ok(())
    }
}

impl LimitStorage for FileStorage {
    fn load(&self) -> Result<LimitSnapshot, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(LimitSnapshot::default()),
            Ok(raw) => LimitSnapshot::from_json(&raw),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(LimitSnapshot::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, snapshot: &LimitSnapshot) -> Result<(), StorageError> {
        let raw = snapshot.to_json()?;
        write_atomically(&self.path, raw.as_bytes())?;
        tracing::trace!(
            path = %self.path.display(),
            entries = snapshot.limits.len(),
            "rate limit state saved"
        );
        Ok(())
    }

    fn limit_override(&self) -> Result<Option<u32>, StorageError> {
        let raw = match fs::read_to_string(&self.override_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed.parse().map(Some).map_err(|e| {
            StorageError::Unavailable(format!(
                "override {} is not a number: {}",
                self.override_path.display(),
                e
            ))
        })
    }
}

/// The backend `config` asks for: [`FileStorage`] when `storage_path` is set,
/// otherwise [`MemoryStorage`], which forgets everything on restart.
pub fn storage_from_config(config: &GateConfig) -> Arc<dyn LimitStorage> {
    match FileStorage::from_config(config) {
        Some(storage) => {
            tracing::debug!(path = %storage.path().display(), "using file storage for rate limits");
            Arc::new(storage)
        }
        None => {
            tracing::debug!("no storage path configured; rate limits are kept in memory");
            Arc::new(MemoryStorage::new())
        }
    }
}

fn sibling(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(ext);
    path.with_file_name(name)
}

// Write to `<path>.tmp`, then rename over `path`, so a crash mid-write never leaves a
// truncated file behind.
fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = sibling(path, "tmp");
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.flush()?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)
}
