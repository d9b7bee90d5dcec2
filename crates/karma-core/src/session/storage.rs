//! Key/value stores backing the persisted session.
//!
//! Two tiers mirror the browser's `localStorage`/`sessionStorage` split:
//! a long-lived file under `$KARMA_HOME` and a session-scoped file under the
//! system temp dir. Files are written with restricted permissions (0600).

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Which persistence tier a session is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageTier {
    /// Survives restarts ("remember me")
    LongLived,
    /// Lives only as long as the current OS session
    SessionScoped,
}

impl StorageTier {
    pub fn for_remember(remember: bool) -> Self {
        if remember {
            StorageTier::LongLived
        } else {
            StorageTier::SessionScoped
        }
    }
}

/// A string key/value store.
pub trait Storage: Send {
    /// Reads a value.
    ///
    /// # Errors
    /// Returns an error if the backing store exists but cannot be read or parsed.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes a value.
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Writes several values. On failure, keys written by this call are removed again.
    ///
    /// # Errors
    /// Returns the first write error.
    fn set_many(&mut self, entries: &[(&str, &str)]) -> Result<()> {
        for (done, (key, value)) in entries.iter().enumerate() {
            if let Err(err) = self.set(key, value) {
                for (written, _) in &entries[..done] {
                    if self.remove(written).is_err() {
                        break;
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// Removes a value; removing a missing key is not an error.
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be read or written.
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Drops every value, including unreadable contents.
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be deleted.
    fn clear(&mut self) -> Result<()>;
}

/// JSON-object file store.
///
/// The file is re-read on every access; there is no in-process cache.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session store {}", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session store {}", self.path.display()))
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if entries.is_empty() {
            return self.delete_file();
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(entries).context("Failed to serialize session store")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        #[cfg(not(unix))]
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        Ok(())
    }

    fn delete_file(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove {}", self.path.display())),
        }
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value)])
    }

    fn set_many(&mut self, entries: &[(&str, &str)]) -> Result<()> {
        let mut stored = self.load()?;
        for (key, value) in entries {
            stored.insert((*key).to_string(), (*value).to_string());
        }
        self.save(&stored)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.delete_file()
    }
}

/// In-process store, used where nothing should touch disk.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_file_storage_missing_file_reads_empty() {
        let dir = tempdir().unwrap();
        let store = FileStorage::new(dir.path().join("session.json"));
        assert_eq!(store.get("adminToken").unwrap(), None);
    }

    #[test]
    fn test_file_storage_set_get_remove() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let mut store = FileStorage::new(&path);

        store.set("adminToken", "tok").unwrap();
        store.set("adminUser", r#"{"uid":"u1"}"#).unwrap();
        assert_eq!(store.get("adminToken").unwrap().as_deref(), Some("tok"));

        let reopened = FileStorage::new(&path);
        assert_eq!(
            reopened.get("adminUser").unwrap().as_deref(),
            Some(r#"{"uid":"u1"}"#)
        );

        store.remove("adminToken").unwrap();
        assert_eq!(store.get("adminToken").unwrap(), None);
        assert!(path.exists());

        store.remove("adminUser").unwrap();
        assert!(!path.exists(), "empty store should delete its file");

        store.remove("adminUser").unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_file_storage_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut store = FileStorage::new(&path);
        store.set("adminToken", "tok").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_file_storage_corrupt_file_errors_until_cleared() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        let mut store = FileStorage::new(&path);
        assert!(store.get("adminToken").is_err());
        assert!(store.remove("adminToken").is_err());

        store.clear().unwrap();
        assert!(!path.exists());
        assert_eq!(store.get("adminToken").unwrap(), None);

        store.clear().unwrap();
    }

    #[test]
    fn test_file_storage_set_many_writes_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut store = FileStorage::new(&path);
        store.set("other", "kept").unwrap();

        store
            .set_many(&[("adminToken", "tok"), ("adminUser", r#"{"uid":"u1"}"#)])
            .unwrap();

        let contents: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents["adminToken"], "tok");
        assert_eq!(contents["other"], "kept");
    }

    #[test]
    fn test_file_storage_set_many_on_corrupt_file_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        let mut store = FileStorage::new(&path);
        assert!(store.set_many(&[("adminToken", "tok")]).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{not json");
    }

    #[test]
    fn test_memory_storage() {
        let mut store = MemoryStorage::new();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_tier_for_remember() {
        assert_eq!(StorageTier::for_remember(true), StorageTier::LongLived);
        assert_eq!(StorageTier::for_remember(false), StorageTier::SessionScoped);
    }
}
