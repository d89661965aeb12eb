//! Key-value secret storage for the signing credential.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Opaque secret holder keyed by string.
pub trait SecretStore: Send + Sync {
  /// Store `value` under `key`, replacing any previous value.
  fn save(&self, key: &str, value: &str) -> bool;

  fn load(&self, key: &str) -> Option<String>;

  /// Remove `key`. Returns false if the key did not exist or removal failed.
  fn delete(&self, key: &str) -> bool;
}

/// Secret store backed by a JSON file, readable only by the current user.
pub struct FileSecretStore {
  path: PathBuf,
  lock: Mutex<()>,
}

impl FileSecretStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      lock: Mutex::new(()),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn read(&self) -> std::io::Result<BTreeMap<String, String>> {
    match std::fs::read(&self.path) {
      Ok(data) => serde_json::from_slice(&data)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
      Err(e) => Err(e),
    }
  }

  fn write(&self, entries: &BTreeMap<String, String>) -> std::io::Result<()> {
    if let Some(parent) = self.path.parent() {
      std::fs::create_dir_all(parent)?;
    }

    let data = serde_json::to_vec_pretty(entries)
      .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
      use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
      options.mode(0o600);
      let mut file = options.open(&self.path)?;
      // mode() only applies on creation
      file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
      file.write_all(&data)?;
    }
    #[cfg(not(unix))]
    options.open(&self.path)?.write_all(&data)?;

    Ok(())
  }

  /// Read-modify-write under the lock. `f` reports whether it changed
  /// anything; unchanged entries are not written back. Returns None on I/O
  /// failure.
  fn update<R>(&self, f: impl FnOnce(&mut BTreeMap<String, String>) -> (R, bool)) -> Option<R> {
    let _guard = self.lock.lock().ok()?;

    let mut entries = match self.read() {
      Ok(entries) => entries,
      Err(e) => {
        warn!(path = %self.path.display(), error = %e, "Failed to read secret store");
        return None;
      }
    };

    let (result, changed) = f(&mut entries);
    if !changed {
      return Some(result);
    }

    if let Err(e) = self.write(&entries) {
      warn!(path = %self.path.display(), error = %e, "Failed to write secret store");
      return None;
    }

    Some(result)
  }
}

impl SecretStore for FileSecretStore {
  fn save(&self, key: &str, value: &str) -> bool {
    self
      .update(|entries| {
        entries.insert(key.to_string(), value.to_string());
        ((), true)
      })
      .is_some()
  }

  fn load(&self, key: &str) -> Option<String> {
    let _guard = self.lock.lock().ok()?;
    match self.read() {
      Ok(mut entries) => entries.remove(key),
      Err(e) => {
        warn!(path = %self.path.display(), error = %e, "Failed to read secret store");
        None
      }
    }
  }

  fn delete(&self, key: &str) -> bool {
    let removed = self.update(|entries| {
      let removed = entries.remove(key).is_some();
      (removed, removed)
    });
    if removed == Some(false) {
      warn!(key, "Secret does not exist");
    }
    removed.unwrap_or(false)
  }
}

/// In-process secret store.
#[cfg(test)]
#[derive(Default)]
pub struct MemorySecretStore {
  entries: Mutex<std::collections::HashMap<String, String>>,
}

#[cfg(test)]
impl SecretStore for MemorySecretStore {
  fn save(&self, key: &str, value: &str) -> bool {
    match self.entries.lock() {
      Ok(mut entries) => {
        entries.insert(key.to_string(), value.to_string());
        true
      }
      Err(_) => false,
    }
  }

  fn load(&self, key: &str) -> Option<String> {
    self.entries.lock().ok()?.get(key).cloned()
  }

  fn delete(&self, key: &str) -> bool {
    match self.entries.lock() {
      Ok(mut entries) => entries.remove(key).is_some(),
      Err(_) => false,
    }
  }
}
