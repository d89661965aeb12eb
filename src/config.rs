use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::catalog::signing::Credentials;
use crate::loader::DEFAULT_ROSTER;
use crate::secrets::SecretStore;

/// Environment variable holding the private signing key
pub const PRIVATE_KEY_ENV: &str = "COMICDEX_PRIVATE_KEY";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub catalog: CatalogConfig,
  /// Character names loaded by `comicdex load` (defaults to the built-in roster)
  pub roster: Option<Vec<String>>,
  /// Secret store key under which the private signing key is kept
  pub secret_key: Option<String>,
  /// Path to the SQLite cache (default: $XDG_DATA_HOME/comicdex/cache.db)
  pub database: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
  pub base_url: String,
  pub public_key: String,
  pub ts: String,
  /// Precomputed request hash. Takes precedence over the stored private key.
  pub hash: Option<String>,
  pub order_by: String,
}

impl Default for CatalogConfig {
  fn default() -> Self {
    Self {
      base_url: "https://gateway.marvel.com".to_string(),
      public_key: String::new(),
      ts: "1".to_string(),
      hash: None,
      order_by: "-modified".to_string(),
    }
  }
}

/// Settings handed explicitly to the loader and the wipe operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogContext {
  pub roster: Vec<String>,
  pub secret_key: String,
}

const DEFAULT_SECRET_KEY: &str = "comicdex.catalog.private-key";

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./comicdex.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/comicdex/config.yaml
  ///
  /// Falls back to defaults when no file is found.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("comicdex.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("comicdex").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    serde_yaml::from_str(contents)
  }

  pub fn context(&self) -> CatalogContext {
    CatalogContext {
      roster: self
        .roster
        .clone()
        .unwrap_or_else(|| DEFAULT_ROSTER.iter().map(|s| s.to_string()).collect()),
      secret_key: self
        .secret_key
        .clone()
        .unwrap_or_else(|| DEFAULT_SECRET_KEY.to_string()),
    }
  }

  /// Path of the SQLite cache.
  pub fn database_path(&self) -> Result<PathBuf> {
    match &self.database {
      Some(p) => Ok(p.clone()),
      None => Ok(data_dir()?.join("cache.db")),
    }
  }

  /// Resolve request credentials.
  ///
  /// Checks, in order: the COMICDEX_PRIVATE_KEY environment variable, a
  /// precomputed `catalog.hash`, then the private key in the secret store.
  pub fn credentials(&self, secrets: &dyn SecretStore) -> Result<Credentials> {
    let catalog = &self.catalog;
    if catalog.public_key.is_empty() {
      return Err(eyre!(
        "catalog.public_key is not configured. Add it to ~/.config/comicdex/config.yaml"
      ));
    }

    if let Ok(private_key) = std::env::var(PRIVATE_KEY_ENV) {
      return Ok(Credentials::sign(&catalog.public_key, &private_key, &catalog.ts));
    }

    if let Some(hash) = &catalog.hash {
      return Ok(Credentials::precomputed(&catalog.public_key, &catalog.ts, hash));
    }

    match secrets.load(&self.context().secret_key) {
      Some(private_key) => Ok(Credentials::sign(&catalog.public_key, &private_key, &catalog.ts)),
      None => Err(eyre!(
        "No signing credential found. Run `comicdex login <PRIVATE_KEY>`, set {} or configure catalog.hash.",
        PRIVATE_KEY_ENV
      )),
    }
  }
}

/// Application data directory ($XDG_DATA_HOME/comicdex).
pub fn data_dir() -> Result<PathBuf> {
  let data_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?;

  Ok(data_dir.join("comicdex"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::secrets::MemorySecretStore;

  #[test]
  fn test_empty_file_uses_defaults() {
    let config = Config::parse("{}").unwrap();
    assert_eq!(config.catalog.base_url, "https://gateway.marvel.com");
    assert_eq!(config.catalog.order_by, "-modified");
    assert_eq!(config.context().roster.len(), DEFAULT_ROSTER.len());
  }

  #[test]
  fn test_parse_overrides() {
    let config = Config::parse(
      r#"
catalog:
  base_url: http://localhost:8080
  public_key: pub
  hash: abc
roster:
  - Thor
  - Loki
secret_key: my.key
"#,
    )
    .unwrap();

    assert_eq!(config.catalog.base_url, "http://localhost:8080");
    assert_eq!(config.catalog.ts, "1");
    let context = config.context();
    assert_eq!(context.roster, vec!["Thor".to_string(), "Loki".to_string()]);
    assert_eq!(context.secret_key, "my.key");
  }

  #[test]
  fn test_credentials_prefer_precomputed_hash_over_secret() {
    let config = Config::parse("catalog: {public_key: pub, hash: abc}").unwrap();
    let secrets = MemorySecretStore::default();
    secrets.save(&config.context().secret_key, "private");

    let creds = config.credentials(&secrets).unwrap();
    assert_eq!(creds.hash, "abc");
  }

  #[test]
  fn test_credentials_sign_with_stored_key() {
    let config = Config::parse("catalog: {public_key: '1234'}").unwrap();
    let secrets = MemorySecretStore::default();
    secrets.save(&config.context().secret_key, "abcd");

    let creds = config.credentials(&secrets).unwrap();
    assert_eq!(creds.hash, Credentials::sign("1234", "abcd", "1").hash);
  }

  #[test]
  fn test_credentials_require_public_key() {
    let config = Config::default();
    assert!(config.credentials(&MemorySecretStore::default()).is_err());
  }
}
