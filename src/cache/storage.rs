//! Catalog store trait and SQLite implementation.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::catalog::types::{
  Character, CharacterThumbnail, ImageFormat, Series, SeriesThumbnail,
};
use crate::db::Database;
use crate::error::{CatalogError, CatalogResult};
use crate::secrets::SecretStore;

/// Row counts and age of the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSummary {
  pub characters: usize,
  pub series: usize,
  /// When the oldest row was written
  pub oldest: Option<DateTime<Utc>>,
}

/// Trait for local catalog storage backends.
pub trait CatalogStore: Send + Sync {
  /// Store a character, replacing any row with the same id.
  fn save_character(&self, character: &Character) -> CatalogResult<()>;

  /// Characters whose name contains `name` (case-sensitive), by ascending id.
  fn find_characters(&self, name: &str) -> CatalogResult<Vec<Character>>;

  /// Store series, replacing any rows with the same ids.
  fn save_series(&self, series: &[Series]) -> CatalogResult<()>;

  /// Series owned by `character_id`, by ascending id.
  fn find_series(&self, character_id: i64) -> CatalogResult<Vec<Series>>;

  /// Point lookup; absent is not an error.
  fn fetch_character_by_id(&self, id: i64) -> CatalogResult<Option<Character>>;

  /// Delete every cached row and the secret stored under `secret_key`.
  ///
  /// Both steps are always attempted. Returns false if either failed,
  /// including when the secret did not exist.
  fn wipe_all(&self, secret_key: &str) -> bool;

  fn summary(&self) -> CatalogResult<CacheSummary>;

  /// Point lookup that fails with `NotFound` when the character is absent.
  fn character(&self, id: i64) -> CatalogResult<Character> {
    self
      .fetch_character_by_id(id)?
      .ok_or(CatalogError::NotFound {
        entity: "character",
        id,
      })
  }
}

/// SQLite-based catalog store.
///
/// The connection is confined behind a mutex; every operation holds it for
/// its whole duration.
pub struct SqliteStore {
  conn: Mutex<Connection>,
  secrets: Arc<dyn SecretStore>,
}

impl SqliteStore {
  pub fn new(db: Database, secrets: Arc<dyn SecretStore>) -> Self {
    Self {
      conn: Mutex::new(db.into_connection()),
      secrets,
    }
  }

  fn lock(&self) -> CatalogResult<MutexGuard<'_, Connection>> {
    self
      .conn
      .lock()
      .map_err(|e| CatalogError::StoreFailure(format!("Lock poisoned: {}", e)))
  }

  fn delete_rows(&self) -> CatalogResult<()> {
    let mut conn = self.lock()?;
    let tx = conn.transaction()?;
    let series = tx.execute("DELETE FROM series", [])?;
    let characters = tx.execute("DELETE FROM characters", [])?;
    tx.commit()?;

    info!(characters, series, "Cache rows deleted");
    Ok(())
  }
}

const CHARACTER_COLUMNS: &str = "id, name, description, thumbnail_path, thumbnail_extension";
const SERIES_COLUMNS: &str =
  "id, title, description, thumbnail_path, thumbnail_extension, character_id";

fn character_from_row(row: &Row<'_>) -> rusqlite::Result<Character> {
  let extension: String = row.get(4)?;
  Ok(Character {
    id: row.get(0)?,
    name: row.get(1)?,
    description: row.get(2)?,
    thumbnail: CharacterThumbnail {
      path: row.get(3)?,
      format: ImageFormat::from_stored(&extension),
    },
  })
}

fn series_from_row(row: &Row<'_>) -> rusqlite::Result<Series> {
  Ok(Series {
    id: row.get(0)?,
    title: row.get(1)?,
    description: row.get(2)?,
    thumbnail: SeriesThumbnail {
      path: row.get(3)?,
      extension: row.get(4)?,
    },
    character_id: row.get(5)?,
  })
}

impl CatalogStore for SqliteStore {
  fn save_character(&self, character: &Character) -> CatalogResult<()> {
    let conn = self.lock()?;

    conn.execute(
      "INSERT OR REPLACE INTO characters (id, name, description, thumbnail_path, thumbnail_extension, cached_at)
       VALUES (?, ?, ?, ?, ?, datetime('now'))",
      params![
        character.id,
        character.name,
        character.description,
        character.thumbnail.path,
        character.thumbnail.format.as_str(),
      ],
    )?;

    debug!(id = character.id, name = %character.name, "Character stored");
    Ok(())
  }

  fn find_characters(&self, name: &str) -> CatalogResult<Vec<Character>> {
    let conn = self.lock()?;

    // instr() is case-sensitive, unlike LIKE
    let mut stmt = conn.prepare(&format!(
      "SELECT {} FROM characters WHERE instr(name, ?) > 0 ORDER BY id",
      CHARACTER_COLUMNS
    ))?;

    let characters = stmt
      .query_map(params![name], character_from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(characters)
  }

  fn save_series(&self, series: &[Series]) -> CatalogResult<()> {
    let mut conn = self.lock()?;
    let tx = conn.transaction()?;

    {
      let mut stmt = tx.prepare(
        "INSERT OR REPLACE INTO series (id, title, description, thumbnail_path, thumbnail_extension, character_id, cached_at)
         VALUES (?, ?, ?, ?, ?, ?, datetime('now'))",
      )?;

      for s in series {
        stmt.execute(params![
          s.id,
          s.title,
          s.description,
          s.thumbnail.path,
          s.thumbnail.extension,
          s.character_id,
        ])?;
      }
    }

    tx.commit()?;

    debug!(count = series.len(), "Series stored");
    Ok(())
  }

  fn find_series(&self, character_id: i64) -> CatalogResult<Vec<Series>> {
    let conn = self.lock()?;

    let mut stmt = conn.prepare(&format!(
      "SELECT {} FROM series WHERE character_id = ? ORDER BY id",
      SERIES_COLUMNS
    ))?;

    let series = stmt
      .query_map(params![character_id], series_from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(series)
  }

  fn fetch_character_by_id(&self, id: i64) -> CatalogResult<Option<Character>> {
    let conn = self.lock()?;

    let mut stmt = conn.prepare(&format!(
      "SELECT {} FROM characters WHERE id = ?",
      CHARACTER_COLUMNS
    ))?;

    let mut rows = stmt.query_map(params![id], character_from_row)?;
    Ok(rows.next().transpose()?)
  }

  fn wipe_all(&self, secret_key: &str) -> bool {
    let secret_deleted = self.secrets.delete(secret_key);
    if !secret_deleted {
      warn!(key = secret_key, "Could not delete secret");
    }

    let rows_deleted = match self.delete_rows() {
      Ok(()) => true,
      Err(e) => {
        warn!(error = %e, "Failed to clear cache");
        false
      }
    };

    secret_deleted && rows_deleted
  }

  fn summary(&self) -> CatalogResult<CacheSummary> {
    let conn = self.lock()?;

    let characters: i64 = conn.query_row("SELECT COUNT(*) FROM characters", [], |row| row.get(0))?;
    let series: i64 = conn.query_row("SELECT COUNT(*) FROM series", [], |row| row.get(0))?;
    let oldest: Option<String> = conn.query_row(
      "SELECT MIN(cached_at) FROM (
         SELECT cached_at FROM characters UNION ALL SELECT cached_at FROM series
       )",
      [],
      |row| row.get(0),
    )?;

    Ok(CacheSummary {
      characters: characters as usize,
      series: series as usize,
      oldest: oldest.as_deref().map(parse_datetime).transpose()?,
    })
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> CatalogResult<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| CatalogError::StoreFailure(format!("Failed to parse datetime '{}': {}", s, e)))
}
