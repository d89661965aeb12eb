//! Sequential roster loading.

use tracing::{info, warn};

use crate::cache::{CacheFirstRepository, CatalogStore};
use crate::catalog::{CatalogApi, Character};
use crate::error::CatalogError;

/// Characters loaded by default, in display order.
pub const DEFAULT_ROSTER: &[&str] = &[
  "Spider-Man (Peter Parker)",
  "Wolverine",
  "Iron Man",
  "Captain America",
  "Hulk",
  "Thor",
  "Deadpool",
  "Black Panther",
  "Black Widow",
  "Doctor Strange",
  "Captain Britain",
  "Captain Marvel (Carol Danvers)",
  "Hawkeye",
  "Scarlet Witch",
  "Vision",
  "Gamora",
  "Star-Lord (Peter Quill)",
  "Rocket Raccoon",
  "Groot",
  "Drax",
  "Loki",
  "Silver Surfer",
  "Doctor Strange",
  "Daredevil",
  "Punisher",
  "Nick Fury",
  "Professor X",
  "Magneto",
  "Charles Xavier",
  "Jean Grey",
  "Cyclops",
  "Storm",
  "Beast",
  "Mystique",
  "Colossus",
  "Iceman",
  "Gambit",
  "Sabretooth",
  "Doctor Doom",
  "Kingpin",
  "Electro",
  "Sandman",
  "Rhino",
  "Mysterio",
  "Shang-Chi",
  "Blade",
  "Moon Knight",
  "Jessica Jones",
  "Luke Cage",
];

/// A roster load stopped at `name`.
#[derive(Debug, thiserror::Error)]
#[error("Error processing character {name}: {source}")]
pub struct LoadError {
  pub name: String,
  pub source: CatalogError,
}

/// Walks a roster through the repository one name at a time.
///
/// The first failure aborts the batch; remaining names are not attempted.
pub struct BatchLoader {
  roster: Vec<String>,
}

impl BatchLoader {
  pub fn new(roster: Vec<String>) -> Self {
    Self { roster }
  }

  pub async fn load<A, S>(
    &self,
    repo: &CacheFirstRepository<A, S>,
  ) -> Result<Vec<Character>, LoadError>
  where
    A: CatalogApi,
    S: CatalogStore,
  {
    let mut characters = Vec::with_capacity(self.roster.len());
    let mut from_cache = 0;

    for name in &self.roster {
      let result = repo.character(name).await.map_err(|source| {
        warn!(name = %name, error = %source, "Roster load aborted");
        LoadError {
          name: name.clone(),
          source,
        }
      })?;

      if result.is_cached() {
        from_cache += 1;
      }
      characters.push(result.data);
    }

    info!(total = characters.len(), from_cache, "Roster loaded");

    Ok(characters)
  }
}

impl Default for BatchLoader {
  fn default() -> Self {
    Self::new(DEFAULT_ROSTER.iter().map(|s| s.to_string()).collect())
  }
}
