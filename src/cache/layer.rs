//! Cache-first repository over the catalog API and the local store.

use std::sync::Arc;
use tracing::{debug, info};

use crate::catalog::{CatalogApi, Character, Series};
use crate::error::CatalogResult;

use super::storage::CatalogStore;
use super::traits::CacheResult;

/// Repository that always consults the local store before the network.
///
/// Cached entries never expire; they are only removed by wiping the store.
/// Errors from either side propagate unchanged, nothing is retried.
pub struct CacheFirstRepository<A: CatalogApi, S: CatalogStore> {
  api: Arc<A>,
  store: Arc<S>,
}

impl<A: CatalogApi, S: CatalogStore> CacheFirstRepository<A, S> {
  pub fn new(api: A, store: Arc<S>) -> Self {
    Self {
      api: Arc::new(api),
      store,
    }
  }

  #[cfg(test)]
  pub fn api(&self) -> &A {
    &self.api
  }

  #[cfg(test)]
  pub fn store(&self) -> &S {
    &self.store
  }

  /// Acquire a character by name.
  ///
  /// 1. Look up cached characters whose name contains `name`
  /// 2. Any match is a hit; the first row is used as-is
  /// 3. Otherwise fetch from the catalog and store the result
  pub async fn character(&self, name: &str) -> CatalogResult<CacheResult<Character>> {
    // TODO: prefer an exact name match when several cached rows contain `name`
    if let Some(character) = self.store.find_characters(name)?.into_iter().next() {
      debug!(name, id = character.id, "Character served from cache");
      return Ok(CacheResult::from_cache(character));
    }

    debug!(name, "Character not cached, fetching");
    let character = self.api.fetch_character(name).await?;
    self.store.save_character(&character)?;
    info!(name, id = character.id, "Character fetched and cached");

    Ok(CacheResult::from_network(character))
  }

  /// Acquire the series of a character.
  ///
  /// On a miss, series without a description are dropped before caching,
  /// so they are never stored or returned.
  pub async fn series(&self, character_id: i64) -> CatalogResult<CacheResult<Vec<Series>>> {
    let cached = self.store.find_series(character_id)?;
    if !cached.is_empty() {
      debug!(character_id, count = cached.len(), "Series served from cache");
      return Ok(CacheResult::from_cache(cached));
    }

    debug!(character_id, "Series not cached, fetching");
    let fetched = self.api.fetch_series(character_id).await?;
    let total = fetched.len();

    let series: Vec<Series> = fetched
      .into_iter()
      .filter(|s| s.description.is_some())
      .collect();

    self.store.save_series(&series)?;
    info!(
      character_id,
      kept = series.len(),
      dropped = total - series.len(),
      "Series fetched and cached"
    );

    Ok(CacheResult::from_network(series))
  }
}

impl<A: CatalogApi, S: CatalogStore> Clone for CacheFirstRepository<A, S> {
  fn clone(&self) -> Self {
    Self {
      api: Arc::clone(&self.api),
      store: Arc::clone(&self.store),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::storage::SqliteStore;
  use crate::cache::traits::CacheSource;
  use crate::catalog::fake::{character, series, FakeCatalog};
  use crate::db::Database;
  use crate::error::CatalogError;
  use crate::secrets::MemorySecretStore;

  fn repository(api: FakeCatalog) -> CacheFirstRepository<FakeCatalog, SqliteStore> {
    let store = SqliteStore::new(
      Database::open_in_memory().unwrap(),
      Arc::new(MemorySecretStore::default()),
    );
    CacheFirstRepository::new(api, Arc::new(store))
  }

  #[tokio::test]
  async fn test_second_acquisition_is_cache_hit() {
    let repo = repository(
      FakeCatalog::default().with_character(character(1011334, "Spider-Man (Peter Parker)")),
    );

    let first = repo.character("Spider-Man (Peter Parker)").await.unwrap();
    assert_eq!(first.source, CacheSource::Network);

    let second = repo.character("Spider-Man (Peter Parker)").await.unwrap();
    assert!(second.is_cached());
    assert_eq!(second.data.id, first.data.id);

    assert_eq!(
      repo.api.requests(),
      vec!["character:Spider-Man (Peter Parker)".to_string()]
    );
  }

  #[tokio::test]
  async fn test_fetched_character_findable_by_substring() {
    let repo = repository(
      FakeCatalog::default().with_character(character(1011334, "Spider-Man (Peter Parker)")),
    );

    repo.character("Spider-Man (Peter Parker)").await.unwrap();

    let found = repo.store().find_characters("Spider-Man").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, 1011334);
    assert_eq!(found[0].name, "Spider-Man (Peter Parker)");
    assert_eq!(found[0].thumbnail.path, "http://i.a/s");
  }

  #[tokio::test]
  async fn test_substring_hit_takes_first_row() {
    let repo = repository(FakeCatalog::default());
    repo
      .store()
      .save_character(&character(2, "Captain Marvel (Carol Danvers)"))
      .unwrap();
    repo.store().save_character(&character(1, "Captain America")).unwrap();

    let result = repo.character("Captain").await.unwrap();
    assert!(result.is_cached());
    assert_eq!(result.data.id, 1);
    assert!(repo.api.requests().is_empty());
  }

  #[tokio::test]
  async fn test_character_fetch_error_propagates_and_caches_nothing() {
    let repo = repository(
      FakeCatalog::default().with_character_error("Groot", CatalogError::EmptyResponse),
    );

    let result = repo.character("Groot").await;
    assert!(matches!(result, Err(CatalogError::EmptyResponse)));
    assert!(repo.store().find_characters("Groot").unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_series_without_description_are_dropped() {
    let repo = repository(FakeCatalog::default().with_series(
      1011334,
      vec![
        series(10, 1011334, None),
        series(20, 1011334, Some("text")),
      ],
    ));

    let result = repo.series(1011334).await.unwrap();
    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(result.data.len(), 1);
    assert_eq!(result.data[0].id, 20);
    assert_eq!(result.data[0].description.as_deref(), Some("text"));

    let stored = repo.store().find_series(1011334).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, 20);
  }

  #[tokio::test]
  async fn test_series_second_acquisition_is_cache_hit() {
    let repo = repository(FakeCatalog::default().with_series(
      7,
      vec![
        series(3, 7, Some("c")),
        series(1, 7, Some("a")),
        series(2, 7, None),
      ],
    ));

    let first = repo.series(7).await.unwrap();
    assert_eq!(first.data.len(), 2);

    let second = repo.series(7).await.unwrap();
    assert!(second.is_cached());
    let ids: Vec<i64> = second.data.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 3]);

    assert_eq!(repo.api.requests(), vec!["series:7".to_string()]);
  }

  #[tokio::test]
  async fn test_series_all_without_description_refetches() {
    let repo = repository(FakeCatalog::default().with_series(5, vec![series(1, 5, None)]));

    assert!(repo.series(5).await.unwrap().data.is_empty());
    assert!(repo.series(5).await.unwrap().data.is_empty());

    // Nothing was cached, so both calls went to the network
    assert_eq!(repo.api.requests().len(), 2);
  }

  #[tokio::test]
  async fn test_series_error_propagates() {
    let repo = repository(
      FakeCatalog::default().with_series_error(9, CatalogError::UnexpectedStatus(500)),
    );

    let result = repo.series(9).await;
    assert!(matches!(result, Err(CatalogError::UnexpectedStatus(500))));
  }
}
