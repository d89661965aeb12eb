use tracing::debug;

use crate::cache::{CacheFirstRepository, CatalogStore};
use crate::catalog::{CatalogApi, Character, Series};
use crate::config::CatalogContext;
use crate::error::CatalogError;
use crate::loader::BatchLoader;

/// Screen state - each variant owns the record it shows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AppState {
  #[default]
  Idle,
  LoadingCharacters,
  CharactersReady,
  LoadingSeries(Character),
  SeriesReady(Character),
  LoadingSerieDetail(Series),
  SerieDetailReady(Series),
  Failed(String),
}

impl AppState {
  /// States that can be returned to with `back`
  fn is_ready(&self) -> bool {
    matches!(
      self,
      AppState::CharactersReady | AppState::SeriesReady(_) | AppState::SerieDetailReady(_)
    )
  }
}

/// Application controller.
///
/// Drives the repository and tracks navigation. All settings come in through
/// the `CatalogContext`; there is no shared global state.
pub struct App<A: CatalogApi, S: CatalogStore> {
  repo: CacheFirstRepository<A, S>,
  context: CatalogContext,
  state: AppState,
  /// Ready states navigated away from, most recent last
  history: Vec<AppState>,
  characters: Vec<Character>,
  series: Vec<Series>,
}

impl<A: CatalogApi, S: CatalogStore> App<A, S> {
  pub fn new(repo: CacheFirstRepository<A, S>, context: CatalogContext) -> Self {
    Self {
      repo,
      context,
      state: AppState::Idle,
      history: Vec::new(),
      characters: Vec::new(),
      series: Vec::new(),
    }
  }

  pub fn state(&self) -> &AppState {
    &self.state
  }

  pub fn characters(&self) -> &[Character] {
    &self.characters
  }

  pub fn series(&self) -> &[Series] {
    &self.series
  }

  fn set_state(&mut self, next: AppState) {
    debug!(from = ?self.state, to = ?next, "State transition");
    self.state = next;
  }

  /// Navigate forward, remembering the current screen if it is a ready one.
  fn push(&mut self, next: AppState) {
    if self.state.is_ready() {
      self.history.push(self.state.clone());
    }
    self.set_state(next);
  }

  /// Load the whole roster. A failure leaves the app in `Failed`.
  pub async fn load_characters(&mut self) {
    self.history.clear();
    self.set_state(AppState::LoadingCharacters);

    let loader = BatchLoader::new(self.context.roster.clone());
    match loader.load(&self.repo).await {
      Ok(characters) => {
        self.characters = characters;
        self.set_state(AppState::CharactersReady);
      }
      Err(e) => {
        self.characters.clear();
        self.set_state(AppState::Failed(e.to_string()));
      }
    }
  }

  /// Load a single character by name, as a one-entry character list.
  pub async fn load_character(&mut self, name: &str) {
    self.history.clear();
    self.set_state(AppState::LoadingCharacters);

    match self.repo.character(name).await {
      Ok(result) => {
        self.characters = vec![result.data];
        self.set_state(AppState::CharactersReady);
      }
      Err(e) => {
        self.characters.clear();
        self.set_state(AppState::Failed(format!(
          "Error processing character {}: {}",
          name, e
        )));
      }
    }
  }

  /// Open a character and load its series.
  pub async fn select_character(&mut self, character: Character) {
    self.push(AppState::LoadingSeries(character.clone()));

    match self.repo.series(character.id).await {
      Ok(result) => {
        self.series = result.data;
        self.set_state(AppState::SeriesReady(character));
      }
      Err(e) => self.set_state(AppState::Failed(format!(
        "Error loading series for {}: {}",
        character.name, e
      ))),
    }
  }

  /// Open one of the loaded series.
  pub fn select_serie(&mut self, series_id: i64) {
    let Some(serie) = self.series.iter().find(|s| s.id == series_id).cloned() else {
      let error = CatalogError::NotFound {
        entity: "series",
        id: series_id,
      };
      self.push(AppState::Failed(error.to_string()));
      return;
    };

    self.push(AppState::LoadingSerieDetail(serie.clone()));
    self.set_state(AppState::SerieDetailReady(serie));
  }

  /// Return to the previous ready screen. No-op at the root.
  pub fn back(&mut self) {
    if let Some(previous) = self.history.pop() {
      self.set_state(previous);
    }
  }
}
