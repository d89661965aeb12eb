//! Serde-deserializable types matching catalog API responses.
//!
//! Every list endpoint wraps its payload as `{"data": {"results": [...]}}`.
//! These types stay separate from the domain records because the series
//! payload has no owning character id.

use serde::Deserialize;

use super::types::{Character, Series, SeriesThumbnail};

#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
  pub data: ApiData<T>,
}

#[derive(Debug, Deserialize)]
pub struct ApiData<T> {
  pub results: Vec<T>,
}

impl<T> ApiEnvelope<T> {
  pub fn into_results(self) -> Vec<T> {
    self.data.results
  }
}

/// Characters decode straight into the domain type.
pub type ApiCharacter = Character;

#[derive(Debug, Deserialize)]
pub struct ApiSeries {
  pub id: i64,
  pub title: String,
  pub description: Option<String>,
  pub thumbnail: SeriesThumbnail,
}

impl ApiSeries {
  pub fn into_series(self, character_id: i64) -> Series {
    Series {
      id: self.id,
      title: self.title,
      description: self.description,
      thumbnail: self.thumbnail,
      character_id,
    }
  }
}
