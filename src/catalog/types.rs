//! Domain records for the catalog.
//!
//! Both record types compare and hash by `id` only: the id is the catalog's
//! authoritative key, so two values with the same id are the same record.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Image format of a character thumbnail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
  Gif,
  Jpg,
}

impl ImageFormat {
  pub fn as_str(&self) -> &'static str {
    match self {
      ImageFormat::Gif => "gif",
      ImageFormat::Jpg => "jpg",
    }
  }

  /// Parse a stored extension, falling back to jpg for anything unknown.
  pub fn from_stored(s: &str) -> Self {
    match s {
      "gif" => ImageFormat::Gif,
      _ => ImageFormat::Jpg,
    }
  }
}

/// Thumbnail of a character
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacterThumbnail {
  pub path: String,
  #[serde(rename = "extension")]
  pub format: ImageFormat,
}

/// Thumbnail of a series. The extension is kept as free text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesThumbnail {
  pub path: String,
  pub extension: String,
}

/// A catalog character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
  pub id: i64,
  pub name: String,
  #[serde(default)]
  pub description: String,
  pub thumbnail: CharacterThumbnail,
}

impl Character {
  /// Full image URL (`{path}.{extension}`)
  pub fn image_url(&self) -> String {
    format!("{}.{}", self.thumbnail.path, self.thumbnail.format.as_str())
  }
}

impl PartialEq for Character {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for Character {}

impl Hash for Character {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}

/// A series a character appears in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Series {
  pub id: i64,
  pub title: String,
  pub description: Option<String>,
  pub thumbnail: SeriesThumbnail,
  /// Owning character. Not part of the API payload; stamped by the client.
  pub character_id: i64,
}

impl Series {
  pub fn image_url(&self) -> String {
    format!("{}.{}", self.thumbnail.path, self.thumbnail.extension)
  }
}

impl PartialEq for Series {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for Series {}

impl Hash for Series {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}
