use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::CatalogConfig;
use crate::error::{CatalogError, CatalogResult};

use super::api_types::{ApiCharacter, ApiEnvelope, ApiSeries};
use super::signing::Credentials;
use super::types::{Character, Series};

/// Page size for series requests. Only the first page is fetched.
pub const SERIES_PAGE_LIMIT: u32 = 50;

/// Remote catalog operations.
#[async_trait]
pub trait CatalogApi: Send + Sync {
  /// First character matching `name` exactly.
  async fn fetch_character(&self, name: &str) -> CatalogResult<Character>;

  /// First page of series for a character, stamped with `character_id`.
  async fn fetch_series(&self, character_id: i64) -> CatalogResult<Vec<Series>>;
}

/// Catalog API client
#[derive(Clone)]
pub struct CatalogClient {
  http: reqwest::Client,
  base_url: String,
  order_by: String,
  credentials: Credentials,
}

impl CatalogClient {
  pub fn new(config: &CatalogConfig, credentials: Credentials) -> Result<Self> {
    let http = reqwest::Client::builder()
      .user_agent(concat!("comicdex/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url: config.base_url.clone(),
      order_by: config.order_by.clone(),
      credentials,
    })
  }

  /// Build a signed URL for `path` with extra query parameters
  fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> CatalogResult<Url> {
    let mut url = Url::parse(&self.base_url)
      .map_err(|e| CatalogError::MalformedRequest(format!("{}: {}", self.base_url, e)))?;

    if url.cannot_be_a_base() {
      return Err(CatalogError::MalformedRequest(format!(
        "{}: not a base URL",
        self.base_url
      )));
    }

    url.set_path(path);
    {
      let mut pairs = url.query_pairs_mut();
      pairs
        .append_pair("apikey", &self.credentials.public_key)
        .append_pair("ts", &self.credentials.ts)
        .append_pair("hash", &self.credentials.hash);
      pairs.extend_pairs(query);
    }

    Ok(url)
  }

  /// GET `url` and decode the `results` of the response envelope
  async fn get_results<T: DeserializeOwned>(&self, url: Url) -> CatalogResult<Vec<T>> {
    debug!(path = url.path(), "GET");

    let response = self
      .http
      .get(url)
      .send()
      .await
      .map_err(|e| CatalogError::Transport(e.without_url().to_string()))?;

    let status = response.status();
    if status != StatusCode::OK {
      return Err(CatalogError::UnexpectedStatus(status.as_u16()));
    }

    let body = response
      .bytes()
      .await
      .map_err(|e| CatalogError::Transport(e.without_url().to_string()))?;

    if body.is_empty() {
      return Err(CatalogError::EmptyResponse);
    }

    let envelope: ApiEnvelope<T> =
      serde_json::from_slice(&body).map_err(|e| CatalogError::DecodeFailure(e.to_string()))?;

    Ok(envelope.into_results())
  }
}

#[async_trait]
impl CatalogApi for CatalogClient {
  async fn fetch_character(&self, name: &str) -> CatalogResult<Character> {
    let url = self.endpoint(
      "/v1/public/characters",
      &[("orderBy", self.order_by.as_str()), ("name", name)],
    )?;

    let characters: Vec<ApiCharacter> = self.get_results(url).await?;

    characters
      .into_iter()
      .next()
      .ok_or_else(|| CatalogError::DecodeFailure(format!("No results for character '{}'", name)))
  }

  async fn fetch_series(&self, character_id: i64) -> CatalogResult<Vec<Series>> {
    let limit = SERIES_PAGE_LIMIT.to_string();
    let url = self.endpoint(
      &format!("/v1/public/characters/{}/series", character_id),
      &[("limit", limit.as_str())],
    )?;

    let series: Vec<ApiSeries> = self.get_results(url).await?;

    Ok(
      series
        .into_iter()
        .map(|s| s.into_series(character_id))
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::types::ImageFormat;
  use mockito::Matcher;

  fn client(base_url: &str) -> CatalogClient {
    let config = CatalogConfig {
      base_url: base_url.to_string(),
      ..CatalogConfig::default()
    };
    CatalogClient::new(&config, Credentials::precomputed("pub", "1", "h4sh")).unwrap()
  }

  const SPIDER_MAN: &str = r#"{"data": {"results": [{
    "id": 1011334,
    "name": "Spider-Man (Peter Parker)",
    "description": "...",
    "thumbnail": {"path": "http://i.a/s", "extension": "jpg"}
  }]}}"#;

  #[tokio::test]
  async fn test_fetch_character_sends_signed_query() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/v1/public/characters")
      .match_query(Matcher::AllOf(vec![
        Matcher::UrlEncoded("apikey".into(), "pub".into()),
        Matcher::UrlEncoded("ts".into(), "1".into()),
        Matcher::UrlEncoded("hash".into(), "h4sh".into()),
        Matcher::UrlEncoded("orderBy".into(), "-modified".into()),
        Matcher::UrlEncoded("name".into(), "Spider-Man (Peter Parker)".into()),
      ]))
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(SPIDER_MAN)
      .create_async()
      .await;

    let character = client(&server.url())
      .fetch_character("Spider-Man (Peter Parker)")
      .await
      .unwrap();

    mock.assert_async().await;
    assert_eq!(character.id, 1011334);
    assert_eq!(character.name, "Spider-Man (Peter Parker)");
    assert_eq!(character.thumbnail.path, "http://i.a/s");
    assert_eq!(character.thumbnail.format, ImageFormat::Jpg);
  }

  #[tokio::test]
  async fn test_fetch_character_non_200_status() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/v1/public/characters")
      .match_query(Matcher::Any)
      .with_status(404)
      .with_body(r#"{"code": 404}"#)
      .create_async()
      .await;

    let result = client(&server.url()).fetch_character("Nobody").await;
    assert_eq!(result, Err(CatalogError::UnexpectedStatus(404)));
  }

  #[tokio::test]
  async fn test_fetch_character_empty_body() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/v1/public/characters")
      .match_query(Matcher::Any)
      .with_status(200)
      .create_async()
      .await;

    let result = client(&server.url()).fetch_character("Hulk").await;
    assert_eq!(result, Err(CatalogError::EmptyResponse));
  }

  #[tokio::test]
  async fn test_fetch_character_empty_results_is_decode_failure() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/v1/public/characters")
      .match_query(Matcher::Any)
      .with_status(200)
      .with_body(r#"{"data": {"results": []}}"#)
      .create_async()
      .await;

    let result = client(&server.url()).fetch_character("Hulk").await;
    assert!(matches!(result, Err(CatalogError::DecodeFailure(_))));
  }

  #[tokio::test]
  async fn test_fetch_character_wrong_shape_is_decode_failure() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/v1/public/characters")
      .match_query(Matcher::Any)
      .with_status(200)
      .with_body(r#"{"results": [{"id": 1}]}"#)
      .create_async()
      .await;

    let result = client(&server.url()).fetch_character("Hulk").await;
    assert!(matches!(result, Err(CatalogError::DecodeFailure(_))));
  }

  #[tokio::test]
  async fn test_fetch_series_stamps_character_id() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/v1/public/characters/1011334/series")
      .match_query(Matcher::AllOf(vec![
        Matcher::UrlEncoded("limit".into(), "50".into()),
        Matcher::UrlEncoded("apikey".into(), "pub".into()),
      ]))
      .with_status(200)
      .with_body(
        r#"{"data": {"results": [
          {"id": 1, "title": "A", "description": null, "thumbnail": {"path": "p", "extension": "jpg"}},
          {"id": 2, "title": "B", "description": "text", "thumbnail": {"path": "p", "extension": "gif"}}
        ]}}"#,
      )
      .create_async()
      .await;

    let series = client(&server.url()).fetch_series(1011334).await.unwrap();

    mock.assert_async().await;
    assert_eq!(series.len(), 2);
    assert!(series.iter().all(|s| s.character_id == 1011334));
    assert_eq!(series[0].description, None);
    assert_eq!(series[1].thumbnail.extension, "gif");
  }

  #[tokio::test]
  async fn test_malformed_base_url() {
    let result = client("not a url").fetch_character("Thor").await;
    assert!(matches!(result, Err(CatalogError::MalformedRequest(_))));

    let result = client("mailto:someone@example.com").fetch_series(1).await;
    assert!(matches!(result, Err(CatalogError::MalformedRequest(_))));
  }

  #[tokio::test]
  async fn test_connection_failure_is_transport_error() {
    let result = client("http://127.0.0.1:1").fetch_character("Thor").await;
    assert!(matches!(result, Err(CatalogError::Transport(_))));
  }
}
