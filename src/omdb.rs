use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::env;
use thiserror::Error;

use crate::models::{MovieDetail, SearchResult};

const OMDB_BASE: &str = "https://www.omdbapi.com/";

/// Provider failures, split so the session can show the right message.
/// `NotFound` is OMDb's explicit `Response: "False"` signal; `Network`
/// covers transport and non-2xx status; `Malformed` covers payloads that
/// do not decode. The same taxonomy applies to search and detail fetches.
#[derive(Debug, Error)]
pub enum OmdbError {
    #[error("{0}")]
    NotFound(String),
    #[error("request failed: {0}")]
    Network(String),
    #[error("unexpected payload: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait OmdbApi: Send + Sync {
    async fn search_titles(&self, query: &str) -> Result<Vec<SearchResult>, OmdbError>;
    async fn fetch_detail(&self, imdb_id: &str) -> Result<MovieDetail, OmdbError>;
}

#[derive(Debug, Clone)]
pub struct OmdbClient {
    client: Client,
    api_key: String,
}

impl OmdbClient {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = env::var("OMDB_API_KEY").context("OMDB_API_KEY not set")?;
        Ok(Self {
            client: Client::new(),
            api_key,
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, OmdbError> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| OmdbError::Network(e.to_string()))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| OmdbError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(OmdbError::Network(format!("provider returned {status}")));
        }
        serde_json::from_str(&text).map_err(|e| OmdbError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl OmdbApi for OmdbClient {
    async fn search_titles(&self, query: &str) -> Result<Vec<SearchResult>, OmdbError> {
        let url = format!(
            "{OMDB_BASE}?apikey={}&s={}",
            self.api_key,
            urlencoding::encode(query)
        );
        let data: SearchResponse = self.get_json(&url).await?;
        if data.response.eq_ignore_ascii_case("false") {
            return Err(OmdbError::NotFound(
                data.error.unwrap_or_else(|| "Movie not found!".to_string()),
            ));
        }
        Ok(data.search.into_iter().map(map_hit).collect())
    }

    async fn fetch_detail(&self, imdb_id: &str) -> Result<MovieDetail, OmdbError> {
        let url = format!(
            "{OMDB_BASE}?apikey={}&i={}",
            self.api_key,
            urlencoding::encode(imdb_id)
        );
        let data: DetailResponse = self.get_json(&url).await?;
        if data.response.eq_ignore_ascii_case("false") {
            return Err(OmdbError::NotFound(
                data.error
                    .unwrap_or_else(|| "Incorrect IMDb ID.".to_string()),
            ));
        }
        Ok(map_detail(data))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "Search", default)]
    search: Vec<SearchHit>,
    #[serde(rename = "Response", default)]
    response: String,
    #[serde(rename = "Error")]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Year", default)]
    year: String,
    #[serde(rename = "imdbID")]
    imdb_id: String,
    #[serde(rename = "Poster", default)]
    poster: String,
}

#[derive(Debug, Deserialize)]
struct DetailResponse {
    #[serde(rename = "Response", default)]
    response: String,
    #[serde(rename = "Error")]
    error: Option<String>,
    #[serde(rename = "imdbID", default)]
    imdb_id: String,
    #[serde(rename = "Title", default)]
    title: String,
    #[serde(rename = "Year", default)]
    year: String,
    #[serde(rename = "Poster", default)]
    poster: String,
    #[serde(rename = "Runtime", default)]
    runtime: String,
    #[serde(rename = "imdbRating", default)]
    imdb_rating: String,
    #[serde(rename = "Plot", default)]
    plot: String,
    #[serde(rename = "Released", default)]
    released: String,
    #[serde(rename = "Actors", default)]
    actors: String,
    #[serde(rename = "Director", default)]
    director: String,
    #[serde(rename = "Genre", default)]
    genre: String,
}

fn map_hit(hit: SearchHit) -> SearchResult {
    SearchResult {
        imdb_id: hit.imdb_id,
        title: hit.title,
        year: hit.year,
        poster_url: optional_field(hit.poster),
    }
}

fn map_detail(data: DetailResponse) -> MovieDetail {
    MovieDetail {
        catalog_rating: parse_rating(&data.imdb_rating),
        runtime_minutes: parse_runtime_minutes(&data.runtime),
        poster_url: optional_field(data.poster),
        imdb_id: data.imdb_id,
        title: data.title,
        year: data.year,
        genre: data.genre,
        plot: data.plot,
        released: data.released,
        actors: data.actors,
        director: data.director,
    }
}

// OMDb reports absent fields as the literal string "N/A".
fn optional_field(value: String) -> Option<String> {
    if value.is_empty() || value == "N/A" {
        None
    } else {
        Some(value)
    }
}

/// Parses OMDb's `"148 min"` runtime shape. Anything non-numeric ("N/A",
/// empty) is None rather than a parse failure.
pub fn parse_runtime_minutes(input: &str) -> Option<u32> {
    input.split_whitespace().next()?.parse().ok()
}

pub fn parse_rating(input: &str) -> Option<f32> {
    input.trim().parse().ok()
}
