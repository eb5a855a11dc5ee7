use serde::{Deserialize, Serialize};

/// One row of a title search. Replaced wholesale on every search.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SearchResult {
    pub imdb_id: String,
    pub title: String,
    pub year: String,
    pub poster_url: Option<String>,
}

/// Full metadata for the active selection, fetched fresh on each selection
/// change and discarded when the selection changes again.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MovieDetail {
    pub imdb_id: String,
    pub title: String,
    pub year: String,
    pub poster_url: Option<String>,
    pub runtime_minutes: Option<u32>,
    pub genre: String,
    pub plot: String,
    pub released: String,
    pub actors: String,
    pub director: String,
    pub catalog_rating: Option<f32>,
}

/// A confirmed watched record. Immutable once created; at most one per
/// imdb_id.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WatchedEntry {
    pub imdb_id: String,
    pub title: String,
    pub poster_url: Option<String>,
    pub catalog_rating: Option<f32>,
    pub personal_rating: u8,
    pub runtime_minutes: Option<u32>,
}

/// Derived aggregate over the watched list. Never stored, recomputed on
/// demand. An empty list yields `count: 0` and `None` for every mean, so no
/// NaN ever reaches the wire.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WatchedSummary {
    pub count: usize,
    pub avg_catalog_rating: Option<f32>,
    pub avg_personal_rating: Option<f32>,
    pub avg_runtime_minutes: Option<f32>,
}

pub fn summarize(watched: &[WatchedEntry]) -> WatchedSummary {
    WatchedSummary {
        count: watched.len(),
        avg_catalog_rating: mean(watched.iter().filter_map(|w| w.catalog_rating)),
        avg_personal_rating: mean(watched.iter().map(|w| w.personal_rating as f32)),
        avg_runtime_minutes: mean(
            watched
                .iter()
                .filter_map(|w| w.runtime_minutes)
                .map(|r| r as f32),
        ),
    }
}

// Means skip entries where the provider reported no value; only entries with
// a known rating/runtime contribute.
fn mean(values: impl Iterator<Item = f32>) -> Option<f32> {
    let collected: Vec<f32> = values.collect();
    if collected.is_empty() {
        return None;
    }
    let sum: f32 = collected.iter().sum();
    Some(sum / collected.len() as f32)
}
