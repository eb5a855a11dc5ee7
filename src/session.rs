use serde::Serialize;
use thiserror::Error;

use crate::models::{summarize, MovieDetail, SearchResult, WatchedEntry, WatchedSummary};
use crate::omdb::OmdbError;

/// Queries shorter than this never reach the provider.
pub const MIN_QUERY_LEN: usize = 3;
/// Personal ratings are ordinal stars, 1 through 5.
pub const MAX_RATING: u8 = 5;

const SEARCH_FAILED_MSG: &str = "Something went wrong while fetching the movie.";
const DETAIL_FAILED_MSG: &str = "Something went wrong while fetching the movie details.";

/// All mutable application state for the single browsing session, mutated
/// only through the named actions below.
///
/// Network calls happen outside this struct: `begin_*` hands out a
/// generation ticket, the caller performs the fetch without holding the
/// session lock, and `commit_*` applies the outcome only if the ticket is
/// still current. A ticket goes stale whenever the query or selection
/// changes, which is how a superseded request's late response gets dropped
/// instead of overwriting newer state.
#[derive(Debug, Default)]
pub struct Session {
    query: String,
    results: Vec<SearchResult>,
    search_error: Option<String>,
    searching: bool,
    search_gen: u64,
    selected: Option<String>,
    detail: Option<MovieDetail>,
    detail_error: Option<String>,
    loading_detail: bool,
    detail_gen: u64,
    watched: Vec<WatchedEntry>,
}

#[derive(Debug, Error, PartialEq)]
pub enum AddWatchedError {
    #[error("no movie detail is loaded")]
    NothingSelected,
    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),
    #[error("'{0}' is already on the watched list")]
    AlreadyWatched(String),
}

/// Browsing half of the view: query, results, and the search status.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct BrowseView {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub error: Option<String>,
    pub searching: bool,
}

/// Detail half of the view for the active selection.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DetailView {
    pub selected: Option<String>,
    pub detail: Option<MovieDetail>,
    pub error: Option<String>,
    pub loading: bool,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct WatchedView {
    pub entries: Vec<WatchedEntry>,
    pub summary: WatchedSummary,
}

/// Everything a dumb client needs to render the whole app.
#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub browse: BrowseView,
    pub selection: DetailView,
    pub watched: WatchedView,
}

impl Session {
    /// Records the new query. Below the length threshold the result list
    /// and error are cleared and no ticket is issued, so no network access
    /// happens. Otherwise the search generation advances (invalidating any
    /// in-flight search) and the caller gets a ticket to commit with.
    pub fn begin_search(&mut self, query: &str) -> Option<u64> {
        self.query = query.to_string();
        self.search_gen += 1;
        if query.chars().count() < MIN_QUERY_LEN {
            self.results.clear();
            self.search_error = None;
            self.searching = false;
            return None;
        }
        self.searching = true;
        self.search_error = None;
        Some(self.search_gen)
    }

    /// Applies a search outcome. Returns false (session untouched) when the
    /// ticket was superseded by a newer query.
    pub fn commit_search(
        &mut self,
        ticket: u64,
        outcome: Result<Vec<SearchResult>, OmdbError>,
    ) -> bool {
        if ticket != self.search_gen {
            return false;
        }
        self.searching = false;
        match outcome {
            Ok(results) => {
                self.results = results;
                self.search_error = None;
            }
            Err(OmdbError::NotFound(message)) => {
                self.results.clear();
                self.search_error = Some(message);
            }
            // Transport/decoding failures keep the stale list in place;
            // the error message is what the user sees.
            Err(_) => {
                self.search_error = Some(SEARCH_FAILED_MSG.to_string());
            }
        }
        true
    }

    /// Activates a selection and issues a detail-fetch ticket. Selecting
    /// the already-active id toggles the detail view closed instead. No
    /// length gate here.
    pub fn begin_detail(&mut self, imdb_id: &str) -> Option<u64> {
        if self.selected.as_deref() == Some(imdb_id) {
            self.close_detail();
            return None;
        }
        self.selected = Some(imdb_id.to_string());
        self.detail = None;
        self.detail_error = None;
        self.detail_gen += 1;
        self.loading_detail = true;
        Some(self.detail_gen)
    }

    /// Applies a detail-fetch outcome under the same supersession rule as
    /// `commit_search`.
    pub fn commit_detail(&mut self, ticket: u64, outcome: Result<MovieDetail, OmdbError>) -> bool {
        if ticket != self.detail_gen {
            return false;
        }
        self.loading_detail = false;
        match outcome {
            Ok(detail) => {
                self.detail = Some(detail);
                self.detail_error = None;
            }
            Err(OmdbError::NotFound(message)) => {
                self.detail_error = Some(message);
            }
            Err(_) => {
                self.detail_error = Some(DETAIL_FAILED_MSG.to_string());
            }
        }
        true
    }

    /// Back to browsing. Also invalidates any detail fetch still in flight.
    pub fn close_detail(&mut self) {
        self.selected = None;
        self.detail = None;
        self.detail_error = None;
        self.loading_detail = false;
        self.detail_gen += 1;
    }

    /// Confirms the add-to-watched flow: pairs the loaded detail with the
    /// chosen rating, appends the entry, and returns the view to browsing.
    /// At most one entry per imdb_id.
    pub fn add_watched(&mut self, rating: u8) -> Result<WatchedEntry, AddWatchedError> {
        let detail = self.detail.as_ref().ok_or(AddWatchedError::NothingSelected)?;
        if rating == 0 || rating > MAX_RATING {
            return Err(AddWatchedError::InvalidRating(rating));
        }
        if self.watched.iter().any(|w| w.imdb_id == detail.imdb_id) {
            return Err(AddWatchedError::AlreadyWatched(detail.imdb_id.clone()));
        }
        let entry = WatchedEntry {
            imdb_id: detail.imdb_id.clone(),
            title: detail.title.clone(),
            poster_url: detail.poster_url.clone(),
            catalog_rating: detail.catalog_rating,
            personal_rating: rating,
            runtime_minutes: detail.runtime_minutes,
        };
        self.watched.push(entry.clone());
        self.close_detail();
        Ok(entry)
    }

    pub fn remove_watched(&mut self, imdb_id: &str) -> bool {
        let before = self.watched.len();
        self.watched.retain(|w| w.imdb_id != imdb_id);
        self.watched.len() != before
    }

    pub fn summary(&self) -> WatchedSummary {
        summarize(&self.watched)
    }

    pub fn browse_view(&self) -> BrowseView {
        BrowseView {
            query: self.query.clone(),
            results: self.results.clone(),
            error: self.search_error.clone(),
            searching: self.searching,
        }
    }

    pub fn detail_view(&self) -> DetailView {
        DetailView {
            selected: self.selected.clone(),
            detail: self.detail.clone(),
            error: self.detail_error.clone(),
            loading: self.loading_detail,
        }
    }

    pub fn watched_view(&self) -> WatchedView {
        WatchedView {
            entries: self.watched.clone(),
            summary: self.summary(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            browse: self.browse_view(),
            selection: self.detail_view(),
            watched: self.watched_view(),
        }
    }
}
