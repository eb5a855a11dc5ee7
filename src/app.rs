use crate::omdb::{OmdbApi, OmdbClient};
use crate::session::{
    AddWatchedError, BrowseView, DetailView, Session, SessionSnapshot, WatchedView,
};
use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Shared handles for the handlers: the provider client behind a trait so
/// tests can substitute a fake, and the single browsing session behind a
/// mutex. The lock is never held across a provider call.
#[derive(Clone)]
pub struct AppState {
    pub omdb: Arc<dyn OmdbApi>,
    pub session: Arc<Mutex<Session>>,
}

pub async fn run_server() -> Result<()> {
    let omdb: Arc<dyn OmdbApi> = Arc::new(OmdbClient::from_env()?);
    let state = AppState {
        omdb,
        session: Arc::new(Mutex::new(Session::default())),
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 3148));
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/state", get(full_state))
        .route("/search", put(search))
        .route("/selection", put(select).delete(close_selection))
        .route("/watched", get(watched).post(add_watched))
        .route("/watched/:id", axum::routing::delete(remove_watched))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Deserialize)]
struct SearchBody {
    query: String,
}

/// Search orchestration: take a ticket, fetch with the lock released, then
/// commit. A commit that reports stale means the query changed while the
/// provider call was in flight; the outcome is dropped and the response
/// reflects whatever is current.
async fn search(State(state): State<AppState>, Json(body): Json<SearchBody>) -> Json<BrowseView> {
    let ticket = state.session.lock().await.begin_search(&body.query);

    let Some(ticket) = ticket else {
        // Below the length threshold: state already cleared, no fetch.
        return Json(state.session.lock().await.browse_view());
    };

    let outcome = state.omdb.search_titles(&body.query).await;
    if let Err(err) = &outcome {
        warn!("Search for '{}' failed: {}", body.query, err);
    }

    let mut session = state.session.lock().await;
    if !session.commit_search(ticket, outcome) {
        debug!("Discarding superseded search for '{}'", body.query);
    }
    Json(session.browse_view())
}

#[derive(Deserialize)]
struct SelectBody {
    imdb_id: String,
}

async fn select(State(state): State<AppState>, Json(body): Json<SelectBody>) -> Json<DetailView> {
    let ticket = state.session.lock().await.begin_detail(&body.imdb_id);

    let Some(ticket) = ticket else {
        // Re-selecting the active movie toggled the detail view closed.
        return Json(state.session.lock().await.detail_view());
    };

    let outcome = state.omdb.fetch_detail(&body.imdb_id).await;
    if let Err(err) = &outcome {
        warn!("Detail fetch for '{}' failed: {}", body.imdb_id, err);
    }

    let mut session = state.session.lock().await;
    if !session.commit_detail(ticket, outcome) {
        debug!("Discarding superseded detail fetch for '{}'", body.imdb_id);
    }
    Json(session.detail_view())
}

async fn close_selection(State(state): State<AppState>) -> Json<DetailView> {
    let mut session = state.session.lock().await;
    session.close_detail();
    Json(session.detail_view())
}

#[derive(Deserialize)]
struct RateBody {
    rating: u8,
}

async fn add_watched(
    State(state): State<AppState>,
    Json(body): Json<RateBody>,
) -> (StatusCode, Json<serde_json::Value>) {
    let mut session = state.session.lock().await;
    match session.add_watched(body.rating) {
        Ok(entry) => {
            info!("Added '{}' to the watched list", entry.title);
            (StatusCode::CREATED, Json(json!(entry)))
        }
        Err(err) => {
            warn!("Rejected add-to-watched: {}", err);
            let status = match err {
                AddWatchedError::InvalidRating(_) => StatusCode::UNPROCESSABLE_ENTITY,
                AddWatchedError::NothingSelected | AddWatchedError::AlreadyWatched(_) => {
                    StatusCode::CONFLICT
                }
            };
            (status, Json(json!({ "error": err.to_string() })))
        }
    }
}

async fn watched(State(state): State<AppState>) -> Json<WatchedView> {
    Json(state.session.lock().await.watched_view())
}

async fn remove_watched(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    let mut session = state.session.lock().await;
    if session.remove_watched(&id) {
        info!("Removed '{}' from the watched list", id);
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn full_state(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.lock().await.snapshot())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
