use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::{PageError, PageResult};
use crate::movie::{MovieCardView, SwipeAction};
use crate::server::AppState;
use crate::swipe::{CardFrame, CardStyle, Decision, Direction, PointerEvent};
use crate::util::QueryParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeStatus {
    Loading,
    Ready,
    Error,
    NoMoreMovies,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipePage {
    pub status: SwipeStatus,
    pub card: Option<MovieCardView>,
    pub style: Option<CardStyle>,
    pub frames: Vec<CardFrame<String>>,
    pub queued: usize,
    pub liked_count: usize,
    pub loading: bool,
    pub refilling: bool,
    pub error: Option<String>,
    pub genres: Vec<String>,
    pub actions: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeResponse {
    pub decision: Option<Decision<String>>,
    pub accepted: bool,
    pub page: SwipePage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerRequest {
    #[serde(default)]
    pub movie_id: Option<String>,
    pub events: Vec<PointerEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRef {
    pub movie_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReloadRequest {
    #[serde(default)]
    pub genres: Option<Vec<String>>,
}

/// Renders the swipe screen from the session and the card stack.
pub fn build_page(state: &AppState) -> SwipePage {
    let snapshot = state.session.snapshot();

    let (card, style, frames) = {
        let mut deck = state.deck();
        deck.sync(snapshot.candidates.iter().map(|m| m.id.clone()));
        let card = deck
            .head()
            .and_then(|id| snapshot.candidates.iter().find(|m| &m.id == id))
            .map(MovieCardView::from);
        (card, deck.head_style(), deck.frames())
    };

    let status = if snapshot.loading {
        SwipeStatus::Loading
    } else if card.is_some() {
        SwipeStatus::Ready
    } else if snapshot.error.is_some() {
        SwipeStatus::Error
    } else {
        SwipeStatus::NoMoreMovies
    };

    let actions = match status {
        SwipeStatus::Loading => vec!["view_liked"],
        SwipeStatus::Ready => vec!["like", "skip", "recommendations", "view_liked"],
        SwipeStatus::Error => vec!["retry", "view_liked"],
        SwipeStatus::NoMoreMovies if snapshot.genres.is_empty() => vec!["retry", "view_liked"],
        SwipeStatus::NoMoreMovies => vec!["retry", "clear_filters", "view_liked"],
    };

    SwipePage {
        status,
        card,
        style,
        frames,
        queued: snapshot.candidates.len(),
        liked_count: snapshot.liked.len(),
        loading: snapshot.loading,
        refilling: snapshot.refilling,
        error: snapshot.error,
        genres: snapshot.genres,
        actions,
    }
}

/// Hands a committed decision to the session.
fn apply_decision(state: &AppState, decision: &Decision<String>) -> bool {
    match state.session.candidate(&decision.key) {
        Some(movie) => state.session.handle_swipe(decision.direction, &movie).accepted,
        None => {
            warn!(movie_id = %decision.key, "Decided card is no longer queued");
            false
        }
    }
}

/// Shows the swipe screen, optionally switching the genre filter.
pub async fn swipe_page(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Json<SwipePage> {
    state.session.start().await;

    if params.has("genres") {
        let genres = params.get_all("genres");
        if genres != state.session.genres() {
            debug!(genres = ?genres, "Switching genre filter");
            // Failures land in the session's error state.
            let _ = state.session.load_random_movies(Some(genres)).await;
        }
    }

    Json(build_page(&state))
}

pub async fn pointer(
    State(state): State<AppState>,
    Json(request): Json<PointerRequest>,
) -> PageResult<Json<SwipeResponse>> {
    let decision = {
        let mut deck = state.deck();
        deck.sync(state.session.candidate_ids());

        if let Some(expected) = &request.movie_id {
            if deck.head() != Some(expected) {
                return Err(PageError::Conflict(format!("{} is not the current card", expected)));
            }
        }

        // Anything after the committing release belongs to no card.
        request.events.into_iter().find_map(|event| deck.pointer(event))
    };

    let accepted = decision
        .as_ref()
        .map(|d| apply_decision(&state, d))
        .unwrap_or(false);

    Ok(Json(SwipeResponse {
        decision,
        accepted,
        page: build_page(&state),
    }))
}

/// Fixed like/skip controls.
pub async fn press(
    State(state): State<AppState>,
    Path(action): Path<String>,
    Query(params): Query<QueryParams>,
) -> PageResult<Json<SwipeResponse>> {
    let action: SwipeAction = action.parse().map_err(PageError::BadRequest)?;

    let decision = {
        let mut deck = state.deck();
        deck.sync(state.session.candidate_ids());

        if let Some(expected) = params.get("movieId") {
            if deck.head().map(String::as_str) != Some(expected) {
                return Err(PageError::Conflict(format!("{} is not the current card", expected)));
            }
        }

        deck.press(Direction::from(action))
            .ok_or_else(|| PageError::Conflict("no movie to swipe".to_string()))?
    };

    let accepted = apply_decision(&state, &decision);
    Ok(Json(SwipeResponse {
        decision: Some(decision),
        accepted,
        page: build_page(&state),
    }))
}

pub async fn animation_finished(
    State(state): State<AppState>,
    Json(request): Json<MovieRef>,
) -> PageResult<StatusCode> {
    if state.deck().finish_animation(&request.movie_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(PageError::NotFound(request.movie_id))
    }
}

/// Retry and clear-filters recovery actions.
pub async fn reload(
    State(state): State<AppState>,
    request: Option<Json<ReloadRequest>>,
) -> PageResult<Json<SwipePage>> {
    let genres = request.and_then(|Json(r)| r.genres);
    state.session.load_random_movies(genres).await?;
    Ok(Json(build_page(&state)))
}

pub async fn recommendations(State(state): State<AppState>) -> PageResult<Json<SwipePage>> {
    state.session.get_recommendations().await?;
    Ok(Json(build_page(&state)))
}
