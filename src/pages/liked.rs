use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use super::error::{PageError, PageResult};
use crate::movie::MovieCardView;
use crate::server::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedPage {
    pub count: usize,
    pub movies: Vec<MovieCardView>,
}

pub async fn list_liked(State(state): State<AppState>) -> Json<LikedPage> {
    let movies: Vec<MovieCardView> = state.session.liked().iter().map(MovieCardView::from).collect();
    Json(LikedPage {
        count: movies.len(),
        movies,
    })
}

pub async fn remove_liked(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> PageResult<StatusCode> {
    if state.session.remove_liked(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(PageError::NotFound(id))
    }
}

pub async fn clear_liked(State(state): State<AppState>) -> StatusCode {
    state.session.clear_liked();
    StatusCode::NO_CONTENT
}
