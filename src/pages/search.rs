use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;

use super::error::{PageError, PageResult};
use crate::movie::{default_min_confidence, default_search_limit, GenreStats, MovieCardView, MovieSearchRequest};
use crate::server::AppState;
use crate::util::QueryParams;

const MAX_SEARCH_LIMIT: usize = 50;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub query: String,
    pub genres: Vec<String>,
    pub count: usize,
    pub results: Vec<MovieCardView>,
}

fn search_request(params: &QueryParams) -> PageResult<MovieSearchRequest> {
    let query = params.get("query").or_else(|| params.get("q")).unwrap_or("").trim().to_string();

    let limit = params.get_parsed::<usize>("limit").unwrap_or_else(default_search_limit);
    if limit == 0 || limit > MAX_SEARCH_LIMIT {
        return Err(PageError::BadRequest(format!("limit must be between 1 and {}", MAX_SEARCH_LIMIT)));
    }

    let min_confidence = params
        .get_parsed::<f64>("minConfidence")
        .unwrap_or_else(default_min_confidence);
    if !(0.0..=1.0).contains(&min_confidence) {
        return Err(PageError::BadRequest("minConfidence must be between 0 and 1".to_string()));
    }

    Ok(MovieSearchRequest {
        query,
        genres: params.get_all("genres"),
        limit,
        min_confidence,
    })
}

/// Blank queries render an empty result list without calling upstream.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> PageResult<Json<SearchPage>> {
    let request = search_request(&params)?;

    let results = if request.query.is_empty() {
        Vec::new()
    } else {
        state
            .api
            .search_movies(&request)
            .await?
            .iter()
            .map(MovieCardView::from)
            .collect()
    };

    Ok(Json(SearchPage {
        count: results.len(),
        query: request.query,
        genres: request.genres,
        results,
    }))
}

pub async fn genre_stats(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> PageResult<Json<GenreStats>> {
    let genres = params.get_all("genres");
    Ok(Json(state.api.get_genre_statistics(&genres).await?))
}

pub async fn genres(State(state): State<AppState>) -> PageResult<Json<Vec<String>>> {
    Ok(Json(state.api.get_available_genres().await?))
}

pub async fn movie_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> PageResult<Json<MovieCardView>> {
    let movie = state.api.get_movie_details(&id).await?;
    Ok(Json(MovieCardView::from(&movie)))
}
