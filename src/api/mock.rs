use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{ApiError, ApiResult, MovieApi};
use crate::movie::{GenreStats, Movie, MovieSearchRequest, SwipeEvent};

/// Scripted movie source for tests.
#[derive(Default)]
pub struct MockApi {
    pub batches: Mutex<VecDeque<ApiResult<Vec<Movie>>>>,
    pub random_calls: Mutex<Vec<Vec<String>>>,
    pub swipes: Mutex<Vec<SwipeEvent>>,
    pub recommendations: Mutex<Option<Vec<Movie>>>,
    pub search_results: Mutex<Vec<Movie>>,
    pub genres: Mutex<Option<Vec<String>>>,
}

impl MockApi {
    pub fn with_batches(batches: Vec<ApiResult<Vec<Movie>>>) -> Arc<Self> {
        Arc::new(Self {
            batches: Mutex::new(batches.into()),
            ..Default::default()
        })
    }

    pub fn random_call_count(&self) -> usize {
        self.random_calls.lock().unwrap().len()
    }
}

pub fn movies(ids: &[&str]) -> Vec<Movie> {
    ids.iter().map(|id| Movie::new(*id, id.to_uppercase())).collect()
}

#[async_trait]
impl MovieApi for MockApi {
    async fn search_movies(&self, request: &MovieSearchRequest) -> ApiResult<Vec<Movie>> {
        let results = self.search_results.lock().unwrap().clone();
        Ok(results
            .into_iter()
            .filter(|m| m.matches_genres(&request.genres))
            .take(request.limit)
            .collect())
    }

    async fn get_movie_details(&self, id: &str) -> ApiResult<Movie> {
        self.search_results
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(id.to_string()))
    }

    async fn get_available_genres(&self) -> ApiResult<Vec<String>> {
        self.genres.lock().unwrap().clone().ok_or(ApiError::Status {
            status: 500,
            message: "genres unavailable".to_string(),
        })
    }

    async fn get_genre_statistics(&self, _genres: &[String]) -> ApiResult<GenreStats> {
        Ok(GenreStats::from_movies(&self.search_results.lock().unwrap()))
    }

    async fn get_random_movies(&self, _user_id: &str, _limit: usize, genres: &[String]) -> ApiResult<Vec<Movie>> {
        self.random_calls.lock().unwrap().push(genres.to_vec());
        self.batches.lock().unwrap().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn get_recommendations(&self, _user_id: &str, _limit: usize) -> ApiResult<Vec<Movie>> {
        self.recommendations
            .lock()
            .unwrap()
            .clone()
            .ok_or(ApiError::Unsupported("Recommendations"))
    }

    async fn record_swipe_action(&self, event: &SwipeEvent) -> ApiResult<()> {
        self.swipes.lock().unwrap().push(event.clone());
        Ok(())
    }
}
