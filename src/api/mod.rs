pub mod backend;
#[cfg(test)]
pub mod mock;
pub mod omdb;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{ApiConfig, ApiSource};
use crate::movie::{GenreStats, Movie, MovieSearchRequest, SwipeEvent};

pub use backend::BackendClient;
pub use omdb::OmdbClient;

pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 10;

/// Remote movie data. Implementations never retry; callers decide.
#[async_trait]
pub trait MovieApi: Send + Sync {
    async fn search_movies(&self, request: &MovieSearchRequest) -> ApiResult<Vec<Movie>>;
    async fn get_movie_details(&self, id: &str) -> ApiResult<Movie>;
    async fn get_available_genres(&self) -> ApiResult<Vec<String>>;
    async fn get_genre_statistics(&self, genres: &[String]) -> ApiResult<GenreStats>;
    async fn get_random_movies(&self, user_id: &str, limit: usize, genres: &[String]) -> ApiResult<Vec<Movie>>;
    async fn get_recommendations(&self, user_id: &str, limit: usize) -> ApiResult<Vec<Movie>>;
    async fn record_swipe_action(&self, event: &SwipeEvent) -> ApiResult<()>;
}

pub fn build_client(config: &ApiConfig) -> ApiResult<Arc<dyn MovieApi>> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    match config.source {
        ApiSource::Backend => {
            let base_url = config
                .base_url
                .as_deref()
                .ok_or_else(|| ApiError::Config("no backend base_url configured".to_string()))?;
            Ok(Arc::new(BackendClient::new(http, base_url)))
        }
        ApiSource::Omdb => {
            let key = config
                .omdb_api_key
                .as_deref()
                .ok_or_else(|| ApiError::Config("no OMDb api key configured".to_string()))?;
            Ok(Arc::new(OmdbClient::new(http, &config.omdb_url, key)))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server responded with {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Unexpected response: {0}")]
    Decode(String),
    #[error("Movie not found: {0}")]
    NotFound(String),
    #[error("{0} is not supported by this movie source")]
    Unsupported(&'static str),
    #[error("API configuration error: {0}")]
    Config(String),
}

pub type ApiResult<T> = Result<T, ApiError>;
