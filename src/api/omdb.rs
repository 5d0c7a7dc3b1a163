use std::sync::Mutex;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::backend::check_status;
use super::{ApiError, ApiResult, MovieApi};
use crate::movie::{normalize_movie, GenreStats, Movie, MovieSearchRequest, SwipeEvent};

/// Terms that reliably return plenty of movies; random sampling walks their
/// result pages.
const SAMPLE_TERMS: &[&str] = &[
    "love", "life", "home", "time", "heart", "world", "night", "dream", "hope", "peace", "light",
    "story", "house", "water", "music", "dance", "happy", "brave", "quick", "sweet", "quiet",
    "storm", "smile", "truth", "magic", "ocean", "river", "mountain", "forest", "garden",
    "winter", "summer", "spring", "golden", "silver", "beauty", "wonder", "journey",
];

const GENRES: &[&str] = &[
    "Action", "Adventure", "Animation", "Biography", "Comedy", "Crime", "Documentary", "Drama",
    "Family", "Fantasy", "History", "Horror", "Music", "Musical", "Mystery", "Romance", "Sci-Fi",
    "Sport", "Thriller", "War", "Western",
];

const PAGE_SIZE: usize = 10;
const MAX_PAGES_PER_CALL: usize = 5;

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Search", default)]
    search: Vec<SearchHit>,
    #[serde(rename = "totalResults", default)]
    total_results: Option<String>,
    #[serde(rename = "Error", default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "imdbID")]
    imdb_id: String,
}

#[derive(Debug, Clone, PartialEq)]
struct Cursor {
    term: String,
    page: usize,
}

/// Client for the public OMDb API.
pub struct OmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    cursor: Mutex<Cursor>,
}

impl OmdbClient {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            cursor: Mutex::new(Cursor {
                term: random_term(),
                page: 1,
            }),
        }
    }

    async fn search_page(&self, term: &str, page: usize) -> ApiResult<(Vec<String>, usize)> {
        debug!(term = term, page = page, "OMDb search");
        let page_number = page.to_string();
        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("s", term),
                ("type", "movie"),
                ("page", page_number.as_str()),
            ])
            .send()
            .await?;
        let page: SearchPage = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        if page.response != "True" {
            debug!(term = term, error = ?page.error, "OMDb search returned no results");
            return Ok((Vec::new(), 0));
        }

        let total = page
            .total_results
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or(0);
        Ok((page.search.into_iter().map(|h| h.imdb_id).collect(), total))
    }

    /// Fetches full records for every id concurrently, keeping input order.
    /// Ids whose lookup fails are dropped.
    async fn details_for(&self, ids: Vec<String>) -> Vec<Movie> {
        let mut set = JoinSet::new();
        for (index, id) in ids.into_iter().enumerate() {
            let http = self.http.clone();
            let base_url = self.base_url.clone();
            let api_key = self.api_key.clone();
            set.spawn(async move { (index, fetch_details(&http, &base_url, &api_key, &id).await) });
        }

        let mut found = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, Ok(movie))) => found.push((index, movie)),
                Ok((_, Err(e))) => warn!("Skipping movie, detail lookup failed: {}", e),
                Err(e) => warn!("Detail lookup task failed: {}", e),
            }
        }
        found.sort_by_key(|(index, _)| *index);
        found.into_iter().map(|(_, movie)| movie).collect()
    }

    fn take_cursor(&self) -> Cursor {
        match self.cursor.lock() {
            Ok(cursor) => cursor.clone(),
            Err(_) => Cursor {
                term: random_term(),
                page: 1,
            },
        }
    }

    fn advance_cursor(&self, used: &Cursor, exhausted: bool) {
        if let Ok(mut cursor) = self.cursor.lock() {
            // Another sampler already moved on.
            if *cursor != *used {
                return;
            }
            if exhausted {
                *cursor = Cursor {
                    term: random_term(),
                    page: 1,
                };
            } else {
                cursor.page += 1;
            }
        }
    }
}

async fn fetch_details(http: &reqwest::Client, base_url: &str, api_key: &str, id: &str) -> ApiResult<Movie> {
    let response = http
        .get(base_url)
        .query(&[("apikey", api_key), ("i", id), ("plot", "full")])
        .send()
        .await?;
    let value: Value = check_status(response)
        .await?
        .json()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))?;

    if value.get("Response").and_then(Value::as_str) != Some("True") {
        return Err(ApiError::NotFound(id.to_string()));
    }
    normalize_movie(value).ok_or_else(|| ApiError::NotFound(id.to_string()))
}

fn random_term() -> String {
    SAMPLE_TERMS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("love")
        .to_string()
}

#[async_trait]
impl MovieApi for OmdbClient {
    async fn search_movies(&self, request: &MovieSearchRequest) -> ApiResult<Vec<Movie>> {
        let pages = request.limit.div_ceil(PAGE_SIZE).clamp(1, MAX_PAGES_PER_CALL);
        let mut movies = Vec::new();

        for page in 1..=pages {
            let (ids, total) = self.search_page(&request.query, page).await?;
            if ids.is_empty() {
                break;
            }
            movies.extend(
                self.details_for(ids)
                    .await
                    .into_iter()
                    .filter(|m| m.matches_genres(&request.genres)),
            );
            if movies.len() >= request.limit || page * PAGE_SIZE >= total {
                break;
            }
        }

        movies.truncate(request.limit);
        Ok(movies)
    }

    async fn get_movie_details(&self, id: &str) -> ApiResult<Movie> {
        fetch_details(&self.http, &self.base_url, &self.api_key, id).await
    }

    async fn get_available_genres(&self) -> ApiResult<Vec<String>> {
        Ok(GENRES.iter().map(|g| g.to_string()).collect())
    }

    async fn get_genre_statistics(&self, genres: &[String]) -> ApiResult<GenreStats> {
        let sample = self.get_random_movies("", PAGE_SIZE, genres).await?;
        Ok(GenreStats::from_movies(&sample))
    }

    async fn get_random_movies(&self, _user_id: &str, limit: usize, genres: &[String]) -> ApiResult<Vec<Movie>> {
        let mut movies = Vec::new();

        for _ in 0..MAX_PAGES_PER_CALL {
            let cursor = self.take_cursor();
            let (ids, total) = self.search_page(&cursor.term, cursor.page).await?;
            let exhausted = ids.is_empty() || cursor.page * PAGE_SIZE >= total;
            self.advance_cursor(&cursor, exhausted);

            movies.extend(
                self.details_for(ids)
                    .await
                    .into_iter()
                    .filter(|m| m.matches_genres(genres)),
            );
            if movies.len() >= limit {
                break;
            }
        }

        movies.truncate(limit);
        Ok(movies)
    }

    async fn get_recommendations(&self, _user_id: &str, _limit: usize) -> ApiResult<Vec<Movie>> {
        Err(ApiError::Unsupported("Recommendations"))
    }

    async fn record_swipe_action(&self, event: &SwipeEvent) -> ApiResult<()> {
        debug!(movie_id = %event.movie_id, action = %event.action, "OMDb source does not record swipes");
        Ok(())
    }
}
