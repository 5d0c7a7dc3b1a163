use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::{ApiError, ApiResult, MovieApi};
use crate::movie::{normalize_movie, normalize_movies, GenreStats, Movie, MovieSearchRequest, SwipeEvent};

/// Client for the movie backend service.
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> ApiResult<T> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let response = self.http.get(&url).query(query).send().await?;
        let response = check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn get_movies(&self, path: &str, query: &[(&str, String)]) -> ApiResult<Vec<Movie>> {
        let value: Value = self.get_json(path, query).await?;
        movie_list(value)
    }
}

/// Turns a non-success response into an error carrying the server's message.
pub(crate) async fn check_status(response: reqwest::Response) -> ApiResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            ["error", "message", "Error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| {
            let body = body.trim();
            if body.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                body.to_string()
            }
        });

    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

/// Accepts a bare array or an object wrapping the array.
fn movie_list(value: Value) -> ApiResult<Vec<Movie>> {
    match value {
        Value::Array(items) => Ok(normalize_movies(items)),
        Value::Object(mut map) => {
            for key in ["movies", "results", "recommendations"] {
                if let Some(Value::Array(items)) = map.remove(key) {
                    return Ok(normalize_movies(items));
                }
            }
            Err(ApiError::Decode("expected a list of movies".to_string()))
        }
        _ => Err(ApiError::Decode("expected a list of movies".to_string())),
    }
}

fn genre_params(genres: &[String]) -> impl Iterator<Item = (&'static str, String)> + '_ {
    genres.iter().map(|g| ("genres", g.clone()))
}

#[async_trait]
impl MovieApi for BackendClient {
    async fn search_movies(&self, request: &MovieSearchRequest) -> ApiResult<Vec<Movie>> {
        let mut query = vec![
            ("query", request.query.clone()),
            ("limit", request.limit.to_string()),
            ("minConfidence", request.min_confidence.to_string()),
        ];
        query.extend(genre_params(&request.genres));
        self.get_movies("search", &query).await
    }

    async fn get_movie_details(&self, id: &str) -> ApiResult<Movie> {
        let value: Value = self.get_json(&urlencoding::encode(id), &[]).await?;
        normalize_movie(value).ok_or_else(|| ApiError::NotFound(id.to_string()))
    }

    async fn get_available_genres(&self) -> ApiResult<Vec<String>> {
        self.get_json("genres", &[]).await
    }

    async fn get_genre_statistics(&self, genres: &[String]) -> ApiResult<GenreStats> {
        let query: Vec<_> = genre_params(genres).collect();
        self.get_json("stats", &query).await
    }

    async fn get_random_movies(&self, user_id: &str, limit: usize, genres: &[String]) -> ApiResult<Vec<Movie>> {
        let mut query = vec![("userId", user_id.to_string()), ("limit", limit.to_string())];
        query.extend(genre_params(genres));
        self.get_movies("random", &query).await
    }

    async fn get_recommendations(&self, user_id: &str, limit: usize) -> ApiResult<Vec<Movie>> {
        let query = [("userId", user_id.to_string()), ("limit", limit.to_string())];
        self.get_movies("recommendations", &query).await
    }

    async fn record_swipe_action(&self, event: &SwipeEvent) -> ApiResult<()> {
        let url = self.url("swipe");
        debug!(url = %url, movie_id = %event.movie_id, action = %event.action, "POST");
        let response = self.http.post(&url).json(event).send().await?;
        check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movie::SwipeAction;
    use axum::{
        extract::{Path, RawQuery},
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/api/movies", addr)
    }

    #[tokio::test]
    async fn test_search_sends_filters_and_normalizes() {
        let seen = Arc::new(Mutex::new(String::new()));
        let seen_clone = seen.clone();
        let router = Router::new().route(
            "/api/movies/search",
            get(move |RawQuery(q): RawQuery| {
                let seen = seen_clone.clone();
                async move {
                    *seen.lock().unwrap() = q.unwrap_or_default();
                    Json(json!([
                        {"imdbID": "tt1", "title": "One", "imdb_rating": "7.1", "poster": "https://x/1.jpg"},
                        {"imdbID": "tt2", "title": "Two"}
                    ]))
                }
            }),
        );
        let base = spawn_upstream(router).await;
        let client = BackendClient::new(reqwest::Client::new(), &format!("{}/", base));

        let mut request = MovieSearchRequest::new("space");
        request.genres = vec!["Sci-Fi".to_string(), "Drama".to_string()];
        let movies = client.search_movies(&request).await.unwrap();

        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].id, "tt1");
        assert_eq!(movies[0].rating, Some(7.1));
        let q = seen.lock().unwrap().clone();
        assert!(q.contains("query=space"));
        assert!(q.contains("limit=10"));
        assert!(q.contains("minConfidence=0.3"));
        assert!(q.contains("genres=Sci-Fi"));
        assert!(q.contains("genres=Drama"));
    }

    #[tokio::test]
    async fn test_details_and_swipe() {
        let swipes = Arc::new(Mutex::new(Vec::<SwipeEvent>::new()));
        let swipes_clone = swipes.clone();
        let router = Router::new()
            .route(
                "/api/movies/:id",
                get(|Path(id): Path<String>| async move {
                    Json(json!({"imdbID": id, "title": "Detail", "plot": "Plot text"}))
                }),
            )
            .route(
                "/api/movies/swipe",
                post(move |Json(event): Json<SwipeEvent>| {
                    let swipes = swipes_clone.clone();
                    async move {
                        swipes.lock().unwrap().push(event);
                        StatusCode::NO_CONTENT
                    }
                }),
            );
        let base = spawn_upstream(router).await;
        let client = BackendClient::new(reqwest::Client::new(), &base);

        let movie = client.get_movie_details("tt42").await.unwrap();
        assert_eq!(movie.id, "tt42");
        assert_eq!(movie.overview.as_deref(), Some("Plot text"));

        let event = SwipeEvent::now("user-1", "tt42", SwipeAction::Skip);
        client.record_swipe_action(&event).await.unwrap();
        assert_eq!(swipes.lock().unwrap().as_slice(), &[event]);
    }

    #[tokio::test]
    async fn test_error_status_carries_message() {
        let router = Router::new().route(
            "/api/movies/random",
            get(|| async {
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({"error": "Database is warming up"})),
                )
            }),
        );
        let base = spawn_upstream(router).await;
        let client = BackendClient::new(reqwest::Client::new(), &base);

        let err = client.get_random_movies("u", 10, &[]).await.unwrap_err();
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "Database is warming up");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_movie_list_shapes() {
        let wrapped = json!({"movies": [{"imdbID": "a", "title": "A"}]});
        assert_eq!(movie_list(wrapped).unwrap().len(), 1);
        assert!(movie_list(json!("nope")).is_err());
    }
}
