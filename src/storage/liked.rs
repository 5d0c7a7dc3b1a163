use serde_json::Value;
use tracing::debug;

use super::store::{load_json, save_json, KeyValueStore};
use crate::movie::{normalize_movies, Movie};

pub const LIKED_MOVIES_KEY: &str = "likedMovies";
pub const USER_ID_KEY: &str = "user_id";

/// Restores the liked collection. Records written by any client version are
/// accepted; anything unreadable yields an empty collection.
pub fn load_liked(store: &dyn KeyValueStore) -> Vec<Movie> {
    let movies = load_json::<Vec<Value>>(store, LIKED_MOVIES_KEY)
        .map(normalize_movies)
        .unwrap_or_default();
    debug!(count = movies.len(), "Restored liked movies");
    movies
}

/// Overwrites the persisted liked collection.
pub fn save_liked(store: &dyn KeyValueStore, movies: &[Movie]) -> bool {
    save_json(store, LIKED_MOVIES_KEY, movies)
}
