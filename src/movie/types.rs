use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Canonical movie record shared by every source and consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actors: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awards: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_office: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_votes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Movie {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            poster: None,
            overview: None,
            release: None,
            rating: None,
            genres: Vec::new(),
            runtime: None,
            director: None,
            actors: None,
            awards: None,
            box_office: None,
            imdb_votes: None,
            confidence: None,
        }
    }

    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g.eq_ignore_ascii_case(genre))
    }

    /// True when the movie carries at least one of `genres`, or the filter is empty.
    pub fn matches_genres(&self, genres: &[String]) -> bool {
        genres.is_empty() || genres.iter().any(|g| self.has_genre(g))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeAction {
    Like,
    Skip,
}

impl SwipeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwipeAction::Like => "like",
            SwipeAction::Skip => "skip",
        }
    }
}

impl fmt::Display for SwipeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwipeAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(SwipeAction::Like),
            "skip" => Ok(SwipeAction::Skip),
            other => Err(format!("unknown swipe action: {}", other)),
        }
    }
}

/// One user decision, as recorded upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeEvent {
    pub user_id: String,
    pub movie_id: String,
    pub action: SwipeAction,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl SwipeEvent {
    pub fn now(user_id: &str, movie_id: &str, action: SwipeAction) -> Self {
        Self {
            user_id: user_id.to_string(),
            movie_id: movie_id.to_string(),
            action,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieSearchRequest {
    pub query: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

impl MovieSearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            genres: Vec::new(),
            limit: default_search_limit(),
            min_confidence: default_min_confidence(),
        }
    }
}

pub fn default_search_limit() -> usize {
    10
}

pub fn default_min_confidence() -> f64 {
    0.3
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenreStats {
    #[serde(default)]
    pub genre_distribution: HashMap<String, u64>,
    #[serde(default)]
    pub total_movies: u64,
    #[serde(default)]
    pub average_confidence: f64,
}

impl GenreStats {
    /// Builds statistics from a sample of movies.
    pub fn from_movies(movies: &[Movie]) -> Self {
        let mut genre_distribution = HashMap::new();
        let mut confidence_sum = 0.0;
        let mut confidence_count = 0;

        for movie in movies {
            for genre in &movie.genres {
                *genre_distribution.entry(genre.clone()).or_insert(0) += 1;
            }
            if let Some(c) = movie.confidence {
                confidence_sum += c;
                confidence_count += 1;
            }
        }

        let average_confidence = if confidence_count > 0 {
            confidence_sum / confidence_count as f64
        } else {
            0.0
        };

        Self {
            genre_distribution,
            total_movies: movies.len() as u64,
            average_confidence,
        }
    }
}
