use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::types::Movie;

/// Any movie payload we may encounter: OMDb, the backend service, TMDB-style
/// records written by older clients, or our own canonical shape. Every
/// naming of a concept gets its own slot so mixed records still parse.
#[derive(Debug, Default, Deserialize)]
pub struct RawMovie {
    #[serde(default)]
    id: Option<Value>,
    #[serde(rename = "imdbID", default)]
    imdb_id: Option<Value>,

    #[serde(default)]
    title: Option<Value>,
    #[serde(rename = "Title", default)]
    omdb_title: Option<Value>,

    #[serde(default)]
    poster: Option<Value>,
    #[serde(rename = "Poster", default)]
    omdb_poster: Option<Value>,
    #[serde(default)]
    poster_path: Option<Value>,

    #[serde(default)]
    overview: Option<Value>,
    #[serde(default)]
    plot: Option<Value>,
    #[serde(rename = "Plot", default)]
    omdb_plot: Option<Value>,

    #[serde(default)]
    release: Option<Value>,
    #[serde(default)]
    release_date: Option<Value>,
    #[serde(default)]
    year: Option<Value>,
    #[serde(rename = "Year", default)]
    omdb_year: Option<Value>,

    #[serde(default)]
    rating: Option<Value>,
    #[serde(default)]
    vote_average: Option<Value>,
    #[serde(rename = "imdbRating", default)]
    imdb_rating: Option<Value>,
    #[serde(rename = "imdb_rating", default)]
    imdb_rating_snake: Option<Value>,

    #[serde(default)]
    genres: Option<Value>,
    #[serde(default)]
    genre: Option<Value>,
    #[serde(rename = "Genre", default)]
    omdb_genre: Option<Value>,
    #[serde(rename = "detectedGenres", default)]
    detected_genres: Option<Value>,

    #[serde(default)]
    runtime: Option<Value>,
    #[serde(rename = "Runtime", default)]
    omdb_runtime: Option<Value>,
    #[serde(default)]
    director: Option<Value>,
    #[serde(rename = "Director", default)]
    omdb_director: Option<Value>,
    #[serde(default)]
    actors: Option<Value>,
    #[serde(rename = "Actors", default)]
    omdb_actors: Option<Value>,
    #[serde(default)]
    awards: Option<Value>,
    #[serde(rename = "Awards", default)]
    omdb_awards: Option<Value>,
    #[serde(rename = "boxOffice", default)]
    box_office: Option<Value>,
    #[serde(rename = "BoxOffice", default)]
    omdb_box_office: Option<Value>,
    #[serde(rename = "box_office", default)]
    box_office_snake: Option<Value>,
    #[serde(rename = "imdbVotes", default)]
    imdb_votes: Option<Value>,
    #[serde(rename = "imdb_votes", default)]
    imdb_votes_snake: Option<Value>,

    #[serde(default)]
    confidence: Option<Value>,
}

impl RawMovie {
    pub fn into_movie(self) -> Movie {
        let id = first_text(&[&self.id, &self.imdb_id])
            .unwrap_or_else(|| format!("unknown-{}", uuid::Uuid::new_v4()));
        let title = first_text(&[&self.title, &self.omdb_title])
            .unwrap_or_else(|| "Unknown Title".to_string());

        let rating = [&self.rating, &self.vote_average, &self.imdb_rating, &self.imdb_rating_snake]
            .into_iter()
            .find_map(|v| v.as_ref().and_then(number).filter(|r| *r > 0.0));

        let genres = [&self.genres, &self.genre, &self.omdb_genre, &self.detected_genres]
            .into_iter()
            .map(|v| v.as_ref().map(genre_list).unwrap_or_default())
            .find(|list| !list.is_empty())
            .unwrap_or_default();

        Movie {
            id,
            title,
            poster: first_text(&[&self.poster, &self.poster_path, &self.omdb_poster]),
            overview: first_text(&[&self.overview, &self.plot, &self.omdb_plot]),
            release: first_text(&[&self.release, &self.release_date, &self.year, &self.omdb_year]),
            rating,
            genres,
            runtime: first_text(&[&self.runtime, &self.omdb_runtime]),
            director: first_text(&[&self.director, &self.omdb_director]),
            actors: first_text(&[&self.actors, &self.omdb_actors]),
            awards: first_text(&[&self.awards, &self.omdb_awards]),
            box_office: first_text(&[&self.box_office, &self.omdb_box_office, &self.box_office_snake]),
            imdb_votes: first_text(&[&self.imdb_votes, &self.imdb_votes_snake]),
            confidence: self.confidence.as_ref().and_then(number),
        }
    }
}

/// Normalizes a single JSON payload into a canonical movie.
/// Returns `None` only when the payload is not an object.
pub fn normalize_movie(value: Value) -> Option<Movie> {
    if !value.is_object() {
        return None;
    }
    serde_json::from_value::<RawMovie>(value)
        .ok()
        .map(RawMovie::into_movie)
}

/// Normalizes a list payload. Entries that are not objects are skipped.
pub fn normalize_movies(values: Vec<Value>) -> Vec<Movie> {
    values.into_iter().filter_map(normalize_movie).collect()
}

/// Extracts a four-digit year from release text such as "2010–2012" or
/// "1999-03-31".
pub fn release_year(release: &str) -> Option<i32> {
    static YEAR: OnceLock<Regex> = OnceLock::new();
    let re = YEAR.get_or_init(|| Regex::new(r"\b(\d{4})\b").expect("valid year regex"));
    re.captures(release)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn first_text(values: &[&Option<Value>]) -> Option<String> {
    values.iter().find_map(|v| v.as_ref().and_then(text))
}

fn text(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if s.is_empty() || s.eq_ignore_ascii_case("N/A") {
        None
    } else {
        Some(s)
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

fn genre_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(text).collect(),
        Value::String(_) => text(value)
            .map(|s| {
                s.split(',')
                    .map(|g| g.trim().to_string())
                    .filter(|g| !g.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}
