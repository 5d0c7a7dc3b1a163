use serde::Serialize;

use super::normalize::release_year;
use super::types::Movie;

pub const PLACEHOLDER_POSTER: &str = "/placeholder-movie.png";
pub const NOT_AVAILABLE: &str = "N/A";

/// Display-ready card. Missing fields are replaced with placeholders so a
/// partial record always renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieCardView {
    pub id: String,
    pub title: String,
    pub poster: String,
    pub overview: String,
    pub release: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub rating: String,
    pub genres: String,
    pub director: String,
    pub actors: String,
    pub runtime: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awards: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_office: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
}

impl From<&Movie> for MovieCardView {
    fn from(movie: &Movie) -> Self {
        let release = or_na(movie.release.as_deref());
        Self {
            id: movie.id.clone(),
            title: movie.title.clone(),
            poster: poster_url(movie.poster.as_deref()).to_string(),
            overview: movie
                .overview
                .clone()
                .unwrap_or_else(|| "No description available".to_string()),
            year: movie.release.as_deref().and_then(release_year),
            release,
            rating: movie
                .rating
                .map(|r| format!("{:.1}", r))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            genres: if movie.genres.is_empty() {
                NOT_AVAILABLE.to_string()
            } else {
                movie.genres.join(", ")
            },
            director: or_na(movie.director.as_deref()),
            actors: or_na(movie.actors.as_deref()),
            runtime: or_na(movie.runtime.as_deref()),
            awards: movie.awards.clone(),
            box_office: movie.box_office.clone(),
            confidence: movie.confidence.map(|c| format!("{:.0}%", c * 100.0)),
        }
    }
}

/// Returns the poster to display, falling back to the placeholder image for
/// missing or non-URL values.
pub fn poster_url(poster: Option<&str>) -> &str {
    match poster {
        Some(p) if p.starts_with("http://") || p.starts_with("https://") || p.starts_with('/') => p,
        _ => PLACEHOLDER_POSTER,
    }
}

fn or_na(value: Option<&str>) -> String {
    value.unwrap_or(NOT_AVAILABLE).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_poster_uses_placeholder() {
        let movie = Movie::new("tt1", "No Poster");
        let view = MovieCardView::from(&movie);
        assert_eq!(view.poster, PLACEHOLDER_POSTER);
        assert_eq!(view.rating, "N/A");
        assert_eq!(view.director, "N/A");
        assert_eq!(view.genres, "N/A");
        assert_eq!(view.overview, "No description available");
        assert_eq!(view.year, None);
    }

    #[test]
    fn test_full_record_view() {
        let mut movie = Movie::new("tt0133093", "The Matrix");
        movie.poster = Some("https://example.com/m.jpg".to_string());
        movie.release = Some("1999".to_string());
        movie.rating = Some(8.7);
        movie.genres = vec!["Action".to_string(), "Sci-Fi".to_string()];
        movie.confidence = Some(0.75);

        let view = MovieCardView::from(&movie);
        assert_eq!(view.poster, "https://example.com/m.jpg");
        assert_eq!(view.year, Some(1999));
        assert_eq!(view.rating, "8.7");
        assert_eq!(view.genres, "Action, Sci-Fi");
        assert_eq!(view.confidence.as_deref(), Some("75%"));
    }

    #[test]
    fn test_bogus_poster_value() {
        assert_eq!(poster_url(Some("N/A")), PLACEHOLDER_POSTER);
        assert_eq!(poster_url(Some("/img/a.png")), "/img/a.png");
    }
}
