use axum::{extract::State, Json};
use serde::Serialize;
use tracing::error;

use crate::server::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePage {
    pub user_id: String,
    pub genres: Vec<String>,
    pub liked_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: String,
}

/// Genre picker. A failed genre lookup still renders the page.
pub async fn home(State(state): State<AppState>) -> Json<HomePage> {
    let genres = match state.api.get_available_genres().await {
        Ok(genres) => genres,
        Err(e) => {
            error!("Failed to load genres: {}", e);
            Vec::new()
        }
    };

    Json(HomePage {
        user_id: state.identity.user_id(),
        genres,
        liked_count: state.session.liked().len(),
    })
}

pub async fn current_user(State(state): State<AppState>) -> Json<UserInfo> {
    Json(UserInfo {
        user_id: state.identity.user_id(),
    })
}
