use axum::{
    extract::Request,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use std::sync::{Arc, Mutex, MutexGuard};
use tower::Layer;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::api::MovieApi;
use crate::config::Config;
use crate::identity::UserIdProvider;
use crate::pages;
use crate::swipe::{CardStack, GestureConfig, SwipeSession};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub api: Arc<dyn MovieApi>,
    pub identity: Arc<UserIdProvider>,
    pub session: SwipeSession,
    deck: Arc<Mutex<CardStack<String>>>,
}

impl AppState {
    pub fn new(
        config: Config,
        api: Arc<dyn MovieApi>,
        identity: Arc<UserIdProvider>,
        session: SwipeSession,
    ) -> Self {
        let deck = CardStack::new(GestureConfig::from(&config.swipe));
        Self {
            config: Arc::new(config),
            api,
            identity,
            session,
            deck: Arc::new(Mutex::new(deck)),
        }
    }

    /// The card stack shown on the swipe page. Never hold across an await.
    pub fn deck(&self) -> MutexGuard<'_, CardStack<String>> {
        self.deck.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/home", get(pages::home::home))
        .route("/api/user", get(pages::home::current_user))
        .route("/api/genres", get(pages::search::genres))
        .route("/api/search", get(pages::search::search))
        .route("/api/search/stats", get(pages::search::genre_stats))
        .route("/api/movies/:id", get(pages::search::movie_details))
        .route("/api/swipe", get(pages::swipe::swipe_page))
        .route("/api/swipe/pointer", post(pages::swipe::pointer))
        .route("/api/swipe/reload", post(pages::swipe::reload))
        .route("/api/swipe/recommendations", post(pages::swipe::recommendations))
        .route("/api/swipe/animation-finished", post(pages::swipe::animation_finished))
        .route("/api/swipe/:action", post(pages::swipe::press))
        .route("/api/liked", get(pages::liked::list_liked).delete(pages::liked::clear_liked))
        .route("/api/liked/:id", delete(pages::liked::remove_liked));

    let mut router = Router::new().merge(api_routes).fallback(fallback_handler);

    if let Some(ref appdir) = state.config.appdir {
        router = router.fallback_service(ServeDir::new(appdir));
    }

    router
        .layer(axum::middleware::from_fn(crate::middleware::log_request))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The router with path normalization in front, so rewritten paths are
/// what routing sees. Serve this one.
pub fn build_app(state: AppState) -> Router {
    let normalized = axum::middleware::from_fn(crate::middleware::normalize_path).layer(build_router(state));
    Router::new().fallback_service(normalized)
}

async fn fallback_handler(req: Request<axum::body::Body>) -> impl IntoResponse {
    if req.method() == axum::http::Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}
