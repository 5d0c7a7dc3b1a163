use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::gesture::Direction;
use crate::api::{ApiResult, MovieApi, DEFAULT_RECOMMENDATION_LIMIT};
use crate::config::{DedupePolicy, SwipeConfig};
use crate::identity::{UserIdProvider, PLACEHOLDER_USER_ID};
use crate::movie::{Movie, SwipeAction, SwipeEvent};
use crate::storage::{load_liked, save_liked, KeyValueStore};

#[derive(Debug, Default)]
struct SessionState {
    candidates: Vec<Movie>,
    liked: Vec<Movie>,
    loading: bool,
    error: Option<String>,
    genres: Vec<String>,
    decided: HashSet<String>,
}

impl SessionState {
    /// Appends `batch`. A decided movie never re-enters the queue and ids
    /// stay unique; with `ById` liked movies are dropped as well.
    fn enqueue(&mut self, batch: Vec<Movie>, policy: DedupePolicy) -> usize {
        let mut queued: HashSet<String> = self.candidates.iter().map(|m| m.id.clone()).collect();
        let mut added = 0;
        for movie in batch {
            if self.decided.contains(&movie.id) {
                continue;
            }
            if policy == DedupePolicy::ById && self.liked.iter().any(|m| m.id == movie.id) {
                continue;
            }
            if queued.insert(movie.id.clone()) {
                self.candidates.push(movie);
                added += 1;
            }
        }
        added
    }
}

/// Point-in-time copy of the session for rendering.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub candidates: Vec<Movie>,
    pub liked: Vec<Movie>,
    pub loading: bool,
    pub refilling: bool,
    pub error: Option<String>,
    pub genres: Vec<String>,
}

/// Result of one decision. The handles belong to fire-and-forget work and
/// may simply be dropped.
#[derive(Debug)]
pub struct SwipeOutcome {
    pub accepted: bool,
    pub action: SwipeAction,
    pub remaining: usize,
    pub liked_count: usize,
    pub recorded: Option<JoinHandle<()>>,
    pub refill: Option<JoinHandle<()>>,
}

/// Candidate queue and liked collection for the local user.
#[derive(Clone)]
pub struct SwipeSession {
    api: Arc<dyn MovieApi>,
    store: Arc<dyn KeyValueStore>,
    identity: Arc<UserIdProvider>,
    config: SwipeConfig,
    state: Arc<RwLock<SessionState>>,
    started: Arc<AtomicBool>,
    refills_in_flight: Arc<AtomicUsize>,
}

impl SwipeSession {
    pub fn new(
        api: Arc<dyn MovieApi>,
        store: Arc<dyn KeyValueStore>,
        identity: Arc<UserIdProvider>,
        config: SwipeConfig,
    ) -> Self {
        Self {
            api,
            store,
            identity,
            config,
            state: Arc::new(RwLock::new(SessionState::default())),
            started: Arc::new(AtomicBool::new(false)),
            refills_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn user_id(&self) -> String {
        self.identity.user_id()
    }

    /// Restores liked movies and loads the first batch of candidates once a
    /// real user identity is available. Later calls are no-ops.
    pub async fn start(&self) {
        if self.user_id() == PLACEHOLDER_USER_ID {
            debug!("User identity not available yet, deferring session start");
            return;
        }
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        self.restore_liked();
        if let Err(e) = self.load_random_movies(None).await {
            error!("Failed to load initial movies: {}", e);
        }
    }

    pub fn restore_liked(&self) {
        let liked = load_liked(self.store.as_ref());
        info!(count = liked.len(), "Loaded liked movies");
        self.write().liked = liked;
    }

    /// Replaces the candidate queue with a fresh random batch. `genres`
    /// replaces the active filter when given.
    pub async fn load_random_movies(&self, genres: Option<Vec<String>>) -> ApiResult<()> {
        let genres = {
            let mut state = self.write();
            if let Some(genres) = genres {
                state.genres = genres;
            }
            state.loading = true;
            state.error = None;
            state.genres.clone()
        };

        let result = self
            .api
            .get_random_movies(&self.user_id(), self.config.batch_size, &genres)
            .await;

        let mut state = self.write();
        state.loading = false;
        match result {
            Ok(movies) => {
                state.candidates.clear();
                let added = state.enqueue(movies, self.config.dedupe);
                debug!(added = added, "Loaded random movies");
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Replaces the candidate queue with personalized recommendations.
    pub async fn get_recommendations(&self) -> ApiResult<()> {
        {
            let mut state = self.write();
            state.loading = true;
            state.error = None;
        }

        let result = self
            .api
            .get_recommendations(&self.user_id(), DEFAULT_RECOMMENDATION_LIMIT)
            .await;

        let mut state = self.write();
        state.loading = false;
        match result {
            Ok(movies) => {
                state.candidates.clear();
                let added = state.enqueue(movies, self.config.dedupe);
                info!(count = added, "Loaded recommendations");
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Applies a like/skip decision. The movie leaves the queue at once; the
    /// upstream record and any refill run in the background.
    pub fn handle_swipe(&self, direction: Direction, movie: &Movie) -> SwipeOutcome {
        let action = direction.action();

        let (remaining, liked_count) = {
            let mut state = self.write();
            let before = state.candidates.len();
            state.candidates.retain(|m| m.id != movie.id);
            if state.candidates.len() == before {
                debug!(movie_id = %movie.id, "Ignoring decision for a movie not in the queue");
                return SwipeOutcome {
                    accepted: false,
                    action,
                    remaining: before,
                    liked_count: state.liked.len(),
                    recorded: None,
                    refill: None,
                };
            }
            state.decided.insert(movie.id.clone());

            if action == SwipeAction::Like {
                state.liked.push(movie.clone());
                save_liked(self.store.as_ref(), &state.liked);
            }
            (state.candidates.len(), state.liked.len())
        };

        info!(movie_id = %movie.id, action = %action, remaining = remaining, "Swipe");

        let event = SwipeEvent::now(&self.user_id(), &movie.id, action);
        let api = Arc::clone(&self.api);
        let recorded = tokio::spawn(async move {
            if let Err(e) = api.record_swipe_action(&event).await {
                error!(movie_id = %event.movie_id, "Failed to record swipe action: {}", e);
            }
        });

        let refill = if remaining <= self.config.low_water_mark {
            Some(self.spawn_refill())
        } else {
            None
        };

        SwipeOutcome {
            accepted: true,
            action,
            remaining,
            liked_count,
            recorded: Some(recorded),
            refill,
        }
    }

    /// Counts the refill as in flight before the task is scheduled.
    fn spawn_refill(&self) -> JoinHandle<()> {
        self.refills_in_flight.fetch_add(1, Ordering::SeqCst);
        let session = self.clone();
        tokio::spawn(async move { session.refill().await })
    }

    /// Appends another random batch. Failures are logged only.
    async fn refill(&self) {
        let genres = self.read().genres.clone();

        match self
            .api
            .get_random_movies(&self.user_id(), self.config.batch_size, &genres)
            .await
        {
            Ok(movies) => {
                let fetched = movies.len();
                let added = self.write().enqueue(movies, self.config.dedupe);
                debug!(fetched = fetched, added = added, "Refilled candidate queue");
            }
            Err(e) => warn!("Background refill failed: {}", e),
        }

        self.refills_in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn remove_liked(&self, id: &str) -> bool {
        let mut state = self.write();
        let before = state.liked.len();
        state.liked.retain(|m| m.id != id);
        if state.liked.len() == before {
            return false;
        }
        save_liked(self.store.as_ref(), &state.liked);
        true
    }

    pub fn clear_liked(&self) {
        let mut state = self.write();
        state.liked.clear();
        save_liked(self.store.as_ref(), &state.liked);
    }

    pub fn head(&self) -> Option<Movie> {
        self.read().candidates.first().cloned()
    }

    pub fn candidate(&self, id: &str) -> Option<Movie> {
        self.read().candidates.iter().find(|m| m.id == id).cloned()
    }

    pub fn candidate_ids(&self) -> Vec<String> {
        self.read().candidates.iter().map(|m| m.id.clone()).collect()
    }

    pub fn genres(&self) -> Vec<String> {
        self.read().genres.clone()
    }

    pub fn liked(&self) -> Vec<Movie> {
        self.read().liked.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.read();
        SessionSnapshot {
            candidates: state.candidates.clone(),
            liked: state.liked.clone(),
            loading: state.loading,
            refilling: self.refills_in_flight.load(Ordering::SeqCst) > 0,
            error: state.error.clone(),
            genres: state.genres.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{movies, MockApi};
    use crate::api::ApiError;
    use crate::storage::{MemoryStore, LIKED_MOVIES_KEY};

    fn ids(movies: &[Movie]) -> Vec<&str> {
        movies.iter().map(|m| m.id.as_str()).collect()
    }

    fn session(api: Arc<MockApi>, store: Arc<MemoryStore>, dedupe: DedupePolicy) -> SwipeSession {
        let identity = Arc::new(UserIdProvider::new(Some(store.clone())));
        let config = SwipeConfig {
            dedupe,
            ..SwipeConfig::default()
        };
        SwipeSession::new(api, store, identity, config)
    }

    #[tokio::test]
    async fn test_like_skip_refill_scenario() {
        let api = MockApi::with_batches(vec![Ok(movies(&["a", "b", "c"])), Ok(movies(&["d", "e"])), Ok(movies(&["e", "f"]))]);
        let store = Arc::new(MemoryStore::new());
        let s = session(api.clone(), store.clone(), DedupePolicy::ById);
        s.start().await;
        assert_eq!(ids(&s.snapshot().candidates), vec!["a", "b", "c"]);

        let a = s.head().unwrap();
        let liked = s.handle_swipe(Direction::Right, &a);
        assert!(liked.accepted);
        let snap = s.snapshot();
        assert_eq!(ids(&snap.candidates), vec!["b", "c"]);
        assert_eq!(ids(&snap.liked), vec!["a"]);

        let b = s.candidate("b").unwrap();
        let skipped = s.handle_swipe(Direction::Left, &b);
        let snap = s.snapshot();
        assert_eq!(ids(&snap.candidates), vec!["c"]);
        assert_eq!(ids(&snap.liked), vec!["a"]);
        assert_eq!(skipped.remaining, 1);
        assert!(skipped.refill.is_some());

        liked.refill.unwrap().await.unwrap();
        skipped.refill.unwrap().await.unwrap();
        liked.recorded.unwrap().await.unwrap();
        skipped.recorded.unwrap().await.unwrap();

        assert_eq!(api.random_call_count(), 3);
        assert_eq!(ids(&s.snapshot().candidates), vec!["c", "d", "e", "f"]);

        let swipes = api.swipes.lock().unwrap().clone();
        assert_eq!(swipes.len(), 2);
        assert_eq!(swipes[0].action, SwipeAction::Like);
        assert_eq!(swipes[1].movie_id, "b");
        assert_eq!(swipes[1].action, SwipeAction::Skip);
    }

    #[tokio::test]
    async fn test_decision_applies_exactly_once() {
        let api = MockApi::with_batches(vec![Ok(movies(&["a", "b", "c", "d", "e"]))]);
        let store = Arc::new(MemoryStore::new());
        let s = session(api, store, DedupePolicy::ById);
        s.start().await;

        let a = s.head().unwrap();
        let first = s.handle_swipe(Direction::Right, &a);
        let second = s.handle_swipe(Direction::Right, &a);
        assert!(first.accepted);
        assert!(!second.accepted);
        assert!(second.refill.is_none());
        assert_eq!(s.liked().len(), 1);
        assert!(s.candidate("a").is_none());
        assert!(first.refill.is_none());
    }

    #[tokio::test]
    async fn test_like_persists_and_skip_does_not() {
        let api = MockApi::with_batches(vec![Ok(movies(&["a", "b", "c", "d", "e", "f"]))]);
        let store = Arc::new(MemoryStore::new());
        let s = session(api, store.clone(), DedupePolicy::ById);
        s.start().await;

        let a = s.head().unwrap();
        s.handle_swipe(Direction::Left, &a);
        assert!(s.liked().is_empty());
        assert_eq!(store.get(LIKED_MOVIES_KEY).unwrap(), None);

        let b = s.head().unwrap();
        s.handle_swipe(Direction::Right, &b);
        let persisted = load_liked(store.as_ref());
        assert_eq!(persisted, s.liked());
        assert_eq!(ids(&persisted), vec!["b"]);
    }

    #[tokio::test]
    async fn test_refill_failure_is_not_surfaced() {
        let api = MockApi::with_batches(vec![
            Ok(movies(&["a", "b"])),
            Err(ApiError::Status {
                status: 500,
                message: "boom".to_string(),
            }),
        ]);
        let store = Arc::new(MemoryStore::new());
        let s = session(api, store, DedupePolicy::ById);
        s.start().await;

        let a = s.head().unwrap();
        let outcome = s.handle_swipe(Direction::Left, &a);
        outcome.refill.unwrap().await.unwrap();

        let snap = s.snapshot();
        assert_eq!(snap.error, None);
        assert!(!snap.refilling);
        assert_eq!(ids(&snap.candidates), vec!["b"]);
    }

    #[tokio::test]
    async fn test_decided_movies_never_return() {
        for dedupe in [DedupePolicy::None, DedupePolicy::ById] {
            let api = MockApi::with_batches(vec![Ok(movies(&["a", "b"])), Ok(movies(&["a", "b", "b", "c"]))]);
            let s = session(api, Arc::new(MemoryStore::new()), dedupe);
            s.start().await;

            let a = s.head().unwrap();
            s.handle_swipe(Direction::Left, &a).refill.unwrap().await.unwrap();
            assert_eq!(ids(&s.snapshot().candidates), vec!["b", "c"]);
        }
    }

    #[tokio::test]
    async fn test_dedupe_policy_and_earlier_likes() {
        let batch = || vec![Ok(movies(&["x", "a"]))];

        let store = Arc::new(MemoryStore::new());
        save_liked(store.as_ref(), &movies(&["x"]));
        let s = session(MockApi::with_batches(batch()), store, DedupePolicy::ById);
        s.start().await;
        assert_eq!(ids(&s.snapshot().candidates), vec!["a"]);

        let store = Arc::new(MemoryStore::new());
        save_liked(store.as_ref(), &movies(&["x"]));
        let s = session(MockApi::with_batches(batch()), store, DedupePolicy::None);
        s.start().await;
        assert_eq!(ids(&s.snapshot().candidates), vec!["x", "a"]);
    }

    #[tokio::test]
    async fn test_refilling_reported_until_refill_lands() {
        let api = MockApi::with_batches(vec![Ok(movies(&["a", "b"])), Ok(movies(&["c"]))]);
        let s = session(api, Arc::new(MemoryStore::new()), DedupePolicy::ById);
        s.start().await;

        let a = s.head().unwrap();
        let outcome = s.handle_swipe(Direction::Left, &a);
        assert!(s.snapshot().refilling);

        outcome.refill.unwrap().await.unwrap();
        let snap = s.snapshot();
        assert!(!snap.refilling);
        assert_eq!(ids(&snap.candidates), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_initial_load_error_and_recommendations() {
        let api = MockApi::with_batches(vec![Err(ApiError::Status {
            status: 502,
            message: "upstream down".to_string(),
        })]);
        let store = Arc::new(MemoryStore::new());
        let s = session(api.clone(), store, DedupePolicy::ById);
        s.start().await;

        let snap = s.snapshot();
        assert!(snap.candidates.is_empty());
        assert!(!snap.loading);
        assert!(snap.error.unwrap().contains("upstream down"));

        assert!(s.get_recommendations().await.is_err());
        assert!(s.snapshot().error.unwrap().contains("not supported"));

        *api.recommendations.lock().unwrap() = Some(movies(&["r1", "r2"]));
        s.get_recommendations().await.unwrap();
        let snap = s.snapshot();
        assert_eq!(snap.error, None);
        assert_eq!(ids(&snap.candidates), vec!["r1", "r2"]);
    }

    #[tokio::test]
    async fn test_genre_filter_carries_into_refills() {
        let api = MockApi::with_batches(vec![Ok(movies(&["a"])), Ok(movies(&["b"])), Ok(movies(&["c"]))]);
        let store = Arc::new(MemoryStore::new());
        let s = session(api.clone(), store, DedupePolicy::ById);
        s.start().await;

        s.load_random_movies(Some(vec!["Horror".to_string()])).await.unwrap();
        let b = s.head().unwrap();
        s.handle_swipe(Direction::Left, &b).refill.unwrap().await.unwrap();

        let calls = api.random_calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 3);
        assert!(calls[0].is_empty());
        assert_eq!(calls[1], vec!["Horror".to_string()]);
        assert_eq!(calls[2], vec!["Horror".to_string()]);
    }

    #[tokio::test]
    async fn test_liked_restored_and_removed() {
        let store = Arc::new(MemoryStore::new());
        save_liked(store.as_ref(), &movies(&["x", "y", "z"]));

        let s = session(MockApi::with_batches(vec![]), store.clone(), DedupePolicy::ById);
        s.start().await;
        assert_eq!(ids(&s.liked()), vec!["x", "y", "z"]);

        assert!(s.remove_liked("y"));
        assert!(!s.remove_liked("y"));
        assert_eq!(ids(&load_liked(store.as_ref())), vec!["x", "z"]);

        s.clear_liked();
        assert!(load_liked(store.as_ref()).is_empty());
    }

    #[tokio::test]
    async fn test_start_waits_for_identity() {
        let api = MockApi::with_batches(vec![Ok(movies(&["a"]))]);
        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(UserIdProvider::new(None));
        let s = SwipeSession::new(api.clone(), store.clone(), identity.clone(), SwipeConfig::default());

        s.start().await;
        assert_eq!(api.random_call_count(), 0);

        identity.attach(store);
        s.start().await;
        s.start().await;
        assert_eq!(api.random_call_count(), 1);
        assert_eq!(ids(&s.snapshot().candidates), vec!["a"]);
    }
}
