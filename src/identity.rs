use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use crate::storage::{KeyValueStore, USER_ID_KEY};

/// Identifier handed out before any storage context exists.
pub const PLACEHOLDER_USER_ID: &str = "temp-ssr-id";

/// Per-installation user identity, created once and kept in storage.
pub struct UserIdProvider {
    store: RwLock<Option<Arc<dyn KeyValueStore>>>,
    resolved: RwLock<Option<String>>,
}

impl UserIdProvider {
    pub fn new(store: Option<Arc<dyn KeyValueStore>>) -> Self {
        Self {
            store: RwLock::new(store),
            resolved: RwLock::new(None),
        }
    }

    /// Attaches a storage context. The next call to `user_id` resolves the
    /// real identifier.
    pub fn attach(&self, store: Arc<dyn KeyValueStore>) {
        if let Ok(mut slot) = self.store.write() {
            *slot = Some(store);
        }
        if let Ok(mut resolved) = self.resolved.write() {
            *resolved = None;
        }
    }

    pub fn user_id(&self) -> String {
        if let Ok(resolved) = self.resolved.read() {
            if let Some(id) = resolved.as_ref() {
                return id.clone();
            }
        }

        let store = match self.store.read() {
            Ok(store) => store.clone(),
            Err(_) => None,
        };
        let Some(store) = store else {
            return PLACEHOLDER_USER_ID.to_string();
        };

        let id = resolve(store.as_ref());
        match self.resolved.write() {
            Ok(mut resolved) => resolved.get_or_insert(id).clone(),
            Err(_) => id,
        }
    }
}

fn resolve(store: &dyn KeyValueStore) -> String {
    match store.get(USER_ID_KEY) {
        Ok(Some(id)) if !id.trim().is_empty() => id.trim().to_string(),
        Ok(_) => {
            let id = uuid::Uuid::new_v4().to_string();
            match store.set(USER_ID_KEY, &id) {
                Ok(()) => info!(user_id = %id, "Created new user id"),
                Err(e) => warn!("Storage not available, using ephemeral user id: {}", e),
            }
            id
        }
        Err(e) => {
            warn!("Storage not available, using ephemeral user id: {}", e);
            uuid::Uuid::new_v4().to_string()
        }
    }
}
