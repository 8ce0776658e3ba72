use super::recents::RecentList;
use super::storage::{KeyValueStorage, MemoryStorage};
use crate::shared::error::{StorageError, StorageResult};
use crate::shared::types::PreferencesSnapshot;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

pub const FAVORITES_KEY: &str = "favorites";
pub const RECENTS_KEY: &str = "recents";
pub const CATEGORY_ORDER_KEY: &str = "categoryOrder";

/// Most recently used tools kept
pub const MAX_RECENTS: usize = 10;

#[derive(Debug)]
struct PreferenceState {
    /// Starring order
    favorites: Vec<String>,
    favorite_index: HashSet<String>,
    recents: RecentList<String>,
    category_order: Vec<String>,
}

impl PreferenceState {
    fn empty() -> Self {
        Self {
            favorites: Vec::new(),
            favorite_index: HashSet::new(),
            recents: RecentList::new(MAX_RECENTS),
            category_order: Vec::new(),
        }
    }
}

/// Favorites, recents and category order, backed by a key-value storage
///
/// Every mutation updates memory first and then writes through. A failed
/// write is logged and the in-memory state stays authoritative for the
/// session.
pub struct PreferenceStore {
    storage: Arc<dyn KeyValueStorage>,
    state: Mutex<PreferenceState>,
}

fn dedupe(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}

impl PreferenceStore {
    /// Rehydrate from `storage`; unreadable values start empty
    pub fn load(storage: Arc<dyn KeyValueStorage>) -> Self {
        let favorites = dedupe(Self::read_list(storage.as_ref(), FAVORITES_KEY));
        let recents = RecentList::from_items(MAX_RECENTS, Self::read_list(storage.as_ref(), RECENTS_KEY));
        let category_order = dedupe(Self::read_list(storage.as_ref(), CATEGORY_ORDER_KEY));

        info!(
            "[Preferences] Loaded {} favorites, {} recents from {}",
            favorites.len(),
            recents.len(),
            storage.name()
        );

        let state = PreferenceState {
            favorite_index: favorites.iter().cloned().collect(),
            favorites,
            recents,
            category_order,
        };
        Self { storage, state: Mutex::new(state) }
    }

    /// Session-only store
    pub fn in_memory() -> Self {
        Self {
            storage: Arc::new(MemoryStorage::new()),
            state: Mutex::new(PreferenceState::empty()),
        }
    }

    fn read_list(storage: &dyn KeyValueStorage, key: &str) -> Vec<String> {
        let decoded = storage.get(key).and_then(|raw| match raw {
            Some(raw) => serde_json::from_str::<Vec<String>>(&raw)
                .map_err(|e| StorageError::Corrupt { key: key.to_string(), reason: e.to_string() }),
            None => Ok(Vec::new()),
        });
        match decoded {
            Ok(items) => items,
            Err(e) => {
                warn!("[Preferences] {}; starting with an empty list", e);
                Vec::new()
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, PreferenceState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("[Preferences] Mutex poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Write-through while the state lock is held so writes land in mutation order
    fn persist<'a, I>(&self, key: &str, items: I)
    where
        I: IntoIterator<Item = &'a String>,
    {
        let items: Vec<&String> = items.into_iter().collect();
        let result: StorageResult<()> = serde_json::to_string(&items)
            .map_err(|e| StorageError::Corrupt { key: key.to_string(), reason: e.to_string() })
            .and_then(|raw| self.storage.set(key, &raw));
        if let Err(e) = result {
            warn!("[Preferences] Failed to persist '{}' to {}: {}", key, self.storage.name(), e);
        }
    }

    /// Flip membership; returns whether `key` is now a favorite
    pub fn toggle_favorite(&self, key: &str) -> bool {
        let mut state = self.lock();
        let now_favorite = if state.favorite_index.remove(key) {
            state.favorites.retain(|k| k != key);
            false
        } else {
            state.favorite_index.insert(key.to_string());
            state.favorites.push(key.to_string());
            true
        };
        debug!("[Preferences] Favorite '{}' -> {}", key, now_favorite);
        self.persist(FAVORITES_KEY, &state.favorites);
        now_favorite
    }

    pub fn is_favorite(&self, key: &str) -> bool {
        self.lock().favorite_index.contains(key)
    }

    /// Favorites in starring order
    pub fn favorites(&self) -> Vec<String> {
        self.lock().favorites.clone()
    }

    pub fn clear_favorites(&self) {
        let mut state = self.lock();
        state.favorites.clear();
        state.favorite_index.clear();
        self.persist(FAVORITES_KEY, &state.favorites);
    }

    /// Move `key` to the front of the recents, evicting past `MAX_RECENTS`
    pub fn add_recent(&self, key: &str) {
        let mut state = self.lock();
        if let Some(evicted) = state.recents.touch(key.to_string()) {
            debug!("[Preferences] Evicted recent '{}'", evicted);
        }
        self.persist(RECENTS_KEY, state.recents.iter());
    }

    /// Most recent first
    pub fn recents(&self) -> Vec<String> {
        self.lock().recents.as_slice().to_vec()
    }

    pub fn clear_recents(&self) {
        let mut state = self.lock();
        state.recents.clear();
        self.persist(RECENTS_KEY, state.recents.iter());
    }

    pub fn category_order(&self) -> Vec<String> {
        self.lock().category_order.clone()
    }

    pub fn set_category_order(&self, order: Vec<String>) {
        let mut state = self.lock();
        state.category_order = dedupe(order);
        self.persist(CATEGORY_ORDER_KEY, &state.category_order);
    }

    /// Back to catalog order
    pub fn reset_category_order(&self) {
        self.set_category_order(Vec::new());
    }

    pub fn snapshot(&self) -> PreferencesSnapshot {
        let state = self.lock();
        PreferencesSnapshot {
            favorites: state.favorites.clone(),
            recents: state.recents.as_slice().to_vec(),
            category_order: state.category_order.clone(),
        }
    }

    pub fn storage_name(&self) -> &'static str {
        self.storage.name()
    }
}
