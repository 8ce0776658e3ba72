//! User preferences: favorites, recently used tools and category order

pub mod recents;
pub mod storage;
pub mod store;

pub use storage::{open_storage, JsonFileStorage, KeyValueStorage, MemoryStorage, RedbStorage};
pub use store::{PreferenceStore, MAX_RECENTS};
