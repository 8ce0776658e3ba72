//! Calculator hub core: unit conversion, the tool catalog, user preferences
//! and route resolution for the widget layer.

pub mod api;
pub mod core;
pub mod shared;

use crate::core::features::unit_converter::format_number_with;
use crate::core::navigation::Navigator;
use crate::core::preferences::{open_storage, KeyValueStorage, MemoryStorage, PreferenceStore};
use crate::core::registry::ToolRegistry;
use crate::shared::settings::AppSettings;
use log::{info, warn};
use std::sync::Arc;

/// Application state shared by every command
pub struct CalculatorHub {
    settings: AppSettings,
    registry: &'static ToolRegistry,
    preferences: Arc<PreferenceStore>,
}

impl CalculatorHub {
    /// Load settings from the platform config dir and start
    pub async fn launch() -> Self {
        let settings = AppSettings::load().await.unwrap_or_else(|e| {
            warn!("[CalculatorHub] Failed to load settings: {}", e);
            AppSettings::default()
        });
        Self::start(settings)
    }

    /// Open the configured storage, falling back to memory when it is unavailable
    pub fn start(settings: AppSettings) -> Self {
        let storage: Arc<dyn KeyValueStorage> = match open_storage(&settings.storage) {
            Ok(storage) => storage,
            Err(e) => {
                warn!("[CalculatorHub] {}; preferences will not persist this session", e);
                Arc::new(MemoryStorage::new())
            }
        };
        Self::with_storage(settings, storage)
    }

    pub fn with_storage(settings: AppSettings, storage: Arc<dyn KeyValueStorage>) -> Self {
        let registry = ToolRegistry::builtin();
        let preferences = Arc::new(PreferenceStore::load(storage));
        info!(
            "[CalculatorHub] Ready with {} tools, preferences in {}",
            registry.len(),
            preferences.storage_name()
        );
        Self { settings, registry, preferences }
    }

    /// Default settings, session-only preferences
    pub fn in_memory() -> Self {
        Self::with_storage(AppSettings::default(), Arc::new(MemoryStorage::new()))
    }

    pub fn navigator(&self) -> Navigator {
        Navigator::new(self.registry, Arc::clone(&self.preferences))
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn registry(&self) -> &'static ToolRegistry {
        self.registry
    }

    pub fn preferences(&self) -> &Arc<PreferenceStore> {
        &self.preferences
    }

    /// Format with the configured display precision
    pub fn format_number(&self, value: f64) -> String {
        format_number_with(value, self.settings.display.decimal_places)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::navigation::View;
    use crate::shared::settings::{StorageBackend, StorageSettings};
    use tempfile::TempDir;

    #[test]
    fn test_preferences_survive_restart() {
        let dir = TempDir::new().unwrap();
        let mut settings = AppSettings::default();
        settings.storage = StorageSettings {
            backend: StorageBackend::JsonFile,
            path: Some(dir.path().join("preferences.json")),
        };

        let hub = CalculatorHub::start(settings.clone());
        hub.navigator().navigate("/calculator/loan");
        hub.preferences().toggle_favorite("bmi");
        drop(hub);

        let hub = CalculatorHub::start(settings);
        assert_eq!(hub.preferences().recents(), vec!["loan"]);
        assert!(hub.preferences().is_favorite("bmi"));
    }

    #[test]
    fn test_unopenable_storage_falls_back_to_memory() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let mut settings = AppSettings::default();
        settings.storage.path = Some(blocker.join("preferences.json"));

        let hub = CalculatorHub::start(settings);
        assert_eq!(hub.preferences().storage_name(), "memory");
        assert!(hub.preferences().toggle_favorite("bmi"));
    }

    #[test]
    fn test_navigator_shares_preferences() {
        let hub = CalculatorHub::in_memory();
        let mut nav = hub.navigator();
        nav.navigate("/calculator/age");
        match nav.navigate("/recent") {
            View::Recent { tools } => assert_eq!(tools[0].key, "age"),
            other => panic!("expected Recent, got {:?}", other),
        }
    }

    #[test]
    fn test_display_precision() {
        let mut settings = AppSettings::default();
        settings.display.decimal_places = 2;
        let hub = CalculatorHub::with_storage(settings, Arc::new(MemoryStorage::new()));
        assert_eq!(hub.format_number(1.0 / 3.0), "0.33");
    }
}
